//! 실행 조율자.
//!
//! 웹훅 수신과 주문 실행 사이의 유일한 연결 고리입니다. 트리거가 오면
//! 디바운스만큼 기다렸다가 미소비 신호를 종목별로 묶어 상쇄하고,
//! 종목마다 진입/청산 시퀀스를 실행합니다.
//!
//! 동시 드레인은 세마포어 하나로 막습니다. 이미 드레인이 진행 중이면
//! 새 트리거는 아무것도 하지 않고 돌아가며, 진행 중인 드레인이 곧
//! 새 신호까지 함께 처리합니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sigflow_core::{
    Action, Direction, ExchangeGateway, ExecutionIntent, ExecutionResult, InstrumentConstraints,
    Signal, SignalStore,
};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};

use crate::chunker::{self, ChunkLimits};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::netter;
use crate::quantizer;
use crate::report::{ExecutionReport, InstrumentOutcome, SkipReason};
use crate::sizer;

/// 실행 조율자.
///
/// 복제해도 동일한 세마포어를 공유하므로, 어느 복제본에서 트리거하든
/// 드레인은 한 번에 하나만 돕니다.
#[derive(Clone)]
pub struct ExecutionCoordinator {
    gateway: Arc<dyn ExchangeGateway>,
    store: Arc<dyn SignalStore>,
    config: EngineConfig,
    drain_permit: Arc<Semaphore>,
    report_tx: Option<mpsc::UnboundedSender<ExecutionReport>>,
}

impl ExecutionCoordinator {
    /// 새 조율자 생성.
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        store: Arc<dyn SignalStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            config,
            drain_permit: Arc::new(Semaphore::new(1)),
            report_tx: None,
        }
    }

    /// 실행 보고 송신 채널 설정.
    pub fn with_report_sender(mut self, tx: mpsc::UnboundedSender<ExecutionReport>) -> Self {
        self.report_tx = Some(tx);
        self
    }

    /// 드레인 사이클 트리거.
    ///
    /// 드레인이 이미 진행 중이면 아무것도 하지 않습니다. 이 함수는
    /// 블로킹하지 않으며, 실제 작업은 백그라운드 태스크에서 돕니다.
    ///
    /// # Returns
    ///
    /// 새 드레인이 시작되었으면 `true`.
    pub fn trigger_drain(&self) -> bool {
        let permit = match Arc::clone(&self.drain_permit).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!("드레인 진행 중, 트리거 무시");
                return false;
            }
        };

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.run_drain_cycle().await;
            drop(permit);
        });
        true
    }

    /// 드레인 사이클 본체.
    ///
    /// 디바운스 후 미소비 신호를 종목별로 처리합니다. 한 종목의 실패는
    /// 로그와 보고로만 남기고 다른 종목 처리를 계속합니다.
    async fn run_drain_cycle(&self) {
        debug!("드레인 시작, 디바운스 {}초", self.config.debounce_secs);
        tokio::time::sleep(self.config.debounce()).await;

        let pending = match self.store.pending().await {
            Ok(pending) => pending,
            Err(e) => {
                error!("미소비 신호 조회 실패: {}", e);
                return;
            }
        };
        if pending.is_empty() {
            debug!("처리할 신호 없음");
            return;
        }

        // 종목별로 묶고 순서를 고정한다
        let mut by_instrument: BTreeMap<String, Vec<Signal>> = BTreeMap::new();
        for signal in pending {
            by_instrument
                .entry(signal.instrument.clone())
                .or_default()
                .push(signal);
        }

        for (instrument, signals) in by_instrument {
            let signal_count = signals.len();
            let net_intent = netter::net(&signals);
            info!(
                "{}: 신호 {}건 상쇄 결과 {}",
                instrument, signal_count, net_intent
            );

            let outcome = match net_intent.directive() {
                None => InstrumentOutcome::Skipped(SkipReason::NetFlat),
                Some((direction, action)) => {
                    self.execute_directive(&instrument, direction, action).await
                }
            };

            // 결과와 무관하게 시도한 종목의 신호는 소비 처리
            match self.store.mark_consumed(&instrument).await {
                Ok(consumed) => debug!("{}: 신호 {}건 소비 처리", instrument, consumed),
                Err(e) => error!("{}: 신호 소비 처리 실패: {}", instrument, e),
            }

            self.publish_report(ExecutionReport {
                instrument,
                net_intent,
                signal_count,
                outcome,
                finished_at: Utc::now(),
            });
        }
    }

    async fn execute_directive(
        &self,
        instrument: &str,
        direction: Direction,
        action: Action,
    ) -> InstrumentOutcome {
        let result = match action {
            Action::Open => self.execute_open(instrument, direction).await,
            Action::Close => self.execute_close(instrument, direction).await,
        };
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{}: 실행 중단: {}", instrument, e);
                InstrumentOutcome::Aborted(e)
            }
        }
    }

    /// 진입 시퀀스.
    ///
    /// 제약 조회, 레버리지/마진 설정, 시세/잔고 조회, 반대 포지션 정리,
    /// 수량 계산, 분할 제출 순서로 진행합니다. 레버리지/마진 설정과
    /// 반대 포지션 정리는 실패해도 진입을 막지 않습니다.
    async fn execute_open(
        &self,
        instrument: &str,
        direction: Direction,
    ) -> Result<InstrumentOutcome, EngineError> {
        let constraints = self.fetch_constraints(instrument).await?;

        // 레버리지/마진 모드는 사이클당 한 번만 설정
        let leverage = quantizer::quantize_leverage(self.config.leverage.max(1), &constraints);
        if let Err(e) = self
            .gateway
            .set_margin_mode(instrument, self.config.margin_mode)
            .await
        {
            warn!("{}: 마진 모드 설정 실패: {}", instrument, e);
        }
        if let Err(e) = self.gateway.set_leverage(instrument, leverage).await {
            warn!("{}: 레버리지 {} 설정 실패: {}", instrument, leverage, e);
        }

        let price = self.gateway.market_price(instrument).await?;
        let balance = self.gateway.quote_balance(&constraints.quote_asset).await?;

        // 반대 방향 포지션이 있으면 먼저 정리한다. 실패해도 진입은 계속.
        if let Err(e) = self.flatten_opposite(instrument, direction, &constraints).await {
            warn!("{}: 반대 포지션 정리 실패: {}", instrument, e);
        }

        let desired =
            sizer::size_position(balance, self.config.balance_percent, leverage, price)?;
        let intent = ExecutionIntent {
            instrument: instrument.to_string(),
            direction,
            action: Action::Open,
            desired_qty: desired,
            leverage,
        };
        self.execute_intent(intent, &constraints).await
    }

    /// 청산 시퀀스.
    ///
    /// 보유 수량을 조회해 없으면 건너뛰고, 있으면 전량을 축소 전용
    /// 주문으로 제출합니다.
    async fn execute_close(
        &self,
        instrument: &str,
        direction: Direction,
    ) -> Result<InstrumentOutcome, EngineError> {
        let constraints = self.fetch_constraints(instrument).await?;

        let held = self.gateway.position_quantity(instrument, direction).await?;
        if held <= Decimal::ZERO {
            info!("{}: 청산할 {} 포지션 없음", instrument, direction);
            return Ok(InstrumentOutcome::Skipped(SkipReason::NoOpenPosition));
        }

        let intent = ExecutionIntent {
            instrument: instrument.to_string(),
            direction,
            action: Action::Close,
            desired_qty: held,
            leverage: self.config.leverage.max(1),
        };
        self.execute_intent(intent, &constraints).await
    }

    /// 도출된 의도 실행: 양자화 후 분할 제출.
    ///
    /// 청산 의도는 축소 전용 주문으로 제출합니다.
    async fn execute_intent(
        &self,
        intent: ExecutionIntent,
        constraints: &InstrumentConstraints,
    ) -> Result<InstrumentOutcome, EngineError> {
        let Some(quantity) = quantizer::quantize(intent.desired_qty, constraints) else {
            info!(
                "{}: 희망 수량 {} 양자화 결과 없음",
                intent.instrument, intent.desired_qty
            );
            return Ok(InstrumentOutcome::Skipped(SkipReason::QuantizationEmpty));
        };

        let reduce_only = intent.action == Action::Close;
        info!(
            "{}: {} {} {} (레버리지 {})",
            intent.instrument, intent.action, intent.direction, quantity, intent.leverage
        );
        let result = self
            .submit_chunked(&intent.instrument, intent.direction, quantity, reduce_only, constraints)
            .await?;
        Ok(InstrumentOutcome::Completed(result))
    }

    async fn fetch_constraints(
        &self,
        instrument: &str,
    ) -> Result<InstrumentConstraints, EngineError> {
        self.gateway
            .instrument_constraints(instrument)
            .await
            .map_err(|source| EngineError::Constraints {
                instrument: instrument.to_string(),
                source,
            })
    }

    /// 반대 방향 포지션 전량 정리.
    async fn flatten_opposite(
        &self,
        instrument: &str,
        direction: Direction,
        constraints: &InstrumentConstraints,
    ) -> Result<(), EngineError> {
        let opposite = direction.opposite();
        let held = self.gateway.position_quantity(instrument, opposite).await?;
        if held <= Decimal::ZERO {
            return Ok(());
        }

        info!("{}: 진입 전 반대 {} 포지션 {} 정리", instrument, opposite, held);
        let intent = ExecutionIntent {
            instrument: instrument.to_string(),
            direction: opposite,
            action: Action::Close,
            desired_qty: held,
            leverage: self.config.leverage.max(1),
        };
        self.execute_intent(intent, constraints).await?;
        Ok(())
    }

    async fn submit_chunked(
        &self,
        instrument: &str,
        direction: Direction,
        quantity: Decimal,
        reduce_only: bool,
        constraints: &InstrumentConstraints,
    ) -> Result<ExecutionResult, EngineError> {
        let limits = ChunkLimits::from(constraints);
        let gateway = Arc::clone(&self.gateway);
        let instrument_owned = instrument.to_string();

        let result = chunker::execute_chunked(quantity, &limits, move |qty| {
            let gateway = Arc::clone(&gateway);
            let instrument = instrument_owned.clone();
            async move {
                gateway
                    .submit_market_order(&instrument, direction, qty, reduce_only)
                    .await
            }
        })
        .await?;

        if result.is_total_failure() {
            warn!(
                "{}: 주문 전량 실패 (거부 {}건)",
                instrument, result.failed_chunks
            );
        } else if result.is_partial() {
            warn!(
                "{}: 부분 체결 {}/{} (거부 {}건)",
                instrument, result.executed_qty, quantity, result.failed_chunks
            );
        } else {
            debug!("{}: 전량 체결 {}", instrument, result.executed_qty);
        }
        Ok(result)
    }

    fn publish_report(&self, report: ExecutionReport) {
        if let Some(tx) = &self.report_tx {
            if tx.send(report).is_err() {
                debug!("실행 보고 수신자 없음");
            }
        }
    }
}
