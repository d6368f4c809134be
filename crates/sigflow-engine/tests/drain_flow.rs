//! 드레인 사이클 통합 테스트
//!
//! 신호 적재부터 상쇄, 수량 계산, 분할 제출, 소비 처리까지의 전체
//! 흐름을 스크립트된 게이트웨이로 검증합니다.
//!
//! ## 핵심 불변식
//!
//! 1. 드레인은 한 번에 하나만 돈다 (중복 트리거 무시)
//! 2. 한 종목의 실패는 다른 종목의 실행을 막지 않는다
//! 3. 실행 결과와 무관하게 시도한 신호는 소비 처리된다

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sigflow_core::{
    Direction, ExchangeGateway, GatewayError, InstrumentConstraints, IntentKind, MarginMode,
    MemorySignalStore, Signal, SignalStore,
};
use sigflow_engine::{
    EngineConfig, EngineError, ExecutionCoordinator, ExecutionReport, InstrumentOutcome,
    NetIntent, SkipReason,
};
use tokio::sync::mpsc;

// ============================================================================
// 테스트 헬퍼
// ============================================================================

/// 기록된 주문 호출.
#[derive(Debug, Clone, PartialEq)]
struct OrderCall {
    instrument: String,
    direction: Direction,
    quantity: Decimal,
    reduce_only: bool,
}

/// 종목별 게이트웨이 동작 스크립트.
#[derive(Debug, Clone)]
struct GatewayScript {
    constraints: InstrumentConstraints,
    price: Decimal,
    balance: Decimal,
    long_position: Decimal,
    short_position: Decimal,
    /// 앞에서부터 거부할 주문 제출 횟수
    reject_submits: u32,
    fail_constraints: bool,
}

fn constraints() -> InstrumentConstraints {
    InstrumentConstraints {
        base_asset: "BTC".to_string(),
        quote_asset: "USDT".to_string(),
        min_qty: dec!(0.001),
        max_qty: Some(dec!(1000)),
        step_size: dec!(0.001),
        tick_size: Some(dec!(0.1)),
        min_leverage: Some(1),
        max_leverage: Some(125),
        per_order_max_qty: None,
        per_order_step_size: None,
    }
}

fn script() -> GatewayScript {
    GatewayScript {
        constraints: constraints(),
        price: dec!(50000),
        balance: dec!(1000),
        long_position: Decimal::ZERO,
        short_position: Decimal::ZERO,
        reject_submits: 0,
        fail_constraints: false,
    }
}

/// 스크립트 기반 테스트 게이트웨이.
struct MockGateway {
    scripts: Mutex<HashMap<String, GatewayScript>>,
    orders: Mutex<Vec<OrderCall>>,
    leverage_calls: Mutex<Vec<(String, u32)>>,
    margin_calls: Mutex<Vec<(String, MarginMode)>>,
}

impl MockGateway {
    fn new(scripts: Vec<(&str, GatewayScript)>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(
                scripts
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            ),
            orders: Mutex::new(Vec::new()),
            leverage_calls: Mutex::new(Vec::new()),
            margin_calls: Mutex::new(Vec::new()),
        })
    }

    fn orders(&self) -> Vec<OrderCall> {
        self.orders.lock().unwrap().clone()
    }

    fn script_of(&self, instrument: &str) -> Result<GatewayScript, GatewayError> {
        self.scripts
            .lock()
            .unwrap()
            .get(instrument)
            .cloned()
            .ok_or_else(|| GatewayError::SymbolNotFound(instrument.to_string()))
    }
}

#[async_trait]
impl ExchangeGateway for MockGateway {
    async fn instrument_constraints(
        &self,
        instrument: &str,
    ) -> Result<InstrumentConstraints, GatewayError> {
        let script = self.script_of(instrument)?;
        if script.fail_constraints {
            return Err(GatewayError::Network("mock constraints failure".to_string()));
        }
        Ok(script.constraints)
    }

    async fn market_price(&self, instrument: &str) -> Result<Decimal, GatewayError> {
        Ok(self.script_of(instrument)?.price)
    }

    async fn quote_balance(&self, _asset: &str) -> Result<Decimal, GatewayError> {
        // 단일 계좌 가정: 아무 스크립트의 잔고나 동일
        let scripts = self.scripts.lock().unwrap();
        let balance = scripts
            .values()
            .next()
            .map(|s| s.balance)
            .unwrap_or(Decimal::ZERO);
        Ok(balance)
    }

    async fn position_quantity(
        &self,
        instrument: &str,
        direction: Direction,
    ) -> Result<Decimal, GatewayError> {
        let script = self.script_of(instrument)?;
        Ok(match direction {
            Direction::Long => script.long_position,
            Direction::Short => script.short_position,
        })
    }

    async fn submit_market_order(
        &self,
        instrument: &str,
        direction: Direction,
        quantity: Decimal,
        reduce_only: bool,
    ) -> Result<(), GatewayError> {
        self.orders.lock().unwrap().push(OrderCall {
            instrument: instrument.to_string(),
            direction,
            quantity,
            reduce_only,
        });
        let mut scripts = self.scripts.lock().unwrap();
        if let Some(script) = scripts.get_mut(instrument) {
            if script.reject_submits > 0 {
                script.reject_submits -= 1;
                return Err(GatewayError::Api("mock order rejected".to_string()));
            }
        }
        Ok(())
    }

    async fn set_leverage(&self, instrument: &str, leverage: u32) -> Result<(), GatewayError> {
        self.leverage_calls
            .lock()
            .unwrap()
            .push((instrument.to_string(), leverage));
        Ok(())
    }

    async fn set_margin_mode(
        &self,
        instrument: &str,
        mode: MarginMode,
    ) -> Result<(), GatewayError> {
        self.margin_calls
            .lock()
            .unwrap()
            .push((instrument.to_string(), mode));
        Ok(())
    }

    fn gateway_name(&self) -> &str {
        "MockGateway"
    }
}

/// 조율자, 저장소, 보고 수신 채널을 한 번에 만든다.
fn build_coordinator(
    gateway: Arc<MockGateway>,
    config: EngineConfig,
) -> (
    ExecutionCoordinator,
    Arc<MemorySignalStore>,
    mpsc::UnboundedReceiver<ExecutionReport>,
) {
    let store = Arc::new(MemorySignalStore::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let coordinator =
        ExecutionCoordinator::new(gateway, store.clone(), config).with_report_sender(tx);
    (coordinator, store, rx)
}

async fn enqueue(store: &MemorySignalStore, instrument: &str, intent: IntentKind) {
    store
        .enqueue(Signal::new(instrument, intent, dec!(50000)))
        .await
        .unwrap();
}

async fn recv_report(rx: &mut mpsc::UnboundedReceiver<ExecutionReport>) -> ExecutionReport {
    rx.recv().await.expect("실행 보고가 와야 한다")
}

// ============================================================================
// 진입 흐름
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_open_long_flow() {
    let gateway = MockGateway::new(vec![("BTCUSDT", script())]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;
    assert!(coordinator.trigger_drain());

    let report = recv_report(&mut rx).await;
    assert_eq!(report.instrument, "BTCUSDT");
    assert_eq!(report.net_intent, NetIntent::OpenLong);
    assert_eq!(report.signal_count, 1);

    // 1000 USDT * 100% * 2배 / 50000 = 0.04
    let orders = gateway.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].direction, Direction::Long);
    assert_eq!(orders[0].quantity, dec!(0.04));
    assert!(!orders[0].reduce_only);

    match report.outcome {
        InstrumentOutcome::Completed(result) => {
            assert!(result.any_chunk_succeeded);
            assert_eq!(result.executed_qty, dec!(0.04));
            assert_eq!(result.failed_chunks, 0);
        }
        other => panic!("진입이 완료되어야 한다: {other:?}"),
    }

    // 레버리지/마진 모드가 설정되고 신호는 소비된다
    assert_eq!(gateway.leverage_calls.lock().unwrap().as_slice(), &[("BTCUSDT".to_string(), 2)]);
    assert_eq!(
        gateway.margin_calls.lock().unwrap().as_slice(),
        &[("BTCUSDT".to_string(), MarginMode::Isolated)]
    );
    assert!(store.pending().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_open_flattens_opposite_position_first() {
    let gateway = MockGateway::new(vec![(
        "BTCUSDT",
        GatewayScript {
            short_position: dec!(0.3),
            ..script()
        },
    )]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;
    coordinator.trigger_drain();
    recv_report(&mut rx).await;

    // 반대 숏 포지션을 축소 전용으로 정리한 뒤 롱 진입
    let orders = gateway.orders();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].direction, Direction::Short);
    assert_eq!(orders[0].quantity, dec!(0.3));
    assert!(orders[0].reduce_only);
    assert_eq!(orders[1].direction, Direction::Long);
    assert!(!orders[1].reduce_only);
}

#[tokio::test(start_paused = true)]
async fn test_open_split_into_chunks() {
    let mut chunked = script();
    chunked.constraints.per_order_max_qty = Some(dec!(10));
    chunked.price = dec!(100);
    chunked.balance = dec!(1250);
    let gateway = MockGateway::new(vec![("BTCUSDT", chunked)]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;
    coordinator.trigger_drain();
    let report = recv_report(&mut rx).await;

    // 1250 * 2배 / 100 = 25 -> 10, 10, 5
    let quantities: Vec<Decimal> = gateway.orders().iter().map(|o| o.quantity).collect();
    assert_eq!(quantities, vec![dec!(10), dec!(10), dec!(5)]);

    match report.outcome {
        InstrumentOutcome::Completed(result) => assert_eq!(result.executed_qty, dec!(25)),
        other => panic!("진입이 완료되어야 한다: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_open_quantization_empty_skips() {
    let mut tiny = script();
    tiny.constraints.min_qty = Decimal::ZERO;
    tiny.balance = dec!(10);
    tiny.price = dec!(1000000);
    let gateway = MockGateway::new(vec![("BTCUSDT", tiny)]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;
    coordinator.trigger_drain();
    let report = recv_report(&mut rx).await;

    // 10 * 2배 / 1000000 은 스텝 미만이라 주문 불가
    assert!(matches!(
        report.outcome,
        InstrumentOutcome::Skipped(SkipReason::QuantizationEmpty)
    ));
    assert!(gateway.orders().is_empty());
    assert!(store.pending().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_open_insufficient_balance_aborts() {
    let gateway = MockGateway::new(vec![(
        "BTCUSDT",
        GatewayScript {
            balance: dec!(5),
            ..script()
        },
    )]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;
    coordinator.trigger_drain();
    let report = recv_report(&mut rx).await;

    assert!(matches!(
        report.outcome,
        InstrumentOutcome::Aborted(EngineError::InsufficientFunds { .. })
    ));
    assert!(gateway.orders().is_empty());
    // 실패해도 신호는 소비된다
    assert!(store.pending().await.unwrap().is_empty());
}

// ============================================================================
// 청산 흐름
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_close_submits_reduce_only() {
    let gateway = MockGateway::new(vec![(
        "BTCUSDT",
        GatewayScript {
            short_position: dec!(0.5),
            ..script()
        },
    )]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::CloseShort).await;
    coordinator.trigger_drain();
    let report = recv_report(&mut rx).await;

    let orders = gateway.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].direction, Direction::Short);
    assert_eq!(orders[0].quantity, dec!(0.5));
    assert!(orders[0].reduce_only);
    assert_eq!(report.net_intent, NetIntent::CloseShort);
}

#[tokio::test(start_paused = true)]
async fn test_close_without_position_skips() {
    let gateway = MockGateway::new(vec![("BTCUSDT", script())]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::CloseLong).await;
    coordinator.trigger_drain();
    let report = recv_report(&mut rx).await;

    assert!(matches!(
        report.outcome,
        InstrumentOutcome::Skipped(SkipReason::NoOpenPosition)
    ));
    assert!(gateway.orders().is_empty());
    assert!(store.pending().await.unwrap().is_empty());
}

// ============================================================================
// 상쇄
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_netting_open_beats_close() {
    let gateway = MockGateway::new(vec![("BTCUSDT", script())]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;
    enqueue(&store, "BTCUSDT", IntentKind::CloseShort).await;
    coordinator.trigger_drain();
    let report = recv_report(&mut rx).await;

    // 롱 진입 + 숏 청산은 순 롱 진입 하나로 합쳐진다
    assert_eq!(report.net_intent, NetIntent::OpenLong);
    assert_eq!(report.signal_count, 2);
    assert_eq!(gateway.orders().len(), 1);
    assert!(!gateway.orders()[0].reduce_only);
}

#[tokio::test(start_paused = true)]
async fn test_opposing_signals_cancel_out() {
    let gateway = MockGateway::new(vec![("BTCUSDT", script())]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;
    enqueue(&store, "BTCUSDT", IntentKind::OpenShort).await;
    coordinator.trigger_drain();
    let report = recv_report(&mut rx).await;

    assert_eq!(report.net_intent, NetIntent::None);
    assert!(matches!(
        report.outcome,
        InstrumentOutcome::Skipped(SkipReason::NetFlat)
    ));
    assert!(gateway.orders().is_empty());
    // 상쇄된 신호도 소비된다
    assert!(store.pending().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_debounce_batches_late_signals() {
    let gateway = MockGateway::new(vec![("BTCUSDT", script())]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;
    coordinator.trigger_drain();

    // 디바운스 중 도착한 신호도 같은 사이클에서 함께 처리된다
    enqueue(&store, "BTCUSDT", IntentKind::OpenShort).await;

    let report = recv_report(&mut rx).await;
    assert_eq!(report.signal_count, 2);
    assert_eq!(report.net_intent, NetIntent::None);
    assert!(gateway.orders().is_empty());
}

// ============================================================================
// 격리 및 동시성
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failure_contained_per_instrument() {
    let gateway = MockGateway::new(vec![
        (
            "BTCUSDT",
            GatewayScript {
                reject_submits: 2,
                ..script()
            },
        ),
        ("ETHUSDT", script()),
    ]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;
    enqueue(&store, "ETHUSDT", IntentKind::OpenLong).await;
    coordinator.trigger_drain();

    // 종목은 사전순으로 처리된다
    let btc = recv_report(&mut rx).await;
    assert_eq!(btc.instrument, "BTCUSDT");
    match btc.outcome {
        InstrumentOutcome::Completed(result) => {
            assert!(result.is_total_failure());
            assert_eq!(result.failed_chunks, 2);
        }
        other => panic!("거부는 실행 결과로 남아야 한다: {other:?}"),
    }

    // BTC의 전량 거부가 ETH 실행을 막지 않는다
    let eth = recv_report(&mut rx).await;
    assert_eq!(eth.instrument, "ETHUSDT");
    match eth.outcome {
        InstrumentOutcome::Completed(result) => assert!(result.any_chunk_succeeded),
        other => panic!("진입이 완료되어야 한다: {other:?}"),
    }

    assert!(store.pending().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_constraints_failure_aborts_instrument() {
    let gateway = MockGateway::new(vec![(
        "BTCUSDT",
        GatewayScript {
            fail_constraints: true,
            ..script()
        },
    )]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;
    coordinator.trigger_drain();
    let report = recv_report(&mut rx).await;

    assert!(matches!(
        report.outcome,
        InstrumentOutcome::Aborted(EngineError::Constraints { .. })
    ));
    assert!(gateway.orders().is_empty());
    assert!(store.pending().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_double_trigger_runs_single_drain() {
    let gateway = MockGateway::new(vec![("BTCUSDT", script())]);
    let (coordinator, store, mut rx) = build_coordinator(gateway.clone(), EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;

    // 두 번째 트리거는 진행 중인 드레인에 흡수된다
    assert!(coordinator.trigger_drain());
    assert!(!coordinator.trigger_drain());

    let report = recv_report(&mut rx).await;
    assert_eq!(report.signal_count, 1);
    assert_eq!(gateway.orders().len(), 1);

    // 드레인이 끝나면 다시 트리거할 수 있다
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    assert!(coordinator.trigger_drain());
}

#[tokio::test(start_paused = true)]
async fn test_clone_shares_drain_permit() {
    let gateway = MockGateway::new(vec![("BTCUSDT", script())]);
    let (coordinator, store, _rx) = build_coordinator(gateway, EngineConfig::default());

    enqueue(&store, "BTCUSDT", IntentKind::OpenLong).await;

    let clone = coordinator.clone();
    assert!(coordinator.trigger_drain());
    // 복제본도 같은 세마포어를 본다
    assert!(!clone.trigger_drain());
}
