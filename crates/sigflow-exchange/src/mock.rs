//! Mock 거래소 게이트웨이.
//!
//! 실제 거래소 없이 파이프라인 전체를 돌려보는 가상 게이트웨이입니다.
//! 모든 종목에 동일한 제약을 적용하고, 주문은 즉시 체결된 것으로
//! 간주하여 포지션만 갱신합니다. 증거금 정산은 하지 않으므로 잔고는
//! 설정값 그대로 유지됩니다.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sigflow_core::{Direction, ExchangeGateway, GatewayError, InstrumentConstraints, MarginMode};
use tracing::debug;

/// 방향별 포지션 수량 (롱, 숏).
type PositionPair = (Decimal, Decimal);

pub struct MockGateway {
    price: Mutex<Decimal>,
    balance: Mutex<Decimal>,
    /// 종목별 (롱 수량, 숏 수량)
    positions: Mutex<HashMap<String, PositionPair>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            price: Mutex::new(dec!(50000)),
            balance: Mutex::new(dec!(10000)),
            positions: Mutex::new(HashMap::new()),
        }
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 시세 설정 (빌더 패턴).
    pub fn with_price(self, price: Decimal) -> Self {
        *self.price.lock().unwrap_or_else(|e| e.into_inner()) = price;
        self
    }

    /// 잔고 설정 (빌더 패턴).
    pub fn with_balance(self, balance: Decimal) -> Self {
        *self.balance.lock().unwrap_or_else(|e| e.into_inner()) = balance;
        self
    }

    /// 포지션 설정 (빌더 패턴).
    pub fn with_position(self, instrument: &str, direction: Direction, qty: Decimal) -> Self {
        {
            let mut positions = self.positions.lock().unwrap_or_else(|e| e.into_inner());
            let entry = positions.entry(instrument.to_string()).or_default();
            match direction {
                Direction::Long => entry.0 = qty,
                Direction::Short => entry.1 = qty,
            }
        }
        self
    }
}

#[async_trait]
impl ExchangeGateway for MockGateway {
    /// 모든 종목에 동일한 제약을 반환합니다.
    async fn instrument_constraints(
        &self,
        instrument: &str,
    ) -> Result<InstrumentConstraints, GatewayError> {
        let base_asset = instrument
            .strip_suffix("USDT")
            .unwrap_or(instrument)
            .to_string();
        Ok(InstrumentConstraints {
            base_asset,
            quote_asset: "USDT".to_string(),
            min_qty: dec!(0.001),
            max_qty: Some(dec!(1000)),
            step_size: dec!(0.001),
            tick_size: Some(dec!(0.01)),
            min_leverage: Some(1),
            max_leverage: Some(125),
            per_order_max_qty: Some(dec!(100)),
            per_order_step_size: Some(dec!(0.001)),
        })
    }

    async fn market_price(&self, _instrument: &str) -> Result<Decimal, GatewayError> {
        Ok(*self.price.lock().unwrap_or_else(|e| e.into_inner()))
    }

    async fn quote_balance(&self, _asset: &str) -> Result<Decimal, GatewayError> {
        Ok(*self.balance.lock().unwrap_or_else(|e| e.into_inner()))
    }

    async fn position_quantity(
        &self,
        instrument: &str,
        direction: Direction,
    ) -> Result<Decimal, GatewayError> {
        let positions = self.positions.lock().unwrap_or_else(|e| e.into_inner());
        let (long, short) = positions.get(instrument).copied().unwrap_or_default();
        Ok(match direction {
            Direction::Long => long,
            Direction::Short => short,
        })
    }

    /// 주문을 즉시 체결 처리합니다.
    ///
    /// 축소 주문은 보유 수량을 넘는 부분을 무시합니다.
    async fn submit_market_order(
        &self,
        instrument: &str,
        direction: Direction,
        quantity: Decimal,
        reduce_only: bool,
    ) -> Result<(), GatewayError> {
        let mut positions = self.positions.lock().unwrap_or_else(|e| e.into_inner());
        let entry = positions.entry(instrument.to_string()).or_default();
        let held = match direction {
            Direction::Long => &mut entry.0,
            Direction::Short => &mut entry.1,
        };
        if reduce_only {
            *held = (*held - quantity).max(Decimal::ZERO);
        } else {
            *held += quantity;
        }

        debug!(
            "{}: 모의 체결 {} {} (reduce_only={}, 보유 {})",
            instrument, direction, quantity, reduce_only, held
        );
        Ok(())
    }

    async fn set_leverage(&self, instrument: &str, leverage: u32) -> Result<(), GatewayError> {
        debug!("{}: 모의 레버리지 설정 {}x", instrument, leverage);
        Ok(())
    }

    async fn set_margin_mode(
        &self,
        instrument: &str,
        mode: MarginMode,
    ) -> Result<(), GatewayError> {
        debug!("{}: 모의 마진 모드 설정 {}", instrument, mode);
        Ok(())
    }

    fn gateway_name(&self) -> &str {
        "mock"
    }
}
