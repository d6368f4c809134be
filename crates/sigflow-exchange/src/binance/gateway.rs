//! Binance USDT-M 선물 게이트웨이.
//!
//! [`ExchangeGateway`]를 Binance 선물 REST API로 구현합니다.
//! 심볼 필터(LOT_SIZE, MARKET_LOT_SIZE, PRICE_FILTER)와 레버리지
//! 브래킷을 종목 제약으로 변환하고, 방향/축소 여부를 BUY/SELL로
//! 사상합니다.

use async_trait::async_trait;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Deserialize;
use sigflow_core::{Direction, ExchangeGateway, GatewayError, InstrumentConstraints, MarginMode};
use tracing::{debug, warn};

use super::client::{BinanceClient, BinanceConfig};

/// 이미 동일한 마진 모드일 때 Binance가 반환하는 에러 코드.
const NO_NEED_TO_CHANGE_MARGIN_TYPE: i64 = -4046;

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    base_asset: String,
    quote_asset: String,
    filters: Vec<SymbolFilter>,
}

/// 심볼 필터. 타입별로 채워지는 필드가 다릅니다.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolFilter {
    filter_type: String,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    min_qty: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    max_qty: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    step_size: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    tick_size: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct LeverageBracketEntry {
    brackets: Vec<LeverageBracket>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeverageBracket {
    initial_leverage: u32,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct AssetBalance {
    asset: String,
    #[serde(with = "rust_decimal::serde::str")]
    balance: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionRisk {
    #[serde(with = "rust_decimal::serde::str")]
    position_amt: Decimal,
}

/// 방향과 축소 여부를 주문 side로 변환합니다.
fn order_side(direction: Direction, reduce_only: bool) -> &'static str {
    match (direction, reduce_only) {
        (Direction::Long, false) | (Direction::Short, true) => "BUY",
        (Direction::Long, true) | (Direction::Short, false) => "SELL",
    }
}

// ============================================================================
// BinanceGateway
// ============================================================================

pub struct BinanceGateway {
    client: BinanceClient,
}

impl BinanceGateway {
    pub fn new(config: BinanceConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: BinanceClient::new(config)?,
        })
    }

    /// 이미 구성된 클라이언트로 생성합니다. 모의 서버 테스트에 사용합니다.
    pub fn with_client(client: BinanceClient) -> Self {
        Self { client }
    }

    /// 레버리지 브래킷에서 허용 범위를 구합니다 (GET /fapi/v1/leverageBracket).
    async fn fetch_leverage_bounds(
        &self,
        instrument: &str,
    ) -> Result<(Option<u32>, Option<u32>), GatewayError> {
        let params = vec![("symbol", instrument.to_string())];
        let entries: Vec<LeverageBracketEntry> = self
            .client
            .request_signed(Method::GET, "/fapi/v1/leverageBracket", &params)
            .await?;

        Ok(entries
            .into_iter()
            .next()
            .map(|entry| {
                let min = entry.brackets.iter().map(|b| b.initial_leverage).min();
                let max = entry.brackets.iter().map(|b| b.initial_leverage).max();
                (min, max)
            })
            .unwrap_or((None, None)))
    }
}

#[async_trait]
impl ExchangeGateway for BinanceGateway {
    /// 종목 제약 조회 (GET /fapi/v1/exchangeInfo).
    ///
    /// 레버리지 브래킷 조회가 실패하면 레버리지 범위만 비운 채 반환합니다.
    async fn instrument_constraints(
        &self,
        instrument: &str,
    ) -> Result<InstrumentConstraints, GatewayError> {
        let params = vec![("symbol", instrument.to_string())];
        let info: ExchangeInfo = self
            .client
            .get_public("/fapi/v1/exchangeInfo", &params)
            .await?;

        let symbol = info
            .symbols
            .into_iter()
            .find(|s| s.symbol == instrument)
            .ok_or_else(|| GatewayError::SymbolNotFound(instrument.to_string()))?;

        let mut constraints = InstrumentConstraints {
            base_asset: symbol.base_asset,
            quote_asset: symbol.quote_asset,
            min_qty: Decimal::ZERO,
            max_qty: None,
            step_size: Decimal::ZERO,
            tick_size: None,
            min_leverage: None,
            max_leverage: None,
            per_order_max_qty: None,
            per_order_step_size: None,
        };
        for filter in symbol.filters {
            match filter.filter_type.as_str() {
                "LOT_SIZE" => {
                    if let Some(min) = filter.min_qty {
                        constraints.min_qty = min;
                    }
                    if let Some(step) = filter.step_size {
                        constraints.step_size = step;
                    }
                    constraints.max_qty = filter.max_qty;
                }
                "MARKET_LOT_SIZE" => {
                    constraints.per_order_max_qty = filter.max_qty;
                    constraints.per_order_step_size = filter.step_size;
                }
                "PRICE_FILTER" => {
                    constraints.tick_size = filter.tick_size;
                }
                _ => {}
            }
        }

        match self.fetch_leverage_bounds(instrument).await {
            Ok((min, max)) => {
                constraints.min_leverage = min;
                constraints.max_leverage = max;
            }
            Err(e) => {
                warn!("{}: 레버리지 브래킷 조회 실패: {}", instrument, e);
            }
        }

        Ok(constraints)
    }

    /// 현재 시장가 조회 (GET /fapi/v1/ticker/price).
    async fn market_price(&self, instrument: &str) -> Result<Decimal, GatewayError> {
        let params = vec![("symbol", instrument.to_string())];
        let ticker: TickerPrice = self
            .client
            .get_public("/fapi/v1/ticker/price", &params)
            .await?;
        if ticker.price <= Decimal::ZERO {
            return Err(GatewayError::PriceUnavailable(instrument.to_string()));
        }
        Ok(ticker.price)
    }

    /// 지갑 잔고 조회 (GET /fapi/v2/balance).
    ///
    /// 포지션 증거금에 묶인 금액과 무관하게 자산의 지갑 잔고(balance)를
    /// 기준으로 합니다. 주문 규모 산정이 이 값을 사용합니다.
    async fn quote_balance(&self, asset: &str) -> Result<Decimal, GatewayError> {
        let balances: Vec<AssetBalance> = self
            .client
            .request_signed(Method::GET, "/fapi/v2/balance", &[])
            .await?;
        Ok(balances
            .into_iter()
            .find(|b| b.asset == asset)
            .map(|b| b.balance)
            .unwrap_or(Decimal::ZERO))
    }

    /// 방향별 포지션 수량 조회 (GET /fapi/v2/positionRisk).
    ///
    /// positionAmt는 롱이면 양수, 숏이면 음수입니다.
    async fn position_quantity(
        &self,
        instrument: &str,
        direction: Direction,
    ) -> Result<Decimal, GatewayError> {
        let params = vec![("symbol", instrument.to_string())];
        let positions: Vec<PositionRisk> = self
            .client
            .request_signed(Method::GET, "/fapi/v2/positionRisk", &params)
            .await?;

        Ok(positions
            .iter()
            .map(|p| match direction {
                Direction::Long => p.position_amt.max(Decimal::ZERO),
                Direction::Short => (-p.position_amt).max(Decimal::ZERO),
            })
            .sum())
    }

    /// 시장가 주문 제출 (POST /fapi/v1/order).
    async fn submit_market_order(
        &self,
        instrument: &str,
        direction: Direction,
        quantity: Decimal,
        reduce_only: bool,
    ) -> Result<(), GatewayError> {
        let side = order_side(direction, reduce_only);
        let mut params = vec![
            ("symbol", instrument.to_string()),
            ("side", side.to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", quantity.normalize().to_string()),
        ];
        if reduce_only {
            params.push(("reduceOnly", "true".to_string()));
        }

        debug!(
            "{}: 시장가 주문 {} {} (reduce_only={})",
            instrument, side, quantity, reduce_only
        );
        let _: serde_json::Value = self
            .client
            .request_signed(Method::POST, "/fapi/v1/order", &params)
            .await?;
        Ok(())
    }

    /// 포지션 전체 청산 스톱 주문 (POST /fapi/v1/order, STOP_MARKET).
    async fn submit_stop_market_close(
        &self,
        instrument: &str,
        direction: Direction,
        stop_price: Decimal,
    ) -> Result<(), GatewayError> {
        let side = match direction {
            Direction::Long => "SELL",
            Direction::Short => "BUY",
        };
        let params = vec![
            ("symbol", instrument.to_string()),
            ("side", side.to_string()),
            ("type", "STOP_MARKET".to_string()),
            ("stopPrice", stop_price.normalize().to_string()),
            ("closePosition", "true".to_string()),
        ];

        let _: serde_json::Value = self
            .client
            .request_signed(Method::POST, "/fapi/v1/order", &params)
            .await?;
        Ok(())
    }

    /// 레버리지 설정 (POST /fapi/v1/leverage).
    async fn set_leverage(&self, instrument: &str, leverage: u32) -> Result<(), GatewayError> {
        let params = vec![
            ("symbol", instrument.to_string()),
            ("leverage", leverage.to_string()),
        ];
        let _: serde_json::Value = self
            .client
            .request_signed(Method::POST, "/fapi/v1/leverage", &params)
            .await?;
        Ok(())
    }

    /// 마진 모드 설정 (POST /fapi/v1/marginType).
    ///
    /// 이미 동일한 모드면 성공으로 처리합니다.
    async fn set_margin_mode(
        &self,
        instrument: &str,
        mode: MarginMode,
    ) -> Result<(), GatewayError> {
        let params = vec![
            ("symbol", instrument.to_string()),
            ("marginType", mode.as_api_str().to_string()),
        ];
        match self
            .client
            .request_signed::<serde_json::Value>(Method::POST, "/fapi/v1/marginType", &params)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if BinanceClient::is_error_code(&e, NO_NEED_TO_CHANGE_MARGIN_TYPE) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn gateway_name(&self) -> &str {
        "binance-futures"
    }
}
