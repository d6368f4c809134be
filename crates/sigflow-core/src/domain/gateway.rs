//! 거래소 게이트웨이 추상화.
//!
//! 선물 거래소에 대한 조회(제약, 시세, 잔고, 포지션)와 주문 제출을
//! 거래소 중립적인 인터페이스로 제공합니다. 실행 엔진은 이 trait만
//! 바라보며, 거래소별 구현은 별도 크레이트에 둡니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use super::{Direction, InstrumentConstraints, MarginMode};

// =============================================================================
// 에러 타입
// =============================================================================

/// ExchangeGateway 에러.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 요청 타임아웃. 주문의 경우 체결 여부를 알 수 없으므로 거부로 간주합니다.
    #[error("요청 타임아웃: {0}")]
    Timeout(String),

    /// 인증 실패
    #[error("인증 실패: {0}")]
    Authentication(String),

    /// API 에러
    #[error("API 에러: {0}")]
    Api(String),

    /// 파싱 에러
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 종목을 찾을 수 없음
    #[error("종목을 찾을 수 없음: {0}")]
    SymbolNotFound(String),

    /// 시세를 가져올 수 없음
    #[error("시세를 가져올 수 없음: {0}")]
    PriceUnavailable(String),

    /// 지원하지 않는 기능
    #[error("지원하지 않는 기능: {0}")]
    Unsupported(String),
}

// =============================================================================
// ExchangeGateway Trait
// =============================================================================

/// 거래소 게이트웨이 trait.
///
/// 실행 엔진이 필요로 하는 최소한의 거래소 기능을 정의합니다.
/// 모든 조회는 호출 시점에 거래소에서 새로 가져오며, 구현체는 결과를
/// 캐시하지 않아야 합니다.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct BinanceGateway {
///     client: Arc<BinanceClient>,
/// }
///
/// #[async_trait]
/// impl ExchangeGateway for BinanceGateway {
///     async fn market_price(&self, instrument: &str) -> Result<Decimal, GatewayError> {
///         // Binance API 호출 및 변환
///     }
///
///     // ... 나머지 메서드 구현
/// }
/// ```
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// 종목 제약 조건 조회.
    ///
    /// 수량 스텝, 최소/최대 수량, 레버리지 범위를 조회합니다.
    ///
    /// # Errors
    ///
    /// - `GatewayError::SymbolNotFound`: 거래소에 없는 종목
    /// - `GatewayError::Network`: 네트워크 연결 실패
    /// - `GatewayError::Api`: 거래소 API 에러
    async fn instrument_constraints(
        &self,
        instrument: &str,
    ) -> Result<InstrumentConstraints, GatewayError>;

    /// 현재 시장가 조회.
    ///
    /// # Errors
    ///
    /// - `GatewayError::PriceUnavailable`: 시세 조회 실패
    /// - `GatewayError::Network`: 네트워크 연결 실패
    async fn market_price(&self, instrument: &str) -> Result<Decimal, GatewayError>;

    /// 견적 자산 가용 잔고 조회.
    ///
    /// # Arguments
    ///
    /// * `asset` - 견적 자산 (예: "USDT")
    ///
    /// # Returns
    ///
    /// 주문에 사용 가능한 잔고. 자산이 없으면 0.
    async fn quote_balance(&self, asset: &str) -> Result<Decimal, GatewayError>;

    /// 특정 방향의 보유 포지션 수량 조회.
    ///
    /// # Returns
    ///
    /// 항상 0 이상의 수량. 해당 방향 포지션이 없으면 0.
    async fn position_quantity(
        &self,
        instrument: &str,
        direction: Direction,
    ) -> Result<Decimal, GatewayError>;

    /// 시장가 주문 제출.
    ///
    /// `reduce_only`가 true이면 포지션 축소 전용 주문으로 제출하여
    /// 반대 방향 신규 진입을 방지합니다.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Api`: 거래소가 주문을 거부 (수량 초과, 자금 부족 등)
    /// - `GatewayError::Timeout`: 응답 시간 초과 (거부와 동일하게 처리)
    /// - `GatewayError::Network`: 네트워크 연결 실패
    async fn submit_market_order(
        &self,
        instrument: &str,
        direction: Direction,
        quantity: Decimal,
        reduce_only: bool,
    ) -> Result<(), GatewayError>;

    /// 포지션 전체 청산 스톱 주문 제출.
    ///
    /// 지정 가격 도달 시 해당 방향 포지션 전체를 청산하는 스톱 주문입니다.
    ///
    /// # 기본 구현
    ///
    /// 기본적으로 `Unsupported` 에러를 반환합니다.
    /// 스톱 주문을 지원하는 거래소는 이 메서드를 구현합니다.
    async fn submit_stop_market_close(
        &self,
        _instrument: &str,
        _direction: Direction,
        _stop_price: Decimal,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::Unsupported(
            "이 거래소는 스톱 청산 주문을 지원하지 않습니다".to_string(),
        ))
    }

    /// 레버리지 설정.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Api`: 허용 범위 밖 레버리지 등 거래소 거부
    async fn set_leverage(&self, instrument: &str, leverage: u32) -> Result<(), GatewayError>;

    /// 마진 모드 설정.
    ///
    /// 이미 동일한 모드인 경우 구현체가 성공으로 처리해야 합니다.
    async fn set_margin_mode(
        &self,
        instrument: &str,
        mode: MarginMode,
    ) -> Result<(), GatewayError>;

    /// 거래소 이름 반환.
    ///
    /// 로깅 및 디버깅 목적으로 사용됩니다.
    fn gateway_name(&self) -> &str;
}
