//! 실행 엔진 에러.

use rust_decimal::Decimal;
use sigflow_core::GatewayError;
use thiserror::Error;

/// 실행 엔진 에러.
///
/// 모든 변형은 해당 종목의 실행을 중단시킬 뿐, 프로세스를 종료시키지
/// 않습니다. 다른 종목의 실행에도 영향을 주지 않습니다.
#[derive(Debug, Error)]
pub enum EngineError {
    /// 종목 제약 조회 실패. 설정 오류로 간주합니다.
    #[error("종목 제약 조회 실패 ({instrument}): {source}")]
    Constraints {
        instrument: String,
        #[source]
        source: GatewayError,
    },

    /// 자금 부족
    #[error("자금 부족: 필요 {required}, 보유 {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// 유효하지 않은 가격
    #[error("유효하지 않은 가격: {price}")]
    InvalidPrice { price: Decimal },

    /// 유효하지 않은 청크 크기
    #[error("유효하지 않은 청크 크기: 총 수량 {total}, 스텝 {step}")]
    InvalidChunkSize { total: Decimal, step: Decimal },

    /// 게이트웨이 에러
    #[error("게이트웨이 에러: {0}")]
    Gateway(#[from] GatewayError),
}
