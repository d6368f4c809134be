//! 서버 에러 타입.

/// 서버 초기화/설정 에러.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// 설정 오류
    #[error("설정 오류: {0}")]
    Config(String),

    /// 게이트웨이 초기화 오류
    #[error("게이트웨이 초기화 오류: {0}")]
    Gateway(#[from] sigflow_core::GatewayError),

    /// 네트워크 바인딩 오류
    #[error("바인딩 오류: {0}")]
    Bind(#[from] std::io::Error),
}

/// 서버 결과 타입.
pub type Result<T> = std::result::Result<T, ServerError>;
