//! # sigflow-server
//!
//! TradingView 웹훅을 받아 실행 엔진을 구동하는 HTTP 서버입니다.
//!
//! - `config`: 환경변수 기반 설정
//! - `routes`: 웹훅/헬스 체크 라우트
//! - `services`: 실행 보고를 알림으로 전달하는 백그라운드 서비스
//! - `state`: 핸들러 공유 상태

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

// 주요 타입 재내보내기
pub use config::{AppConfig, GatewayMode};
pub use error::{Result, ServerError};
pub use routes::create_api_router;
pub use services::ReportForwarder;
pub use state::AppState;
