//! 도메인 모델.
//!
//! 외부에서 유입되는 트레이딩 시그널, 거래소 제약 조건, 실행 결과 등
//! 실행 엔진 전반에서 공유되는 타입을 정의합니다.

mod execution;
mod gateway;
mod instrument;
mod signal;

pub use execution::{Action, Direction, ExecutionIntent, ExecutionResult};
pub use gateway::{ExchangeGateway, GatewayError};
pub use instrument::{InstrumentConstraints, MarginMode};
pub use signal::{IntentKind, Signal};
