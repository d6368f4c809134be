//! 실행 엔진의 핵심 도메인 타입.
//!
//! 시그널/주문 도메인 모델, 거래소 게이트웨이 추상화, 시그널 저장소 포트를
//! 제공합니다. 이 크레이트는 네트워크나 런타임에 의존하지 않습니다.

pub mod domain;
pub mod store;

// 주요 타입 재내보내기
pub use domain::{
    Action, Direction, ExchangeGateway, ExecutionIntent, ExecutionResult, GatewayError,
    InstrumentConstraints, IntentKind, MarginMode, Signal,
};
pub use store::{MemorySignalStore, SignalStore, StoreError};
