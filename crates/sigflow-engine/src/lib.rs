//! 신호 상쇄 및 주문 실행 엔진.
//!
//! 이 crate는 다음을 제공합니다:
//! - 중첩 신호를 단일 순 의도로 줄이는 상쇄기
//! - 거래소 제약에 맞춘 수량/레버리지 양자화
//! - 주문당 최대 수량을 넘는 주문의 분할 제출
//! - 디바운스와 단일 드레인을 보장하는 실행 조율자
//!
//! # 예제
//!
//! ```rust,ignore
//! use sigflow_engine::{EngineConfig, ExecutionCoordinator};
//!
//! let coordinator = ExecutionCoordinator::new(gateway, store, EngineConfig::default());
//!
//! // 웹훅 수신 시마다 호출. 이미 드레인 중이면 무시된다.
//! coordinator.trigger_drain();
//! ```

pub mod chunker;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod netter;
pub mod quantizer;
pub mod report;
pub mod sizer;

// 주요 타입 재내보내기
pub use chunker::{execute_chunked, ChunkLimits};
pub use config::EngineConfig;
pub use coordinator::ExecutionCoordinator;
pub use error::EngineError;
pub use netter::{net, NetIntent};
pub use quantizer::{floor_to_step, quantize, quantize_leverage};
pub use report::{ExecutionReport, InstrumentOutcome, SkipReason};
pub use sizer::{size_position, MIN_QUOTE_BALANCE};
