//! 드레인 사이클 실행 보고.

use chrono::{DateTime, Utc};
use sigflow_core::ExecutionResult;

use crate::error::EngineError;
use crate::netter::NetIntent;

/// 실행을 건너뛴 이유.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 신호가 서로 상쇄되어 순 의도 없음
    NetFlat,
    /// 양자화 결과가 비어 주문 불가
    QuantizationEmpty,
    /// 청산할 포지션 없음
    NoOpenPosition,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::NetFlat => "net_flat",
            SkipReason::QuantizationEmpty => "quantization_empty",
            SkipReason::NoOpenPosition => "no_open_position",
        };
        write!(f, "{s}")
    }
}

/// 종목 하나의 실행 결과.
#[derive(Debug)]
pub enum InstrumentOutcome {
    /// 주문 제출 완료 (부분 성공 포함)
    Completed(ExecutionResult),
    /// 실행 건너뜀
    Skipped(SkipReason),
    /// 실행 중단
    Aborted(EngineError),
}

/// 드레인 사이클에서 종목 하나에 대한 보고.
///
/// 실행 성공 여부와 무관하게 종목별로 항상 하나씩 발행됩니다.
#[derive(Debug)]
pub struct ExecutionReport {
    /// 종목
    pub instrument: String,
    /// 상쇄 후 순 의도
    pub net_intent: NetIntent,
    /// 이번 사이클에서 소비한 신호 개수
    pub signal_count: usize,
    /// 결과
    pub outcome: InstrumentOutcome,
    /// 보고 생성 시각
    pub finished_at: DateTime<Utc>,
}
