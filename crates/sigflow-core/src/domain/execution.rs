//! 주문 실행 도메인 타입.
//!
//! 포지션 방향/액션과 드레인 사이클의 중간·최종 산출물을 정의합니다:
//! - `Direction` / `Action` - 닫힌 열거형으로 표현한 방향과 액션
//! - `ExecutionIntent` - 사이징까지 끝난 일시적 실행 의도
//! - `ExecutionResult` - 청크 실행 결과 (부분 성공 포함)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::IntentKind;

/// 포지션 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// 롱 (상승 베팅)
    Long,
    /// 숏 (하락 베팅)
    Short,
}

impl Direction {
    /// 반대 방향을 반환합니다.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// 포지션에 대한 액션.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// 신규 진입
    Open,
    /// 기존 포지션 청산
    Close,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Open => write!(f, "OPEN"),
            Action::Close => write!(f, "CLOSE"),
        }
    }
}

impl IntentKind {
    /// 의도의 포지션 방향.
    pub fn direction(self) -> Direction {
        match self {
            IntentKind::OpenLong | IntentKind::CloseLong => Direction::Long,
            IntentKind::OpenShort | IntentKind::CloseShort => Direction::Short,
        }
    }

    /// 의도의 액션.
    pub fn action(self) -> Action {
        match self {
            IntentKind::OpenLong | IntentKind::OpenShort => Action::Open,
            IntentKind::CloseLong | IntentKind::CloseShort => Action::Close,
        }
    }
}

/// 드레인 사이클에서 도출된 실행 의도.
///
/// 넷팅과 사이징을 거친 뒤 양자화 직전의 상태를 담습니다.
/// 사이클 내부에서만 쓰이는 일시적 값이며 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionIntent {
    /// 대상 종목
    pub instrument: String,
    /// 포지션 방향
    pub direction: Direction,
    /// 진입/청산 구분
    pub action: Action,
    /// 원하는 수량 (양자화 전, 반올림되지 않은 값)
    pub desired_qty: Decimal,
    /// 적용 레버리지 (브래킷 클램프 후)
    pub leverage: u32,
}

/// 청크 실행 결과.
///
/// 부분 성공이 일급 결과입니다: `any_chunk_succeeded`가 true이면서
/// `executed_qty`가 요청 수량보다 작을 수 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// 하나 이상의 청크가 성공했는지 여부
    pub any_chunk_succeeded: bool,
    /// 제출하려던 총 수량
    pub requested_qty: Decimal,
    /// 실제 체결된 총 수량
    pub executed_qty: Decimal,
    /// 거부된 제출 횟수 (최초 시도와 축소 재시도 각각 집계)
    pub failed_chunks: u32,
}

impl ExecutionResult {
    /// 아무 것도 체결되지 않은 완전 실패 여부.
    pub fn is_total_failure(&self) -> bool {
        !self.any_chunk_succeeded && self.failed_chunks > 0
    }

    /// 요청 수량 대비 일부만 체결된 부분 성공 여부.
    pub fn is_partial(&self) -> bool {
        self.any_chunk_succeeded && self.executed_qty < self.requested_qty
    }
}
