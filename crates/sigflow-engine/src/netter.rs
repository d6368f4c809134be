//! 중첩 신호 상쇄.
//!
//! 디바운스 동안 쌓인 한 종목의 신호 묶음을 단일 순 의도로 줄입니다.
//! 진입 신호는 +1, 청산 신호는 -1로 점수를 매겨 롱/숏 점수를 만들고,
//! 두 점수가 같으면 서로 상쇄된 것으로 보아 아무것도 실행하지 않습니다.

use sigflow_core::{Action, Direction, IntentKind, Signal};

/// 상쇄 후 남는 순 의도.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetIntent {
    /// 롱 진입
    OpenLong,
    /// 숏 진입
    OpenShort,
    /// 롱 청산
    CloseLong,
    /// 숏 청산
    CloseShort,
    /// 실행 없음 (신호가 서로 상쇄됨)
    None,
}

impl NetIntent {
    /// 실행할 방향과 동작.
    ///
    /// `None` 의도는 실행할 것이 없으므로 `Option::None`을 반환합니다.
    pub fn directive(self) -> Option<(Direction, Action)> {
        match self {
            NetIntent::OpenLong => Some((Direction::Long, Action::Open)),
            NetIntent::OpenShort => Some((Direction::Short, Action::Open)),
            NetIntent::CloseLong => Some((Direction::Long, Action::Close)),
            NetIntent::CloseShort => Some((Direction::Short, Action::Close)),
            NetIntent::None => None,
        }
    }
}

impl std::fmt::Display for NetIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NetIntent::OpenLong => "open_long",
            NetIntent::OpenShort => "open_short",
            NetIntent::CloseLong => "close_long",
            NetIntent::CloseShort => "close_short",
            NetIntent::None => "none",
        };
        write!(f, "{s}")
    }
}

/// 신호 묶음을 단일 순 의도로 상쇄합니다.
///
/// 우선순위는 진입이 청산보다 먼저, 롱이 숏보다 먼저입니다.
pub fn net(signals: &[Signal]) -> NetIntent {
    let mut long_score = 0i32;
    let mut short_score = 0i32;
    for signal in signals {
        match signal.intent {
            IntentKind::OpenLong => long_score += 1,
            IntentKind::CloseLong => long_score -= 1,
            IntentKind::OpenShort => short_score += 1,
            IntentKind::CloseShort => short_score -= 1,
        }
    }

    if long_score == short_score {
        return NetIntent::None;
    }
    if long_score > 0 {
        NetIntent::OpenLong
    } else if short_score > 0 {
        NetIntent::OpenShort
    } else if long_score < 0 {
        NetIntent::CloseLong
    } else if short_score < 0 {
        NetIntent::CloseShort
    } else {
        NetIntent::None
    }
}
