//! 외부에서 유입되는 트레이딩 시그널.
//!
//! 이 모듈은 웹훅 수신 계층이 생성하고 실행 코디네이터가 소비하는
//! 시그널 관련 타입을 정의합니다:
//! - `IntentKind` - 시그널 의도 (롱/숏 진입, 롱/숏 청산)
//! - `Signal` - 큐에 적재되는 시그널 레코드

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 시그널이 요구하는 포지션 의도.
///
/// 직렬화 형식은 `open_long` 등 snake_case가 표준이며, 구버전 알림
/// 템플릿의 `long_open` 계열 표기도 역직렬화 시 허용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// 롱 포지션 진입
    #[serde(alias = "long_open")]
    OpenLong,
    /// 숏 포지션 진입
    #[serde(alias = "short_open")]
    OpenShort,
    /// 롱 포지션 청산
    #[serde(alias = "long_close")]
    CloseLong,
    /// 숏 포지션 청산
    #[serde(alias = "short_close")]
    CloseShort,
}

impl IntentKind {
    /// 문자열에서 의도를 파싱합니다 (대소문자 무시, 구버전 표기 허용).
    ///
    /// 웹훅 페이로드처럼 자유 형식 문자열을 받는 경로에서 사용합니다.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "open_long" | "long_open" => Some(Self::OpenLong),
            "open_short" | "short_open" => Some(Self::OpenShort),
            "close_long" | "long_close" => Some(Self::CloseLong),
            "close_short" | "short_close" => Some(Self::CloseShort),
            _ => None,
        }
    }

    /// 진입 의도 여부.
    pub fn is_open(self) -> bool {
        matches!(self, Self::OpenLong | Self::OpenShort)
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentKind::OpenLong => write!(f, "open_long"),
            IntentKind::OpenShort => write!(f, "open_short"),
            IntentKind::CloseLong => write!(f, "close_long"),
            IntentKind::CloseShort => write!(f, "close_short"),
        }
    }
}

/// 큐에 적재된 트레이딩 시그널.
///
/// 수신 계층이 생성하며, 실행 코디네이터가 드레인 사이클을 마친 뒤
/// `consumed` 플래그를 설정합니다. 소비된 시그널은 불변입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// 고유 시그널 ID
    pub id: Uuid,
    /// 대상 종목 (정규화된 심볼, 예: "BTCUSDT")
    pub instrument: String,
    /// 시그널 의도
    pub intent: IntentKind,
    /// 알림 발생 시점의 참조 가격 (감사용, 사이징에는 사용하지 않음)
    pub reference_price: Decimal,
    /// 수신 시각
    pub received_at: DateTime<Utc>,
    /// 소비 여부 (코디네이터만 설정)
    pub consumed: bool,
}

impl Signal {
    /// 새 시그널을 생성합니다.
    pub fn new(instrument: impl Into<String>, intent: IntentKind, reference_price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument: instrument.into(),
            intent,
            reference_price,
            received_at: Utc::now(),
            consumed: false,
        }
    }

    /// 수신 시각을 지정합니다 (보존 기간 테스트용).
    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_intent_parse_canonical() {
        assert_eq!(IntentKind::parse("open_long"), Some(IntentKind::OpenLong));
        assert_eq!(IntentKind::parse("close_short"), Some(IntentKind::CloseShort));
        assert_eq!(IntentKind::parse("  OPEN_SHORT "), Some(IntentKind::OpenShort));
    }

    #[test]
    fn test_intent_parse_legacy_aliases() {
        // 구버전 알림 템플릿 표기
        assert_eq!(IntentKind::parse("long_open"), Some(IntentKind::OpenLong));
        assert_eq!(IntentKind::parse("short_open"), Some(IntentKind::OpenShort));
        assert_eq!(IntentKind::parse("long_close"), Some(IntentKind::CloseLong));
        assert_eq!(IntentKind::parse("short_close"), Some(IntentKind::CloseShort));
    }

    #[test]
    fn test_intent_parse_invalid() {
        assert_eq!(IntentKind::parse("buy"), None);
        assert_eq!(IntentKind::parse(""), None);
        assert_eq!(IntentKind::parse("123"), None);
    }

    #[test]
    fn test_intent_serde_round_trip() {
        let json = serde_json::to_string(&IntentKind::OpenLong).unwrap();
        assert_eq!(json, "\"open_long\"");

        let legacy: IntentKind = serde_json::from_str("\"short_close\"").unwrap();
        assert_eq!(legacy, IntentKind::CloseShort);
    }

    #[test]
    fn test_signal_new() {
        let signal = Signal::new("BTCUSDT", IntentKind::OpenLong, dec!(65000));
        assert_eq!(signal.instrument, "BTCUSDT");
        assert_eq!(signal.intent, IntentKind::OpenLong);
        assert!(!signal.consumed);
    }
}
