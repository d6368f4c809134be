//! # sigflow-notification
//!
//! 실행 이벤트 알림 전송 라이브러리입니다.
//!
//! - `types`: 알림 이벤트/우선순위, [`NotificationSender`] trait, 관리자
//! - `telegram`: Telegram Bot API 전송기
//!
//! 전송은 항상 best-effort입니다. 알림 실패가 주문 흐름을 막지 않습니다.

pub mod telegram;
pub mod types;

// 주요 타입 재내보내기
pub use telegram::{TelegramConfig, TelegramSender};
pub use types::{
    Notification, NotificationError, NotificationEvent, NotificationManager,
    NotificationPriority, NotificationResult, NotificationSender,
};
