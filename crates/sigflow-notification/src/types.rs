//! 알림 공통 타입.
//!
//! 알림 이벤트, 우선순위, 전송기 trait, 전송기 관리자를 정의합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sigflow_core::{Action, Direction};
use tracing::{debug, warn};

/// 알림 결과 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 전송 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// 네트워크 오류
    #[error("네트워크 오류: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// 요청 한도 초과 (재시도 대기 초)
    #[error("요청 한도 초과: {0}초 후 재시도")]
    RateLimited(u64),

    /// 전송 실패
    #[error("전송 실패: {0}")]
    SendFailed(String),
}

/// 알림 우선순위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Critical,
}

/// 알림 이벤트.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// 주문 실행 완료 (부분 체결 포함)
    OrderExecuted {
        instrument: String,
        direction: Direction,
        action: Action,
        executed_qty: Decimal,
        requested_qty: Decimal,
        failed_chunks: u32,
    },
    /// 주문 실행 실패
    ExecutionFailed { instrument: String, reason: String },
    /// 시스템 오류
    SystemError { message: String },
    /// 임의 메시지
    Custom { title: String, message: String },
}

impl NotificationEvent {
    /// 이벤트별 기본 우선순위.
    pub fn default_priority(&self) -> NotificationPriority {
        match self {
            NotificationEvent::OrderExecuted { .. } => NotificationPriority::Normal,
            NotificationEvent::ExecutionFailed { .. } => NotificationPriority::High,
            NotificationEvent::SystemError { .. } => NotificationPriority::Critical,
            NotificationEvent::Custom { .. } => NotificationPriority::Normal,
        }
    }
}

/// 전송 대상 알림.
#[derive(Debug, Clone)]
pub struct Notification {
    pub event: NotificationEvent,
    pub priority: NotificationPriority,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// 이벤트 기본 우선순위로 알림을 생성합니다.
    pub fn new(event: NotificationEvent) -> Self {
        let priority = event.default_priority();
        Self {
            event,
            priority,
            timestamp: Utc::now(),
        }
    }

    /// 우선순위를 지정합니다.
    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// 알림 전송기 trait.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 알림을 전송합니다.
    async fn send(&self, notification: &Notification) -> NotificationResult<()>;

    /// 전송기 활성화 여부.
    fn is_enabled(&self) -> bool;

    /// 전송기 이름.
    fn name(&self) -> &str;
}

/// 알림 전송기 관리자.
///
/// 등록된 전송기 전부에 알림을 전달합니다. 개별 전송 실패는 로그만
/// 남기고 다음 전송기로 넘어갑니다.
#[derive(Default)]
pub struct NotificationManager {
    senders: Vec<Box<dyn NotificationSender>>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 전송기를 등록합니다.
    pub fn add_sender(&mut self, sender: Box<dyn NotificationSender>) {
        self.senders.push(sender);
    }

    /// 등록된 전송기 수.
    pub fn sender_count(&self) -> usize {
        self.senders.len()
    }

    /// 모든 활성 전송기로 알림을 전송합니다.
    pub async fn notify(&self, notification: &Notification) {
        for sender in &self.senders {
            if !sender.is_enabled() {
                continue;
            }
            match sender.send(notification).await {
                Ok(()) => debug!("{} 알림 전송 완료", sender.name()),
                Err(e) => warn!("{} 알림 전송 실패: {}", sender.name(), e),
            }
        }
    }

    /// 이벤트를 기본 우선순위 알림으로 전송합니다.
    pub async fn notify_event(&self, event: NotificationEvent) {
        self.notify(&Notification::new(event)).await;
    }
}
