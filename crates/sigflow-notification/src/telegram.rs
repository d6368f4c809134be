//! Telegram 알림 서비스.
//!
//! Telegram Bot API를 통해 주문 실행 결과와 시스템 알림을 전송합니다.

use crate::types::{
    Notification, NotificationError, NotificationEvent, NotificationResult, NotificationSender,
};
use async_trait::async_trait;
use serde_json::json;
use sigflow_core::{Action, Direction};
use tracing::{debug, error, info, warn};

/// Telegram 알림 전송 설정.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API 토큰
    pub bot_token: String,
    /// 수신 채팅 ID
    pub chat_id: String,
    /// 전송 활성화 여부
    pub enabled: bool,
}

impl TelegramConfig {
    /// 새 Telegram 설정을 생성합니다.
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            enabled: true,
        }
    }

    /// 환경 변수에서 설정을 생성합니다.
    ///
    /// `TELEGRAM_BOT_TOKEN`, `TELEGRAM_USER_ID`가 모두 있어야 합니다.
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_USER_ID").ok()?;
        let enabled = std::env::var("TELEGRAM_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);

        Some(Self {
            bot_token,
            chat_id,
            enabled,
        })
    }
}

/// Telegram HTML parse_mode용 이스케이프.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// 방향과 동작을 한국어 표기로 변환합니다.
fn describe_directive(direction: Direction, action: Action) -> &'static str {
    match (direction, action) {
        (Direction::Long, Action::Open) => "롱 진입",
        (Direction::Long, Action::Close) => "롱 청산",
        (Direction::Short, Action::Open) => "숏 진입",
        (Direction::Short, Action::Close) => "숏 청산",
    }
}

/// Telegram 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramSender {
    /// 새 Telegram 전송기를 생성합니다.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 환경 변수에서 전송기를 생성합니다.
    pub fn from_env() -> Option<Self> {
        TelegramConfig::from_env().map(Self::new)
    }

    /// 알림을 Telegram HTML 메시지로 포맷합니다.
    fn format_message(&self, notification: &Notification) -> String {
        match &notification.event {
            NotificationEvent::OrderExecuted {
                instrument,
                direction,
                action,
                executed_qty,
                requested_qty,
                failed_chunks,
            } => {
                let full = executed_qty == requested_qty && *failed_chunks == 0;
                let title = if full {
                    "✅ 주문 체결"
                } else {
                    "⚠️ 부분 체결"
                };
                let mut message = format!(
                    "<b>{}</b>\n종목: <code>{}</code>\n주문: {}",
                    title,
                    instrument,
                    describe_directive(*direction, *action)
                );
                if full {
                    message.push_str(&format!("\n수량: {}", executed_qty));
                } else {
                    message.push_str(&format!("\n수량: {}/{}", executed_qty, requested_qty));
                }
                if *failed_chunks > 0 {
                    message.push_str(&format!("\n실패 청크: {}", failed_chunks));
                }
                message
            }

            NotificationEvent::ExecutionFailed { instrument, reason } => {
                format!(
                    "<b>❌ 주문 실패</b>\n종목: <code>{}</code>\n사유: {}",
                    instrument,
                    escape_html(reason)
                )
            }

            NotificationEvent::SystemError { message } => {
                format!("<b>🚨 시스템 오류</b>\n{}", escape_html(message))
            }

            NotificationEvent::Custom { title, message } => {
                format!("<b>{}</b>\n{}", escape_html(title), escape_html(message))
            }
        }
    }

    /// Bot API sendMessage를 호출합니다.
    async fn send_message(&self, text: String) -> NotificationResult<()> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.config.bot_token
        );
        let payload = json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        debug!("Sending Telegram message");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(NotificationError::NetworkError)?;

        if response.status().is_success() {
            info!("Telegram 알림 전송 완료");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                warn!("Telegram rate limited");
                return Err(NotificationError::RateLimited(60));
            }

            error!("Telegram 전송 실패: {} - {}", status, body);
            Err(NotificationError::SendFailed(format!(
                "HTTP {}: {}",
                status, body
            )))
        }
    }

    /// 테스트 메시지를 전송합니다.
    pub async fn send_test(&self) -> NotificationResult<()> {
        let text = "<b>✓ Telegram 알림 설정 완료</b>\n실행 알림을 이 채팅으로 받습니다."
            .to_string();
        self.send_message(text).await
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        if !self.is_enabled() {
            debug!("Telegram 알림이 비활성화되어 있습니다");
            return Ok(());
        }

        let text = self.format_message(notification);
        self.send_message(text).await
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty() && !self.config.chat_id.is_empty()
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
