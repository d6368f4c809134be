//! 웹훅 수신 라우트.
//!
//! TradingView 알림 웹훅을 받아 검증하고 신호 큐에 적재합니다.
//! 적재에 성공하면 드레인을 트리거하고 즉시 응답합니다. 주문 실행을
//! 기다리지 않으므로 TradingView 타임아웃에 걸리지 않습니다.

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sigflow_core::{IntentKind, Signal};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

// ==================== Request/Response 타입 ====================

/// TradingView 웹훅 페이로드.
///
/// 필드 누락을 422가 아닌 400으로 돌려주기 위해 전부 Option으로 받고
/// 직접 검증합니다.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub symbol: Option<String>,
    pub alert: Option<String>,
    /// 숫자와 문자열 둘 다 허용
    pub price: Option<serde_json::Value>,
    pub key: Option<String>,
}

/// 웹훅 응답.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub message: String,
}

/// 헬스 체크 응답.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

type WebhookReply = (StatusCode, Json<WebhookResponse>);

fn accepted(message: String) -> WebhookReply {
    (
        StatusCode::OK,
        Json(WebhookResponse {
            status: "success",
            message,
        }),
    )
}

fn rejected(status: StatusCode, message: impl Into<String>) -> WebhookReply {
    (
        status,
        Json(WebhookResponse {
            status: "error",
            message: message.into(),
        }),
    )
}

// ==================== 페이로드 검증 ====================

/// 가격 필드 파싱. JSON 숫자와 문자열 표기를 모두 허용합니다.
fn parse_price(raw: &serde_json::Value) -> Option<Decimal> {
    match raw {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
        serde_json::Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// TradingView 심볼 정규화.
///
/// 공백을 제거하고 대문자로 바꾼 뒤 무기한 선물 접미사 `.P`를 뗍니다.
fn normalize_symbol(raw: &str) -> String {
    let mut symbol = raw.trim().to_uppercase();
    if let Some(stripped) = symbol.strip_suffix(".P") {
        symbol = stripped.to_string();
    }
    symbol
}

// ==================== API 핸들러 ====================

/// 웹훅 수신 핸들러.
///
/// 본문이 있으면 JSON으로, 없으면 쿼리 문자열로 파싱합니다 (수동 점검용
/// GET 경로). 검증 순서는 필드 존재, 가격, 인증 키, 알림 종류 순입니다.
pub async fn receive_webhook(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> WebhookReply {
    let payload: WebhookPayload = if !body.is_empty() {
        match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("웹훅 본문 파싱 실패: {}", e);
                return rejected(StatusCode::BAD_REQUEST, "invalid JSON payload");
            }
        }
    } else {
        match serde_urlencoded::from_str(query.as_deref().unwrap_or_default()) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("웹훅 쿼리 파싱 실패: {}", e);
                return rejected(StatusCode::BAD_REQUEST, "invalid query payload");
            }
        }
    };

    let Some(symbol) = payload
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return rejected(StatusCode::BAD_REQUEST, "missing or empty field: symbol");
    };
    let Some(alert) = payload
        .alert
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return rejected(StatusCode::BAD_REQUEST, "missing or empty field: alert");
    };
    let Some(key) = payload.key.as_deref().filter(|s| !s.is_empty()) else {
        return rejected(StatusCode::BAD_REQUEST, "missing or empty field: key");
    };
    let Some(raw_price) = payload.price.as_ref() else {
        return rejected(StatusCode::BAD_REQUEST, "missing field: price");
    };

    let Some(price) = parse_price(raw_price) else {
        return rejected(StatusCode::BAD_REQUEST, "invalid price");
    };
    if price <= Decimal::ZERO {
        return rejected(StatusCode::BAD_REQUEST, "price must be positive");
    }

    if key != state.alert_key {
        warn!("웹훅 인증 실패 (symbol={})", symbol);
        return rejected(StatusCode::FORBIDDEN, "invalid key");
    }

    let Some(intent) = IntentKind::parse(alert) else {
        return rejected(
            StatusCode::BAD_REQUEST,
            format!("unknown alert type: {alert}"),
        );
    };

    let instrument = normalize_symbol(symbol);
    let signal = Signal::new(instrument.clone(), intent, price);

    match state.store.enqueue(signal).await {
        Ok(true) => {
            info!("{}: {} 신호 적재 (가격 {})", instrument, intent, price);
            state.coordinator.trigger_drain();
            accepted(format!("{instrument} {intent} added"))
        }
        Ok(false) => {
            debug!("{}: {} 중복 신호 무시", instrument, intent);
            accepted("duplicate signal ignored".to_string())
        }
        Err(e) => {
            error!("{}: 신호 적재 실패: {}", instrument, e);
            rejected(StatusCode::INTERNAL_SERVER_ERROR, "signal store unavailable")
        }
    }
}

/// 헬스 체크 핸들러.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
    })
}

/// API 라우터 생성.
///
/// TradingView는 POST로 보내지만 수동 점검용으로 GET도 같은 핸들러에
/// 연결합니다.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(receive_webhook).get(receive_webhook))
        .route("/health", get(health))
}
