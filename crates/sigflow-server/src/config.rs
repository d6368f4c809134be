//! 환경변수 기반 설정 모듈.

use std::net::SocketAddr;

use sigflow_core::MarginMode;
use sigflow_engine::EngineConfig;

use crate::error::ServerError;
use crate::Result;

/// 서버 전체 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP 리스너 설정
    pub server: ListenConfig,
    /// 웹훅 인증 키
    pub alert_key: String,
    /// 거래소 게이트웨이 설정
    pub gateway: GatewayConfig,
    /// 주문 실행 설정
    pub order: EngineConfig,
}

/// HTTP 리스너 설정
#[derive(Debug, Clone)]
pub struct ListenConfig {
    /// 바인딩할 호스트 주소
    pub host: String,
    /// 바인딩할 포트
    pub port: u16,
}

impl ListenConfig {
    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `Config` 에러를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                ServerError::Config(format!(
                    "유효하지 않은 바인딩 주소 {}:{} ({})",
                    self.host, self.port, e
                ))
            })
    }
}

/// 게이트웨이 동작 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    /// 실거래 (Binance)
    Live,
    /// 모의 체결 (가상 게이트웨이)
    Mock,
}

impl GatewayMode {
    /// 문자열에서 모드를 파싱합니다.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "live" => Some(GatewayMode::Live),
            "mock" => Some(GatewayMode::Mock),
            _ => None,
        }
    }
}

/// 거래소 게이트웨이 설정
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 동작 모드
    pub mode: GatewayMode,
    /// Binance API 키
    pub api_key: String,
    /// Binance 시크릿 키
    pub secret_key: String,
    /// 테스트넷 사용 여부
    pub testnet: bool,
}

impl AppConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let alert_key = std::env::var("ALERT_KEY").map_err(|_| {
            ServerError::Config("ALERT_KEY 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let mode = match std::env::var("GATEWAY_MODE") {
            Ok(raw) => GatewayMode::parse(&raw).ok_or_else(|| {
                ServerError::Config(format!("유효하지 않은 GATEWAY_MODE: {}", raw))
            })?,
            Err(_) => GatewayMode::Live,
        };

        // 실거래 모드에서만 API 키를 요구한다
        let (api_key, secret_key) = if mode == GatewayMode::Live {
            let api_key = std::env::var("BINANCE_API_KEY").map_err(|_| {
                ServerError::Config("BINANCE_API_KEY 환경변수가 설정되지 않았습니다".to_string())
            })?;
            let secret_key = std::env::var("BINANCE_SECRET_KEY").map_err(|_| {
                ServerError::Config("BINANCE_SECRET_KEY 환경변수가 설정되지 않았습니다".to_string())
            })?;
            (api_key, secret_key)
        } else {
            (String::new(), String::new())
        };

        let margin_mode = match std::env::var("MARGIN_TYPE") {
            Ok(raw) => MarginMode::parse(&raw).ok_or_else(|| {
                ServerError::Config(format!("유효하지 않은 MARGIN_TYPE: {}", raw))
            })?,
            Err(_) => MarginMode::Isolated,
        };

        Ok(Self {
            server: ListenConfig {
                host: std::env::var("WEBHOOK_IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env_var_parse("WEBHOOK_PORT", 5001),
            },
            alert_key,
            gateway: GatewayConfig {
                mode,
                api_key,
                secret_key,
                testnet: env_var_bool("BINANCE_TESTNET", false),
            },
            order: EngineConfig {
                balance_percent: env_var_parse("ORDER_BALANCE_PERCENT", 100),
                leverage: env_var_parse("ORDER_LEVERAGE", 2),
                margin_mode,
                debounce_secs: env_var_parse("ORDER_DEBOUNCE_SECS", 10),
            },
        })
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
