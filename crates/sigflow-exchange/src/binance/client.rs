//! Binance USDT-M 선물 REST 클라이언트.
//!
//! 서명(HMAC-SHA256)과 공개/서명 요청 공통 처리를 담당합니다.
//! 엔드포인트별 변환은 [`super::gateway`]에 있습니다.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use sigflow_core::GatewayError;

type HmacSha256 = Hmac<Sha256>;

/// 운영망 REST 엔드포인트.
const MAINNET_URL: &str = "https://fapi.binance.com";
/// 테스트넷 REST 엔드포인트.
const TESTNET_URL: &str = "https://testnet.binancefuture.com";
/// 서명 요청 유효 시간 (ms).
const RECV_WINDOW: u64 = 5000;
/// HTTP 요청 타임아웃.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// 설정
// ============================================================================

#[derive(Clone)]
pub struct BinanceConfig {
    pub api_key: SecretString,
    pub secret_key: SecretString,
    pub testnet: bool,
}

impl std::fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceConfig")
            .field("api_key", &"***")
            .field("secret_key", &"***")
            .field("testnet", &self.testnet)
            .finish()
    }
}

impl BinanceConfig {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>, testnet: bool) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            secret_key: SecretString::from(secret_key.into()),
            testnet,
        }
    }
}

// ============================================================================
// 에러 응답
// ============================================================================

/// Binance 에러 응답 본문.
#[derive(Debug, Deserialize)]
struct BinanceApiError {
    code: i64,
    msg: String,
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(err.to_string())
    } else {
        GatewayError::Network(err.to_string())
    }
}

// ============================================================================
// Binance 클라이언트
// ============================================================================

pub struct BinanceClient {
    client: Client,
    config: BinanceConfig,
    base_url: String,
}

impl BinanceClient {
    pub fn new(config: BinanceConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let base_url = if config.testnet {
            TESTNET_URL
        } else {
            MAINNET_URL
        }
        .to_string();

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// base URL 교체. 모의 서버 테스트에 사용합니다.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 특정 API 에러 코드인지 확인합니다.
    pub(crate) fn is_error_code(err: &GatewayError, code: i64) -> bool {
        matches!(err, GatewayError::Api(msg) if msg.starts_with(&format!("code {code}:")))
    }

    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn sign(&self, query: &str) -> Result<String, GatewayError> {
        let mut mac =
            HmacSha256::new_from_slice(self.config.secret_key.expose_secret().as_bytes())
                .map_err(|e| GatewayError::Authentication(e.to_string()))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// 공개 엔드포인트 요청 (서명 없음).
    pub(crate) async fn get_public<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::parse_response(response).await
    }

    /// 서명 엔드포인트 요청.
    ///
    /// timestamp와 recvWindow를 덧붙인 쿼리 문자열 전체를 서명합니다.
    pub(crate) async fn request_signed<T: for<'de> Deserialize<'de>>(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let mut params: Vec<(&str, String)> = params.to_vec();
        params.push(("timestamp", Self::timestamp_ms().to_string()));
        params.push(("recvWindow", RECV_WINDOW.to_string()));

        let query = serde_urlencoded::to_string(&params)
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        let signature = self.sign(&query)?;
        let url = format!(
            "{}{}?{}&signature={}",
            self.base_url, endpoint, query, signature
        );

        let response = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::parse_response(response).await
    }

    async fn parse_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            if let Ok(api_err) = serde_json::from_str::<BinanceApiError>(&text) {
                return Err(GatewayError::Api(format!(
                    "code {}: {}",
                    api_err.code, api_err.msg
                )));
            }
            return Err(GatewayError::Api(format!("HTTP {status}: {text}")));
        }

        serde_json::from_str::<T>(&text).map_err(|e| {
            GatewayError::Parse(format!(
                "Failed to parse Binance response: {e}. Body: {text}"
            ))
        })
    }
}
