//! 실행 엔진 설정.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sigflow_core::MarginMode;

/// 실행 엔진 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 진입 시 사용할 견적 자산 잔고 비율 (1~100)
    #[serde(default = "default_balance_percent")]
    pub balance_percent: u32,
    /// 진입 레버리지 (종목 허용 범위로 보정됨)
    #[serde(default = "default_leverage")]
    pub leverage: u32,
    /// 마진 모드
    #[serde(default = "default_margin_mode")]
    pub margin_mode: MarginMode,
    /// 드레인 시작 전 디바운스 대기 시간 (초)
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,
}

fn default_balance_percent() -> u32 {
    100
}

fn default_leverage() -> u32 {
    2
}

fn default_margin_mode() -> MarginMode {
    MarginMode::Isolated
}

fn default_debounce_secs() -> u64 {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            balance_percent: default_balance_percent(),
            leverage: default_leverage(),
            margin_mode: default_margin_mode(),
            debounce_secs: default_debounce_secs(),
        }
    }
}

impl EngineConfig {
    /// 디바운스 대기 시간.
    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }
}
