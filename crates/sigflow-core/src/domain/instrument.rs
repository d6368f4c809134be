//! 종목(선물 계약)의 거래소 제약 조건.
//!
//! 거래소가 부과하는 수량/가격/레버리지 제약을 담습니다. 제약은 실행마다
//! 게이트웨이에서 새로 조회하며 (캐시 없음), 엔진은 읽기만 합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 마진 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    /// 격리 마진
    Isolated,
    /// 교차 마진
    Crossed,
}

impl MarginMode {
    /// 설정 문자열에서 파싱합니다 (대소문자 무시). 알 수 없는 값은 None.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "isolated" => Some(Self::Isolated),
            "crossed" | "cross" => Some(Self::Crossed),
            _ => None,
        }
    }

    /// 거래소 API가 기대하는 대문자 표기.
    pub fn as_api_str(self) -> &'static str {
        match self {
            MarginMode::Isolated => "ISOLATED",
            MarginMode::Crossed => "CROSSED",
        }
    }
}

impl std::fmt::Display for MarginMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_api_str())
    }
}

/// 종목별 거래소 제약 조건.
///
/// 일반 주문 제약(LOT_SIZE 계열)과 시장가 주문 전용 제약(MARKET_LOT_SIZE
/// 계열)을 모두 담습니다. 주문 계획 시에는 시장가 전용 값이 일반 값보다
/// 우선합니다 (`order_step` / `order_max` 참고).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConstraints {
    /// 기초 자산 (예: "BTC")
    pub base_asset: String,
    /// 견적 자산 (예: "USDT")
    pub quote_asset: String,
    /// 최소 주문 수량
    pub min_qty: Decimal,
    /// 최대 주문 수량 (없으면 무제한)
    pub max_qty: Option<Decimal>,
    /// 수량 스텝 (모든 수량은 이 값의 정수배)
    pub step_size: Decimal,
    /// 가격 틱 크기
    pub tick_size: Option<Decimal>,
    /// 최소 레버리지 (브래킷 조회 실패 시 None)
    pub min_leverage: Option<u32>,
    /// 최대 레버리지 (브래킷 조회 실패 시 None)
    pub max_leverage: Option<u32>,
    /// 시장가 주문당 최대 수량
    pub per_order_max_qty: Option<Decimal>,
    /// 시장가 주문 전용 수량 스텝
    pub per_order_step_size: Option<Decimal>,
}

impl InstrumentConstraints {
    /// 주문 계획에 사용할 수량 스텝.
    ///
    /// 시장가 전용 스텝이 있으면 그것을, 없으면 일반 스텝을 사용합니다.
    /// 이 우선순위가 전체 코드베이스의 유일한 규칙입니다.
    pub fn order_step(&self) -> Decimal {
        match self.per_order_step_size {
            Some(step) if step > Decimal::ZERO => step,
            _ => self.step_size,
        }
    }

    /// 주문당 최대 수량.
    ///
    /// 시장가 전용 최대치가 있으면 그것을, 없으면 일반 최대치를 사용합니다.
    pub fn order_max(&self) -> Option<Decimal> {
        match self.per_order_max_qty {
            Some(max) if max > Decimal::ZERO => Some(max),
            _ => self.max_qty,
        }
    }
}
