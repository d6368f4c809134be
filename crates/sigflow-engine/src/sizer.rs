//! 포지션 크기 계산.
//!
//! 견적 자산 잔고와 레버리지를 기반으로 진입 주문의 희망 수량을
//! 계산합니다. 계산에는 웹훅이 전달한 참고 가격이 아니라 실행 시점에
//! 조회한 시장가를 사용합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;

/// 주문을 시도하기 위한 최소 견적 자산 잔고.
pub const MIN_QUOTE_BALANCE: Decimal = dec!(10);

/// 진입 주문의 희망 수량 계산.
///
/// 잔고의 지정 비율에 레버리지를 곱한 명목 금액을 시장가로 나눕니다.
/// 비율은 [1, 100] 범위로 보정하고, 레버리지는 최소 1로 보정합니다.
///
/// # Errors
///
/// - `EngineError::InvalidPrice`: 가격이 0 이하
/// - `EngineError::InsufficientFunds`: 잔고가 [`MIN_QUOTE_BALANCE`] 미만
pub fn size_position(
    quote_balance: Decimal,
    balance_percent: u32,
    leverage: u32,
    price: Decimal,
) -> Result<Decimal, EngineError> {
    if price <= Decimal::ZERO {
        return Err(EngineError::InvalidPrice { price });
    }
    if quote_balance < MIN_QUOTE_BALANCE {
        return Err(EngineError::InsufficientFunds {
            required: MIN_QUOTE_BALANCE,
            available: quote_balance,
        });
    }

    let percent = balance_percent.clamp(1, 100);
    let use_amount = quote_balance * Decimal::from(percent) / dec!(100);
    let notional = use_amount * Decimal::from(leverage.max(1));
    Ok(notional / price)
}
