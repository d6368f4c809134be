//! 주문 수량 양자화.
//!
//! 희망 수량을 거래소 제약(스텝, 최소/최대 수량)에 맞는 유효 수량으로
//! 변환합니다. 수량 반올림은 항상 내림(ROUND_DOWN)이며, 거래소가
//! 거부할 수량은 이 단계에서 걸러집니다.

use rust_decimal::Decimal;
use sigflow_core::InstrumentConstraints;

/// 수량을 스텝의 정수배로 내림합니다.
///
/// 스텝이 0 이하이면 수량을 그대로 반환합니다.
pub fn floor_to_step(qty: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return qty;
    }
    (qty / step).floor() * step
}

/// 희망 수량을 거래소가 수락하는 유효 수량으로 변환합니다.
///
/// 순서는 고정입니다: 최대 수량으로 자르고, 최소 수량으로 올리고,
/// 스텝에 맞춰 내린 뒤, 최대/최소를 한 번 더 적용합니다. 최대 수량
/// 자체도 스텝에 맞춰 내린 값을 사용합니다.
///
/// # Returns
///
/// 유효 수량. 양의 수량을 만들 수 없으면 `None`.
pub fn quantize(desired: Decimal, constraints: &InstrumentConstraints) -> Option<Decimal> {
    if desired <= Decimal::ZERO {
        return None;
    }
    let step = constraints.step_size;
    let min_qty = constraints.min_qty;

    // 스텝에 맞춘 유효 최대 수량
    let max_effective = constraints
        .max_qty
        .filter(|m| *m > Decimal::ZERO)
        .map(|m| floor_to_step(m, step));

    let mut qty = desired;
    if let Some(max) = max_effective {
        qty = qty.min(max);
    }
    if qty < min_qty {
        qty = min_qty;
    }
    qty = floor_to_step(qty, step);
    if let Some(max) = max_effective {
        qty = qty.min(max);
    }
    if qty < min_qty {
        qty = min_qty;
    }

    if qty <= Decimal::ZERO {
        return None;
    }
    Some(qty.normalize())
}

/// 희망 레버리지를 종목 허용 범위로 보정합니다.
///
/// 레버리지 범위를 모르는 경우(어느 한쪽이라도 None) 희망값을 그대로
/// 반환합니다.
pub fn quantize_leverage(desired: u32, constraints: &InstrumentConstraints) -> u32 {
    match (constraints.min_leverage, constraints.max_leverage) {
        (Some(min), Some(max)) if min <= max => desired.clamp(min, max),
        _ => desired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn constraints(min: Decimal, max: Option<Decimal>, step: Decimal) -> InstrumentConstraints {
        InstrumentConstraints {
            base_asset: "BTC".to_string(),
            quote_asset: "USDT".to_string(),
            min_qty: min,
            max_qty: max,
            step_size: step,
            tick_size: None,
            min_leverage: Some(1),
            max_leverage: Some(125),
            per_order_max_qty: None,
            per_order_step_size: None,
        }
    }

    #[test]
    fn test_floor_to_step() {
        assert_eq!(floor_to_step(dec!(1.2345), dec!(0.001)), dec!(1.234));
        assert_eq!(floor_to_step(dec!(25), dec!(0.001)), dec!(25.000));
        assert_eq!(floor_to_step(dec!(0.0005), dec!(0.001)), dec!(0));
        // 스텝이 없으면 그대로 통과
        assert_eq!(floor_to_step(dec!(1.2345), Decimal::ZERO), dec!(1.2345));
    }

    #[test]
    fn test_quantize_rounds_down_to_step() {
        let c = constraints(dec!(0.001), Some(dec!(1000)), dec!(0.001));
        assert_eq!(quantize(dec!(1.23456), &c), Some(dec!(1.234)));
    }

    #[test]
    fn test_quantize_lifts_to_min() {
        // 최소 수량 미만은 최소 수량으로 올림
        let c = constraints(dec!(0.001), Some(dec!(1000)), dec!(0.001));
        assert_eq!(quantize(dec!(0.0005), &c), Some(dec!(0.001)));
    }

    #[test]
    fn test_quantize_clamps_to_max() {
        let c = constraints(dec!(0.001), Some(dec!(100)), dec!(0.001));
        assert_eq!(quantize(dec!(250), &c), Some(dec!(100)));
    }

    #[test]
    fn test_quantize_max_floored_to_step() {
        // 최대 수량이 스텝의 배수가 아니면 내린 값이 상한
        let c = constraints(dec!(1), Some(dec!(10.5)), dec!(1));
        assert_eq!(quantize(dec!(99), &c), Some(dec!(10)));
    }

    #[test]
    fn test_quantize_empty_when_unachievable() {
        let c = constraints(Decimal::ZERO, Some(dec!(100)), dec!(0.001));
        assert_eq!(quantize(dec!(0.0004), &c), None);
        assert_eq!(quantize(Decimal::ZERO, &c), None);
        assert_eq!(quantize(dec!(-1), &c), None);
    }

    #[test]
    fn test_quantize_without_max() {
        let c = constraints(dec!(0.001), None, dec!(0.001));
        assert_eq!(quantize(dec!(123456.789999), &c), Some(dec!(123456.789)));
    }

    #[test]
    fn test_quantize_leverage() {
        let c = constraints(dec!(0.001), Some(dec!(1000)), dec!(0.001));
        assert_eq!(quantize_leverage(2, &c), 2);
        assert_eq!(quantize_leverage(200, &c), 125);
        assert_eq!(quantize_leverage(0, &c), 1);

        // 범위를 모르면 그대로 통과
        let mut c = c;
        c.max_leverage = None;
        assert_eq!(quantize_leverage(200, &c), 200);
    }

    proptest! {
        /// 양자화는 멱등: 결과를 다시 양자화해도 같은 값.
        #[test]
        fn quantize_is_idempotent(
            mantissa in 1u64..10_000_000,
            min_steps in 1u32..100,
            max_steps in 1_000u32..1_000_000,
        ) {
            let step = dec!(0.001);
            let c = constraints(
                Decimal::from(min_steps) * step,
                Some(Decimal::from(max_steps) * step),
                step,
            );
            let desired = Decimal::new(mantissa as i64, 4);

            if let Some(first) = quantize(desired, &c) {
                prop_assert_eq!(quantize(first, &c), Some(first));
            }
        }

        /// 결과는 항상 [최소, 유효 최대] 범위 안의 스텝 배수.
        #[test]
        fn quantize_is_bounded(
            mantissa in 1u64..10_000_000,
            min_steps in 1u32..100,
            max_steps in 1_000u32..1_000_000,
        ) {
            let step = dec!(0.001);
            let min_qty = Decimal::from(min_steps) * step;
            let max_qty = Decimal::from(max_steps) * step;
            let c = constraints(min_qty, Some(max_qty), step);
            let desired = Decimal::new(mantissa as i64, 4);

            if let Some(q) = quantize(desired, &c) {
                prop_assert!(q >= min_qty);
                prop_assert!(q <= max_qty);
                prop_assert_eq!((q / step) % Decimal::ONE, Decimal::ZERO);
            }
        }
    }
}
