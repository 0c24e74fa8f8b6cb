//! 정밀한 금융 계산을 위한 Decimal 유틸리티.

use rust_decimal::Decimal;
use std::str::FromStr;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 주문/체결 수량을 위한 타입.
pub type Quantity = Decimal;

/// 거래소가 내려주는 숫자 문자열을 Decimal로 파싱합니다.
///
/// 일반 표기(`"0.00012"`)와 지수 표기(`"1.2e-4"`)를 모두 허용합니다.
/// 빈 문자열이나 숫자가 아닌 값은 `None`을 반환합니다.
pub fn parse_exchange_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_plain_and_scientific() {
        assert_eq!(parse_exchange_decimal("2.0"), Some(dec!(2.0)));
        assert_eq!(parse_exchange_decimal(" 0.5 "), Some(dec!(0.5)));
        assert_eq!(parse_exchange_decimal("1.5e-3"), Some(dec!(0.0015)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_exchange_decimal(""), None);
        assert_eq!(parse_exchange_decimal("abc"), None);
        assert_eq!(parse_exchange_decimal("1,5"), None);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn plain_notation_round_trips(mantissa in any::<i64>(), scale in 0u32..=18) {
                let value = Decimal::new(mantissa, scale);
                prop_assert_eq!(parse_exchange_decimal(&value.to_string()), Some(value));
            }

            #[test]
            fn surrounding_whitespace_is_ignored(mantissa in any::<i32>(), scale in 0u32..=8) {
                let value = Decimal::new(mantissa as i64, scale);
                let padded = format!("  {}\t", value);
                prop_assert_eq!(parse_exchange_decimal(&padded), Some(value));
            }

            #[test]
            fn comma_separator_is_rejected(whole in 0u32..100_000, frac in 0u32..1_000) {
                let raw = format!("{},{}", whole, frac);
                prop_assert_eq!(parse_exchange_decimal(&raw), None);
            }
        }
    }
}
