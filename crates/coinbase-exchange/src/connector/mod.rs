//! 거래소 커넥터.

pub mod coinbase;
pub mod order_state;
pub mod signer;

pub use coinbase::*;
pub use order_state::{lifecycle_state, translate, RawOrder};
pub use signer::*;

use coinbase_core::parse_exchange_decimal;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ExchangeError;
use crate::traits::ExchangeResult;

/// 필수 숫자 문자열 필드를 Decimal로 파싱합니다.
pub(crate) fn decimal_field(field: &str, raw: &str) -> ExchangeResult<Decimal> {
    parse_exchange_decimal(raw).ok_or_else(|| {
        ExchangeError::Parse(format!("field `{}` is not a decimal: {:?}", field, raw))
    })
}

/// 숫자 또는 숫자 문자열인 JSON 값을 Decimal로 파싱합니다.
pub(crate) fn decimal_value(field: &str, value: &Value) -> ExchangeResult<Decimal> {
    match value {
        Value::String(s) => decimal_field(field, s),
        Value::Number(n) => decimal_field(field, &n.to_string()),
        other => Err(ExchangeError::Parse(format!(
            "field `{}` is not a decimal: {}",
            field, other
        ))),
    }
}
