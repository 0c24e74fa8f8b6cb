//! 거래소 주문 기록 → 정규화된 `OrderResult` 변환.
//!
//! 거래소의 `open`/`active` 상태는 실제로 전량 또는 부분 체결되었지만 아직
//! 정산되지 않은 주문에도 재사용됩니다. 그래서 상태 문자열을 먼저 보고,
//! 모호한 상태에 대해서만 요청 수량과 체결 수량을 교차 확인합니다.
//! 금액(`funds`)으로 낸 주문은 기준 통화 요청 수량이 없으므로 체결 여부만 봅니다.

use chrono::{DateTime, Utc};
use coinbase_core::{OrderResult, OrderState, Side};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use super::decimal_field;
use crate::error::ExchangeError;
use crate::traits::ExchangeResult;

/// 거래소 주문 응답 (`/orders`, `/orders/{id}`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrder {
    pub id: String,
    pub product_id: String,
    pub side: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub funds: Option<String>,
    #[serde(default)]
    pub filled_size: Option<String>,
    #[serde(default)]
    pub executed_value: Option<String>,
    #[serde(default)]
    pub fill_fees: Option<String>,
    #[serde(default)]
    pub done_reason: Option<String>,
}

/// 상태 문자열과 수량으로 생명주기 상태를 결정합니다.
///
/// `requested`는 기준 통화 요청 수량입니다. 없으면 전량 체결 판정을 하지 않습니다.
pub fn lifecycle_state(status: &str, requested: Option<Decimal>, filled: Decimal) -> OrderState {
    match status.to_ascii_lowercase().as_str() {
        "pending" => OrderState::Pending,
        "active" | "open" => {
            if requested == Some(filled) {
                OrderState::Filled
            } else if filled > Decimal::ZERO {
                OrderState::PartiallyFilled
            } else {
                OrderState::Pending
            }
        }
        "done" | "settled" => OrderState::Filled,
        "cancelled" | "canceled" => OrderState::Canceled,
        _ => OrderState::Unknown,
    }
}

/// 거래소 주문 기록을 변환합니다.
///
/// 인식할 수 없는 상태는 `OrderState::Unknown`으로 기록하고 성공합니다.
/// 숫자 필드가 파싱되지 않으면 `ExchangeError::Parse`를 반환합니다.
pub fn translate(raw: &RawOrder) -> ExchangeResult<OrderResult> {
    let side = Side::from_wire(&raw.side)
        .ok_or_else(|| ExchangeError::Parse(format!("unknown order side: {}", raw.side)))?;

    let requested = optional_decimal("size", raw.size.as_deref())?;
    let funds = optional_decimal("funds", raw.funds.as_deref())?;
    let filled = optional_decimal("filled_size", raw.filled_size.as_deref())?.unwrap_or(Decimal::ZERO);
    let executed_value = optional_decimal("executed_value", raw.executed_value.as_deref())?;
    let limit_price = optional_decimal("price", raw.price.as_deref())?;
    let fees = optional_decimal("fill_fees", raw.fill_fees.as_deref())?.unwrap_or(Decimal::ZERO);

    let average_price = match executed_value {
        Some(value) if filled > Decimal::ZERO => value / filled,
        _ => limit_price.unwrap_or(Decimal::ZERO),
    };

    let state = lifecycle_state(&raw.status, requested, filled);
    if state == OrderState::Unknown {
        warn!(order_id = %raw.id, status = %raw.status, "Unrecognized order status");
    }

    Ok(OrderResult {
        order_id: raw.id.clone(),
        symbol: raw.product_id.clone(),
        side,
        requested_amount: requested,
        funds,
        filled_amount: filled,
        average_price,
        limit_price,
        fees,
        created_at: raw.created_at,
        state,
        done_reason: raw.done_reason.clone(),
    })
}

fn optional_decimal(field: &str, raw: Option<&str>) -> ExchangeResult<Option<Decimal>> {
    raw.map(|value| decimal_field(field, value)).transpose()
}
