//! 주문 타입 및 주문 생명주기.
//!
//! 이 모듈은 커넥터의 주문 관련 타입을 정의합니다:
//! - `Side` - 주문 방향 (매수/매도)
//! - `OrderState` - 정규화된 주문 생명주기 상태
//! - `LimitOrderRequest` - 지정가 주문 요청
//! - `OrderResult` - 거래소 주문 기록을 정규화한 결과

use crate::types::{Price, Quantity, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 주문 방향 (매수 또는 매도).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl Side {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// 거래소 전송 형식 (`buy` / `sell`).
    pub fn as_wire(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    /// 거래소 문자열에서 방향을 파싱합니다.
    pub fn from_wire(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("buy") {
            Some(Side::Buy)
        } else if raw.eq_ignore_ascii_case("sell") {
            Some(Side::Sell)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// 정규화된 주문 생명주기 상태.
///
/// 거래소의 상태 문자열은 일관성이 없으므로 이 닫힌 집합으로 변환됩니다.
/// 인식할 수 없는 상태는 에러가 아니라 `Unknown`으로 기록됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// 접수됨 (아직 체결 없음)
    Pending,
    /// 부분 체결됨
    PartiallyFilled,
    /// 전량 체결됨
    Filled,
    /// 취소됨
    Canceled,
    /// 알 수 없는 상태
    Unknown,
}

impl OrderState {
    /// 주문이 최종 상태인지 확인합니다.
    pub fn is_final(&self) -> bool {
        matches!(self, OrderState::Filled | OrderState::Canceled)
    }

    /// 주문이 여전히 활성 상태인지 확인합니다.
    pub fn is_active(&self) -> bool {
        matches!(self, OrderState::Pending | OrderState::PartiallyFilled)
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderState::Pending => "PENDING",
            OrderState::PartiallyFilled => "PARTIALLY_FILLED",
            OrderState::Filled => "FILLED",
            OrderState::Canceled => "CANCELED",
            OrderState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// 새 지정가 주문 요청.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderRequest {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 주문 방향
    pub side: Side,
    /// 주문 수량
    pub amount: Quantity,
    /// 지정가
    pub price: Price,
}

impl LimitOrderRequest {
    /// 지정가 매수 주문을 생성합니다.
    pub fn limit_buy(symbol: Symbol, amount: Quantity, price: Price) -> Self {
        Self {
            symbol,
            side: Side::Buy,
            amount,
            price,
        }
    }

    /// 지정가 매도 주문을 생성합니다.
    pub fn limit_sell(symbol: Symbol, amount: Quantity, price: Price) -> Self {
        Self {
            symbol,
            side: Side::Sell,
            amount,
            price,
        }
    }

    /// 주문의 명목 가치를 계산합니다.
    pub fn notional_value(&self) -> Decimal {
        self.price * self.amount
    }
}

/// 거래소 주문 기록을 정규화한 결과.
///
/// `filled_amount <= requested_amount`는 기대되지만 이 계층에서 강제하지 않습니다.
/// 거래소가 진실의 원천입니다.
///
/// 금액(`funds`)으로 낸 시장가 주문은 기준 통화 요청 수량이 없으므로
/// `requested_amount`가 `None`이고 호가 통화 금액은 `funds`에 담깁니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    /// 거래소 주문 ID
    pub order_id: String,
    /// 거래 심볼 (거래소 상품 ID)
    pub symbol: String,
    /// 주문 방향
    pub side: Side,
    /// 요청 수량 (기준 통화, 수량 지정 주문만)
    pub requested_amount: Option<Quantity>,
    /// 요청 금액 (호가 통화, 금액 지정 시장가 주문만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funds: Option<Decimal>,
    /// 체결된 수량
    pub filled_amount: Quantity,
    /// 평균 체결 가격
    pub average_price: Price,
    /// 지정가 (시장가 주문은 없음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Price>,
    /// 누적 수수료
    pub fees: Decimal,
    /// 주문 생성 시각
    pub created_at: DateTime<Utc>,
    /// 정규화된 생명주기 상태
    pub state: OrderState,
    /// 종료 사유 (`filled`, `canceled` 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
}

impl OrderResult {
    /// 남은 체결 수량을 반환합니다. 요청 수량이 없는 주문은 `None`.
    pub fn remaining_amount(&self) -> Option<Quantity> {
        self.requested_amount.map(|requested| requested - self.filled_amount)
    }

    /// 주문이 전량 체결되었는지 확인합니다.
    pub fn is_filled(&self) -> bool {
        self.state == OrderState::Filled
    }
}
