//! 시장 데이터 타입 및 구조체.
//!
//! 이 모듈은 시장 데이터 관련 타입을 정의합니다:
//! - `Ticker` - 시세 스냅샷
//! - `OrderBook` - 호가창 스냅샷
//! - `Trade` - 체결 기록

use crate::domain::order::Side;
use crate::types::{Price, Quantity, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 시세 스냅샷.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 최우선 매수 호가
    pub bid: Price,
    /// 최우선 매도 호가
    pub ask: Price,
    /// 최근 체결가
    pub last: Price,
    /// 24시간 거래량 (기준 자산 단위)
    pub volume: Quantity,
    /// 거래소 기준 시각
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    /// 매수/매도 스프레드를 반환합니다.
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// 중간 가격을 반환합니다.
    pub fn mid_price(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::from(2)
    }
}

/// 호가창 가격 레벨.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    /// 가격
    pub price: Price,
    /// 수량
    pub amount: Quantity,
}

/// 호가창 스냅샷.
///
/// 증분 업데이트 모델은 없습니다. 조회할 때마다 전체 스냅샷입니다.
/// 레벨 순서는 거래소가 준 그대로 유지됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 매수 호가 - 가격 내림차순
    pub bids: Vec<OrderBookLevel>,
    /// 매도 호가 - 가격 오름차순
    pub asks: Vec<OrderBookLevel>,
    /// 거래소 시퀀스 번호
    pub sequence: i64,
    /// 조회 시각
    pub timestamp: DateTime<Utc>,
}

impl OrderBook {
    /// 최우선 매수 호가를 반환합니다.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    /// 최우선 매도 호가를 반환합니다.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    /// 스프레드를 반환합니다.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// 중간 가격을 반환합니다.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }
}

/// 체결 기록.
///
/// 정렬 키는 `timestamp` 오름차순이며, 같은 시각은 원래 페이지의 순서를 따릅니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// 거래소 체결 ID (엔드포인트가 제공하지 않으면 0)
    pub id: i64,
    /// 가격
    pub price: Price,
    /// 수량
    pub amount: Quantity,
    /// 체결 시각
    pub timestamp: DateTime<Utc>,
    /// 메이커가 매수 측인지 여부
    pub is_buyer_maker: bool,
}

impl Trade {
    /// 테이커 방향을 반환합니다.
    pub fn taker_side(&self) -> Side {
        if self.is_buyer_maker {
            Side::Sell
        } else {
            Side::Buy
        }
    }

    /// 체결 금액(가격 × 수량)을 반환합니다.
    pub fn notional(&self) -> Decimal {
        self.price * self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_book() {
        let ob = OrderBook {
            symbol: Symbol::new("ETH", "USD"),
            bids: vec![
                OrderBookLevel { price: dec!(2000), amount: dec!(10) },
                OrderBookLevel { price: dec!(1999), amount: dec!(20) },
            ],
            asks: vec![
                OrderBookLevel { price: dec!(2001), amount: dec!(15) },
                OrderBookLevel { price: dec!(2002), amount: dec!(25) },
            ],
            sequence: 42,
            timestamp: Utc::now(),
        };

        assert_eq!(ob.best_bid(), Some(dec!(2000)));
        assert_eq!(ob.best_ask(), Some(dec!(2001)));
        assert_eq!(ob.spread(), Some(dec!(1)));
        assert_eq!(ob.mid_price(), Some(dec!(2000.5)));
    }

    #[test]
    fn test_trade_taker_side() {
        let trade = Trade {
            id: 7,
            price: dec!(100),
            amount: dec!(0.5),
            timestamp: Utc::now(),
            is_buyer_maker: true,
        };

        assert_eq!(trade.taker_side(), Side::Sell);
        assert_eq!(trade.notional(), dec!(50));
    }
}
