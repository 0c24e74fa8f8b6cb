//! 거래소 trait 정의.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coinbase_core::{LimitOrderRequest, OrderBook, OrderResult, Symbol, Ticker, Trade};
use futures::stream::BoxStream;
use rust_decimal::Decimal;

use crate::ExchangeError;

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 통합 거래소 인터페이스.
///
/// 모든 작업은 `&mut self`를 받습니다. 응답마다 페이지 커서를 갱신하므로
/// 한 인스턴스에 대한 호출은 동시에 하나만 진행됩니다.
#[async_trait]
pub trait Exchange: Send {
    /// 거래소 이름 반환.
    fn name(&self) -> &str;

    // === 시장 데이터 ===

    /// 거래 가능한 심볼 목록 조회.
    async fn get_symbols(&mut self) -> ExchangeResult<Vec<Symbol>>;

    /// 심볼의 현재 시세 조회.
    async fn get_ticker(&mut self, symbol: &str) -> ExchangeResult<Ticker>;

    /// 심볼의 호가창 조회.
    async fn get_order_book(&mut self, symbol: &str) -> ExchangeResult<OrderBook>;

    /// 심볼의 최근 체결 조회 (시간 오름차순).
    async fn get_recent_trades(&mut self, symbol: &str) -> ExchangeResult<Vec<Trade>>;

    /// 과거 체결을 시간 순서대로 내보내는 지연 스트림.
    ///
    /// `since`가 없으면 가장 최근 페이지 하나만 조회합니다.
    /// 스트림을 drop하면 이후 요청은 보내지 않습니다.
    fn stream_historical_trades<'a>(
        &'a mut self,
        symbol: &str,
        since: Option<DateTime<Utc>>,
    ) -> BoxStream<'a, ExchangeResult<Trade>>;

    // === 계좌 작업 ===

    /// 통화별 사용 가능 잔고 조회 (0 잔고 제외).
    async fn get_available_balances(&mut self) -> ExchangeResult<HashMap<String, Decimal>>;

    // === 주문 작업 ===

    /// 지정가 주문 제출.
    async fn place_limit_order(
        &mut self,
        request: &LimitOrderRequest,
    ) -> ExchangeResult<OrderResult>;

    /// 주문 상세 조회.
    async fn get_order_details(&mut self, order_id: &str) -> ExchangeResult<OrderResult>;

    /// 주문 목록 조회 (심볼 필터 선택).
    async fn get_open_orders(&mut self, symbol: Option<&str>) -> ExchangeResult<Vec<OrderResult>>;

    /// 주문 취소.
    async fn cancel_order(&mut self, order_id: &str) -> ExchangeResult<()>;
}
