//! Coinbase Exchange 커넥터.
//!
//! REST API(`api.exchange.coinbase.com`) 구현. 샌드박스와 운영 환경 모두 지원.
//! 인증 요청은 [`super::signer`]로 서명하고, 주문 응답은
//! [`super::order_state`]로 변환합니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coinbase_core::{
    ApiCredentials, ConnectorConfig, CredentialEncryptor, HistoryConfig, LimitOrderRequest,
    OrderBook, OrderBookLevel, OrderResult, Symbol, Ticker, Trade,
};
use futures::stream::BoxStream;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::order_state::{translate, RawOrder};
use super::signer::sign;
use super::{decimal_field, decimal_value};
use crate::history::HistoryWalker;
use crate::traits::{Exchange, ExchangeResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
use crate::ExchangeError;

/// 다음 페이지 커서 헤더
pub const HEADER_CURSOR_AFTER: &str = "CB-AFTER";
/// 이전 페이지 커서 헤더
pub const HEADER_CURSOR_BEFORE: &str = "CB-BEFORE";

// ============================================================================
// 페이지 커서
// ============================================================================

/// 마지막 응답의 페이지 커서.
///
/// 어떤 작업이든 응답을 받을 때마다 덮어씁니다. 헤더가 없으면 해당 값은 지워집니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor {
    /// 더 오래된 페이지 커서 (`CB-AFTER`)
    pub after: Option<String>,
    /// 더 최근 페이지 커서 (`CB-BEFORE`)
    pub before: Option<String>,
}

impl PageCursor {
    fn update(&mut self, response: &HttpResponse) {
        self.after = response.header(HEADER_CURSOR_AFTER).map(str::to_string);
        self.before = response.header(HEADER_CURSOR_BEFORE).map(str::to_string);
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
struct CoinbaseProduct {
    base_currency: String,
    quote_currency: String,
    #[serde(default)]
    trading_disabled: bool,
}

#[derive(Debug, Deserialize)]
struct CoinbaseTicker {
    price: String,
    bid: String,
    ask: String,
    volume: String,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CoinbaseBook {
    #[serde(default)]
    sequence: i64,
    bids: Vec<Vec<Value>>,
    asks: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct CoinbaseTrade {
    time: DateTime<Utc>,
    trade_id: i64,
    price: String,
    size: String,
    side: String,
}

#[derive(Debug, Deserialize)]
struct CoinbaseAccount {
    currency: String,
    available: String,
}

#[derive(Debug, Deserialize)]
struct CoinbaseErrorBody {
    message: String,
}

/// 지정가 주문 요청 본문. 직렬화 결과가 서명과 전송에 그대로 쓰입니다.
#[derive(Debug, Serialize)]
struct LimitOrderPayload<'a> {
    #[serde(rename = "type")]
    order_type: &'static str,
    side: &'static str,
    product_id: &'a str,
    price: String,
    size: String,
}

// ============================================================================
// Coinbase 클라이언트
// ============================================================================

/// Coinbase Exchange 클라이언트.
pub struct CoinbaseClient {
    name: String,
    transport: Box<dyn Transport>,
    credentials: Option<ApiCredentials>,
    history: HistoryConfig,
    cursor: PageCursor,
}

impl CoinbaseClient {
    /// 설정과 자격증명으로 `reqwest` 기반 클라이언트 생성.
    ///
    /// 자격증명이 없으면 공개 API만 사용할 수 있습니다.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::Network`를 반환합니다.
    pub fn new(config: &ConnectorConfig, credentials: Option<ApiCredentials>) -> ExchangeResult<Self> {
        let transport = HttpTransport::new(config.rest_url(), config.timeout(), &config.user_agent)?;
        let mut client = Self::with_transport(Box::new(transport), credentials, config.history.clone());
        if config.sandbox {
            client.name = "coinbase-sandbox".to_string();
        }
        Ok(client)
    }

    /// 설정에서 클라이언트 생성.
    ///
    /// `credentials_path`가 있으면 보호된 번들을 마스터 키로 열고,
    /// 없으면 환경 변수의 자격증명을 사용합니다.
    ///
    /// # Errors
    /// 번들을 열 수 없거나 항목 수가 세 개가 아니면 `ExchangeError::Configuration`.
    pub fn from_config(config: &ConnectorConfig) -> ExchangeResult<Self> {
        let credentials = match &config.credentials_path {
            Some(path) => {
                let encryptor = CredentialEncryptor::from_env()?;
                let credentials = ApiCredentials::from_bundle_file(path, &encryptor)?;
                info!(path = %path.display(), "Loaded credentials from protected bundle");
                Some(credentials)
            }
            None => ApiCredentials::from_env(),
        };

        if credentials.is_none() {
            info!("No credentials configured, public endpoints only");
        }

        Self::new(config, credentials)
    }

    /// 임의의 전송 계층으로 클라이언트 생성.
    pub fn with_transport(
        transport: Box<dyn Transport>,
        credentials: Option<ApiCredentials>,
        history: HistoryConfig,
    ) -> Self {
        Self {
            name: "coinbase".to_string(),
            transport,
            credentials,
            history,
            cursor: PageCursor::default(),
        }
    }

    /// 마지막 응답의 페이지 커서.
    pub fn page_cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// 인증 요청이 가능한지 확인.
    pub fn has_credentials(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(ApiCredentials::is_complete)
    }

    /// 백필 설정.
    pub fn history_config(&self) -> &HistoryConfig {
        &self.history
    }

    /// "BTC/USD", "btc-usd" 등을 거래소 상품 ID("BTC-USD")로 변환.
    pub fn product_id(symbol: &str) -> String {
        symbol.trim().replace('/', "-").to_ascii_uppercase()
    }

    /// 요청을 보내고 커서를 갱신한 뒤 성공 본문을 반환합니다.
    async fn execute(&mut self, request: HttpRequest) -> ExchangeResult<String> {
        let response = self.transport.send(request).await?;
        self.cursor.update(&response);

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(map_http_error(response.status, &response.body))
        }
    }

    /// 공개 API 요청 후 원본 본문 반환 (인증 불필요).
    pub(crate) async fn public_body(&mut self, path: &str) -> ExchangeResult<String> {
        debug!("GET {}", path);
        self.execute(HttpRequest::new(Method::GET, path)).await
    }

    /// 공개 API 요청 (인증 불필요).
    pub(crate) async fn public_get<T: DeserializeOwned>(&mut self, path: &str) -> ExchangeResult<T> {
        let body = self.public_body(path).await?;
        decode(path, &body)
    }

    /// 서명된 API 요청 (인증 필요).
    ///
    /// 자격증명이 없거나 불완전하면 요청을 보내지 않고 `NoAuthContext`를 반환합니다.
    async fn signed<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> ExchangeResult<T> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ExchangeError::NoAuthContext)?;

        let signed = sign(
            credentials,
            method.as_str(),
            path,
            body.as_deref().unwrap_or(""),
            Utc::now(),
        )?;

        let mut request = HttpRequest::new(method, path);
        for (name, value) in signed.auth_headers(credentials) {
            request = request.with_header(name, value);
        }
        if let Some(body) = body {
            request = request.with_body(body);
        }

        debug!("{} (signed) {}", request.method, path);
        let body = self.execute(request).await?;
        decode(path, &body)
    }
}

/// 성공 응답 본문 디코딩.
fn decode<T: DeserializeOwned>(path: &str, body: &str) -> ExchangeResult<T> {
    serde_json::from_str(body).map_err(|e| {
        error!(path, "Failed to parse response: {}", e);
        ExchangeError::Parse(e.to_string())
    })
}

/// HTTP 에러 상태와 `{"message": ...}` 본문을 ExchangeError로 매핑.
fn map_http_error(status: u16, body: &str) -> ExchangeError {
    let message = serde_json::from_str::<CoinbaseErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        401 => ExchangeError::Unauthorized(message),
        404 => ExchangeError::NotFound(message),
        429 => ExchangeError::RateLimited,
        code => ExchangeError::Api { code, message },
    }
}

fn parse_product(product_id: &str) -> ExchangeResult<Symbol> {
    Symbol::from_product_id(product_id)
        .ok_or_else(|| ExchangeError::Parse(format!("invalid product id: {}", product_id)))
}

fn to_symbols(products: Vec<CoinbaseProduct>) -> Vec<Symbol> {
    products
        .into_iter()
        .filter(|p| !p.trading_disabled)
        .map(|p| Symbol::new(p.base_currency, p.quote_currency))
        .collect()
}

fn to_ticker(symbol: Symbol, raw: CoinbaseTicker) -> ExchangeResult<Ticker> {
    Ok(Ticker {
        symbol,
        bid: decimal_field("bid", &raw.bid)?,
        ask: decimal_field("ask", &raw.ask)?,
        last: decimal_field("price", &raw.price)?,
        volume: decimal_field("volume", &raw.volume)?,
        timestamp: raw.time.unwrap_or_else(Utc::now),
    })
}

/// `[price, size, num_orders]` 항목을 위치 기준으로 변환.
fn to_level(entry: &[Value]) -> ExchangeResult<OrderBookLevel> {
    match entry {
        [price, amount, ..] => Ok(OrderBookLevel {
            price: decimal_value("price", price)?,
            amount: decimal_value("size", amount)?,
        }),
        _ => Err(ExchangeError::Parse(format!(
            "order book entry has {} fields, expected at least 2",
            entry.len()
        ))),
    }
}

/// 거래소가 보낸 순서를 그대로 유지합니다 (매도 오름차순, 매수 내림차순).
fn to_order_book(symbol: Symbol, raw: CoinbaseBook) -> ExchangeResult<OrderBook> {
    let bids = raw
        .bids
        .iter()
        .map(|entry| to_level(entry))
        .collect::<ExchangeResult<Vec<_>>>()?;
    let asks = raw
        .asks
        .iter()
        .map(|entry| to_level(entry))
        .collect::<ExchangeResult<Vec<_>>>()?;

    Ok(OrderBook {
        symbol,
        bids,
        asks,
        sequence: raw.sequence,
        timestamp: Utc::now(),
    })
}

/// 거래소는 최신순으로 주므로 시간 오름차순으로 안정 정렬합니다.
///
/// `side`는 메이커 쪽이므로 `buy`이면 매수자가 메이커입니다.
fn to_trades(raw: Vec<CoinbaseTrade>) -> ExchangeResult<Vec<Trade>> {
    let mut trades = raw
        .into_iter()
        .map(|t| {
            Ok(Trade {
                id: t.trade_id,
                price: decimal_field("price", &t.price)?,
                amount: decimal_field("size", &t.size)?,
                timestamp: t.time,
                is_buyer_maker: t.side.eq_ignore_ascii_case("buy"),
            })
        })
        .collect::<ExchangeResult<Vec<_>>>()?;
    trades.sort_by_key(|t| t.timestamp);
    Ok(trades)
}

fn to_available_balances(accounts: Vec<CoinbaseAccount>) -> ExchangeResult<HashMap<String, Decimal>> {
    let mut balances = HashMap::new();
    for account in accounts {
        let available = decimal_field("available", &account.available)?;
        if available > Decimal::ZERO {
            *balances.entry(account.currency).or_insert(Decimal::ZERO) += available;
        }
    }
    Ok(balances)
}

fn limit_order_body(request: &LimitOrderRequest) -> ExchangeResult<String> {
    if request.amount <= Decimal::ZERO {
        return Err(ExchangeError::InvalidOrder(format!(
            "amount must be positive: {}",
            request.amount
        )));
    }
    if request.price <= Decimal::ZERO {
        return Err(ExchangeError::InvalidOrder(format!(
            "price must be positive: {}",
            request.price
        )));
    }

    let product_id = request.symbol.product_id();
    let payload = LimitOrderPayload {
        order_type: "limit",
        side: request.side.as_wire(),
        product_id: &product_id,
        price: request.price.normalize().to_string(),
        size: request.amount.normalize().to_string(),
    };
    Ok(serde_json::to_string(&payload)?)
}

fn order_path(order_id: &str) -> ExchangeResult<String> {
    let order_id = order_id.trim();
    if order_id.is_empty() {
        return Err(ExchangeError::InvalidOrder("order id is empty".to_string()));
    }
    Ok(format!("/orders/{}", order_id))
}

#[async_trait]
impl Exchange for CoinbaseClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_symbols(&mut self) -> ExchangeResult<Vec<Symbol>> {
        let products: Vec<CoinbaseProduct> = self.public_get("/products").await?;
        Ok(to_symbols(products))
    }

    async fn get_ticker(&mut self, symbol: &str) -> ExchangeResult<Ticker> {
        let product_id = Self::product_id(symbol);
        let parsed = parse_product(&product_id)?;
        let raw: CoinbaseTicker = self
            .public_get(&format!("/products/{}/ticker", product_id))
            .await?;
        to_ticker(parsed, raw)
    }

    async fn get_order_book(&mut self, symbol: &str) -> ExchangeResult<OrderBook> {
        let product_id = Self::product_id(symbol);
        let parsed = parse_product(&product_id)?;
        let raw: CoinbaseBook = self
            .public_get(&format!("/products/{}/book?level=2", product_id))
            .await?;
        to_order_book(parsed, raw)
    }

    async fn get_recent_trades(&mut self, symbol: &str) -> ExchangeResult<Vec<Trade>> {
        let product_id = Self::product_id(symbol);
        let raw: Vec<CoinbaseTrade> = self
            .public_get(&format!("/products/{}/trades", product_id))
            .await?;
        to_trades(raw)
    }

    fn stream_historical_trades<'a>(
        &'a mut self,
        symbol: &str,
        since: Option<DateTime<Utc>>,
    ) -> BoxStream<'a, ExchangeResult<Trade>> {
        let product_id = Self::product_id(symbol);
        HistoryWalker::new(self, product_id, since).into_stream()
    }

    async fn get_available_balances(&mut self) -> ExchangeResult<HashMap<String, Decimal>> {
        let accounts: Vec<CoinbaseAccount> = self.signed(Method::GET, "/accounts", None).await?;
        to_available_balances(accounts)
    }

    async fn place_limit_order(
        &mut self,
        request: &LimitOrderRequest,
    ) -> ExchangeResult<OrderResult> {
        let body = limit_order_body(request)?;

        info!(
            "Placing order: {} {} {} @ {}",
            request.side, request.amount, request.symbol, request.price
        );

        let raw: RawOrder = self.signed(Method::POST, "/orders", Some(body)).await?;
        let result = translate(&raw)?;

        info!(order_id = %result.order_id, state = %result.state, "Order placed");
        Ok(result)
    }

    async fn get_order_details(&mut self, order_id: &str) -> ExchangeResult<OrderResult> {
        let path = order_path(order_id)?;
        let raw: RawOrder = self.signed(Method::GET, &path, None).await?;
        translate(&raw)
    }

    async fn get_open_orders(&mut self, symbol: Option<&str>) -> ExchangeResult<Vec<OrderResult>> {
        let mut path = "/orders?status=all".to_string();
        if let Some(symbol) = symbol {
            path.push_str("&product_id=");
            path.push_str(&Self::product_id(symbol));
        }

        let raw: Vec<RawOrder> = self.signed(Method::GET, &path, None).await?;
        raw.iter().map(translate).collect()
    }

    async fn cancel_order(&mut self, order_id: &str) -> ExchangeResult<()> {
        let path = order_path(order_id)?;
        let _: Value = self.signed(Method::DELETE, &path, None).await?;
        info!(order_id = %order_id.trim(), "Order cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_id_normalization() {
        assert_eq!(CoinbaseClient::product_id("BTC/USD"), "BTC-USD");
        assert_eq!(CoinbaseClient::product_id(" eth-eur "), "ETH-EUR");
    }

    #[test]
    fn test_order_book_preserves_exchange_order() {
        let raw: CoinbaseBook = serde_json::from_value(serde_json::json!({
            "sequence": 3,
            "bids": [["295.96", "4.39088265", 2], ["295.95", "1.0", 1]],
            "asks": [["295.97", "25.23542881", 12], ["296.10", "0.5", 3]]
        }))
        .unwrap();

        let book = to_order_book(Symbol::new("BTC", "USD"), raw).unwrap();
        assert_eq!(book.sequence, 3);
        assert_eq!(book.bids[0].price, dec!(295.96));
        assert_eq!(book.bids[1].price, dec!(295.95));
        assert_eq!(book.asks[0].amount, dec!(25.23542881));
        assert_eq!(book.asks[1].price, dec!(296.10));
        assert_eq!(book.best_bid(), Some(dec!(295.96)));
    }

    #[test]
    fn test_order_book_short_entry_is_parse_error() {
        let raw: CoinbaseBook = serde_json::from_value(serde_json::json!({
            "bids": [["295.96"]],
            "asks": []
        }))
        .unwrap();

        assert!(matches!(
            to_order_book(Symbol::new("BTC", "USD"), raw),
            Err(ExchangeError::Parse(_))
        ));
    }

    #[test]
    fn test_trades_sorted_ascending_with_maker_side() {
        let raw: Vec<CoinbaseTrade> = serde_json::from_value(serde_json::json!([
            {"time": "2024-01-01T00:00:03Z", "trade_id": 3, "price": "10.3", "size": "1", "side": "sell"},
            {"time": "2024-01-01T00:00:02Z", "trade_id": 2, "price": "10.2", "size": "2", "side": "buy"},
            {"time": "2024-01-01T00:00:01Z", "trade_id": 1, "price": "10.1", "size": "3", "side": "buy"}
        ]))
        .unwrap();

        let trades = to_trades(raw).unwrap();
        let ids: Vec<i64> = trades.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(trades[0].is_buyer_maker);
        assert!(!trades[2].is_buyer_maker);
        assert_eq!(trades[1].amount, dec!(2));
    }

    #[test]
    fn test_symbols_skip_disabled_products() {
        let raw: Vec<CoinbaseProduct> = serde_json::from_value(serde_json::json!([
            {"id": "BTC-USD", "base_currency": "BTC", "quote_currency": "USD"},
            {"id": "OLD-USD", "base_currency": "OLD", "quote_currency": "USD", "trading_disabled": true}
        ]))
        .unwrap();

        let symbols = to_symbols(raw);
        assert_eq!(symbols, vec![Symbol::new("BTC", "USD")]);
    }

    #[test]
    fn test_ticker_mapping() {
        let raw: CoinbaseTicker = serde_json::from_value(serde_json::json!({
            "trade_id": 4729088,
            "price": "333.99",
            "size": "0.193",
            "bid": "333.98",
            "ask": "333.99",
            "volume": "5957.11914015",
            "time": "2015-11-14T20:46:03.511254Z"
        }))
        .unwrap();

        let ticker = to_ticker(Symbol::new("BTC", "USD"), raw).unwrap();
        assert_eq!(ticker.last, dec!(333.99));
        assert_eq!(ticker.spread(), dec!(0.01));
        assert_eq!(ticker.volume, dec!(5957.11914015));
    }

    #[test]
    fn test_balances_omit_zero() {
        let raw: Vec<CoinbaseAccount> = serde_json::from_value(serde_json::json!([
            {"id": "a", "currency": "BTC", "balance": "1.5", "available": "1.0", "hold": "0.5"},
            {"id": "b", "currency": "USD", "balance": "0", "available": "0.0000000000", "hold": "0"},
            {"id": "c", "currency": "ETH", "balance": "3", "available": "3", "hold": "0"}
        ]))
        .unwrap();

        let balances = to_available_balances(raw).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances["BTC"], dec!(1.0));
        assert_eq!(balances["ETH"], dec!(3));
        assert!(!balances.contains_key("USD"));
    }

    #[test]
    fn test_limit_order_body_is_compact() {
        let request = LimitOrderRequest::limit_buy(Symbol::new("BTC", "USD"), dec!(0.0100), dec!(100.50));
        let body = limit_order_body(&request).unwrap();
        assert_eq!(
            body,
            r#"{"type":"limit","side":"buy","product_id":"BTC-USD","price":"100.5","size":"0.01"}"#
        );
    }

    #[test]
    fn test_limit_order_rejects_non_positive_values() {
        let zero_amount = LimitOrderRequest::limit_sell(Symbol::new("BTC", "USD"), dec!(0), dec!(1));
        assert!(matches!(limit_order_body(&zero_amount), Err(ExchangeError::InvalidOrder(_))));

        let negative_price = LimitOrderRequest::limit_sell(Symbol::new("BTC", "USD"), dec!(1), dec!(-1));
        assert!(matches!(limit_order_body(&negative_price), Err(ExchangeError::InvalidOrder(_))));
    }

    #[test]
    fn test_empty_order_id_rejected() {
        assert!(matches!(order_path("  "), Err(ExchangeError::InvalidOrder(_))));
        assert_eq!(order_path("abc").unwrap(), "/orders/abc");
    }

    #[test]
    fn test_http_error_mapping() {
        assert!(matches!(
            map_http_error(401, r#"{"message":"invalid signature"}"#),
            ExchangeError::Unauthorized(ref m) if m == "invalid signature"
        ));
        assert!(matches!(map_http_error(429, "{}"), ExchangeError::RateLimited));
        assert!(matches!(
            map_http_error(404, r#"{"message":"NotFound"}"#),
            ExchangeError::NotFound(_)
        ));
        assert!(matches!(
            map_http_error(500, "oops"),
            ExchangeError::Api { code: 500, ref message } if message == "oops"
        ));
    }

    #[test]
    fn test_page_cursor_update_clears_missing_headers() {
        let mut cursor = PageCursor::default();
        cursor.update(&HttpResponse::new(200, "[]").with_header("CB-AFTER", "10").with_header("CB-BEFORE", "5"));
        assert_eq!(cursor.after.as_deref(), Some("10"));
        assert_eq!(cursor.before.as_deref(), Some("5"));

        cursor.update(&HttpResponse::new(200, "[]").with_header("cb-after", "20"));
        assert_eq!(cursor.after.as_deref(), Some("20"));
        assert_eq!(cursor.before, None);
    }
}
