//! 시장 데이터 조회 명령.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use coinbase_core::{OrderBook, Symbol, Ticker, Trade};
use coinbase_exchange::Exchange;
use futures::StreamExt;
use tracing::info;

use super::output::{format_json, table_header, OutputFormat};

/// `--since` 인자 파싱 (RFC 3339 또는 YYYY-MM-DD).
pub fn parse_since(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| {
        format!("Invalid date format: {}. Expected RFC 3339 or YYYY-MM-DD", s)
    })?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid date: {}", s))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

/// 거래 가능한 심볼 목록.
pub async fn symbols<E: Exchange>(client: &mut E, format: OutputFormat) -> Result<String> {
    let mut symbols = client.get_symbols().await.context("Failed to fetch products")?;
    symbols.sort_by(|a, b| a.product_id().cmp(&b.product_id()));
    info!("Found {} products", symbols.len());

    match format {
        OutputFormat::Json => format_json(&symbols),
        OutputFormat::Table => Ok(format_symbols(&symbols)),
    }
}

fn format_symbols(symbols: &[Symbol]) -> String {
    let mut output = table_header(&format!("{:<14} {:<8} {:<8}", "PRODUCT", "BASE", "QUOTE"));
    for symbol in symbols {
        output.push_str(&format!(
            "{:<14} {:<8} {:<8}\n",
            symbol.product_id(),
            symbol.base,
            symbol.quote
        ));
    }
    output.push_str(&format!("\nTotal: {} products", symbols.len()));
    output
}

/// 현재 시세.
pub async fn ticker<E: Exchange>(client: &mut E, symbol: &str, format: OutputFormat) -> Result<String> {
    let ticker = client
        .get_ticker(symbol)
        .await
        .with_context(|| format!("Failed to fetch ticker for {}", symbol))?;

    match format {
        OutputFormat::Json => format_json(&ticker),
        OutputFormat::Table => Ok(format_ticker(&ticker)),
    }
}

fn format_ticker(ticker: &Ticker) -> String {
    format!(
        "{}\n  last:   {}\n  bid:    {}\n  ask:    {}\n  spread: {}\n  volume: {}\n  time:   {}",
        ticker.symbol,
        ticker.last,
        ticker.bid,
        ticker.ask,
        ticker.spread(),
        ticker.volume,
        ticker.timestamp.to_rfc3339()
    )
}

/// 호가창 (상위 `depth` 단계).
pub async fn order_book<E: Exchange>(
    client: &mut E,
    symbol: &str,
    depth: usize,
    format: OutputFormat,
) -> Result<String> {
    let mut book = client
        .get_order_book(symbol)
        .await
        .with_context(|| format!("Failed to fetch order book for {}", symbol))?;
    book.bids.truncate(depth);
    book.asks.truncate(depth);

    match format {
        OutputFormat::Json => format_json(&book),
        OutputFormat::Table => Ok(format_order_book(&book)),
    }
}

fn format_order_book(book: &OrderBook) -> String {
    let mut output = table_header(&format!(
        "{:>18} {:>16} | {:<16} {:<18}",
        "BID SIZE", "BID", "ASK", "ASK SIZE"
    ));
    let rows = book.bids.len().max(book.asks.len());
    for i in 0..rows {
        let (bid_amount, bid) = book
            .bids
            .get(i)
            .map(|l| (l.amount.to_string(), l.price.to_string()))
            .unwrap_or_default();
        let (ask, ask_amount) = book
            .asks
            .get(i)
            .map(|l| (l.price.to_string(), l.amount.to_string()))
            .unwrap_or_default();
        output.push_str(&format!(
            "{:>18} {:>16} | {:<16} {:<18}\n",
            bid_amount, bid, ask, ask_amount
        ));
    }
    if let Some(spread) = book.spread() {
        output.push_str(&format!("\n{} spread: {} (seq {})", book.symbol, spread, book.sequence));
    }
    output
}

/// 최근 체결.
pub async fn recent_trades<E: Exchange>(
    client: &mut E,
    symbol: &str,
    format: OutputFormat,
) -> Result<String> {
    let trades = client
        .get_recent_trades(symbol)
        .await
        .with_context(|| format!("Failed to fetch trades for {}", symbol))?;

    match format {
        OutputFormat::Json => format_json(&trades),
        OutputFormat::Table => {
            let mut output = table_header(&trade_columns());
            for trade in &trades {
                output.push_str(&format_trade_row(trade));
            }
            output.push_str(&format!("\nTotal: {} trades", trades.len()));
            Ok(output)
        }
    }
}

fn trade_columns() -> String {
    format!(
        "{:<26} {:>12} {:>18} {:>18} {:<5}",
        "TIME", "ID", "PRICE", "AMOUNT", "TAKER"
    )
}

fn format_trade_row(trade: &Trade) -> String {
    format!(
        "{:<26} {:>12} {:>18} {:>18} {:<5}\n",
        trade.timestamp.to_rfc3339(),
        trade.id,
        trade.price,
        trade.amount,
        trade.taker_side()
    )
}

/// 과거 체결을 받는 대로 출력합니다.
///
/// `limit`에 도달하면 스트림을 버려 이후 요청을 보내지 않습니다.
/// JSON 형식은 한 줄에 체결 하나씩 출력합니다.
pub async fn history<E: Exchange, W: Write>(
    client: &mut E,
    symbol: &str,
    since: Option<DateTime<Utc>>,
    limit: Option<usize>,
    format: OutputFormat,
    out: &mut W,
) -> Result<usize> {
    if limit == Some(0) {
        return Ok(0);
    }

    let mut stream = client.stream_historical_trades(symbol, since);
    let mut count = 0usize;

    if format == OutputFormat::Table {
        out.write_all(table_header(&trade_columns()).as_bytes())?;
    }

    while let Some(item) = stream.next().await {
        let trade = item.with_context(|| format!("History backfill failed after {} trades", count))?;
        match format {
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&trade)?)?,
            OutputFormat::Table => out.write_all(format_trade_row(&trade).as_bytes())?,
        }
        count += 1;

        if limit.is_some_and(|limit| count >= limit) {
            break;
        }
    }

    info!(symbol, count, "History backfill finished");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinbase_core::OrderBookLevel;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_since_accepts_rfc3339_and_date() {
        let at = parse_since("2024-01-01T09:00:00+09:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let day = parse_since("2024-03-05").unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-05T00:00:00+00:00");

        assert!(parse_since("yesterday").is_err());
    }

    #[test]
    fn test_format_symbols_lists_product_ids() {
        let output = format_symbols(&[Symbol::new("BTC", "USD"), Symbol::new("ETH", "EUR")]);
        assert!(output.contains("BTC-USD"));
        assert!(output.contains("ETH-EUR"));
        assert!(output.ends_with("Total: 2 products"));
    }

    #[test]
    fn test_format_order_book_uneven_sides() {
        let book = OrderBook {
            symbol: Symbol::new("BTC", "USD"),
            bids: vec![OrderBookLevel { price: dec!(99), amount: dec!(1) }],
            asks: vec![
                OrderBookLevel { price: dec!(101), amount: dec!(2) },
                OrderBookLevel { price: dec!(102), amount: dec!(3) },
            ],
            sequence: 5,
            timestamp: Utc::now(),
        };

        let output = format_order_book(&book);
        assert!(output.contains("102"));
        assert!(output.contains("spread: 2 (seq 5)"));
    }
}
