//! 잔고와 주문 관리 명령.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use coinbase_core::{LimitOrderRequest, OrderResult, Side, Symbol};
use coinbase_exchange::Exchange;
use rust_decimal::Decimal;
use tracing::info;

use super::output::{format_json, table_header, OutputFormat};

/// "BTC/USD" 또는 "btc-usd" 형식 심볼 파싱.
pub fn parse_symbol(s: &str) -> Result<Symbol> {
    Symbol::from_string(s)
        .or_else(|| Symbol::from_product_id(s.trim()))
        .ok_or_else(|| anyhow::anyhow!("Invalid symbol: {}. Expected BASE/QUOTE or BASE-QUOTE", s))
}

/// 양수 Decimal 인자 파싱.
pub fn parse_positive(name: &str, s: &str) -> Result<Decimal> {
    let value: Decimal = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}: {}", name, s))?;
    if value <= Decimal::ZERO {
        return Err(anyhow::anyhow!("{} must be positive: {}", name, s));
    }
    Ok(value)
}

/// 사용 가능 잔고.
pub async fn balances<E: Exchange>(client: &mut E, format: OutputFormat) -> Result<String> {
    let balances: BTreeMap<String, Decimal> = client
        .get_available_balances()
        .await
        .context("Failed to fetch balances")?
        .into_iter()
        .collect();

    match format {
        OutputFormat::Json => format_json(&balances),
        OutputFormat::Table => {
            let mut output = table_header(&format!("{:<10} {:>24}", "CURRENCY", "AVAILABLE"));
            for (currency, available) in &balances {
                output.push_str(&format!("{:<10} {:>24}\n", currency, available));
            }
            Ok(output)
        }
    }
}

/// 주문 목록.
pub async fn orders<E: Exchange>(
    client: &mut E,
    symbol: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let orders = client
        .get_open_orders(symbol)
        .await
        .context("Failed to fetch orders")?;
    info!("Found {} orders", orders.len());

    match format {
        OutputFormat::Json => format_json(&orders),
        OutputFormat::Table => Ok(format_orders(&orders)),
    }
}

/// 주문 상세.
pub async fn order<E: Exchange>(client: &mut E, order_id: &str, format: OutputFormat) -> Result<String> {
    let order = client
        .get_order_details(order_id)
        .await
        .with_context(|| format!("Failed to fetch order {}", order_id))?;

    match format {
        OutputFormat::Json => format_json(&order),
        OutputFormat::Table => Ok(format_orders(std::slice::from_ref(&order))),
    }
}

/// 주문 취소.
pub async fn cancel<E: Exchange>(client: &mut E, order_id: &str) -> Result<String> {
    client
        .cancel_order(order_id)
        .await
        .with_context(|| format!("Failed to cancel order {}", order_id))?;
    Ok(format!("Cancelled {}", order_id))
}

/// 지정가 주문 제출.
pub async fn place<E: Exchange>(
    client: &mut E,
    side: Side,
    symbol: &str,
    amount: &str,
    price: &str,
    format: OutputFormat,
) -> Result<String> {
    let symbol = parse_symbol(symbol)?;
    let amount = parse_positive("amount", amount)?;
    let price = parse_positive("price", price)?;

    let request = match side {
        Side::Buy => LimitOrderRequest::limit_buy(symbol, amount, price),
        Side::Sell => LimitOrderRequest::limit_sell(symbol, amount, price),
    };

    let result = client
        .place_limit_order(&request)
        .await
        .context("Failed to place order")?;

    match format {
        OutputFormat::Json => format_json(&result),
        OutputFormat::Table => Ok(format_orders(std::slice::from_ref(&result))),
    }
}

/// 수량 지정 주문은 수량, 금액 지정 주문은 `funds 금액`으로 표시합니다.
fn requested_column(order: &OrderResult) -> String {
    match (order.requested_amount, order.funds) {
        (Some(amount), _) => amount.to_string(),
        (None, Some(funds)) => format!("funds {}", funds),
        (None, None) => "-".to_string(),
    }
}

fn format_orders(orders: &[OrderResult]) -> String {
    let mut output = table_header(&format!(
        "{:<38} {:<10} {:<5} {:>14} {:>14} {:>14} {:<16}",
        "ORDER ID", "PRODUCT", "SIDE", "REQUESTED", "FILLED", "AVG PRICE", "STATE"
    ));
    for order in orders {
        output.push_str(&format!(
            "{:<38} {:<10} {:<5} {:>14} {:>14} {:>14} {:<16}\n",
            order.order_id,
            order.symbol,
            order.side.to_string(),
            requested_column(order),
            order.filled_amount.to_string(),
            order.average_price.to_string(),
            order.state.to_string()
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coinbase_core::OrderState;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_symbol_forms() {
        assert_eq!(parse_symbol("btc/usd").unwrap(), Symbol::new("BTC", "USD"));
        assert_eq!(parse_symbol("ETH-EUR").unwrap(), Symbol::new("ETH", "EUR"));
        assert!(parse_symbol("BTCUSD").is_err());
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("amount", "0.25").unwrap(), dec!(0.25));
        assert!(parse_positive("amount", "0").is_err());
        assert!(parse_positive("price", "-1").is_err());
        assert!(parse_positive("price", "abc").is_err());
    }

    #[test]
    fn test_format_orders_row() {
        let order = OrderResult {
            order_id: "d0c5340b-6d6c-49d9-b567-48c4bfca13d2".to_string(),
            symbol: "BTC-USD".to_string(),
            side: Side::Buy,
            requested_amount: Some(dec!(2)),
            funds: None,
            filled_amount: dec!(0.5),
            average_price: dec!(100),
            limit_price: Some(dec!(100)),
            fees: dec!(0),
            created_at: Utc::now(),
            state: OrderState::PartiallyFilled,
            done_reason: None,
        };

        let output = format_orders(&[order]);
        let row = output.lines().nth(2).unwrap();
        assert!(row.starts_with("d0c5340b-6d6c-49d9-b567-48c4bfca13d2"));
        assert!(row.contains("BTC-USD"));
        assert!(row.contains("0.5"));
    }

    #[test]
    fn test_requested_column_for_funds_order() {
        let order = OrderResult {
            order_id: "m1".to_string(),
            symbol: "BTC-USD".to_string(),
            side: Side::Buy,
            requested_amount: None,
            funds: Some(dec!(100.00)),
            filled_amount: dec!(0.002),
            average_price: dec!(50000),
            limit_price: None,
            fees: dec!(0),
            created_at: Utc::now(),
            state: OrderState::PartiallyFilled,
            done_reason: None,
        };
        assert_eq!(requested_column(&order), "funds 100.00");
    }
}
