//! 과거 체결 백필.
//!
//! 거래소는 과거 개별 체결을 시간 구간으로 조회할 수 없으므로 캔들을 체결로
//! 투영합니다 (가격 = 종가, 수량 = 거래량). 시작 시점이 주어지면 짧은 시간 창을
//! 앞으로 밀어가며 페이지를 가져오고, 없으면 가장 최근 페이지 하나만 가져옵니다.
//!
//! 한 번에 한 페이지만 메모리에 두며, 스트림을 drop하면 다음 요청은 나가지 않습니다.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use coinbase_core::Trade;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::debug;

use crate::connector::{decimal_value, CoinbaseClient};
use crate::error::ExchangeError;
use crate::traits::ExchangeResult;

/// 최근 페이지 조회 캔들 간격 (초)
pub const COARSE_GRANULARITY_SECS: i64 = 1800;
/// 백필 캔들 간격 (초)
pub const FINE_GRANULARITY_SECS: i64 = 60;

/// 조회 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// 가장 최근 페이지 하나만 조회
    Recent,
    /// 시작 시점부터 시간 창을 밀어가며 조회
    Backfill,
}

impl WalkMode {
    /// 이 방식의 캔들 간격 (초).
    pub fn granularity_secs(&self) -> i64 {
        match self {
            WalkMode::Recent => COARSE_GRANULARITY_SECS,
            WalkMode::Backfill => FINE_GRANULARITY_SECS,
        }
    }
}

/// 과거 체결 페이지 순회기.
///
/// 클라이언트를 독점 대여하므로 순회 중 같은 커넥터로 다른 호출을 할 수 없습니다.
pub struct HistoryWalker<'a> {
    client: &'a mut CoinbaseClient,
    product_id: String,
    mode: WalkMode,
    cursor: DateTime<Utc>,
    window: Option<chrono::Duration>,
    page_delay: Duration,
    last_emitted: Option<DateTime<Utc>>,
    pages_fetched: usize,
    finished: bool,
}

impl<'a> HistoryWalker<'a> {
    /// 새 순회기 생성. 요청은 첫 페이지를 당길 때 나갑니다.
    pub fn new(
        client: &'a mut CoinbaseClient,
        product_id: impl Into<String>,
        since: Option<DateTime<Utc>>,
    ) -> Self {
        let config = client.history_config();
        let window = chrono::Duration::try_minutes(config.window_minutes.max(1));
        let page_delay = config.page_delay();

        let (mode, cursor) = match since {
            Some(since) => (WalkMode::Backfill, since),
            None => (WalkMode::Recent, Utc::now()),
        };

        Self {
            client,
            product_id: product_id.into(),
            mode,
            cursor,
            window,
            page_delay,
            last_emitted: None,
            pages_fetched: 0,
            finished: false,
        }
    }

    /// 조회 방식.
    pub fn mode(&self) -> WalkMode {
        self.mode
    }

    /// 다음 요청의 시작 시점 (백필 모드).
    pub fn cursor(&self) -> DateTime<Utc> {
        self.cursor
    }

    /// 지금까지 보낸 요청 수.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// 다음 페이지를 가져옵니다.
    ///
    /// 반환된 페이지는 시간 오름차순이며 이미 내보낸 시각 이하의 기록은 빠져 있어
    /// 비어 있을 수도 있습니다. 순회가 끝나면 `None`, 에러 후에도 `None`입니다.
    pub async fn next_page(&mut self) -> ExchangeResult<Option<Vec<Trade>>> {
        if self.finished {
            return Ok(None);
        }

        match self.mode {
            WalkMode::Recent => {
                self.finished = true;
                self.pages_fetched += 1;
                let mut page = self
                    .client
                    .fetch_candles(&self.product_id, COARSE_GRANULARITY_SECS, None)
                    .await?;
                if page.is_empty() {
                    return Ok(None);
                }
                page.sort_by_key(|t| t.timestamp);
                Ok(Some(page))
            }
            WalkMode::Backfill => {
                if self.pages_fetched > 0 && !self.page_delay.is_zero() {
                    tokio::time::sleep(self.page_delay).await;
                }

                let Some(window) = self.window else {
                    self.finished = true;
                    return Err(ExchangeError::Configuration(
                        "history.window_minutes is out of range".to_string(),
                    ));
                };
                let start = self.cursor;
                let Some(end) = start.checked_add_signed(window) else {
                    debug!(product_id = %self.product_id, %start, "History window past representable time");
                    self.finished = true;
                    return Ok(None);
                };
                self.pages_fetched += 1;

                let mut page = match self
                    .client
                    .fetch_candles(&self.product_id, FINE_GRANULARITY_SECS, Some((start, end)))
                    .await
                {
                    Ok(page) => page,
                    Err(e) => {
                        self.finished = true;
                        return Err(e);
                    }
                };

                if page.is_empty() {
                    debug!(product_id = %self.product_id, %start, "History exhausted");
                    self.finished = true;
                    return Ok(None);
                }

                page.sort_by_key(|t| t.timestamp);
                self.advance_cursor(&page);

                if let Some(mark) = self.last_emitted {
                    page.retain(|t| t.timestamp > mark);
                }
                if let Some(last) = page.last() {
                    self.last_emitted = Some(last.timestamp);
                }

                debug!(
                    product_id = %self.product_id,
                    %start,
                    records = page.len(),
                    next = %self.cursor,
                    "History page"
                );
                Ok(Some(page))
            }
        }
    }

    /// 정렬된 페이지의 최신 시각으로 커서를 옮기고, 제자리면 한 창만큼 밉니다.
    /// 더 밀 수 없으면 순회를 끝냅니다.
    fn advance_cursor(&mut self, sorted_page: &[Trade]) {
        let newest = sorted_page.last().map(|t| t.timestamp);
        match newest {
            Some(newest) if newest > self.cursor => self.cursor = newest,
            _ => match self
                .cursor
                .checked_add_signed(chrono::Duration::seconds(FINE_GRANULARITY_SECS))
            {
                Some(next) => self.cursor = next,
                None => self.finished = true,
            },
        }
    }

    /// 체결 단위 스트림으로 변환합니다.
    ///
    /// 어느 페이지에서든 에러가 나면 에러 하나를 내보내고 끝납니다.
    pub fn into_stream(self) -> BoxStream<'a, ExchangeResult<Trade>> {
        stream::try_unfold(self, |mut walker| async move {
            let page = walker.next_page().await?;
            Ok::<_, ExchangeError>(page.map(|page| (page, walker)))
        })
        .map_ok(|page| stream::iter(page.into_iter().map(Ok::<Trade, ExchangeError>)))
        .try_flatten()
        .boxed()
    }
}

impl CoinbaseClient {
    /// 캔들 한 페이지를 체결 목록으로 가져옵니다 (거래소 순서 그대로).
    pub(crate) async fn fetch_candles(
        &mut self,
        product_id: &str,
        granularity_secs: i64,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> ExchangeResult<Vec<Trade>> {
        let mut path = format!(
            "/products/{}/candles?granularity={}",
            product_id, granularity_secs
        );
        if let Some((start, end)) = range {
            path.push_str("&start=");
            path.push_str(&start.to_rfc3339_opts(SecondsFormat::Secs, true));
            path.push_str("&end=");
            path.push_str(&end.to_rfc3339_opts(SecondsFormat::Secs, true));
        }

        let body = self.public_body(&path).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows: Option<Vec<Vec<Value>>> = serde_json::from_str(&body)?;
        rows.unwrap_or_default()
            .iter()
            .map(|row| candle_to_trade(row))
            .collect()
    }
}

/// `[time, low, high, open, close, volume]` 캔들 행을 체결로 투영합니다.
pub fn candle_to_trade(row: &[Value]) -> ExchangeResult<Trade> {
    match row {
        [time, _low, _high, _open, close, volume, ..] => {
            let secs = time
                .as_i64()
                .or_else(|| time.as_f64().map(|f| f as i64))
                .ok_or_else(|| ExchangeError::Parse(format!("candle time is not a number: {}", time)))?;
            let timestamp = Utc
                .timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| ExchangeError::Parse(format!("candle time out of range: {}", secs)))?;

            Ok(Trade {
                id: 0,
                price: decimal_value("close", close)?,
                amount: decimal_value("volume", volume)?,
                timestamp,
                is_buyer_maker: false,
            })
        }
        _ => Err(ExchangeError::Parse(format!(
            "candle row has {} fields, expected 6",
            row.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_candle_projection() {
        let row = vec![json!(1415398768), json!(0.32), json!(4.2), json!(0.35), json!(4.2), json!(12.3)];
        let trade = candle_to_trade(&row).unwrap();

        assert_eq!(trade.id, 0);
        assert_eq!(trade.price, dec!(4.2));
        assert_eq!(trade.amount, dec!(12.3));
        assert_eq!(trade.timestamp.timestamp(), 1415398768);
        assert!(!trade.is_buyer_maker);
    }

    #[test]
    fn test_candle_accepts_string_numbers() {
        let row = vec![json!(1700000000), json!("1"), json!("2"), json!("1.5"), json!("1.75"), json!("0.5")];
        let trade = candle_to_trade(&row).unwrap();
        assert_eq!(trade.price, dec!(1.75));
        assert_eq!(trade.amount, dec!(0.5));
    }

    #[test]
    fn test_short_candle_row_is_parse_error() {
        let row = vec![json!(1700000000), json!(1), json!(2)];
        assert!(matches!(candle_to_trade(&row), Err(ExchangeError::Parse(_))));
    }

    #[test]
    fn test_walk_mode_granularity() {
        assert_eq!(WalkMode::Recent.granularity_secs(), 1800);
        assert_eq!(WalkMode::Backfill.granularity_secs(), 60);
    }
}
