//! 통합 테스트 공용 도구: 응답을 미리 정해 두는 메모리 전송 계층.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use coinbase_core::{ApiCredentials, HistoryConfig};
use coinbase_exchange::{
    CoinbaseClient, ExchangeError, ExchangeResult, HttpRequest, HttpResponse, Transport,
};
use serde_json::Value;

/// 테스트 비밀 키 (Base64)
pub const SECRET: &str = "c2VjcmV0LWtleS1mb3ItdGVzdHM=";

/// 2024-01-01T00:00:00Z
pub const BASE_TS: i64 = 1_704_067_200;

/// 순서대로 응답을 돌려주고 받은 요청을 기록하는 전송 계층.
///
/// 준비된 응답이 떨어지면 빈 배열(`[]`)을 돌려줍니다.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<ExchangeResult<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: HttpResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_json(&self, value: Value) {
        self.push(HttpResponse::new(200, value.to_string()));
    }

    pub fn push_error(&self, error: ExchangeError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> ExchangeResult<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, "[]")))
    }
}

pub fn credentials() -> ApiCredentials {
    ApiCredentials::new("public-key", SECRET, "passphrase")
}

pub fn public_client(transport: &ScriptedTransport) -> CoinbaseClient {
    CoinbaseClient::with_transport(Box::new(transport.clone()), None, HistoryConfig::default())
}

pub fn private_client(transport: &ScriptedTransport) -> CoinbaseClient {
    CoinbaseClient::with_transport(
        Box::new(transport.clone()),
        Some(credentials()),
        HistoryConfig::default(),
    )
}

/// `[time, low, high, open, close, volume]` 캔들 행.
pub fn candle(ts: i64, close: f64, volume: f64) -> Value {
    serde_json::json!([ts, close - 1.0, close + 1.0, close, close, volume])
}

/// 최신순(거래소 순서) 캔들 페이지.
pub fn newest_first_page(timestamps: &[i64]) -> Value {
    let mut rows: Vec<Value> = timestamps
        .iter()
        .map(|&ts| candle(ts, 100.0 + (ts - BASE_TS) as f64, 1.0))
        .collect();
    rows.sort_by_key(|row| std::cmp::Reverse(row[0].as_i64().unwrap_or_default()));
    Value::Array(rows)
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
