//! HTTP 전송 계층.
//!
//! 커넥터는 `Transport` trait을 통해서만 네트워크에 접근합니다.
//! 기본 구현은 `reqwest` 기반의 [`HttpTransport`]이며, 재시도와 TLS는
//! 전송 계층(또는 그 아래)의 책임입니다.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use crate::error::ExchangeError;
use crate::traits::ExchangeResult;

/// 전송할 HTTP 요청.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP 메서드
    pub method: Method,
    /// 경로 + 쿼리 (스킴/호스트 제외, 예: `/orders?status=open`)
    pub path: String,
    /// 추가 헤더
    pub headers: Vec<(String, String)>,
    /// 요청 본문 (서명에 사용한 문자열 그대로)
    pub body: Option<String>,
}

impl HttpRequest {
    /// 본문 없는 요청 생성.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// 헤더 추가.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 본문 설정.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// 수신한 HTTP 응답.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// HTTP 상태 코드
    pub status: u16,
    /// 응답 헤더 (이름은 소문자)
    pub headers: HashMap<String, String>,
    /// 원본 JSON 본문
    pub body: String,
}

impl HttpResponse {
    /// 상태 코드와 본문으로 응답 생성.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// 헤더 추가 (이름은 소문자로 저장).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// 헤더 값 조회 (대소문자 무시).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 2xx 응답인지 확인.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 요청/응답 왕복을 수행하는 전송 계층.
#[async_trait]
pub trait Transport: Send + Sync {
    /// 요청을 보내고 응답을 반환합니다.
    ///
    /// 네트워크 실패는 에러로, HTTP 에러 상태는 정상 응답으로 반환합니다.
    async fn send(&self, request: HttpRequest) -> ExchangeResult<HttpResponse>;
}

/// `reqwest` 기반 전송 계층.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// 새 전송 계층 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::Network`를 반환합니다.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ExchangeError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// 기본 URL 반환.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> ExchangeResult<HttpResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, path = %request.path, "HTTP request");

        let mut builder = self
            .client
            .request(request.method, &url)
            .header("Accept", "application/json");

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            builder = builder.header("Content-Type", "application/json").body(body);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
