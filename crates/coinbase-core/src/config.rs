//! 설정 관리.
//!
//! 커넥터 설정은 TOML 파일(선택)과 `COINBASE__` 접두사 환경 변수에서 로드됩니다.
//!
//! ```toml
//! sandbox = true
//! timeout_secs = 10
//! credentials_path = "secrets/coinbase.json"
//!
//! [history]
//! page_delay_ms = 1000
//! window_minutes = 5
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 운영 REST API 기본 URL.
pub const PRODUCTION_REST_URL: &str = "https://api.exchange.coinbase.com";

/// 샌드박스 REST API 기본 URL.
pub const SANDBOX_REST_URL: &str = "https://api-public.sandbox.exchange.coinbase.com";

/// 커넥터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// REST API 기본 URL
    pub rest_base_url: String,
    /// 샌드박스 사용 (설정 시 `rest_base_url` 대신 샌드박스 URL 사용)
    pub sandbox: bool,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// User-Agent 헤더 (거래소가 요구함)
    pub user_agent: String,
    /// 보호된 자격증명 번들 경로
    pub credentials_path: Option<PathBuf>,
    /// 과거 체결 백필 설정
    pub history: HistoryConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            rest_base_url: PRODUCTION_REST_URL.to_string(),
            sandbox: false,
            timeout_secs: 30,
            user_agent: concat!("coinbase-connector/", env!("CARGO_PKG_VERSION")).to_string(),
            credentials_path: None,
            history: HistoryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ConnectorConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config = builder
            // 환경 변수로 오버라이드 (예: COINBASE__SANDBOX=true)
            .add_source(
                config::Environment::with_prefix("COINBASE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// 실제로 사용할 REST 기본 URL을 반환합니다.
    pub fn rest_url(&self) -> &str {
        if self.sandbox {
            SANDBOX_REST_URL
        } else {
            &self.rest_base_url
        }
    }

    /// 요청 타임아웃.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 과거 체결 백필 설정.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// 백필 페이지 사이 대기 시간 (밀리초)
    pub page_delay_ms: u64,
    /// 백필 요청당 조회 구간 (분)
    pub window_minutes: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: 1000,
            window_minutes: 5,
        }
    }
}

impl HistoryConfig {
    /// 페이지 사이 대기 시간.
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
