//! 거래소 에러 타입.

use coinbase_core::CryptoError;
use thiserror::Error;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 잘못되었거나 불완전한 설정/자격증명 번들
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 인증 요청에 필요한 키가 없음 (요청을 보내지 않음)
    #[error("No authentication context: credentials are missing or incomplete")]
    NoAuthContext,

    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 인증/권한 에러
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// 찾을 수 없음 (주문, 상품 등)
    #[error("Not found: {0}")]
    NotFound(String),

    /// 전송 전에 거부된 주문 입력 (0 이하 수량/가격, 빈 주문 ID)
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// API 에러 응답
    #[error("API error {code}: {message}")]
    Api { code: u16, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ExchangeError {
    /// 재시도 가능한 에러인지 확인.
    ///
    /// 이 크레이트는 재시도하지 않습니다. 호출자의 재시도 정책을 위한 분류입니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::Network(_) | ExchangeError::Timeout(_) | ExchangeError::RateLimited
        )
    }

    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ExchangeError::Unauthorized(_) | ExchangeError::NoAuthContext
        )
    }

    /// 재시도하면 안 되는 치명적 에러인지 확인.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExchangeError::Configuration(_)
                | ExchangeError::NoAuthContext
                | ExchangeError::InvalidOrder(_)
                | ExchangeError::Unauthorized(_)
        )
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_decode() {
            ExchangeError::Parse(err.to_string())
        } else {
            ExchangeError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::Parse(err.to_string())
    }
}

impl From<CryptoError> for ExchangeError {
    fn from(err: CryptoError) -> Self {
        ExchangeError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ExchangeError::RateLimited.is_retryable());
        assert!(ExchangeError::Network("reset".to_string()).is_retryable());
        assert!(!ExchangeError::Parse("bad".to_string()).is_retryable());

        assert!(ExchangeError::NoAuthContext.is_fatal());
        assert!(ExchangeError::NoAuthContext.is_auth_error());
        assert!(ExchangeError::Configuration("x".to_string()).is_fatal());
        assert!(!ExchangeError::Timeout("slow".to_string()).is_fatal());
    }

    #[test]
    fn test_crypto_error_is_configuration() {
        let err: ExchangeError = CryptoError::InvalidBundle(2).into();
        assert!(matches!(err, ExchangeError::Configuration(ref m) if m.contains("found 2")));
    }
}
