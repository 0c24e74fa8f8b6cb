//! 요청 서명.
//!
//! 서명 대상 문자열은 `timestamp + METHOD + path + body` 이며,
//! Base64 디코딩한 비밀 키로 HMAC-SHA256을 계산한 뒤 다시 Base64로 인코딩합니다.
//! 한 바이트라도 다르면 거래소가 모든 인증 요청을 거부합니다.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use coinbase_core::ApiCredentials;
use hmac::{Hmac, Mac};
use secrecy::{zeroize::Zeroizing, ExposeSecret};
use sha2::Sha256;

use crate::error::ExchangeError;
use crate::traits::ExchangeResult;

type HmacSha256 = Hmac<Sha256>;

/// 공개 API 키 헤더
pub const HEADER_ACCESS_KEY: &str = "CB-ACCESS-KEY";
/// 서명 헤더
pub const HEADER_ACCESS_SIGN: &str = "CB-ACCESS-SIGN";
/// 타임스탬프 헤더
pub const HEADER_ACCESS_TIMESTAMP: &str = "CB-ACCESS-TIMESTAMP";
/// 패스프레이즈 헤더
pub const HEADER_ACCESS_PASSPHRASE: &str = "CB-ACCESS-PASSPHRASE";

/// 요청마다 새로 계산되는 서명 결과. 저장하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// 서명에 사용한 타임스탬프 문자열
    pub timestamp: String,
    /// 대문자 HTTP 메서드
    pub method: String,
    /// 경로 + 쿼리
    pub path: String,
    /// 전송할 본문 (없으면 빈 문자열)
    pub body: String,
    /// Base64 서명
    pub signature: String,
}

impl SignedRequest {
    /// 인증 헤더 네 개를 만듭니다.
    ///
    /// 공개 키와 패스프레이즈는 이 시점에만 노출됩니다.
    pub fn auth_headers(&self, credentials: &ApiCredentials) -> [(&'static str, String); 4] {
        [
            (
                HEADER_ACCESS_KEY,
                credentials.public_key().expose_secret().to_string(),
            ),
            (HEADER_ACCESS_SIGN, self.signature.clone()),
            (HEADER_ACCESS_TIMESTAMP, self.timestamp.clone()),
            (
                HEADER_ACCESS_PASSPHRASE,
                credentials.passphrase().expose_secret().to_string(),
            ),
        ]
    }
}

/// 타임스탬프를 로케일과 무관한 초 단위 십진 문자열로 변환합니다.
///
/// 소수점은 항상 `.`이며 천 단위 구분자는 없습니다 (예: `1700000000.123`).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    format!("{}.{:03}", at.timestamp(), at.timestamp_subsec_millis())
}

/// 서명 대상 문자열을 만듭니다.
pub fn prehash(timestamp: &str, method: &str, path_and_query: &str, body: &str) -> Zeroizing<String> {
    let mut message =
        String::with_capacity(timestamp.len() + method.len() + path_and_query.len() + body.len());
    message.push_str(timestamp);
    message.push_str(&method.to_ascii_uppercase());
    message.push_str(path_and_query);
    message.push_str(body);
    Zeroizing::new(message)
}

/// 요청에 서명합니다.
///
/// # Errors
/// - 자격증명 중 하나라도 비어 있으면 `ExchangeError::NoAuthContext`
/// - 비밀 키가 올바른 Base64가 아니면 `ExchangeError::Configuration`
pub fn sign(
    credentials: &ApiCredentials,
    method: &str,
    path_and_query: &str,
    body: &str,
    timestamp: DateTime<Utc>,
) -> ExchangeResult<SignedRequest> {
    if !credentials.is_complete() {
        return Err(ExchangeError::NoAuthContext);
    }

    let timestamp = format_timestamp(timestamp);
    let method = method.to_ascii_uppercase();
    let message = prehash(&timestamp, &method, path_and_query, body);

    // 키 바이트와 서명 대상 문자열은 이 블록을 벗어나면 지워짐
    let signature = {
        let key = Zeroizing::new(
            BASE64
                .decode(credentials.private_key().expose_secret().trim())
                .map_err(|e| {
                    ExchangeError::Configuration(format!("private key is not valid base64: {}", e))
                })?,
        );
        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| ExchangeError::Configuration(e.to_string()))?;
        mac.update(message.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    };

    Ok(SignedRequest {
        timestamp,
        method,
        path: path_and_query.to_string(),
        body: body.to_string(),
        signature,
    })
}
