//! # Coinbase Core
//!
//! Coinbase 커넥터의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 커넥터 전반에서 사용되는 기본 타입을 제공합니다:
//! - 주문 결과 및 주문 생명주기 상태
//! - 체결, 시세, 호가창 구조체
//! - 심볼(상품 ID) 정의
//! - 설정 관리
//! - 로깅 인프라
//! - 자격증명 암호화/복호화

pub mod config;
pub mod crypto;
pub mod domain;
pub mod logging;
pub mod types;

pub use self::config::*;
pub use crypto::{
    generate_master_key, ApiCredentials, CredentialEncryptor, CryptoError, ProtectedBundle,
    MASTER_KEY_ENV,
};
pub use domain::*;
pub use logging::*;
pub use types::*;
