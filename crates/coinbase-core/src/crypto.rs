//! # 암호화 모듈
//!
//! AES-256-GCM을 사용한 API 자격증명 번들 암호화/복호화 기능을 제공합니다.
//!
//! ## 보안 고려사항
//! - 마스터 키는 환경변수(`COINBASE_MASTER_KEY`)에서 로드
//! - 각 암호화마다 고유한 nonce (12바이트) 사용
//! - 복호화된 평문은 `Zeroizing` 버퍼에 담겨 사용 직후 지워짐
//! - 자격증명은 `SecretString`으로만 보관되며 직렬화되지 않음

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use secrecy::{zeroize::Zeroizing, ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// 암호화 에러
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid master key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid nonce length: expected 12 bytes, got {0}")]
    InvalidNonceLength(usize),

    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("UTF-8 decode error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("Master key not configured")]
    MasterKeyNotConfigured,

    #[error("Credential bundle must contain exactly 3 entries, found {0}")]
    InvalidBundle(usize),

    #[error("Malformed credential bundle: {0}")]
    MalformedBundle(String),

    #[error("Bundle I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// AES-256-GCM nonce 크기 (바이트)
pub const NONCE_SIZE: usize = 12;

/// AES-256 키 크기 (바이트)
pub const KEY_SIZE: usize = 32;

/// 마스터 키 환경변수 이름
pub const MASTER_KEY_ENV: &str = "COINBASE_MASTER_KEY";

/// 디스크에 저장되는 보호된 자격증명 번들.
///
/// 평문은 문자열의 JSON 배열이며, 커넥터는 정확히 세 개
/// (공개 키, 비밀 키, 패스프레이즈)를 요구합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedBundle {
    /// Base64 인코딩된 nonce
    pub nonce: String,
    /// Base64 인코딩된 암호문
    pub ciphertext: String,
}

impl ProtectedBundle {
    /// JSON 파일에서 번들을 읽습니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CryptoError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| CryptoError::MalformedBundle(e.to_string()))
    }

    /// 번들을 JSON 파일로 저장합니다.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CryptoError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CryptoError::MalformedBundle(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// 자격증명 암호화 관리자
pub struct CredentialEncryptor {
    cipher: Aes256Gcm,
}

impl CredentialEncryptor {
    /// 마스터 키로 암호화 관리자 생성
    ///
    /// # Arguments
    /// * `master_key` - Base64로 인코딩된 32바이트 마스터 키
    pub fn new(master_key: &str) -> Result<Self, CryptoError> {
        let key_bytes = Self::decode_key(master_key)?;
        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// `COINBASE_MASTER_KEY` 환경변수에서 생성
    pub fn from_env() -> Result<Self, CryptoError> {
        let key = Zeroizing::new(
            std::env::var(MASTER_KEY_ENV).map_err(|_| CryptoError::MasterKeyNotConfigured)?,
        );
        Self::new(key.trim())
    }

    fn decode_key(master_key: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let key_bytes = Zeroizing::new(BASE64.decode(master_key)?);

        if key_bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength(key_bytes.len()));
        }

        Ok(key_bytes)
    }

    /// 랜덤 nonce 생성
    pub fn generate_nonce() -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }

    /// 문자열 암호화
    ///
    /// # Returns
    /// * `(encrypted_data, nonce)` - 암호화된 데이터와 사용된 nonce
    pub fn encrypt(&self, plaintext: &str) -> Result<(Vec<u8>, [u8; NONCE_SIZE]), CryptoError> {
        let nonce_bytes = Self::generate_nonce();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok((ciphertext, nonce_bytes))
    }

    /// 암호화된 데이터 복호화
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &[u8]) -> Result<Zeroizing<String>, CryptoError> {
        if nonce.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength(nonce.len()));
        }

        let nonce = Nonce::from_slice(nonce);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        Ok(Zeroizing::new(String::from_utf8(plaintext)?))
    }

    /// 비밀 값 목록을 보호된 번들로 봉인
    pub fn seal(&self, secrets: &[&str]) -> Result<ProtectedBundle, CryptoError> {
        let json = Zeroizing::new(
            serde_json::to_string(secrets)
                .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?,
        );
        let (ciphertext, nonce) = self.encrypt(&json)?;

        Ok(ProtectedBundle {
            nonce: BASE64.encode(nonce),
            ciphertext: BASE64.encode(ciphertext),
        })
    }

    /// 보호된 번들을 열어 비밀 값 목록을 반환
    pub fn open(&self, bundle: &ProtectedBundle) -> Result<Vec<SecretString>, CryptoError> {
        let nonce = BASE64.decode(&bundle.nonce)?;
        let ciphertext = BASE64.decode(&bundle.ciphertext)?;
        let json = self.decrypt(&ciphertext, &nonce)?;

        let entries: Vec<String> = serde_json::from_str(&json)
            .map_err(|e| CryptoError::MalformedBundle(e.to_string()))?;

        Ok(entries.into_iter().map(SecretString::from).collect())
    }
}

/// 새로운 마스터 키 생성 (초기 설정용)
///
/// # Example
/// ```
/// let key = coinbase_core::crypto::generate_master_key();
/// assert!(coinbase_core::crypto::CredentialEncryptor::new(&key).is_ok());
/// ```
pub fn generate_master_key() -> String {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(&mut key[..]);
    BASE64.encode(&key[..])
}

/// 거래소 API 자격증명.
///
/// 세 값 모두 `SecretString`으로 보관되며, `Debug` 출력은 마스킹되고
/// 직렬화는 구현하지 않습니다. 값은 서명/전송 시점에만 노출됩니다.
#[derive(Debug)]
pub struct ApiCredentials {
    public_key: SecretString,
    private_key: SecretString,
    passphrase: SecretString,
}

impl ApiCredentials {
    /// 세 비밀 값으로 자격증명 생성.
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            public_key: SecretString::from(public_key.into()),
            private_key: SecretString::from(private_key.into()),
            passphrase: SecretString::from(passphrase.into()),
        }
    }

    /// 번들에서 복호화한 비밀 값 목록으로 생성.
    ///
    /// 정확히 세 개가 아니면 `CryptoError::InvalidBundle`을 반환합니다.
    pub fn from_secrets(secrets: Vec<SecretString>) -> Result<Self, CryptoError> {
        let count = secrets.len();
        let [public_key, private_key, passphrase]: [SecretString; 3] = secrets
            .try_into()
            .map_err(|_| CryptoError::InvalidBundle(count))?;

        Ok(Self {
            public_key,
            private_key,
            passphrase,
        })
    }

    /// 보호된 번들 파일을 열어 자격증명 생성.
    pub fn from_bundle_file<P: AsRef<Path>>(
        path: P,
        encryptor: &CredentialEncryptor,
    ) -> Result<Self, CryptoError> {
        let bundle = ProtectedBundle::load(path)?;
        Self::from_secrets(encryptor.open(&bundle)?)
    }

    /// 환경 변수에서 생성.
    ///
    /// `COINBASE_API_KEY`, `COINBASE_API_SECRET`, `COINBASE_API_PASSPHRASE`가
    /// 모두 설정되어 있어야 합니다.
    pub fn from_env() -> Option<Self> {
        Some(Self::new(
            std::env::var("COINBASE_API_KEY").ok()?,
            std::env::var("COINBASE_API_SECRET").ok()?,
            std::env::var("COINBASE_API_PASSPHRASE").ok()?,
        ))
    }

    /// 세 값이 모두 비어 있지 않은지 확인.
    pub fn is_complete(&self) -> bool {
        !self.public_key.expose_secret().trim().is_empty()
            && !self.private_key.expose_secret().trim().is_empty()
            && !self.passphrase.expose_secret().trim().is_empty()
    }

    /// 공개 API 키.
    pub fn public_key(&self) -> &SecretString {
        &self.public_key
    }

    /// Base64 인코딩된 서명용 비밀 키.
    pub fn private_key(&self) -> &SecretString {
        &self.private_key
    }

    /// API 패스프레이즈.
    pub fn passphrase(&self) -> &SecretString {
        &self.passphrase
    }
}
