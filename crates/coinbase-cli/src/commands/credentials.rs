//! 자격증명 번들 생성.
//!
//! 공개 키, 비밀 키, 패스프레이즈를 마스터 키(AES-256-GCM)로 암호화해
//! `{ "nonce", "ciphertext" }` JSON 파일로 저장합니다. 커넥터는
//! `credentials_path` 설정과 `COINBASE_MASTER_KEY`로 이 파일을 엽니다.

use std::path::Path;

use anyhow::{Context, Result};
use coinbase_core::{generate_master_key, CredentialEncryptor, MASTER_KEY_ENV};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

/// 번들에 넣을 세 비밀 값.
pub struct CredentialInput {
    pub public_key: SecretString,
    pub private_key: SecretString,
    pub passphrase: SecretString,
}

impl CredentialInput {
    /// `COINBASE_API_KEY`, `COINBASE_API_SECRET`, `COINBASE_API_PASSPHRASE`에서 읽습니다.
    pub fn from_env() -> Result<Self> {
        let read = |name: &str| -> Result<SecretString> {
            std::env::var(name)
                .map(SecretString::from)
                .with_context(|| format!("{} is not set", name))
        };

        Ok(Self {
            public_key: read("COINBASE_API_KEY")?,
            private_key: read("COINBASE_API_SECRET")?,
            passphrase: read("COINBASE_API_PASSPHRASE")?,
        })
    }
}

/// 마스터 키 결정: 환경 변수 값을 쓰거나, 요청 시 새로 생성합니다.
///
/// 새로 생성한 경우 두 번째 값이 `true`입니다.
pub fn resolve_master_key(generate: bool) -> Result<(SecretString, bool)> {
    if generate {
        return Ok((SecretString::from(generate_master_key()), true));
    }

    let key = std::env::var(MASTER_KEY_ENV).with_context(|| {
        format!(
            "{} is not set. Set it or pass --generate-key to create one",
            MASTER_KEY_ENV
        )
    })?;
    Ok((SecretString::from(key), false))
}

/// 세 값을 암호화해 `output`에 저장합니다.
pub fn seal_credentials(input: &CredentialInput, master_key: &SecretString, output: &Path) -> Result<()> {
    let encryptor = CredentialEncryptor::new(master_key.expose_secret().trim())
        .context("Invalid master key")?;

    let bundle = encryptor
        .seal(&[
            input.public_key.expose_secret(),
            input.private_key.expose_secret(),
            input.passphrase.expose_secret(),
        ])
        .context("Failed to encrypt credentials")?;

    bundle
        .save(output)
        .with_context(|| format!("Failed to write bundle: {}", output.display()))?;

    info!("Credential bundle written to: {}", output.display());
    Ok(())
}
