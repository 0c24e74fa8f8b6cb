//! 보호된 자격증명 번들로 클라이언트를 만드는 통합 테스트.

use coinbase_core::{ApiCredentials, ConnectorConfig, CredentialEncryptor, MASTER_KEY_ENV};
use coinbase_exchange::{CoinbaseClient, ExchangeError};
use secrecy::SecretString;

/// 이 파일의 모든 테스트가 같은 값을 쓰므로 병렬 실행에도 안전함
const MASTER_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

fn config_with_bundle(entries: &[&str], dir: &tempfile::TempDir) -> ConnectorConfig {
    std::env::set_var(MASTER_KEY_ENV, MASTER_KEY);

    let encryptor = CredentialEncryptor::new(MASTER_KEY).unwrap();
    let path = dir.path().join("credentials.json");
    encryptor.seal(entries).unwrap().save(&path).unwrap();

    ConnectorConfig {
        credentials_path: Some(path),
        ..ConnectorConfig::default()
    }
}

#[test]
fn two_entry_bundle_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_bundle(&["public-key", "c2VjcmV0"], &dir);

    match CoinbaseClient::from_config(&config) {
        Err(ExchangeError::Configuration(message)) => assert!(message.contains("found 2")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("a two-entry bundle must be rejected"),
    }
}

#[test]
fn three_entry_bundle_enables_signed_calls() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_bundle(&["public-key", "c2VjcmV0", "passphrase"], &dir);

    let client = CoinbaseClient::from_config(&config).unwrap();
    assert!(client.has_credentials());
}

#[test]
fn wrong_entry_count_converts_to_configuration_error() {
    let secrets = vec![SecretString::from("only-one".to_string())];
    let err: ExchangeError = ApiCredentials::from_secrets(secrets).unwrap_err().into();
    assert!(err.is_fatal());
    assert!(matches!(err, ExchangeError::Configuration(_)));
}
