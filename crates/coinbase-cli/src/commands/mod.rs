//! CLI 명령어 구현 모듈.

pub mod account;
pub mod credentials;
pub mod market;
pub mod output;

// 각 서브모듈 직접 사용 권장 (ambiguous re-export 방지)
