//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 시세, 호가창, 체결 조회
//! - 과거 체결 백필 출력
//! - 잔고와 주문 관리
//! - 자격증명 번들 생성

pub mod commands;
