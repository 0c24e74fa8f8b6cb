//! Coinbase Exchange REST 커넥터.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Exchange trait: 통합 거래소 인터페이스
//! - 요청 서명 (Base64 비밀 키 + HMAC-SHA256 + 패스프레이즈 헤더)
//! - 거래소 주문 상태 → 정규화된 주문 생명주기 변환
//! - 과거 체결 백필 스트림 (시간 창 순회, 페이지 간 대기)
//! - 교체 가능한 HTTP 전송 계층

pub mod connector;
pub mod error;
pub mod history;
pub mod traits;
pub mod transport;

pub use connector::{CoinbaseClient, PageCursor};
pub use error::*;
pub use history::{HistoryWalker, WalkMode};
pub use traits::*;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
