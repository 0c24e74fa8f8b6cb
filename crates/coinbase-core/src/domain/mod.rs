//! 커넥터가 상위 계층에 돌려주는 도메인 모델.

mod market_data;
mod order;

pub use market_data::*;
pub use order::*;
