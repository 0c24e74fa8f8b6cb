//! 심볼(상품) 정의.
//!
//! Coinbase는 `BASE-QUOTE` 형식의 상품 ID(예: `BTC-USD`)를 사용합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 거래 가능한 상품을 나타내는 트레이딩 심볼.
///
/// 기준 자산과 호가 자산으로 구성됩니다. 예: BTC/USD.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// 기준 자산 (예: BTC, ETH)
    pub base: String,
    /// 호가 자산 (예: USD, EUR)
    pub quote: String,
}

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// 거래소 상품 ID(`BTC-USD`)에서 심볼을 파싱합니다.
    pub fn from_product_id(product_id: &str) -> Option<Self> {
        let (base, quote) = product_id.split_once('-')?;
        if base.is_empty() || quote.is_empty() || quote.contains('-') {
            return None;
        }
        Some(Self::new(base, quote))
    }

    /// "BASE/QUOTE" 형식 문자열에서 심볼을 파싱합니다.
    pub fn from_string(s: &str) -> Option<Self> {
        let (base, quote) = s.split_once('/')?;
        if base.is_empty() || quote.is_empty() {
            return None;
        }
        Some(Self::new(base, quote))
    }

    /// 거래소 상품 ID 형식을 반환합니다.
    pub fn product_id(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
