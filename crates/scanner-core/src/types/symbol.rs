//! 스캔 대상 심볼 정의.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 스캔 대상 심볼.
///
/// 거래소 전체 식별자(예: `BTCUSDT_PERP.A`)와 알림에 쓰이는 단축 코드(예: `BTC`)의 쌍입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// 데이터 소스에 전달하는 전체 식별자
    pub id: String,
    /// 표시용 단축 코드
    pub short: String,
}

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(id: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            short: short.into(),
        }
    }

    /// 기본 스캔 대상 (BTC, ETH, XRP, SOL 무기한 선물).
    pub fn defaults() -> Vec<Symbol> {
        vec![
            Symbol::new("BTCUSDT_PERP.A", "BTC"),
            Symbol::new("ETHUSDT_PERP.A", "ETH"),
            Symbol::new("XRPUSDT_PERP.A", "XRP"),
            Symbol::new("SOLUSDT_PERP.A", "SOL"),
        ]
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_symbols() {
        let symbols = Symbol::defaults();
        assert_eq!(symbols.len(), 4);
        assert_eq!(symbols[0].id, "BTCUSDT_PERP.A");
        assert_eq!(symbols[3].short, "SOL");
    }

    #[test]
    fn test_display_uses_short_code() {
        assert_eq!(Symbol::new("ETHUSDT_PERP.A", "ETH").to_string(), "ETH");
    }
}
