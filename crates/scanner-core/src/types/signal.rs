//! 패턴 감지기가 생성하는 신호.
//!
//! - `Direction` - 강세/약세
//! - `Signal` - 감지기 하나의 출력 (방향, 신뢰도, 레이블)
//! - `SignalEntry` - 스캔 결과 한 건 (심볼 + 신호)

use crate::types::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 신호 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// 강세
    Bullish,
    /// 약세
    Bearish,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
        }
    }
}

/// 감지기 하나가 생성한 신호.
///
/// 점수는 같은 방향 그룹 안에서의 정렬에만 쓰입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// 신호 방향
    pub direction: Direction,
    /// 신뢰도 (일반적으로 0.0 ~ 1.0, 높을수록 강함)
    pub score: f64,
    /// 사람이 읽는 패턴 이름 (예: "BTC: Head & Shoulders")
    pub label: String,
}

impl Signal {
    /// 새 신호를 생성합니다.
    pub fn new(direction: Direction, score: f64, label: impl Into<String>) -> Self {
        Self {
            direction,
            score,
            label: label.into(),
        }
    }
}

/// 스캔 결과 한 건.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEntry {
    /// 신호가 발생한 심볼
    pub symbol: Symbol,
    /// 신호
    #[serde(flatten)]
    pub signal: Signal,
}

impl SignalEntry {
    pub fn new(symbol: Symbol, signal: Signal) -> Self {
        Self { symbol, signal }
    }

    pub fn direction(&self) -> Direction {
        self.signal.direction
    }

    pub fn score(&self) -> f64 {
        self.signal.score
    }

    pub fn label(&self) -> &str {
        &self.signal.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serde_lowercase() {
        let json = serde_json::to_string(&Direction::Bearish).unwrap();
        assert_eq!(json, "\"bearish\"");
    }

    #[test]
    fn test_entry_flattens_signal() {
        let entry = SignalEntry::new(
            Symbol::new("BTCUSDT_PERP.A", "BTC"),
            Signal::new(Direction::Bullish, 0.8, "BTC: Cup & Handle"),
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["direction"], "bullish");
        assert_eq!(value["label"], "BTC: Cup & Handle");
        assert_eq!(value["symbol"]["short"], "BTC");
    }
}
