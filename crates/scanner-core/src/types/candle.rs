//! OHLC 캔들 데이터.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLC 캔들 한 개.
///
/// 소스에서 가져온 뒤에는 변경되지 않습니다. 시퀀스는 시간 오름차순입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 시가
    pub open: f64,
    /// 고가
    pub high: f64,
    /// 저가
    pub low: f64,
    /// 종가
    pub close: f64,
    /// 캔들 시작 시각 (epoch 밀리초)
    pub timestamp: i64,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    pub fn new(open: f64, high: f64, low: f64, close: f64, timestamp: i64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            timestamp,
        }
    }

    /// 차트 색상 기준의 상승 캔들 여부 (종가 >= 시가).
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// 캔들 시작 시각을 UTC로 반환합니다.
    pub fn open_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// 네 가격이 모두 유한한 값인지 확인합니다.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// 캔들 시퀀스에서 분리한 종가/고가/저가 배열.
///
/// 패턴 감지기는 이 배열들만 읽습니다. 세 배열의 길이는 항상 같습니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub closes: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
}

impl PriceSeries {
    /// 캔들 슬라이스에서 가격 배열을 만듭니다.
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            closes: candles.iter().map(|c| c.close).collect(),
            highs: candles.iter().map(|c| c.high).collect(),
            lows: candles.iter().map(|c| c.low).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullish_includes_flat_candle() {
        assert!(Candle::new(100.0, 101.0, 99.0, 100.0, 0).is_bullish());
        assert!(Candle::new(100.0, 101.0, 99.0, 100.5, 0).is_bullish());
        assert!(!Candle::new(100.0, 101.0, 99.0, 99.5, 0).is_bullish());
    }

    #[test]
    fn test_open_time_from_millis() {
        let candle = Candle::new(1.0, 1.0, 1.0, 1.0, 1_700_000_000_000);
        let time = candle.open_time().unwrap();
        assert_eq!(time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_price_series_split() {
        let candles = vec![
            Candle::new(1.0, 3.0, 0.5, 2.0, 0),
            Candle::new(2.0, 4.0, 1.5, 3.0, 1),
        ];
        let series = PriceSeries::from_candles(&candles);
        assert_eq!(series.closes, vec![2.0, 3.0]);
        assert_eq!(series.highs, vec![3.0, 4.0]);
        assert_eq!(series.lows, vec![0.5, 1.5]);
        assert_eq!(series.len(), 2);
    }
}
