//! 심볼별 캔들 조회와 패턴 감지.

use scanner_analytics::PatternDetector;
use scanner_core::{SignalEntry, Symbol};
use scanner_data::CandleSource;
use std::sync::Arc;
use tracing::debug;

/// 한 번의 스캔 결과.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// 발견 순서 (심볼 순서, 감지기 순서) 그대로의 신호 목록
    pub entries: Vec<SignalEntry>,
    /// 캔들을 받은 심볼 수
    pub symbols_with_data: usize,
    /// 캔들이 비어 있던 심볼 수 (조회 실패 포함)
    pub symbols_empty: usize,
}

/// 설정된 모든 심볼을 순서대로 스캔합니다.
pub struct Scanner {
    source: Arc<dyn CandleSource>,
    detector: PatternDetector,
    symbols: Vec<Symbol>,
    interval: String,
    limit: usize,
}

impl Scanner {
    pub fn new(
        source: Arc<dyn CandleSource>,
        detector: PatternDetector,
        symbols: Vec<Symbol>,
        interval: impl Into<String>,
        limit: usize,
    ) -> Self {
        Self {
            source,
            detector,
            symbols,
            interval: interval.into(),
            limit,
        }
    }

    /// 차트용 캔들 조회에도 같은 소스를 씁니다.
    pub fn source(&self) -> &dyn CandleSource {
        self.source.as_ref()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    /// 모든 심볼의 신호를 하나의 목록으로 모읍니다.
    ///
    /// 데이터가 없는 심볼은 신호 없이 넘어갑니다.
    pub async fn scan(&self) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for symbol in &self.symbols {
            let candles = self
                .source
                .fetch_or_empty(symbol, &self.interval, self.limit)
                .await;

            if candles.is_empty() {
                outcome.symbols_empty += 1;
                continue;
            }
            outcome.symbols_with_data += 1;

            let signals = self.detector.detect(&symbol.short, &candles);
            debug!(
                symbol = %symbol.short,
                candles = candles.len(),
                signals = signals.len(),
                "심볼 스캔 완료"
            );

            outcome.entries.extend(
                signals
                    .into_iter()
                    .map(|signal| SignalEntry::new(symbol.clone(), signal)),
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scanner_core::{Candle, Direction};
    use scanner_data::{DataError, Result as DataResult};
    use std::collections::HashMap;

    struct MapSource(HashMap<String, Vec<Candle>>);

    #[async_trait]
    impl CandleSource for MapSource {
        async fn fetch_candles(
            &self,
            symbol: &Symbol,
            _interval: &str,
            _limit: usize,
        ) -> DataResult<Vec<Candle>> {
            self.0
                .get(&symbol.id)
                .cloned()
                .ok_or_else(|| DataError::InvalidData("unknown".to_string()))
        }

        fn name(&self) -> &str {
            "map"
        }
    }

    fn rising_wedge() -> Vec<Candle> {
        vec![
            Candle::new(100.0, 101.0, 99.0, 100.0, 0),
            Candle::new(100.0, 102.0, 98.0, 100.0, 1),
        ]
    }

    #[tokio::test]
    async fn test_scan_skips_missing_symbols() {
        let mut data = HashMap::new();
        data.insert("ETHUSDT_PERP.A".to_string(), rising_wedge());
        let scanner = Scanner::new(
            Arc::new(MapSource(data)),
            PatternDetector::new(),
            Symbol::defaults(),
            "2h",
            300,
        );

        let outcome = scanner.scan().await;

        assert_eq!(outcome.symbols_with_data, 1);
        assert_eq!(outcome.symbols_empty, 3);
        assert!(outcome.entries.iter().all(|e| e.symbol.short == "ETH"));
        assert!(outcome
            .entries
            .iter()
            .any(|e| e.label() == "ETH: Rising Wedge" && e.direction() == Direction::Bearish));
    }

    #[tokio::test]
    async fn test_scan_preserves_symbol_order() {
        let mut data = HashMap::new();
        for symbol in Symbol::defaults() {
            data.insert(symbol.id, rising_wedge());
        }
        let scanner = Scanner::new(
            Arc::new(MapSource(data)),
            PatternDetector::new(),
            Symbol::defaults(),
            "2h",
            300,
        );

        let outcome = scanner.scan().await;

        let wedges: Vec<&str> = outcome
            .entries
            .iter()
            .filter(|e| e.label().ends_with("Rising Wedge"))
            .map(|e| e.symbol.short.as_str())
            .collect();
        assert_eq!(wedges, vec!["BTC", "ETH", "XRP", "SOL"]);
    }
}
