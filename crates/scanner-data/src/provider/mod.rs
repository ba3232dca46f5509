//! 캔들 데이터 Provider 모듈.
//!
//! ## Coinalyze
//! - `CoinalyzeClient`: 선물 OHLC 캔들 조회 (`/candles`)

pub mod coinalyze;

pub use coinalyze::{CoinalyzeClient, CoinalyzeConfig};

use async_trait::async_trait;
use scanner_core::{Candle, Symbol};
use tracing::warn;

use crate::Result;

/// 심볼/인터벌/개수로 캔들 시퀀스를 제공하는 소스.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// 시간 오름차순 캔들을 조회합니다.
    async fn fetch_candles(&self, symbol: &Symbol, interval: &str, limit: usize)
        -> Result<Vec<Candle>>;

    /// 소스 이름 (로그용).
    fn name(&self) -> &str;

    /// 조회 실패를 빈 결과로 낮춰서 반환합니다.
    ///
    /// 실패는 로그로만 남고 호출자에게 전파되지 않습니다.
    async fn fetch_or_empty(&self, symbol: &Symbol, interval: &str, limit: usize) -> Vec<Candle> {
        match self.fetch_candles(symbol, interval, limit).await {
            Ok(candles) => candles,
            Err(e) => {
                warn!(
                    source = self.name(),
                    symbol = %symbol.id,
                    error = %e,
                    "캔들 조회 실패, 빈 데이터로 처리"
                );
                Vec::new()
            }
        }
    }
}
