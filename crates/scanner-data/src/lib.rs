//! 캔들 데이터 소스.
//!
//! 이 crate는 다음을 제공합니다:
//! - 캔들 소스 추상화 ([`CandleSource`])
//! - Coinalyze 선물 캔들 API 클라이언트

pub mod error;
pub mod provider;

pub use error::{DataError, Result};
pub use provider::{CandleSource, CoinalyzeClient, CoinalyzeConfig};
