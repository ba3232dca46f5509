//! # Scanner Core
//!
//! 차트 패턴 스캐너의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 스캐너 전반에서 사용되는 기본 타입을 제공합니다:
//! - OHLC 캔들 데이터
//! - 거래 심볼 (거래소 식별자 + 표시용 단축 코드)
//! - 패턴 신호와 방향
//! - 로깅 인프라

pub mod logging;
pub mod types;

pub use logging::*;
pub use types::*;
