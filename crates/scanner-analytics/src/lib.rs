//! 차트 패턴 분석.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 패턴 감지기 묶음 ([`patterns`]): 캔들 시퀀스 하나에서 휴리스틱 패턴 신호 생성
//! - 랭킹 ([`ranking`]): 방향별 분리, 신뢰도 내림차순 정렬, 상위 N개 선택
//!
//! 두 모듈 모두 I/O가 없는 순수 함수입니다.

pub mod patterns;
pub mod ranking;

use thiserror::Error;

pub use patterns::{detect_patterns, PatternDetector, PatternKind, PatternParams};
pub use ranking::{rank_signals, RankedSignals, DEFAULT_TOP_N};

/// 패턴 분석 오류.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    /// 데이터 부족 오류
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },
}

/// 패턴 분석 결과 타입.
pub type PatternResult<T> = Result<T, PatternError>;
