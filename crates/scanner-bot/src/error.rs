//! 에러 타입 정의.

use thiserror::Error;

/// 스캐너 봇 에러 타입
#[derive(Debug, Error)]
pub enum BotError {
    /// 설정 값 에러 (필수 값 누락 등)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 설정 소스 로드 에러
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// 파일 시스템 에러 (차트 파일 정리 등)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, BotError>;
