//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 캔들 조회 오류.
///
/// 스캐너는 어떤 오류든 "이번 주기에 해당 심볼 데이터 없음"으로 취급합니다.
#[derive(Debug, Error)]
pub enum DataError {
    /// 네트워크/전송 오류
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 성공이 아닌 HTTP 상태
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::InvalidData(err.to_string())
    }
}

/// 데이터 작업용 Result 타입.
pub type Result<T> = std::result::Result<T, DataError>;
