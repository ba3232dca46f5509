//! 알림 타입 및 trait 정의.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scanner_core::{Direction, SignalEntry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 알림 이벤트 타입.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// 스캐너 시작
    ScannerStarted { interval: String },
    /// 주기별 선택 신호 요약 (강세, 약세 순)
    ScanSummary {
        interval: String,
        bullish: Vec<SignalEntry>,
        bearish: Vec<SignalEntry>,
    },
    /// 이번 주기에 선택된 신호 없음
    NoPatterns,
    /// 차트 없이 전달되는 단일 패턴 알림
    PatternAlert {
        symbol: String,
        label: String,
        direction: Direction,
        score: f64,
    },
    /// 주기 실행 실패
    CycleFailed { message: String },
}

/// 알림 메시지.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// 고유 알림 ID
    pub id: String,
    /// 알림 이벤트
    pub event: NotificationEvent,
    /// 타임스탬프
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// 새 알림을 생성합니다.
    pub fn new(event: NotificationEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            timestamp: Utc::now(),
        }
    }
}

/// 차트 이미지에 붙는 캡션.
///
/// 강세는 🔥, 약세는 ❄️로 시작합니다.
pub fn chart_caption(direction: Direction, label: &str, score: f64) -> String {
    let emoji = match direction {
        Direction::Bullish => "🔥",
        Direction::Bearish => "❄️",
    };
    format!("{emoji} {label} (score {score:.2})")
}

/// 요약 메시지의 신호 한 줄.
pub fn summary_line(entry: &SignalEntry) -> String {
    format!(
        "{} → {} (score {:.2})",
        entry.symbol.short,
        entry.label(),
        entry.score()
    )
}

/// 알림 작업용 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    #[error("잘못된 설정: {0}")]
    InvalidConfig(String),

    #[error("요청 한도 초과: {0}초 후 재시도")]
    RateLimited(u64),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("첨부 파일 에러: {0}")]
    Io(#[from] std::io::Error),
}

/// 알림 전송기 trait.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 텍스트 알림을 전송합니다.
    async fn send(&self, notification: &Notification) -> NotificationResult<()>;

    /// 이미지 파일을 캡션과 함께 전송합니다.
    ///
    /// 파일 삭제는 호출자 책임입니다.
    async fn send_photo(&self, path: &Path, caption: &str) -> NotificationResult<()>;

    /// 전송기가 활성화되어 있는지 확인합니다.
    fn is_enabled(&self) -> bool;

    /// 전송기 이름을 반환합니다.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanner_core::{Signal, Symbol};

    #[test]
    fn test_chart_caption_by_direction() {
        assert_eq!(
            chart_caption(Direction::Bullish, "BTC: Cup & Handle", 0.8),
            "🔥 BTC: Cup & Handle (score 0.80)"
        );
        assert_eq!(
            chart_caption(Direction::Bearish, "ETH: Double Top", 0.75),
            "❄️ ETH: Double Top (score 0.75)"
        );
    }

    #[test]
    fn test_summary_line() {
        let entry = SignalEntry::new(
            Symbol::new("BTCUSDT_PERP.A", "BTC"),
            Signal::new(Direction::Bearish, 0.85, "BTC: Head & Shoulders"),
        );
        assert_eq!(summary_line(&entry), "BTC → BTC: Head & Shoulders (score 0.85)");
    }

    #[test]
    fn test_event_serialization_tag() {
        let value = serde_json::to_value(NotificationEvent::NoPatterns).unwrap();
        assert_eq!(value["type"], "no_patterns");
    }
}
