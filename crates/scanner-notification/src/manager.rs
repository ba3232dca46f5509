//! 여러 전송기를 묶는 알림 관리자.

use crate::types::{
    Notification, NotificationError, NotificationEvent, NotificationResult, NotificationSender,
};
use scanner_core::SignalEntry;
use std::path::Path;
use tracing::{debug, error};

/// 알림 관리자.
///
/// 활성화된 모든 전송기로 보내며, 활성 전송기가 전부 실패한 경우에만 에러를 반환합니다.
pub struct NotificationManager {
    senders: Vec<Box<dyn NotificationSender>>,
}

impl NotificationManager {
    /// 새 알림 관리자를 생성합니다.
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// 알림 전송기를 추가합니다.
    pub fn add_sender<S: NotificationSender + 'static>(&mut self, sender: S) {
        self.senders.push(Box::new(sender));
    }

    /// 활성화된 전송기가 하나라도 있는지 확인합니다.
    pub fn has_enabled_senders(&self) -> bool {
        self.senders.iter().any(|s| s.is_enabled())
    }

    fn enabled_count(&self) -> usize {
        self.senders.iter().filter(|s| s.is_enabled()).count()
    }

    /// 활성화된 모든 전송기를 통해 알림을 전송합니다.
    pub async fn notify(&self, notification: &Notification) -> NotificationResult<()> {
        let mut failures = 0;
        let mut last_error = None;

        for sender in self.senders.iter().filter(|s| s.is_enabled()) {
            if let Err(e) = sender.send(notification).await {
                error!(sender = sender.name(), error = %e, "알림 전송 실패");
                failures += 1;
                last_error = Some(e);
            }
        }

        self.resolve(failures, last_error)
    }

    /// 활성화된 모든 전송기로 이미지를 전송합니다.
    pub async fn notify_photo(&self, path: &Path, caption: &str) -> NotificationResult<()> {
        let mut failures = 0;
        let mut last_error = None;

        for sender in self.senders.iter().filter(|s| s.is_enabled()) {
            if let Err(e) = sender.send_photo(path, caption).await {
                error!(sender = sender.name(), path = %path.display(), error = %e, "이미지 전송 실패");
                failures += 1;
                last_error = Some(e);
            }
        }

        self.resolve(failures, last_error)
    }

    fn resolve(
        &self,
        failures: usize,
        last_error: Option<NotificationError>,
    ) -> NotificationResult<()> {
        match last_error {
            Some(e) if failures == self.enabled_count() => Err(e),
            _ => {
                if self.senders.is_empty() {
                    debug!("등록된 전송기 없음");
                }
                Ok(())
            }
        }
    }

    /// 스캐너 시작 알림.
    pub async fn notify_started(&self, interval: &str) -> NotificationResult<()> {
        self.notify(&Notification::new(NotificationEvent::ScannerStarted {
            interval: interval.to_string(),
        }))
        .await
    }

    /// 주기 요약 알림.
    pub async fn notify_scan_summary(
        &self,
        interval: &str,
        bullish: &[SignalEntry],
        bearish: &[SignalEntry],
    ) -> NotificationResult<()> {
        self.notify(&Notification::new(NotificationEvent::ScanSummary {
            interval: interval.to_string(),
            bullish: bullish.to_vec(),
            bearish: bearish.to_vec(),
        }))
        .await
    }

    /// 선택된 신호가 없을 때의 알림.
    pub async fn notify_no_patterns(&self) -> NotificationResult<()> {
        self.notify(&Notification::new(NotificationEvent::NoPatterns))
            .await
    }

    /// 차트 없이 단일 패턴을 텍스트로 알립니다.
    pub async fn notify_pattern_alert(&self, entry: &SignalEntry) -> NotificationResult<()> {
        self.notify(&Notification::new(NotificationEvent::PatternAlert {
            symbol: entry.symbol.short.clone(),
            label: entry.label().to_string(),
            direction: entry.direction(),
            score: entry.score(),
        }))
        .await
    }

    /// 주기 실패 알림.
    pub async fn notify_cycle_failed(&self, message: &str) -> NotificationResult<()> {
        self.notify(&Notification::new(NotificationEvent::CycleFailed {
            message: message.to_string(),
        }))
        .await
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scanner_core::{Direction, Signal, Symbol};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<NotificationEvent>>>,
        photos: Arc<Mutex<Vec<String>>>,
        fail: bool,
        enabled: bool,
    }

    impl Recorder {
        fn enabled() -> Self {
            Self {
                enabled: true,
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                enabled: true,
                fail: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl NotificationSender for Recorder {
        async fn send(&self, notification: &Notification) -> NotificationResult<()> {
            if self.fail {
                return Err(NotificationError::SendFailed("down".to_string()));
            }
            self.events.lock().unwrap().push(notification.event.clone());
            Ok(())
        }

        async fn send_photo(&self, _path: &Path, caption: &str) -> NotificationResult<()> {
            if self.fail {
                return Err(NotificationError::SendFailed("down".to_string()));
            }
            self.photos.lock().unwrap().push(caption.to_string());
            Ok(())
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn test_notify_reaches_enabled_senders() {
        let first = Recorder::enabled();
        let disabled = Recorder::default();
        let mut manager = NotificationManager::new();
        manager.add_sender(first.clone());
        manager.add_sender(disabled.clone());

        manager.notify_no_patterns().await.unwrap();

        assert_eq!(first.events.lock().unwrap().as_slice(), &[NotificationEvent::NoPatterns]);
        assert!(disabled.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_is_ok() {
        let ok = Recorder::enabled();
        let mut manager = NotificationManager::new();
        manager.add_sender(ok.clone());
        manager.add_sender(Recorder::failing());

        assert!(manager.notify_started("2h").await.is_ok());
        assert!(manager.notify_photo(Path::new("/tmp/x.svg"), "cap").await.is_ok());
        assert_eq!(ok.photos.lock().unwrap().as_slice(), &["cap".to_string()]);
    }

    #[tokio::test]
    async fn test_all_failed_is_error() {
        let mut manager = NotificationManager::new();
        manager.add_sender(Recorder::failing());

        assert!(manager.notify_cycle_failed("boom").await.is_err());
    }

    #[tokio::test]
    async fn test_no_senders() {
        let manager = NotificationManager::default();
        assert!(!manager.has_enabled_senders());
        assert!(manager.notify_no_patterns().await.is_ok());
    }

    #[tokio::test]
    async fn test_pattern_alert_event() {
        let recorder = Recorder::enabled();
        let mut manager = NotificationManager::new();
        manager.add_sender(recorder.clone());

        let entry = SignalEntry::new(
            Symbol::new("BTCUSDT_PERP.A", "BTC"),
            Signal::new(Direction::Bearish, 0.75, "BTC: Double Top"),
        );
        manager.notify_pattern_alert(&entry).await.unwrap();

        assert_eq!(
            recorder.events.lock().unwrap()[0],
            NotificationEvent::PatternAlert {
                symbol: "BTC".to_string(),
                label: "BTC: Double Top".to_string(),
                direction: Direction::Bearish,
                score: 0.75,
            }
        );
    }
}
