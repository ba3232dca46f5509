//! 스캔 주기 파이프라인.
//!
//! 스캔 → 랭킹 → 요약 알림 → 억제 필터 → 차트 알림 순서로 한 주기를 실행합니다.
//! 알림 실패는 로그만 남기고 주기를 계속 진행합니다.

use crate::config::ScannerConfig;
use crate::error::Result;
use crate::scan::Scanner;
use crate::silence::{SilenceFilter, SilenceKey};
use crate::stats::CycleReport;
use chrono::Utc;
use futures::FutureExt;
use scanner_analytics::rank_signals;
use scanner_core::SignalEntry;
use scanner_notification::{chart_caption, ChartRenderer, ChartRequest, NotificationManager};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// 파이프라인 실행 설정.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// 방향별 최대 선택 개수
    pub top_n: usize,
    /// 차트용 캔들 개수
    pub chart_candle_limit: usize,
    /// 차트 파일 디렉토리
    pub chart_dir: PathBuf,
    /// 재알림 금지 구간
    pub cooldown: chrono::Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            top_n: config.top_n,
            chart_candle_limit: config.chart_candle_limit,
            chart_dir: config.chart_dir(),
            cooldown: config.silence_window(),
        }
    }
}

/// 승인된 신호 하나의 차트 알림 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartDelivery {
    /// 차트를 그려 전송함
    Sent,
    /// 차트는 그렸지만 전송에 실패함
    SendFailed,
    /// 차트를 그리지 못해 텍스트로 대체함
    TextFallback,
}

/// 스캔 주기 파이프라인.
pub struct SignalPipeline {
    scanner: Scanner,
    notifier: NotificationManager,
    renderer: Arc<dyn ChartRenderer>,
    silence: SilenceFilter,
    settings: PipelineSettings,
}

impl SignalPipeline {
    pub fn new(
        scanner: Scanner,
        notifier: NotificationManager,
        renderer: Arc<dyn ChartRenderer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            scanner,
            notifier,
            renderer,
            silence: SilenceFilter::new(settings.cooldown),
            settings,
        }
    }

    pub fn interval(&self) -> &str {
        self.scanner.interval()
    }

    pub fn silence(&self) -> &SilenceFilter {
        &self.silence
    }

    /// 시작 알림을 보냅니다.
    pub async fn announce_start(&self) {
        if let Err(e) = self.notifier.notify_started(self.interval()).await {
            warn!(error = %e, "시작 알림 전송 실패");
        }
    }

    /// 한 주기를 실행합니다.
    ///
    /// 알림 실패는 에러로 반환하지 않습니다. `Err`는 차트 파일 정리 실패처럼
    /// 주기 자체가 잘못된 경우에만 반환됩니다.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let started = Instant::now();
        let mut report = CycleReport::new(uuid::Uuid::new_v4().to_string());
        info!(cycle_id = %report.cycle_id, interval = self.interval(), "스캔 주기 시작");

        let outcome = self.scanner.scan().await;
        report.symbols_with_data = outcome.symbols_with_data;
        report.symbols_empty = outcome.symbols_empty;
        report.detected = outcome.entries.len();

        let ranked = rank_signals(outcome.entries, self.settings.top_n);
        report.bullish = ranked.bullish.len();
        report.bearish = ranked.bearish.len();

        if ranked.is_empty() {
            if let Err(e) = self.notifier.notify_no_patterns().await {
                warn!(cycle_id = %report.cycle_id, error = %e, "신호 없음 알림 전송 실패");
            }
        } else {
            if let Err(e) = self
                .notifier
                .notify_scan_summary(self.interval(), &ranked.bullish, &ranked.bearish)
                .await
            {
                warn!(cycle_id = %report.cycle_id, error = %e, "요약 알림 전송 실패");
            }

            let now = Utc::now();
            for entry in ranked.iter() {
                if !self.silence.approve(&SilenceKey::from(entry), now) {
                    report.silenced += 1;
                    continue;
                }
                report.approved += 1;

                match self.post_chart(entry).await? {
                    ChartDelivery::Sent => report.charts_sent += 1,
                    ChartDelivery::SendFailed => report.chart_failures += 1,
                    ChartDelivery::TextFallback => report.chart_fallbacks += 1,
                }
            }
        }

        report.pruned = self.silence.prune(Utc::now());
        report.elapsed = started.elapsed();
        report.log_summary();
        Ok(report)
    }

    /// 승인된 신호의 차트를 그려 전송하고 파일을 정리합니다.
    ///
    /// 차트를 그리지 못하면 캡션을 텍스트로 보냅니다.
    async fn post_chart(&self, entry: &SignalEntry) -> Result<ChartDelivery> {
        let candles = self
            .scanner
            .source()
            .fetch_or_empty(&entry.symbol, self.interval(), self.settings.chart_candle_limit)
            .await;

        let path = self.settings.chart_dir.join(format!(
            "{}_{}.{}",
            entry.symbol.short,
            Utc::now().timestamp(),
            self.renderer.extension()
        ));
        let caption = chart_caption(entry.direction(), entry.label(), entry.score());
        let request = ChartRequest {
            symbol: &entry.symbol,
            label: entry.label(),
            candles: &candles,
        };

        match self.renderer.render(&request, &path) {
            Ok(()) => {
                let delivery = match self.notifier.notify_photo(&path, &caption).await {
                    Ok(()) => {
                        info!(symbol = %entry.symbol.short, label = entry.label(), score = entry.score(), "차트 알림 완료");
                        ChartDelivery::Sent
                    }
                    Err(e) => {
                        warn!(symbol = %entry.symbol.short, label = entry.label(), error = %e, "차트 전송 실패");
                        ChartDelivery::SendFailed
                    }
                };
                remove_artifact(&path).await?;
                Ok(delivery)
            }
            Err(e) => {
                warn!(
                    symbol = %entry.symbol.short,
                    label = entry.label(),
                    error = %e,
                    "차트 생성 실패, 텍스트로 대체"
                );
                remove_artifact(&path).await?;
                if let Err(e) = self.notifier.notify_pattern_alert(entry).await {
                    warn!(symbol = %entry.symbol.short, error = %e, "패턴 알림 전송 실패");
                }
                Ok(ChartDelivery::TextFallback)
            }
        }
    }

    /// 실패를 격리한 주기 실행.
    ///
    /// `Err`와 panic 모두 잡아서 에러 알림으로 보고하고 `None`을 반환합니다.
    pub async fn run_guarded_cycle(&mut self) -> Option<CycleReport> {
        let message = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(Ok(report)) => return Some(report),
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };

        error!(error = %message, "스캔 주기 실패");
        if let Err(e) = self.notifier.notify_cycle_failed(&message).await {
            warn!(error = %e, "에러 알림 전송 실패");
        }
        None
    }
}

/// 차트 파일을 삭제합니다. 이미 없으면 무시합니다.
async fn remove_artifact(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic: unknown cause".to_string()
    }
}
