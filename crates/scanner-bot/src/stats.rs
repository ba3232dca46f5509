//! 주기 실행 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 한 주기의 실행 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleReport {
    /// 주기 ID
    pub cycle_id: String,
    /// 캔들을 받은 심볼 수
    pub symbols_with_data: usize,
    /// 캔들이 비어 있던 심볼 수
    pub symbols_empty: usize,
    /// 감지된 전체 신호 수
    pub detected: usize,
    /// 선택된 강세 신호 수
    pub bullish: usize,
    /// 선택된 약세 신호 수
    pub bearish: usize,
    /// 억제 필터를 통과한 신호 수
    pub approved: usize,
    /// 억제된 신호 수
    pub silenced: usize,
    /// 전송에 성공한 차트 수
    pub charts_sent: usize,
    /// 그렸지만 전송에 실패한 차트 수
    pub chart_failures: usize,
    /// 차트 대신 텍스트로 보낸 수
    pub chart_fallbacks: usize,
    /// 만료되어 제거된 억제 기록 수
    pub pruned: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CycleReport {
    /// 새 통계 객체 생성
    pub fn new(cycle_id: impl Into<String>) -> Self {
        Self {
            cycle_id: cycle_id.into(),
            ..Default::default()
        }
    }

    /// 선택된 전체 신호 수
    pub fn selected(&self) -> usize {
        self.bullish + self.bearish
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            cycle_id = %self.cycle_id,
            symbols_with_data = self.symbols_with_data,
            symbols_empty = self.symbols_empty,
            detected = self.detected,
            bullish = self.bullish,
            bearish = self.bearish,
            approved = self.approved,
            silenced = self.silenced,
            charts_sent = self.charts_sent,
            chart_failures = self.chart_failures,
            chart_fallbacks = self.chart_fallbacks,
            pruned = self.pruned,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "스캔 주기 완료"
        );
    }
}
