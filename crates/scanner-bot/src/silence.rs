//! 중복 알림 억제 필터.
//!
//! (심볼 단축 코드, 레이블) 키별로 마지막 승인 시각을 기록하고,
//! 쿨다운 구간 안에 같은 키가 다시 나오면 차트 알림을 억제합니다.

use chrono::{DateTime, Duration, Utc};
use scanner_core::SignalEntry;
use std::collections::HashMap;
use tracing::info;

/// 억제 판단 키.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SilenceKey {
    pub symbol: String,
    pub label: String,
}

impl SilenceKey {
    pub fn new(symbol: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            label: label.into(),
        }
    }
}

impl From<&SignalEntry> for SilenceKey {
    fn from(entry: &SignalEntry) -> Self {
        Self::new(entry.symbol.short.clone(), entry.label())
    }
}

/// 키별 쿨다운 필터.
///
/// 단일 스케줄러 워커만 갱신하므로 내부 잠금은 없습니다.
#[derive(Debug, Clone)]
pub struct SilenceFilter {
    cooldown: Duration,
    last_approved: HashMap<SilenceKey, DateTime<Utc>>,
}

impl SilenceFilter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_approved: HashMap::new(),
        }
    }

    /// 키를 확인하고, 승인되면 즉시 `now`를 기록합니다.
    ///
    /// 마지막 승인 후 쿨다운이 지나지 않았으면 `false`를 반환하고 기록은 그대로 둡니다.
    pub fn approve(&mut self, key: &SilenceKey, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_approved.get(key) {
            if now - *last < self.cooldown {
                info!(
                    symbol = %key.symbol,
                    label = %key.label,
                    elapsed_secs = (now - *last).num_seconds(),
                    "silenced duplicate signal"
                );
                return false;
            }
        }

        self.last_approved.insert(key.clone(), now);
        true
    }

    /// 쿨다운 이상 지난 기록을 제거하고 제거 개수를 반환합니다.
    ///
    /// 제거된 기록은 더 이상 어떤 키도 억제하지 못하므로 판단 결과는 달라지지 않습니다.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.last_approved.len();
        let cooldown = self.cooldown;
        self.last_approved.retain(|_, last| now - *last < cooldown);
        before - self.last_approved.len()
    }

    pub fn len(&self) -> usize {
        self.last_approved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_approved.is_empty()
    }
}
