//! 신호 랭킹과 선택.
//!
//! 스캔 결과를 강세/약세 그룹으로 나누고, 그룹별로 신뢰도 내림차순 정렬 후
//! 상위 N개만 남깁니다. 점수가 같으면 발견 순서를 유지합니다 (안정 정렬).

use scanner_core::{Direction, SignalEntry};
use serde::Serialize;

/// 방향별 최대 선택 개수 기본값.
pub const DEFAULT_TOP_N: usize = 5;

/// 방향별로 정렬·선택된 신호.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedSignals {
    /// 강세 신호 (신뢰도 내림차순)
    pub bullish: Vec<SignalEntry>,
    /// 약세 신호 (신뢰도 내림차순)
    pub bearish: Vec<SignalEntry>,
}

impl RankedSignals {
    /// 선택된 신호가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.bullish.is_empty() && self.bearish.is_empty()
    }

    /// 선택된 전체 신호 수.
    pub fn len(&self) -> usize {
        self.bullish.len() + self.bearish.len()
    }

    /// 강세 그룹, 약세 그룹 순서로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &SignalEntry> {
        self.bullish.iter().chain(self.bearish.iter())
    }
}

/// 스캔 결과를 방향별로 랭킹합니다.
///
/// 방향이 다른 신호끼리는 점수를 비교하지 않습니다.
pub fn rank_signals<I>(entries: I, top_n: usize) -> RankedSignals
where
    I: IntoIterator<Item = SignalEntry>,
{
    let (mut bullish, mut bearish): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| entry.direction() == Direction::Bullish);

    select_top(&mut bullish, top_n);
    select_top(&mut bearish, top_n);

    RankedSignals { bullish, bearish }
}

fn select_top(group: &mut Vec<SignalEntry>, top_n: usize) {
    // sort_by는 안정 정렬이므로 동점은 발견 순서를 유지
    group.sort_by(|a, b| b.score().total_cmp(&a.score()));
    group.truncate(top_n);
}
