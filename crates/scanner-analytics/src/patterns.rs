//! 차트 패턴 감지기 묶음.
//!
//! 캔들 시퀀스 하나의 종가/고가/저가 배열에 고정 임계값 규칙을 적용합니다.
//! 각 감지기는 독립적으로 평가되며, 한 시퀀스에서 여러 패턴이 동시에 나올 수 있습니다.
//!
//! ## 지원 패턴
//! - **Double Top** (약세): 마지막 종가 < 최고 고가 × 0.97
//! - **Double Bottom** (강세): 마지막 종가 > 최저 저가 × 1.03
//! - **Head & Shoulders** (약세): 중앙 고가가 ±2 위치 고가보다 높음
//! - **Cup & Handle** (강세): 마지막 종가 > 전체 평균, 그리고 > 앞부분 종가 최고치
//! - **Falling Wedge** (강세): 고가 하락 + 저가 상승
//! - **Rising Wedge** (약세): 고가 상승 + 저가 하락
//! - **Bull/Bear Flag**: 최근 10개 종가가 2% 범위 안에서 횡보
//!
//! Double Top과 Double Bottom은 상호 배타적이지 않으며 동시에 발생할 수 있습니다.

use scanner_core::{Candle, Direction, PriceSeries, Signal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{PatternError, PatternResult};

/// 패턴 유형.
///
/// [`PatternKind::ALL`]의 순서가 감지 결과의 순서입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    DoubleTop,
    DoubleBottom,
    HeadAndShoulders,
    CupAndHandle,
    FallingWedge,
    RisingWedge,
    /// 방향은 횡보 구간 이전 평균 대비 마지막 종가로 결정됩니다.
    Flag,
}

impl PatternKind {
    /// 평가 순서대로 나열한 전체 패턴.
    pub const ALL: [PatternKind; 7] = [
        PatternKind::DoubleTop,
        PatternKind::DoubleBottom,
        PatternKind::HeadAndShoulders,
        PatternKind::CupAndHandle,
        PatternKind::FallingWedge,
        PatternKind::RisingWedge,
        PatternKind::Flag,
    ];

    /// 패턴별 고정 신뢰도.
    pub fn score(&self) -> f64 {
        match self {
            PatternKind::DoubleTop | PatternKind::DoubleBottom => 0.75,
            PatternKind::HeadAndShoulders => 0.85,
            PatternKind::CupAndHandle => 0.80,
            PatternKind::FallingWedge | PatternKind::RisingWedge => 0.70,
            PatternKind::Flag => 0.65,
        }
    }
}

/// 패턴 감지 임계값.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternParams {
    /// Double Top: 최고 고가 대비 종가 비율 상한 (기본: 0.97)
    pub double_top_ratio: f64,
    /// Double Bottom: 최저 저가 대비 종가 비율 하한 (기본: 1.03)
    pub double_bottom_ratio: f64,
    /// Head & Shoulders: 중앙에서 어깨까지 거리 (기본: 2)
    pub shoulder_offset: usize,
    /// Cup & Handle: 비교에서 제외할 최근 캔들 수 (기본: 20)
    pub cup_lookback: usize,
    /// Flag: 횡보 판단 구간 (기본: 10)
    pub flag_window: usize,
    /// Flag: 구간 최고/최저 종가 비율 상한 (기본: 1.02)
    pub flag_range_ratio: f64,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            double_top_ratio: 0.97,
            double_bottom_ratio: 1.03,
            shoulder_offset: 2,
            cup_lookback: 20,
            flag_window: 10,
            flag_range_ratio: 1.02,
        }
    }
}

/// 패턴 감지기 묶음.
#[derive(Debug, Clone, Default)]
pub struct PatternDetector {
    params: PatternParams,
}

impl PatternDetector {
    /// 기본 임계값으로 감지기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자 정의 임계값으로 감지기를 생성합니다.
    pub fn with_params(params: PatternParams) -> Self {
        Self { params }
    }

    /// 패턴 하나를 평가하는 데 필요한 최소 캔들 수.
    pub fn min_candles(&self, kind: PatternKind) -> usize {
        match kind {
            PatternKind::DoubleTop | PatternKind::DoubleBottom => 1,
            PatternKind::HeadAndShoulders => self
                .params
                .shoulder_offset
                .saturating_mul(2)
                .saturating_add(1),
            PatternKind::CupAndHandle => self.params.cup_lookback.saturating_add(1),
            PatternKind::FallingWedge | PatternKind::RisingWedge => 2,
            PatternKind::Flag => self.params.flag_window.max(1).saturating_add(1),
        }
    }

    /// 모든 감지기를 평가하는 데 필요한 최소 캔들 수.
    pub fn required_candles(&self) -> usize {
        PatternKind::ALL
            .iter()
            .map(|kind| self.min_candles(*kind))
            .max()
            .unwrap_or(1)
    }

    /// 캔들 시퀀스에서 현재 성립하는 패턴 신호를 감지합니다.
    ///
    /// 시퀀스가 특정 감지기의 최소 길이보다 짧으면 그 감지기만 건너뜁니다.
    ///
    /// # 인자
    /// * `short` - 레이블에 들어갈 심볼 단축 코드
    /// * `candles` - 시간 오름차순 캔들
    pub fn detect(&self, short: &str, candles: &[Candle]) -> Vec<Signal> {
        let series = PriceSeries::from_candles(candles);

        PatternKind::ALL
            .iter()
            .filter_map(|kind| {
                let required = self.min_candles(*kind);
                if series.len() < required {
                    debug!(
                        symbol = short,
                        pattern = ?kind,
                        required,
                        provided = series.len(),
                        "캔들 부족으로 감지기 건너뜀"
                    );
                    return None;
                }

                self.evaluate(*kind, &series).map(|(direction, name)| {
                    Signal::new(direction, kind.score(), format!("{short}: {name}"))
                })
            })
            .collect()
    }

    /// 모든 감지기의 최소 길이를 요구하는 엄격한 감지.
    ///
    /// 시퀀스가 [`required_candles`](Self::required_candles)보다 짧으면 에러를 반환합니다.
    pub fn try_detect(&self, short: &str, candles: &[Candle]) -> PatternResult<Vec<Signal>> {
        let required = self.required_candles();
        if candles.len() < required {
            return Err(PatternError::InsufficientData {
                required,
                provided: candles.len(),
            });
        }

        Ok(self.detect(short, candles))
    }

    /// 단일 패턴 평가. 성립하면 (방향, 패턴 이름)을 반환합니다.
    ///
    /// 호출 전에 길이 조건이 확인되어 있어야 합니다.
    fn evaluate(&self, kind: PatternKind, series: &PriceSeries) -> Option<(Direction, &'static str)> {
        let p = &self.params;
        let c = &series.closes;
        let h = &series.highs;
        let l = &series.lows;
        let len = series.len();
        let last_close = c[len - 1];

        match kind {
            PatternKind::DoubleTop => {
                (last_close < max(h) * p.double_top_ratio).then_some((Direction::Bearish, "Double Top"))
            }
            PatternKind::DoubleBottom => (last_close > min(l) * p.double_bottom_ratio)
                .then_some((Direction::Bullish, "Double Bottom")),
            PatternKind::HeadAndShoulders => {
                let mid = len / 2;
                let off = p.shoulder_offset;
                (h[mid] > h[mid - off] && h[mid] > h[mid + off])
                    .then_some((Direction::Bearish, "Head & Shoulders"))
            }
            PatternKind::CupAndHandle => {
                let rim = max(&c[..len - p.cup_lookback]);
                (last_close > mean(c) && last_close > rim)
                    .then_some((Direction::Bullish, "Cup & Handle"))
            }
            PatternKind::FallingWedge => (h[len - 1] < h[len - 2] && l[len - 1] > l[len - 2])
                .then_some((Direction::Bullish, "Falling Wedge")),
            PatternKind::RisingWedge => (h[len - 1] > h[len - 2] && l[len - 1] < l[len - 2])
                .then_some((Direction::Bearish, "Rising Wedge")),
            PatternKind::Flag => {
                let window = p.flag_window.max(1);
                let recent = &c[len - window..];
                let low = min(recent);
                // 0 이하 가격에서는 비율이 의미 없음
                if low <= 0.0 || max(recent) / low >= p.flag_range_ratio {
                    return None;
                }
                if last_close > mean(&c[..len - window]) {
                    Some((Direction::Bullish, "Bull Flag"))
                } else {
                    Some((Direction::Bearish, "Bear Flag"))
                }
            }
        }
    }
}

/// 기본 임계값으로 패턴을 감지합니다.
pub fn detect_patterns(short: &str, candles: &[Candle]) -> Vec<Signal> {
    PatternDetector::new().detect(short, candles)
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
