//! 캔들스틱 차트 렌더링.
//!
//! 최근 캔들 구간을 SVG 이미지로 그립니다. 상승 캔들은 녹색, 하락 캔들은 빨간색이며
//! 제목은 `"{short} - {label}"` 형식입니다.

use scanner_core::{Candle, Symbol};
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const BULL_COLOR: &str = "#26a69a";
const BEAR_COLOR: &str = "#ef5350";
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;
const Y_TICKS: usize = 5;
const X_TICKS: usize = 6;

/// 차트 렌더링 에러.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("차트를 그릴 캔들이 없습니다")]
    EmptySeries,

    #[error("차트 파일 쓰기 실패: {0}")]
    Io(#[from] std::io::Error),
}

pub type ChartResult<T> = Result<T, ChartError>;

/// 차트 한 장의 입력.
#[derive(Debug, Clone, Copy)]
pub struct ChartRequest<'a> {
    pub symbol: &'a Symbol,
    pub label: &'a str,
    pub candles: &'a [Candle],
}

impl ChartRequest<'_> {
    /// 차트 제목.
    pub fn title(&self) -> String {
        format!("{} - {}", self.symbol.short, self.label)
    }
}

/// 차트 렌더러 trait.
pub trait ChartRenderer: Send + Sync {
    /// 차트를 `path`에 씁니다.
    fn render(&self, request: &ChartRequest<'_>, path: &Path) -> ChartResult<()>;

    /// 출력 파일 확장자 (점 없이).
    fn extension(&self) -> &str;
}

/// SVG 캔들스틱 렌더러.
#[derive(Debug, Clone, Copy)]
pub struct SvgChartRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
        }
    }
}

impl SvgChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// SVG 문서를 문자열로 생성합니다.
    pub fn to_svg(&self, request: &ChartRequest<'_>) -> ChartResult<String> {
        let candles = request.candles;
        if candles.is_empty() {
            return Err(ChartError::EmptySeries);
        }

        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let plot_w = (width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
        let plot_h = (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);

        let mut low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let mut high = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        if (high - low).abs() < f64::EPSILON {
            // 평평한 구간
            low -= 1.0;
            high += 1.0;
        }

        let slot = plot_w / candles.len() as f64;
        let body_w = (slot * 0.6).max(1.0);
        let y = |price: f64| MARGIN_TOP + (high - price) / (high - low) * plot_h;
        let x_center = |i: usize| MARGIN_LEFT + slot * (i as f64 + 0.5);

        // String에 대한 write!는 실패하지 않음
        let mut svg = String::with_capacity(candles.len() * 160 + 1024);
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        let _ = writeln!(svg, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="24" font-family="sans-serif" font-size="16" text-anchor="middle">{}</text>"#,
            width / 2.0,
            escape_xml(&request.title())
        );

        // 가격 축
        for i in 0..=Y_TICKS {
            let price = low + (high - low) * i as f64 / Y_TICKS as f64;
            let py = y(price);
            let _ = writeln!(
                svg,
                r##"<line x1="{:.1}" y1="{py:.1}" x2="{:.1}" y2="{py:.1}" stroke="#eeeeee"/>"##,
                MARGIN_LEFT,
                MARGIN_LEFT + plot_w
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="end">{}</text>"#,
                MARGIN_LEFT - 6.0,
                py + 3.0,
                format_price(price)
            );
        }

        // 시간 축
        let step = (candles.len() / X_TICKS).max(1);
        for i in (0..candles.len()).step_by(step) {
            let label = candles[i]
                .open_time()
                .map(|t| t.format("%m-%d %Hh").to_string())
                .unwrap_or_default();
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="middle">{}</text>"#,
                x_center(i),
                height - MARGIN_BOTTOM + 16.0,
                label
            );
        }

        for (i, candle) in candles.iter().enumerate() {
            let color = if candle.is_bullish() { BULL_COLOR } else { BEAR_COLOR };
            let cx = x_center(i);
            let top = y(candle.open.max(candle.close));
            let bottom = y(candle.open.min(candle.close));
            let _ = writeln!(
                svg,
                r#"<line x1="{cx:.1}" y1="{:.1}" x2="{cx:.1}" y2="{:.1}" stroke="{color}"/>"#,
                y(candle.high),
                y(candle.low)
            );
            let _ = writeln!(
                svg,
                r#"<rect x="{:.1}" y="{top:.1}" width="{body_w:.1}" height="{:.1}" fill="{color}"/>"#,
                cx - body_w / 2.0,
                (bottom - top).max(1.0)
            );
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, request: &ChartRequest<'_>, path: &Path) -> ChartResult<()> {
        let svg = self.to_svg(request)?;
        std::fs::write(path, svg)?;
        debug!(path = %path.display(), candles = request.candles.len(), "차트 생성 완료");
        Ok(())
    }

    fn extension(&self) -> &str {
        "svg"
    }
}

fn format_price(price: f64) -> String {
    if price.abs() >= 100.0 {
        format!("{price:.0}")
    } else if price.abs() >= 1.0 {
        format!("{price:.2}")
    } else {
        format!("{price:.4}")
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles() -> Vec<Candle> {
        vec![
            Candle::new(100.0, 105.0, 99.0, 104.0, 1_700_000_000_000),
            Candle::new(104.0, 106.0, 101.0, 102.0, 1_700_007_200_000),
            Candle::new(102.0, 103.0, 100.0, 102.5, 1_700_014_400_000),
        ]
    }

    #[test]
    fn test_svg_contains_escaped_title_and_colors() {
        let symbol = Symbol::new("BTCUSDT_PERP.A", "BTC");
        let candles = candles();
        let request = ChartRequest {
            symbol: &symbol,
            label: "BTC: Head & Shoulders",
            candles: &candles,
        };

        let svg = SvgChartRenderer::default().to_svg(&request).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("BTC - BTC: Head &amp; Shoulders"));
        assert!(svg.contains(BULL_COLOR));
        assert!(svg.contains(BEAR_COLOR));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_empty_series_rejected() {
        let symbol = Symbol::new("BTCUSDT_PERP.A", "BTC");
        let request = ChartRequest {
            symbol: &symbol,
            label: "x",
            candles: &[],
        };
        assert!(matches!(
            SvgChartRenderer::default().to_svg(&request),
            Err(ChartError::EmptySeries)
        ));
    }

    #[test]
    fn test_flat_series_renders() {
        let symbol = Symbol::new("XRPUSDT_PERP.A", "XRP");
        let flat = vec![Candle::new(0.5, 0.5, 0.5, 0.5, 0); 4];
        let request = ChartRequest {
            symbol: &symbol,
            label: "XRP: Flag",
            candles: &flat,
        };
        let svg = SvgChartRenderer::default().to_svg(&request).unwrap();
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn test_render_writes_file() {
        let symbol = Symbol::new("ETHUSDT_PERP.A", "ETH");
        let candles = candles();
        let request = ChartRequest {
            symbol: &symbol,
            label: "ETH: Double Top",
            candles: &candles,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ETH_chart.svg");

        SvgChartRenderer::default().render(&request, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("ETH - ETH: Double Top"));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(64250.4), "64250");
        assert_eq!(format_price(2.5), "2.50");
        assert_eq!(format_price(0.51234), "0.5123");
    }
}
