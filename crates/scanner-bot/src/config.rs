//! 스캐너 설정 모듈.
//!
//! 기본값 → TOML 파일(선택) → `SCANNER__*` 환경변수 순으로 덮어씁니다.
//! `PORT` 환경변수가 있으면 서버 포트를 덮어씁니다.

use crate::error::{BotError, Result};
use scanner_analytics::{PatternDetector, PatternParams, DEFAULT_TOP_N};
use scanner_core::Symbol;
use scanner_data::CoinalyzeConfig;
use scanner_notification::TelegramConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 스캐너 전체 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// 스캔 대상 심볼
    pub symbols: Vec<Symbol>,
    /// 캔들 인터벌 (예: "2h")
    pub interval: String,
    /// 패턴 감지용 캔들 개수
    pub candle_limit: usize,
    /// 차트용 캔들 개수
    pub chart_candle_limit: usize,
    /// 방향별 최대 선택 개수
    pub top_n: usize,
    /// 스캔 주기 (초)
    pub scan_interval_secs: u64,
    /// 동일 신호 재알림 금지 구간 (초)
    pub silence_secs: u64,
    /// 캔들 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 캔들 API 기본 URL
    pub data_base_url: String,
    /// Telegram Bot API 기본 URL
    pub telegram_api_base: String,
    /// 차트 파일 디렉토리 (없으면 시스템 임시 디렉토리)
    pub chart_dir: Option<PathBuf>,
    /// 패턴 임계값
    pub patterns: PatternParams,
    /// 상태 확인 서버 설정
    pub server: ServerConfig,
}

/// 상태 확인 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            symbols: Symbol::defaults(),
            interval: "2h".to_string(),
            candle_limit: 300,
            chart_candle_limit: 120,
            top_n: DEFAULT_TOP_N,
            scan_interval_secs: 7200,
            silence_secs: 21600,
            request_timeout_secs: 15,
            data_base_url: scanner_data::provider::coinalyze::DEFAULT_BASE_URL.to_string(),
            telegram_api_base: scanner_notification::DEFAULT_API_BASE.to_string(),
            chart_dir: None,
            patterns: PatternParams::default(),
            server: ServerConfig::default(),
        }
    }
}

impl ScannerConfig {
    /// 파일(선택)과 환경변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("SCANNER")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: ScannerConfig = builder.build()?.try_deserialize()?;
        config.server.port = env_var_parse("PORT", config.server.port);
        config.validate()?;
        Ok(config)
    }

    /// 설정 값 검증.
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(BotError::Config("스캔 대상 심볼이 없습니다".to_string()));
        }
        if self.scan_interval_secs == 0 {
            return Err(BotError::Config(
                "scan_interval_secs는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.interval.trim().is_empty() {
            return Err(BotError::Config("interval이 비어 있습니다".to_string()));
        }
        self.validate_patterns()
    }

    /// 패턴 임계값 검증.
    ///
    /// 비율은 유한한 양수여야 하고, 모든 감지기가 `candle_limit` 안에서 평가 가능해야 합니다.
    fn validate_patterns(&self) -> Result<()> {
        let p = &self.patterns;
        let ratios = [
            ("double_top_ratio", p.double_top_ratio),
            ("double_bottom_ratio", p.double_bottom_ratio),
            ("flag_range_ratio", p.flag_range_ratio),
        ];
        for (name, value) in ratios {
            if !value.is_finite() || value <= 0.0 {
                return Err(BotError::Config(format!(
                    "patterns.{name}는 유한한 양수여야 합니다: {value}"
                )));
            }
        }

        let required = PatternDetector::with_params(*p).required_candles();
        if required > self.candle_limit {
            return Err(BotError::Config(format!(
                "패턴 구간이 candle_limit보다 깁니다: 필요 {required}, candle_limit {}",
                self.candle_limit
            )));
        }
        Ok(())
    }

    /// 스캔 주기를 Duration으로 반환
    pub fn scan_period(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    /// 재알림 금지 구간
    pub fn silence_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.silence_secs as i64)
    }

    /// 캔들 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn chart_dir(&self) -> PathBuf {
        self.chart_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// 상태 확인 서버 바인드 주소
    pub fn server_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| BotError::Config(format!("잘못된 서버 주소: {}", e)))
    }

    /// 캔들 클라이언트 설정 (`COINALYZE_API_KEY` 포함)
    pub fn coinalyze(&self) -> CoinalyzeConfig {
        CoinalyzeConfig {
            base_url: self.data_base_url.clone(),
            timeout: self.request_timeout(),
            ..CoinalyzeConfig::from_env()
        }
    }

    /// Telegram 자격 증명을 환경변수에서 읽습니다.
    ///
    /// 봇 토큰이나 채팅 ID가 없으면 시작할 수 없습니다.
    pub fn telegram(&self) -> Result<TelegramConfig> {
        TelegramConfig::from_env()
            .map(|config| config.with_api_base(self.telegram_api_base.clone()))
            .ok_or_else(|| {
                BotError::Config(
                    "BOT_TOKEN과 CHAT_ID 환경변수가 설정되지 않았습니다".to_string(),
                )
            })
    }
}

/// 환경변수 파싱 헬퍼
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_defaults() {
        let config = ScannerConfig::default();

        assert_eq!(config.symbols.len(), 4);
        assert_eq!(config.interval, "2h");
        assert_eq!(config.candle_limit, 300);
        assert_eq!(config.chart_candle_limit, 120);
        assert_eq!(config.top_n, 5);
        assert_eq!(config.scan_period(), Duration::from_secs(7200));
        assert_eq!(config.silence_window(), chrono::Duration::hours(6));
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.chart_dir(), std::env::temp_dir());
        assert!(config.validate().is_ok());
    }

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const CREDENTIAL_KEYS: [&str; 4] = ["BOT_TOKEN", "CHAT_ID", "TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID"];

    /// 자격 증명 환경변수를 지정 값으로 바꾼 채 `f`를 실행하고 원래 값을 복원합니다.
    fn with_credentials<R>(values: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let previous: Vec<(&str, Option<String>)> = CREDENTIAL_KEYS
            .iter()
            .map(|key| (*key, std::env::var(key).ok()))
            .collect();

        for key in CREDENTIAL_KEYS {
            std::env::remove_var(key);
        }
        for (key, value) in values {
            std::env::set_var(key, value);
        }

        let result = f();

        for (key, value) in previous {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
        result
    }

    #[test]
    fn test_telegram_requires_credentials() {
        let missing = with_credentials(&[], || ScannerConfig::default().telegram());
        assert!(matches!(missing, Err(BotError::Config(_))));

        let no_chat = with_credentials(&[("BOT_TOKEN", "123:abc")], || {
            ScannerConfig::default().telegram()
        });
        assert!(matches!(no_chat, Err(BotError::Config(_))));
    }

    #[test]
    fn test_telegram_rejects_blank_credentials() {
        let blank = with_credentials(&[("BOT_TOKEN", "123:abc"), ("CHAT_ID", "   ")], || {
            ScannerConfig::default().telegram()
        });
        assert!(matches!(blank, Err(BotError::Config(_))));

        let blank_token = with_credentials(&[("BOT_TOKEN", ""), ("CHAT_ID", "42")], || {
            ScannerConfig::default().telegram()
        });
        assert!(matches!(blank_token, Err(BotError::Config(_))));
    }

    #[test]
    fn test_telegram_falls_back_to_prefixed_names() {
        let config = with_credentials(
            &[("TELEGRAM_BOT_TOKEN", "123:abc"), ("TELEGRAM_CHAT_ID", "42")],
            || ScannerConfig::default().telegram(),
        )
        .unwrap();
        assert_eq!(config.chat_id, "42");
        assert_eq!(config.api_base, scanner_notification::DEFAULT_API_BASE);

        // 비어 있는 기본 이름은 건너뜀
        let config = with_credentials(
            &[("CHAT_ID", " "), ("BOT_TOKEN", "1:x"), ("TELEGRAM_CHAT_ID", "7")],
            || ScannerConfig::default().telegram(),
        )
        .unwrap();
        assert_eq!(config.chat_id, "7");
    }

    #[test]
    fn test_validate_rejects_bad_pattern_ratios() {
        for ratio in [f64::NAN, f64::INFINITY, 0.0, -1.0] {
            let config = ScannerConfig {
                patterns: PatternParams {
                    flag_range_ratio: ratio,
                    ..Default::default()
                },
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(BotError::Config(_))), "ratio {ratio}");
        }
    }

    #[test]
    fn test_validate_rejects_lookback_beyond_candle_limit() {
        let huge = ScannerConfig {
            patterns: PatternParams {
                cup_lookback: usize::MAX,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(BotError::Config(_))));

        let short_limit = ScannerConfig {
            candle_limit: 10,
            ..Default::default()
        };
        assert!(matches!(short_limit.validate(), Err(BotError::Config(_))));

        let fits = ScannerConfig {
            candle_limit: 21,
            ..Default::default()
        };
        assert!(fits.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanner.toml");
        std::fs::write(
            &path,
            r#"
interval = "4h"
silence_secs = 60

[[symbols]]
id = "DOGEUSDT_PERP.A"
short = "DOGE"

[server]
host = "127.0.0.1"
"#,
        )
        .unwrap();

        let config = ScannerConfig::load(Some(&path)).unwrap();

        assert_eq!(config.interval, "4h");
        assert_eq!(config.silence_secs, 60);
        assert_eq!(config.symbols, vec![Symbol::new("DOGEUSDT_PERP.A", "DOGE")]);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.candle_limit, 300);
    }

    #[test]
    fn test_validate_rejects_empty_symbols() {
        let config = ScannerConfig {
            symbols: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BotError::Config(_))));
    }

    #[test]
    fn test_server_addr() {
        let config = ScannerConfig::default();
        assert_eq!(config.server_addr().unwrap().port(), 10000);

        let bad = ScannerConfig {
            server: ServerConfig {
                host: "not a host".to_string(),
                port: 1,
            },
            ..Default::default()
        };
        assert!(bad.server_addr().is_err());
    }
}
