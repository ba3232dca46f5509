//! Coinalyze 선물 캔들 API 클라이언트.
//!
//! `GET {base_url}/candles?symbol=..&interval=..&limit=..` 응답은 캔들 레코드 배열입니다.
//! 가격 필드는 숫자 또는 숫자 문자열로 올 수 있습니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use scanner_data::{CandleSource, CoinalyzeClient, CoinalyzeConfig};
//!
//! let client = CoinalyzeClient::new(CoinalyzeConfig::from_env());
//! let candles = client.fetch_candles(&symbol, "2h", 300).await?;
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use scanner_core::{Candle, Symbol};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

use super::CandleSource;
use crate::{DataError, Result};

/// 기본 API 주소.
pub const DEFAULT_BASE_URL: &str = "https://api.coinalyze.net/v1/futures";

/// 기본 요청 타임아웃.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Coinalyze 클라이언트 설정.
#[derive(Debug)]
pub struct CoinalyzeConfig {
    /// API 기본 URL
    pub base_url: String,
    /// API 키 (`api_key` 헤더로 전송, 선택)
    pub api_key: Option<SecretString>,
    /// 요청당 타임아웃
    pub timeout: Duration,
}

impl Default for CoinalyzeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CoinalyzeConfig {
    /// 새 설정을 생성합니다.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// 요청 타임아웃을 설정합니다.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// API 키를 설정합니다.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key: String = api_key.into();
        self.api_key = Some(SecretString::new(api_key.into_boxed_str()));
        self
    }

    /// 환경 변수 `COINALYZE_API_KEY`에서 API 키를 읽어 기본 설정을 만듭니다.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("COINALYZE_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(SecretString::new(key.into_boxed_str()));
            }
        }
        config
    }
}

/// Coinalyze 캔들 클라이언트.
pub struct CoinalyzeClient {
    client: reqwest::Client,
    config: CoinalyzeConfig,
}

impl CoinalyzeClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(config: CoinalyzeConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .expect("HTTP 클라이언트 생성 실패"),
            config,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[async_trait]
impl CandleSource for CoinalyzeClient {
    async fn fetch_candles(
        &self,
        symbol: &Symbol,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/candles", self.config.base_url.trim_end_matches('/'));
        let limit = limit.to_string();

        let mut request = self.client.get(&url).query(&[
            ("symbol", symbol.id.as_str()),
            ("interval", interval),
            ("limit", limit.as_str()),
        ]);
        if let Some(key) = &self.config.api_key {
            request = request.header("api_key", key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DataError::Timeout(format!("{} ({}s)", symbol.id, self.config.timeout.as_secs()))
            } else {
                DataError::Network(e)
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload: serde_json::Value = response.json().await?;
        let candles = parse_candles(payload)?;

        debug!(symbol = %symbol.id, interval, candles = candles.len(), "캔들 조회 완료");
        Ok(candles)
    }

    fn name(&self) -> &str {
        "coinalyze"
    }
}

/// 응답 본문을 캔들 목록으로 변환합니다.
fn parse_candles(payload: serde_json::Value) -> Result<Vec<Candle>> {
    if !payload.is_array() {
        return Err(DataError::InvalidData(
            "캔들 응답이 배열이 아닙니다".to_string(),
        ));
    }

    let records: Vec<RawCandle> = serde_json::from_value(payload)?;
    let candles: Vec<Candle> = records.into_iter().map(Candle::from).collect();

    if let Some(bad) = candles.iter().find(|c| !c.is_finite()) {
        return Err(DataError::InvalidData(format!(
            "유한하지 않은 가격 (timestamp {})",
            bad.timestamp
        )));
    }

    Ok(candles)
}

/// API 캔들 레코드.
#[derive(Debug, Deserialize)]
struct RawCandle {
    #[serde(deserialize_with = "number_or_string")]
    open: f64,
    #[serde(deserialize_with = "number_or_string")]
    high: f64,
    #[serde(deserialize_with = "number_or_string")]
    low: f64,
    #[serde(deserialize_with = "number_or_string")]
    close: f64,
    #[serde(deserialize_with = "number_or_string")]
    timestamp: f64,
}

impl From<RawCandle> for Candle {
    fn from(raw: RawCandle) -> Self {
        Candle::new(raw.open, raw.high, raw.low, raw.close, raw.timestamp as i64)
    }
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
