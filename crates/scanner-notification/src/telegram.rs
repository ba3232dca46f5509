//! 텔레그램 알림 서비스.
//!
//! Telegram Bot API를 통해 패턴 요약과 차트를 전송합니다.
//! 래스터 이미지는 `sendPhoto`, 그 외 첨부(SVG 등)는 `sendDocument`로 보냅니다.

use crate::types::{
    summary_line, Notification, NotificationError, NotificationEvent, NotificationResult,
    NotificationSender,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use scanner_core::SignalEntry;
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// 기본 Bot API 주소.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// 텔레그램 알림 전송 설정.
#[derive(Debug)]
pub struct TelegramConfig {
    /// @BotFather에서 받은 봇 토큰
    pub bot_token: SecretString,
    /// 메시지를 보낼 채팅 ID
    pub chat_id: String,
    /// 전송 활성화 여부
    pub enabled: bool,
    /// 파싱 모드 (HTML 또는 MarkdownV2, 없으면 일반 텍스트)
    pub parse_mode: Option<String>,
    /// Bot API 기본 URL
    pub api_base: String,
}

impl TelegramConfig {
    /// 새 텔레그램 설정을 생성합니다.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let bot_token: String = bot_token.into();
        Self {
            bot_token: SecretString::new(bot_token.into_boxed_str()),
            chat_id: chat_id.into(),
            enabled: true,
            parse_mode: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Bot API 기본 URL을 설정합니다.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// 환경 변수에서 설정을 생성합니다.
    ///
    /// `BOT_TOKEN`/`CHAT_ID`를 먼저 찾고, 없으면 `TELEGRAM_BOT_TOKEN`/`TELEGRAM_CHAT_ID`를 사용합니다.
    /// 둘 중 하나라도 비어 있으면 `None`입니다.
    pub fn from_env() -> Option<Self> {
        let bot_token = env_any(&["BOT_TOKEN", "TELEGRAM_BOT_TOKEN"])?;
        let chat_id = env_any(&["CHAT_ID", "TELEGRAM_CHAT_ID"])?;
        let enabled = std::env::var("TELEGRAM_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);

        let mut config = Self::new(bot_token, chat_id);
        config.enabled = enabled;
        Some(config)
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.bot_token.expose_secret(),
            method
        )
    }
}

fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

/// 텔레그램 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramSender {
    /// 새 텔레그램 전송기를 생성합니다.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 알림을 텔레그램 메시지로 포맷합니다.
    fn format_message(&self, notification: &Notification) -> String {
        let content = match &notification.event {
            NotificationEvent::ScannerStarted { interval } => {
                format!("✅ {interval} pattern scanner started with charts & deduplication.")
            }

            NotificationEvent::ScanSummary {
                interval,
                bullish,
                bearish,
            } => {
                format!(
                    "📊 {interval} pattern scan\n\n\
                     🟢 Bullish\n{}\n\n\
                     🔴 Bearish\n{}",
                    summary_section(bullish),
                    summary_section(bearish)
                )
            }

            NotificationEvent::NoPatterns => {
                "No strong new patterns detected this cycle.".to_string()
            }

            NotificationEvent::PatternAlert {
                label,
                direction,
                score,
                ..
            } => crate::types::chart_caption(*direction, label, *score),

            NotificationEvent::CycleFailed { message } => format!("⚠️ Bot error: {message}"),
        };

        let timestamp = notification.timestamp.format("%Y-%m-%d %H:%M UTC");
        format!("{content}\n\n🕐 {timestamp}")
    }

    /// 텔레그램에 원시 메시지를 전송합니다.
    async fn send_message(&self, text: &str) -> NotificationResult<()> {
        let mut params = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if let Some(mode) = &self.config.parse_mode {
            params["parse_mode"] = serde_json::Value::String(mode.clone());
        }

        debug!(chat_id = %self.config.chat_id, "Sending Telegram message");

        let response = self
            .client
            .post(self.config.method_url("sendMessage"))
            .json(&params)
            .send()
            .await
            .map_err(NotificationError::NetworkError)?;

        check_response(response, "text").await
    }

    /// 첨부 파일을 multipart로 전송합니다.
    async fn send_attachment(&self, path: &Path, caption: &str) -> NotificationResult<()> {
        let (method, field) = if is_raster_image(path) {
            ("sendPhoto", "photo")
        } else {
            ("sendDocument", "document")
        };

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chart".to_string());

        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .text("caption", caption.to_string())
            .part(field, Part::bytes(bytes).file_name(file_name));

        debug!(method, path = %path.display(), "Sending Telegram attachment");

        let response = self
            .client
            .post(self.config.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(NotificationError::NetworkError)?;

        check_response(response, field).await
    }
}

fn summary_section(entries: &[SignalEntry]) -> String {
    if entries.is_empty() {
        return "(none)".to_string();
    }
    entries.iter().map(summary_line).collect::<Vec<_>>().join("\n")
}

fn is_raster_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "webp" | "gif"
            )
        })
        .unwrap_or(false)
}

/// Bot API 응답 상태를 결과로 변환합니다.
async fn check_response(response: reqwest::Response, kind: &str) -> NotificationResult<()> {
    let status = response.status();
    if status.is_success() {
        info!(kind, status = status.as_u16(), "Telegram notification sent");
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();

    // 요청 한도 제한 확인
    if status.as_u16() == 429 {
        warn!(kind, "Telegram rate limited");
        return Err(NotificationError::RateLimited(60));
    }

    error!(kind, status = status.as_u16(), body = %body, "Telegram request failed");
    Err(NotificationError::SendFailed(format!("HTTP {}: {}", status, body)))
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        if !self.is_enabled() {
            debug!("Telegram notifications are disabled, skipping");
            return Ok(());
        }

        let message = self.format_message(notification);
        self.send_message(&message).await
    }

    async fn send_photo(&self, path: &Path, caption: &str) -> NotificationResult<()> {
        if !self.is_enabled() {
            debug!("Telegram notifications are disabled, skipping");
            return Ok(());
        }

        self.send_attachment(path, caption).await
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
            && !self.config.bot_token.expose_secret().is_empty()
            && !self.config.chat_id.is_empty()
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
