//! # Scanner Notification
//!
//! 패턴 신호 알림 서비스.
//!
//! - Telegram 텍스트/이미지 전송 ([`TelegramSender`])
//! - 여러 전송기를 묶는 최선노력 전송 ([`NotificationManager`])
//! - 캔들스틱 차트 렌더링 ([`SvgChartRenderer`])

pub mod chart;
pub mod manager;
pub mod telegram;
pub mod types;

pub use chart::*;
pub use manager::*;
pub use telegram::*;
pub use types::*;
