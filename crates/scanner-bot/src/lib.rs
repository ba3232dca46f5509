//! 차트 패턴 스캐너 봇.
//!
//! 이 crate는 스캔 주기를 구성하는 요소를 제공합니다:
//! - 설정 로드 (TOML + 환경변수)
//! - 심볼별 스캔 ([`Scanner`])
//! - 중복 알림 억제 ([`SilenceFilter`])
//! - 주기 파이프라인과 실패 격리 ([`SignalPipeline`])
//! - 스케줄러 루프와 생존 확인 endpoint

pub mod config;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod scan;
pub mod scheduler;
pub mod silence;
pub mod stats;

pub use self::config::{ScannerConfig, ServerConfig};
pub use error::{BotError, Result};
pub use health::{health_router, serve};
pub use pipeline::{PipelineSettings, SignalPipeline};
pub use scan::{ScanOutcome, Scanner};
pub use scheduler::run_scheduler;
pub use silence::{SilenceFilter, SilenceKey};
pub use stats::CycleReport;
