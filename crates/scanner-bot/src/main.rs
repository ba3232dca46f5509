//! 차트 패턴 스캐너 CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use scanner_analytics::{rank_signals, PatternDetector};
use scanner_bot::{
    health, run_scheduler, PipelineSettings, ScannerConfig, Scanner, SignalPipeline,
};
use scanner_core::{init_logging, LogConfig};
use scanner_data::CoinalyzeClient;
use scanner_notification::{summary_line, NotificationManager, SvgChartRenderer, TelegramSender};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "scanner-bot")]
#[command(about = "Chart pattern scanner with Telegram alerts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// 설정 파일 경로 (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 스케줄러와 생존 확인 서버 실행 (기본값)
    Run,

    /// 한 주기만 실행
    Once,

    /// 알림 없이 현재 신호 출력
    Scan {
        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 로깅 초기화
    let mut log_config = LogConfig::from_env();
    if let Some(level) = cli.log_level {
        log_config = log_config.with_level(level);
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {e}"))?;

    // 설정 로드
    let config = ScannerConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;
    info!(
        interval = %config.interval,
        symbols = config.symbols.len(),
        period_secs = config.scan_interval_secs,
        "설정 로드 완료"
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Once => {
            let mut pipeline = build_pipeline(&config)?;
            if let Some(report) = pipeline.run_guarded_cycle().await {
                info!(selected = report.selected(), charts = report.charts_sent, "단일 주기 완료");
            }
            Ok(())
        }
        Commands::Scan { json } => scan(&config, json).await,
    }
}

/// 스케줄러와 생존 확인 서버를 함께 실행합니다.
async fn run(config: ScannerConfig) -> anyhow::Result<()> {
    // 자격 증명이 없으면 루프 시작 전에 종료
    let pipeline = build_pipeline(&config)?;
    let addr = config.server_addr()?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let scheduler = tokio::spawn(run_scheduler(
        pipeline,
        config.scan_period(),
        shutdown.clone(),
    ));

    let served = health::serve(addr, &config.interval, shutdown.clone()).await;
    if let Err(e) = &served {
        error!(%addr, error = %e, "생존 확인 서버 실패");
        shutdown.cancel();
    }

    // 진행 중인 주기가 끝날 때까지 대기
    match scheduler.await {
        Ok(cycles) => info!(cycles, "스캐너 종료"),
        Err(e) => warn!(error = %e, "스케줄러 태스크 비정상 종료"),
    }

    served.with_context(|| format!("생존 확인 서버 실패: {addr}"))
}

/// 알림 없이 한 번 스캔해서 결과를 출력합니다.
async fn scan(config: &ScannerConfig, json: bool) -> anyhow::Result<()> {
    let outcome = build_scanner(config).scan().await;
    let ranked = rank_signals(outcome.entries, config.top_n);

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }

    println!("Bullish");
    for entry in &ranked.bullish {
        println!("  {}", summary_line(entry));
    }
    println!("Bearish");
    for entry in &ranked.bearish {
        println!("  {}", summary_line(entry));
    }
    if ranked.is_empty() {
        println!("No strong new patterns detected.");
    }
    Ok(())
}

fn build_scanner(config: &ScannerConfig) -> Scanner {
    let source = Arc::new(CoinalyzeClient::new(config.coinalyze()));
    Scanner::new(
        source,
        PatternDetector::with_params(config.patterns),
        config.symbols.clone(),
        config.interval.clone(),
        config.candle_limit,
    )
}

fn build_pipeline(config: &ScannerConfig) -> anyhow::Result<SignalPipeline> {
    let telegram = config.telegram()?;

    let mut notifier = NotificationManager::new();
    notifier.add_sender(TelegramSender::new(telegram));

    Ok(SignalPipeline::new(
        build_scanner(config),
        notifier,
        Arc::new(SvgChartRenderer::default()),
        PipelineSettings::from_config(config),
    ))
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown.cancel();
    info!("Shutdown signal propagated to background tasks");
}
