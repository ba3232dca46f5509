//! 주기 실행 루프.

use crate::pipeline::SignalPipeline;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// 종료 토큰이 취소될 때까지 `period`마다 파이프라인을 실행합니다.
///
/// 첫 주기는 즉시 실행됩니다. 실행 중인 주기는 끝까지 진행한 뒤 종료 여부를 확인합니다.
/// 반환값은 실행한 주기 수입니다.
pub async fn run_scheduler(
    mut pipeline: SignalPipeline,
    period: Duration,
    shutdown: CancellationToken,
) -> u64 {
    info!(
        interval = pipeline.interval(),
        period_secs = period.as_secs(),
        "=== 스케줄러 시작 ==="
    );
    pipeline.announce_start().await;

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut cycles = 0u64;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("종료 신호 수신, 스케줄러 종료 중...");
                break;
            }
            _ = ticker.tick() => {
                pipeline.run_guarded_cycle().await;
                cycles += 1;
                info!(
                    cycles,
                    next_in_secs = period.as_secs(),
                    "=== 주기 완료, 다음 실행 대기 ==="
                );
            }
        }
    }

    info!(cycles, "스케줄러 종료");
    cycles
}
