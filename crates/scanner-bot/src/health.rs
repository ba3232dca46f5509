//! 프로세스 생존 확인 endpoint.
//!
//! 외부 모니터링이 프로세스가 살아 있는지만 확인합니다. 파이프라인 데이터는 노출하지 않습니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 생존 확인 응답 문구.
pub fn liveness_message(interval: &str) -> String {
    format!("{interval} pattern scanner with charts is running")
}

/// 생존 확인.
///
/// GET /
async fn liveness(State(message): State<Arc<str>>) -> impl IntoResponse {
    (StatusCode::OK, message.to_string())
}

/// 생존 확인 라우터 생성.
pub fn health_router(interval: &str) -> Router {
    let message: Arc<str> = Arc::from(liveness_message(interval));
    Router::new()
        .route("/", get(liveness))
        .layer(TraceLayer::new_for_http())
        .with_state(message)
}

/// 종료 토큰이 취소될 때까지 생존 확인 서버를 실행합니다.
pub async fn serve(
    addr: SocketAddr,
    interval: &str,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "생존 확인 서버 시작");

    axum::serve(listener, health_router(interval))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("생존 확인 서버 종료");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_liveness_returns_message() {
        let app = health_router("2h");

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"2h pattern scanner with charts is running");
    }

    #[tokio::test]
    async fn test_unknown_route_not_found() {
        let response = health_router("2h")
            .oneshot(Request::builder().uri("/signals").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_reports_bind_failure() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let result = serve(addr, "2h", CancellationToken::new()).await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AddrInUse);
    }
}
