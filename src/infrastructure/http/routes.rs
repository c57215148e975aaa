//! HTTP Routes
//!
//! API Endpoints:
//! - /                  GET   服务信息
//! - /health            GET   健康检查
//! - /model/info        GET   模型信息
//! - /synthesize        POST  单条合成，返回 WAV
//! - /batch_synthesize  POST  批量合成
//! - /synthesize_long   POST  长文本分段合成并合并

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/model/info", get(handlers::model_info))
        .route("/synthesize", post(handlers::synthesize))
        .route("/batch_synthesize", post(handlers::batch_synthesize))
        .route("/synthesize_long", post(handlers::synthesize_long))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::EngineHandle;
    use crate::config::AppConfig;
    use crate::infrastructure::adapters::FakeTtsEngine;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    async fn router(engine: EngineHandle) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.tts.use_fp16 = true;
        config.audio.output_dir = dir.path().join("outputs");
        config.audio.staging_dir = dir.path().join("staging");

        let state = AppState::from_config(&config, engine).await.unwrap();
        (dir, create_routes().with_state(Arc::new(state)))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_root_banner() {
        let (_dir, router) = router(EngineHandle::unavailable("not loaded")).await;
        let (status, body) = get_json(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_health_reports_engine_state() {
        let (_dir, router) = router(EngineHandle::unavailable("not loaded")).await;
        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tts_loaded"], false);

        let (_dir, router) = router_ready().await;
        let (_, body) = get_json(router, "/health").await;
        assert_eq!(body["tts_loaded"], true);
    }

    async fn router_ready() -> (tempfile::TempDir, Router) {
        router(EngineHandle::ready(Arc::new(FakeTtsEngine::with_defaults()))).await
    }

    #[tokio::test]
    async fn test_model_info() {
        let (_dir, router) = router(EngineHandle::unavailable("not loaded")).await;
        let (status, body) = get_json(router, "/model/info").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["errno"], 503);

        let (_dir, router) = router_ready().await;
        let (status, body) = get_json(router, "/model/info").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["model_loaded"], true);
        assert_eq!(body["data"]["variant"], "v2");
        assert_eq!(body["data"]["model_dir"], "index-tts/checkpoints");
        assert_eq!(body["data"]["use_fp16"], true);
        assert_eq!(body["data"]["use_deepspeed"], false);
    }
}
