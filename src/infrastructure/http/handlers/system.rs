//! System Handlers
//!
//! 服务信息、健康检查、模型信息

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{
    ApiResponse, HealthResponse, ModelInfoResponse, RootResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 服务信息
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "IndexTTS API Server",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

/// 健康检查，引擎未加载时仍返回 200
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        tts_loaded: state.engine.is_ready(),
    })
}

/// 模型信息
pub async fn model_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ModelInfoResponse>>, ApiError> {
    if let Some(reason) = state.engine.unavailable_reason() {
        return Err(ApiError::ServiceUnavailable(format!(
            "TTS model not loaded: {}",
            reason
        )));
    }

    Ok(Json(ApiResponse::success(ModelInfoResponse {
        model_dir: state.tts.model_dir.clone(),
        config_path: state.tts.config_path.clone(),
        use_v2: state.tts.use_v2,
        use_fp16: state.tts.use_fp16,
        use_cuda_kernel: state.tts.use_cuda_kernel,
        use_deepspeed: state.tts.use_deepspeed,
        variant: state.engine.variant(),
        model_loaded: true,
    })))
}
