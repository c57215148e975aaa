//! Data Transfer Objects

use serde::Serialize;

use crate::application::{BatchSynthesis, EngineVariant, LongFormSynthesis, UnitFailure};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// System DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tts_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub model_dir: String,
    pub config_path: String,
    pub use_v2: bool,
    /// 引擎侧加载选项，仅展示
    pub use_fp16: bool,
    pub use_cuda_kernel: bool,
    pub use_deepspeed: bool,
    pub variant: Option<EngineVariant>,
    pub model_loaded: bool,
}

// ============================================================================
// Synthesis DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BatchSynthesisResponse {
    pub message: String,
    pub request_id: String,
    pub success_count: usize,
    pub total_count: usize,
    pub output_dir: String,
    pub output_files: Vec<String>,
    pub failures: Vec<UnitFailure>,
}

impl From<BatchSynthesis> for BatchSynthesisResponse {
    fn from(batch: BatchSynthesis) -> Self {
        Self {
            message: format!(
                "Batch synthesis completed: {}/{} succeeded",
                batch.success_count(),
                batch.total_count
            ),
            request_id: batch.request_id.to_string(),
            success_count: batch.success_count(),
            total_count: batch.total_count,
            output_dir: batch.output_dir.display().to_string(),
            output_files: batch
                .outputs
                .iter()
                .map(|o| o.path.display().to_string())
                .collect(),
            failures: batch.failures,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LongFormResponse {
    #[serde(flatten)]
    pub batch: BatchSynthesisResponse,
    pub merged_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_error: Option<String>,
}

impl From<LongFormSynthesis> for LongFormResponse {
    fn from(result: LongFormSynthesis) -> Self {
        let mut batch = BatchSynthesisResponse::from(result.batch);
        batch.message = format!(
            "Long text synthesis completed: {}/{} chunks succeeded",
            batch.success_count, batch.total_count
        );
        Self {
            batch,
            merged_file: result.merged_file.map(|p| p.display().to_string()),
            merge_error: result.merge_error,
        }
    }
}
