//! TTS Engine Port - 合成引擎抽象
//!
//! 引擎对编排层是黑盒：输入文本、参考音频路径、情感参数，输出编码后的音频

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::EmotionParams;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write output audio: {0}")]
    OutputWrite(String),
}

/// 引擎版本，加载时确定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineVariant {
    /// 仅支持文本 + 参考音频
    V1,
    /// 支持情感控制和随机采样
    V2,
}

impl EngineVariant {
    pub fn from_use_v2(use_v2: bool) -> Self {
        if use_v2 {
            EngineVariant::V2
        } else {
            EngineVariant::V1
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineVariant::V1 => "v1",
            EngineVariant::V2 => "v2",
        }
    }
}

/// TTS 推理请求
#[derive(Debug, Clone)]
pub struct InferRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 参考音频路径（暂存文件）
    pub reference_audio: PathBuf,
    /// 校验后的情感参数
    pub emotion: EmotionParams,
    /// 是否使用随机采样
    pub use_random: bool,
}

/// TTS 推理响应
#[derive(Debug, Clone)]
pub struct InferResponse {
    /// 编码后的音频数据（WAV）
    pub audio_data: Vec<u8>,
    /// 音频时长（毫秒）
    pub duration_ms: Option<u64>,
    /// 采样率
    pub sample_rate: Option<u32>,
}

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 执行一次推理
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError>;

    /// 引擎版本
    fn variant(&self) -> EngineVariant;

    /// 检查引擎是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
