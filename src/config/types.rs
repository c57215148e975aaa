//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// API 服务配置
    #[serde(default)]
    pub api: ApiConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 文本处理配置
    #[serde(default)]
    pub text: TextConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// API 服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// tokio 工作线程数
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// 上传文件最大大小（字节）
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_workers() -> usize {
    1
}

fn default_max_upload_size() -> usize {
    50 * 1024 * 1024 // 50 MB
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl ApiConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 推理后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsBackend {
    /// 通过 HTTP 调用推理服务
    #[default]
    Http,
    /// 本地生成测试音频，不依赖推理服务
    Fake,
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 推理后端
    #[serde(default)]
    pub backend: TtsBackend,

    /// 推理服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 模型目录
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// 模型配置文件
    #[serde(default = "default_model_config_path")]
    pub config_path: String,

    /// 是否使用 V2 引擎（支持情感控制）
    #[serde(default = "default_use_v2")]
    pub use_v2: bool,

    #[serde(default)]
    pub use_fp16: bool,

    #[serde(default)]
    pub use_cuda_kernel: bool,

    #[serde(default)]
    pub use_deepspeed: bool,

    /// 单次推理超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 同时进行的推理数上限
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_tts_url() -> String {
    "http://127.0.0.1:9880".to_string()
}

fn default_model_dir() -> String {
    "index-tts/checkpoints".to_string()
}

fn default_model_config_path() -> String {
    "index-tts/checkpoints/config.yaml".to_string()
}

fn default_use_v2() -> bool {
    true
}

fn default_tts_timeout() -> u64 {
    300
}

fn default_max_concurrent() -> usize {
    1
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: TtsBackend::default(),
            url: default_tts_url(),
            model_dir: default_model_dir(),
            config_path: default_model_config_path(),
            use_v2: default_use_v2(),
            use_fp16: false,
            use_cuda_kernel: false,
            use_deepspeed: false,
            timeout_secs: default_tts_timeout(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// 音频配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// 输出采样率（Hz），长文本合并时统一到此采样率
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// 合成结果输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 上传参考音频的临时目录
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// 合并输出时是否做峰值归一化
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

fn default_sample_rate() -> u32 {
    22050
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("indextts-staging")
}

fn default_normalize() -> bool {
    true
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            output_dir: default_output_dir(),
            staging_dir: default_staging_dir(),
            normalize: default_normalize(),
        }
    }
}

/// 文本处理配置
#[derive(Debug, Clone, Deserialize)]
pub struct TextConfig {
    /// 长文本分段的最大字符数
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_max_length() -> usize {
    500
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.tts.backend, TtsBackend::Http);
        assert!(config.tts.use_v2);
        assert_eq!(config.audio.sample_rate, 22050);
        assert_eq!(config.text.max_length, 500);
    }

    #[test]
    fn test_api_addr() {
        let config = ApiConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_backend_deserializes_lowercase() {
        let backend: TtsBackend = serde_json::from_str("\"fake\"").unwrap();
        assert_eq!(backend, TtsBackend::Fake);
    }
}
