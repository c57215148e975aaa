//! IndexTTS Server - 语音合成请求编排服务
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - TextSegmenter: 长文本分段
//! - EmotionResolver: 情感控制参数校验
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TtsEngine, ResourceStaging, AudioCodec）
//! - Engine: 引擎句柄与推理门面
//! - Commands: 合成命令与 RequestOrchestrator
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Adapters: IndexTTS HTTP 引擎、Fake 引擎、文件暂存、WAV 编解码

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
