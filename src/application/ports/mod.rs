//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_codec;
mod resource_staging;
mod tts_engine;

pub use audio_codec::{AudioClip, AudioCodecPort, CodecError};
pub use resource_staging::{ResourceStagingPort, StagedResource, StagingError, StagingGuard};
pub use tts_engine::{EngineVariant, InferRequest, InferResponse, TtsEnginePort, TtsError};
