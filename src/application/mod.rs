//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、ResourceStaging、AudioCodec）
//! - engine: 引擎句柄与推理门面
//! - commands: 合成命令及编排器
//! - error: 调用方可见的失败分类

pub mod commands;
pub mod engine;
pub mod error;
pub mod ports;

// Re-exports
pub use commands::{
    handlers::{OrchestratorConfig, RequestOrchestrator, RequestState},
    BatchSynthesis, BatchSynthesizeCommand, BatchUnits, LongFormSynthesis, ReferenceAudio,
    SingleSynthesis, SynthesizeCommand, UnitFailure, UnitOutput,
};

pub use engine::{AudioArtifact, EngineHandle, SynthesisEngineFacade};

pub use error::{FailureKind, SynthesisError};

pub use ports::{
    // Audio codec
    AudioClip,
    AudioCodecPort,
    CodecError,
    // Resource staging
    ResourceStagingPort,
    StagedResource,
    StagingError,
    StagingGuard,
    // TTS engine
    EngineVariant,
    InferRequest,
    InferResponse,
    TtsEnginePort,
    TtsError,
};
