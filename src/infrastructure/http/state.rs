//! Application State

use std::sync::Arc;

use crate::application::ports::StagingError;
use crate::application::{
    EngineHandle, OrchestratorConfig, RequestOrchestrator, SynthesisEngineFacade,
};
use crate::config::{AppConfig, TtsConfig};
use crate::infrastructure::adapters::{FileResourceStaging, WavCodec};

/// 应用状态
pub struct AppState {
    pub orchestrator: RequestOrchestrator,
    pub engine: Arc<EngineHandle>,
    /// 模型信息展示用
    pub tts: TtsConfig,
}

impl AppState {
    pub fn new(orchestrator: RequestOrchestrator, tts: TtsConfig) -> Self {
        Self {
            engine: orchestrator.engine().handle().clone(),
            orchestrator,
            tts,
        }
    }

    /// 按配置组装：文件暂存、WAV 编解码、引擎门面
    pub async fn from_config(
        config: &AppConfig,
        engine: EngineHandle,
    ) -> Result<Self, StagingError> {
        let staging = FileResourceStaging::new(&config.audio.staging_dir).await?;
        let facade = SynthesisEngineFacade::new(Arc::new(engine), config.tts.max_concurrent);

        let orchestrator = RequestOrchestrator::new(
            facade,
            Arc::new(staging),
            Arc::new(WavCodec::new()),
            OrchestratorConfig {
                output_dir: config.audio.output_dir.clone(),
                sample_rate: config.audio.sample_rate,
                normalize: config.audio.normalize,
                max_length: config.text.max_length,
            },
        );

        Ok(Self::new(orchestrator, config.tts.clone()))
    }
}
