//! TTS Adapter - 推理引擎实现与加载

mod fake_tts_client;
mod http_tts_client;

use std::sync::Arc;

pub use fake_tts_client::{FakeTtsEngine, FakeTtsEngineConfig};
pub use http_tts_client::*;

use crate::application::engine::EngineHandle;
use crate::application::ports::{EngineVariant, TtsEnginePort};
use crate::config::{TtsBackend, TtsConfig};

/// 启动时加载引擎，只执行一次
///
/// 构造失败或健康检查失败都返回 `Unavailable`，进程继续运行并对合成请求返回 503。
pub async fn load_engine(config: &TtsConfig) -> EngineHandle {
    let variant = EngineVariant::from_use_v2(config.use_v2);

    let engine: Arc<dyn TtsEnginePort> = match config.backend {
        TtsBackend::Fake => Arc::new(FakeTtsEngine::new(FakeTtsEngineConfig {
            variant,
            ..Default::default()
        })),
        TtsBackend::Http => {
            let client_config =
                HttpTtsClientConfig::new(config.url.clone()).with_timeout(config.timeout_secs);
            let client = match HttpTtsClient::new(client_config) {
                Ok(client) => client,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create TTS client");
                    return EngineHandle::unavailable(e.to_string());
                }
            };
            match variant {
                EngineVariant::V1 => Arc::new(IndexTtsV1Engine::new(client)),
                EngineVariant::V2 => Arc::new(IndexTtsV2Engine::new(client)),
            }
        }
    };

    if !engine.health_check().await {
        let reason = format!("TTS service at {} is not healthy", config.url);
        tracing::error!(
            url = %config.url,
            model_dir = %config.model_dir,
            "TTS model failed to load"
        );
        return EngineHandle::unavailable(reason);
    }

    tracing::info!(
        backend = ?config.backend,
        variant = variant.as_str(),
        model_dir = %config.model_dir,
        "TTS engine loaded"
    );
    EngineHandle::ready(engine)
}
