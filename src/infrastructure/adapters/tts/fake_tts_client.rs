//! Fake TTS Engine - 本地开发/测试用引擎
//!
//! 不调用推理服务，按文本长度生成一段正弦波 WAV

use async_trait::async_trait;
use std::f32::consts::PI;

use crate::application::ports::{
    AudioClip, EngineVariant, InferRequest, InferResponse, TtsEnginePort, TtsError,
};
use crate::infrastructure::adapters::codec::encode_wav;

/// Fake TTS Engine 配置
#[derive(Debug, Clone)]
pub struct FakeTtsEngineConfig {
    /// 输出采样率
    pub sample_rate: u32,
    /// 每个字符对应的时长（毫秒）
    pub ms_per_char: u64,
    /// 正弦波频率
    pub frequency: f32,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
    pub variant: EngineVariant,
}

impl Default for FakeTtsEngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            ms_per_char: 80,
            frequency: 440.0,
            latency_ms: 0,
            variant: EngineVariant::V2,
        }
    }
}

/// Fake TTS Engine
pub struct FakeTtsEngine {
    config: FakeTtsEngineConfig,
}

impl FakeTtsEngine {
    pub fn new(config: FakeTtsEngineConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            variant = config.variant.as_str(),
            "FakeTtsEngine initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeTtsEngineConfig::default())
    }

    fn tone(&self, text: &str) -> AudioClip {
        let chars = text.chars().count().max(1) as u64;
        let duration_ms = (chars * self.config.ms_per_char).max(200);
        let frames = (self.config.sample_rate as u64 * duration_ms / 1000) as usize;
        let rate = self.config.sample_rate as f32;

        let samples = (0..frames)
            .map(|i| 0.3 * (2.0 * PI * self.config.frequency * i as f32 / rate).sin())
            .collect();
        AudioClip::new(samples, self.config.sample_rate, 1)
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsEngine {
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
        tracing::debug!(
            text_len = request.text.len(),
            reference = %request.reference_audio.display(),
            "FakeTtsEngine: generating tone"
        );

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        let clip = self.tone(&request.text);
        Ok(InferResponse {
            duration_ms: Some(clip.duration_ms()),
            sample_rate: Some(clip.sample_rate),
            audio_data: encode_wav(&clip),
        })
    }

    fn variant(&self) -> EngineVariant {
        self.config.variant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmotionParams;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_fake_engine_returns_wav() {
        let engine = FakeTtsEngine::with_defaults();
        let response = engine
            .infer(InferRequest {
                text: "一二三四五".to_string(),
                reference_audio: PathBuf::from("/tmp/ref.wav"),
                emotion: EmotionParams::Neutral,
                use_random: false,
            })
            .await
            .unwrap();

        assert_eq!(&response.audio_data[0..4], b"RIFF");
        assert_eq!(response.duration_ms, Some(400));
        assert_eq!(response.sample_rate, Some(22050));
    }

    #[test]
    fn test_tone_has_minimum_length() {
        let engine = FakeTtsEngine::with_defaults();
        let clip = engine.tone("");
        assert_eq!(clip.duration_ms(), 200);
    }
}
