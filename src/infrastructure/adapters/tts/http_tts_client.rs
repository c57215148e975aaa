//! HTTP TTS Client - 调用 IndexTTS 推理服务
//!
//! 推理服务 API:
//! POST {url}/infer
//! Request: {"version": 2, "text": "...", "spk_audio_prompt": "/path/ref.wav", ...}  (JSON)
//! Response: audio/wav binary, metadata in headers
//!
//! GET {url}/health
//!
//! V1 / V2 两种引擎共用同一个传输层，区别只在请求体。

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{
    EngineVariant, InferRequest, InferResponse, TtsEnginePort, TtsError,
};

/// V1 推理请求体：仅文本与参考音频
#[derive(Debug, Serialize)]
struct V1InferBody<'a> {
    version: u8,
    text: &'a str,
    spk_audio_prompt: String,
}

/// V2 推理请求体：完整情感控制
#[derive(Debug, Serialize)]
struct V2InferBody<'a> {
    version: u8,
    text: &'a str,
    spk_audio_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    emo_vector: Option<&'a [f32]>,
    use_emo_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    emo_text: Option<&'a str>,
    emo_alpha: f32,
    use_random: bool,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// 推理服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9880".to_string(),
            timeout_secs: 300,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 传输层
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn infer_url(&self) -> String {
        format!("{}/infer", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    /// 发送推理请求，返回音频字节及头部元数据
    async fn post_infer<B: Serialize + ?Sized>(&self, body: &B) -> Result<InferResponse, TtsError> {
        let response = self
            .client
            .post(self.infer_url())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let headers = response.headers();
        let duration_ms = headers
            .get("X-TTS-Duration-Ms")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let sample_rate = headers
            .get("X-TTS-Sample-Rate")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        tracing::debug!(
            duration_ms = ?duration_ms,
            sample_rate = ?sample_rate,
            audio_size = audio_data.len(),
            "TTS inference completed"
        );

        Ok(InferResponse {
            audio_data,
            duration_ms,
            sample_rate,
        })
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %self.health_url(), error = %e, "Health probe failed");
                false
            }
        }
    }
}

/// IndexTTS V1 引擎
///
/// 不支持情感控制和随机采样，这些参数不会发送。
pub struct IndexTtsV1Engine {
    client: HttpTtsClient,
}

impl IndexTtsV1Engine {
    pub fn new(client: HttpTtsClient) -> Self {
        Self { client }
    }

    fn body<'a>(request: &'a InferRequest) -> V1InferBody<'a> {
        V1InferBody {
            version: 1,
            text: &request.text,
            spk_audio_prompt: request.reference_audio.to_string_lossy().to_string(),
        }
    }
}

#[async_trait]
impl TtsEnginePort for IndexTtsV1Engine {
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
        if request.emotion != crate::domain::EmotionParams::Neutral || request.use_random {
            tracing::debug!(
                emotion = ?request.emotion,
                use_random = request.use_random,
                "V1 engine ignores emotion and random sampling"
            );
        }
        self.client.post_infer(&Self::body(&request)).await
    }

    fn variant(&self) -> EngineVariant {
        EngineVariant::V1
    }

    async fn health_check(&self) -> bool {
        self.client.health_check().await
    }
}

/// IndexTTS V2 引擎
pub struct IndexTtsV2Engine {
    client: HttpTtsClient,
}

impl IndexTtsV2Engine {
    pub fn new(client: HttpTtsClient) -> Self {
        Self { client }
    }

    fn body<'a>(request: &'a InferRequest) -> V2InferBody<'a> {
        V2InferBody {
            version: 2,
            text: &request.text,
            spk_audio_prompt: request.reference_audio.to_string_lossy().to_string(),
            emo_vector: request.emotion.vector(),
            use_emo_text: request.emotion.use_emo_text(),
            emo_text: request.emotion.emo_text(),
            emo_alpha: request.emotion.alpha(),
            use_random: request.use_random,
        }
    }
}

#[async_trait]
impl TtsEnginePort for IndexTtsV2Engine {
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
        tracing::debug!(
            url = %self.client.infer_url(),
            text_len = request.text.len(),
            reference = %request.reference_audio.display(),
            "Sending TTS infer request"
        );
        self.client.post_infer(&Self::body(&request)).await
    }

    fn variant(&self) -> EngineVariant {
        EngineVariant::V2
    }

    async fn health_check(&self) -> bool {
        self.client.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmotionParams;
    use std::path::PathBuf;

    fn request(emotion: EmotionParams) -> InferRequest {
        InferRequest {
            text: "你好".to_string(),
            reference_audio: PathBuf::from("/tmp/ref_1.wav"),
            emotion,
            use_random: true,
        }
    }

    #[test]
    fn test_config_builder() {
        let config = HttpTtsClientConfig::new("http://gpu-box:9000").with_timeout(60);
        assert_eq!(config.base_url, "http://gpu-box:9000");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client = HttpTtsClient::new(HttpTtsClientConfig::new("http://gpu-box:9000/")).unwrap();
        assert_eq!(client.infer_url(), "http://gpu-box:9000/infer");
        assert_eq!(client.health_url(), "http://gpu-box:9000/health");
    }

    #[test]
    fn test_v1_body_drops_emotion() {
        let req = request(EmotionParams::Vector(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]));
        let body = serde_json::to_value(IndexTtsV1Engine::body(&req)).unwrap();

        assert_eq!(body["version"], 1);
        assert_eq!(body["text"], "你好");
        assert_eq!(body["spk_audio_prompt"], "/tmp/ref_1.wav");
        assert!(body.get("emo_vector").is_none());
        assert!(body.get("use_random").is_none());
    }

    #[test]
    fn test_v2_body_with_vector() {
        let req = request(EmotionParams::Vector(vec![0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
        let body = serde_json::to_value(IndexTtsV2Engine::body(&req)).unwrap();

        assert_eq!(body["version"], 2);
        assert_eq!(body["emo_vector"].as_array().unwrap().len(), 8);
        assert_eq!(body["use_emo_text"], false);
        assert!(body.get("emo_text").is_none());
        assert_eq!(body["use_random"], true);
    }

    #[test]
    fn test_v2_body_with_emotion_text() {
        let req = request(EmotionParams::Text {
            text: "悲伤".to_string(),
            alpha: 0.5,
        });
        let body = serde_json::to_value(IndexTtsV2Engine::body(&req)).unwrap();

        assert!(body.get("emo_vector").is_none());
        assert_eq!(body["use_emo_text"], true);
        assert_eq!(body["emo_text"], "悲伤");
        assert_eq!(body["emo_alpha"], 0.5);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unhealthy() {
        let client = HttpTtsClient::new(
            HttpTtsClientConfig::new("http://127.0.0.1:1").with_timeout(2),
        )
        .unwrap();
        let engine = IndexTtsV2Engine::new(client);
        assert!(!engine.health_check().await);

        let err = engine.infer(request(EmotionParams::Neutral)).await.unwrap_err();
        assert!(matches!(err, TtsError::NetworkError(_) | TtsError::Timeout));
    }
}
