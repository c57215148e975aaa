//! Synthesis HTTP Handlers
//!
//! 三个入口共用同一套 multipart 表单：
//! - text / texts: 待合成文本（texts 按行拆分）
//! - voice_file: 参考音频
//! - emotion_vector: JSON 数组字符串
//! - use_emo_text / emo_text / emo_alpha
//! - use_random

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::{
    BatchSynthesizeCommand, BatchUnits, ReferenceAudio, SynthesizeCommand,
};
use crate::domain::EmotionInput;
use crate::infrastructure::http::dto::{ApiResponse, BatchSynthesisResponse, LongFormResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 解析后的表单
#[derive(Debug, Default)]
pub struct SynthesisForm {
    pub text: Option<String>,
    pub texts: Option<String>,
    pub voice_file: Option<ReferenceAudio>,
    pub emotion: EmotionInput,
    pub use_random: bool,
}

impl SynthesisForm {
    fn into_single(self) -> SynthesizeCommand {
        SynthesizeCommand {
            text: self.text.unwrap_or_default(),
            reference_audio: self.voice_file,
            emotion: self.emotion,
            use_random: self.use_random,
        }
    }

    fn into_batch(self) -> BatchSynthesizeCommand {
        let texts = self.texts.or(self.text).unwrap_or_default();
        BatchSynthesizeCommand {
            units: BatchUnits::Presplit(vec![texts]),
            reference_audio: self.voice_file,
            emotion: self.emotion,
            use_random: self.use_random,
        }
    }
}

/// 宽松的布尔解析，兼容表单提交
fn parse_flag(name: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ApiError::BadRequest(format!(
            "Invalid boolean for {}: {}",
            name, other
        ))),
    }
}

fn parse_alpha(value: &str) -> Result<Option<f32>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f32>()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("Invalid emo_alpha: {}", value)))
}

/// 读取 multipart 表单
pub async fn read_form(mut multipart: Multipart) -> Result<SynthesisForm, ApiError> {
    let mut form = SynthesisForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        if field_name == "voice_file" {
            let file_name = field.file_name().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read voice_file: {}", e)))?
                .to_vec();
            form.voice_file = Some(ReferenceAudio::new(data, file_name));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", field_name, e)))?;

        match field_name.as_str() {
            "text" => form.text = Some(value),
            "texts" => form.texts = Some(value),
            "emotion_vector" => form.emotion.emotion_vector = Some(value),
            "use_emo_text" => form.emotion.use_emo_text = parse_flag("use_emo_text", &value)?,
            "emo_text" => form.emotion.emo_text = Some(value),
            "emo_alpha" => form.emotion.emo_alpha = parse_alpha(&value)?,
            "use_random" => form.use_random = parse_flag("use_random", &value)?,
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// 以附件形式流式返回 WAV 文件
async fn wav_response(path: &Path, download_name: &str) -> Result<Response, ApiError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open audio file: {}", e)))?;

    let file_size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get file metadata: {}", e)))?
        .len();

    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(header::CONTENT_LENGTH, file_size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download_name),
        )
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// 单条合成，返回音频文件
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    state.orchestrator.check_engine()?;
    let form = read_form(multipart).await?;
    let result = state.orchestrator.synthesize(form.into_single()).await?;

    let file_name = result.file_name();
    let download_name = file_name.strip_prefix("api_").unwrap_or(&file_name);
    wav_response(&result.output_path, download_name).await
}

/// 批量合成，texts 每行一条
pub async fn batch_synthesize(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<BatchSynthesisResponse>>, ApiError> {
    state.orchestrator.check_engine()?;
    let form = read_form(multipart).await?;
    let result = state.orchestrator.batch_synthesize(form.into_batch()).await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// 长文本合成：分段合成后合并
pub async fn synthesize_long(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<LongFormResponse>>, ApiError> {
    state.orchestrator.check_engine()?;
    let form = read_form(multipart).await?;
    let result = state.orchestrator.synthesize_long(form.into_single()).await?;

    Ok(Json(ApiResponse::success(result.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::EngineHandle;
    use crate::config::{AppConfig, TtsBackend};
    use crate::infrastructure::adapters::{FakeTtsEngine, FakeTtsEngineConfig};
    use crate::infrastructure::http::routes::create_routes;
    use axum::http::Request;
    use axum::Router;
    use tower::util::ServiceExt;

    const BOUNDARY: &str = "----indextts-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, file_name, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            name, file_name
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn post(uri: &str, parts: &[Part]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    struct TestApp {
        _dir: tempfile::TempDir,
        config: AppConfig,
        router: Router,
    }

    async fn app_with(engine: EngineHandle) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.tts.backend = TtsBackend::Fake;
        config.audio.output_dir = dir.path().join("outputs");
        config.audio.staging_dir = dir.path().join("staging");
        config.audio.sample_rate = 16000;
        config.text.max_length = 6;

        let state = AppState::from_config(&config, engine).await.unwrap();
        let router = create_routes().with_state(Arc::new(state));
        TestApp {
            _dir: dir,
            config,
            router,
        }
    }

    async fn app() -> TestApp {
        let engine = FakeTtsEngine::new(FakeTtsEngineConfig {
            sample_rate: 16000,
            ..Default::default()
        });
        app_with(EngineHandle::ready(Arc::new(engine))).await
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn staged_count(app: &TestApp) -> usize {
        std::fs::read_dir(&app.config.audio.staging_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("x", "true").unwrap());
        assert!(parse_flag("x", " ON ").unwrap());
        assert!(parse_flag("x", "1").unwrap());
        assert!(!parse_flag("x", "false").unwrap());
        assert!(!parse_flag("x", "").unwrap());
        assert!(parse_flag("x", "maybe").is_err());
    }

    #[test]
    fn test_parse_alpha() {
        assert_eq!(parse_alpha("0.8").unwrap(), Some(0.8));
        assert_eq!(parse_alpha("  ").unwrap(), None);
        assert!(parse_alpha("strong").is_err());
    }

    #[tokio::test]
    async fn test_synthesize_returns_wav_attachment() {
        let app = app().await;
        let request = post(
            "/synthesize",
            &[
                Part::Text("text", "你好，世界"),
                Part::File("voice_file", "speaker.wav", b"RIFF reference"),
            ],
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"output_"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(staged_count(&app), 0);
    }

    #[tokio::test]
    async fn test_synthesize_missing_voice_is_400() {
        let app = app().await;
        let request = post("/synthesize", &[Part::Text("text", "你好")]);

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["errno"], 400);
    }

    #[tokio::test]
    async fn test_synthesize_conflicting_emotion_is_400() {
        let app = app().await;
        let request = post(
            "/synthesize",
            &[
                Part::Text("text", "你好"),
                Part::File("voice_file", "speaker.wav", b"RIFF reference"),
                Part::Text("emotion_vector", "[0,0,0,0,0,0,0,1]"),
                Part::Text("use_emo_text", "true"),
                Part::Text("emo_text", "开心"),
            ],
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(staged_count(&app), 0);
    }

    #[tokio::test]
    async fn test_synthesize_unloaded_engine_is_503() {
        let app = app_with(EngineHandle::unavailable("checkpoint missing")).await;
        let request = post(
            "/synthesize",
            &[
                Part::Text("text", "你好"),
                Part::File("voice_file", "speaker.wav", b"RIFF reference"),
            ],
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json(response).await;
        assert_eq!(body["errno"], 503);
    }

    #[tokio::test]
    async fn test_unloaded_engine_wins_over_malformed_fields() {
        let app = app_with(EngineHandle::unavailable("checkpoint missing")).await;

        for uri in ["/synthesize", "/batch_synthesize", "/synthesize_long"] {
            let request = post(
                uri,
                &[
                    Part::Text("text", "hi"),
                    Part::Text("emo_alpha", "strong"),
                    Part::Text("use_random", "maybe"),
                    Part::File("voice_file", "speaker.wav", b"RIFF reference"),
                ],
            );

            let response = app.router.clone().oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
            let body = json(response).await;
            assert_eq!(body["errno"], 503);
        }
        assert_eq!(staged_count(&app), 0);
    }

    #[tokio::test]
    async fn test_synthesize_malformed_alpha_is_400() {
        let app = app().await;
        let request = post(
            "/synthesize",
            &[
                Part::Text("text", "hi"),
                Part::Text("emo_alpha", "strong"),
                Part::File("voice_file", "speaker.wav", b"RIFF reference"),
            ],
        );

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_synthesize_splits_lines() {
        let app = app().await;
        let request = post(
            "/batch_synthesize",
            &[
                Part::Text("texts", "第一行\n\n第二行\n  第三行  "),
                Part::File("voice_file", "speaker.wav", b"RIFF reference"),
            ],
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["total_count"], 3);
        assert_eq!(body["data"]["success_count"], 3);
        let files = body["data"]["output_files"].as_array().unwrap();
        assert!(files[2].as_str().unwrap().ends_with("output_002.wav"));
        assert!(body["data"]["failures"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_synthesize_without_texts_is_400() {
        let app = app().await;
        let request = post(
            "/batch_synthesize",
            &[
                Part::Text("texts", "\n \n"),
                Part::File("voice_file", "speaker.wav", b"RIFF reference"),
            ],
        );

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_synthesize_long_merges_chunks() {
        let app = app().await;
        let request = post(
            "/synthesize_long",
            &[
                Part::Text("text", "第一句话。第二句话。第三句话。"),
                Part::File("voice_file", "speaker.wav", b"RIFF reference"),
            ],
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["data"]["total_count"], 3);
        let merged = body["data"]["merged_file"].as_str().unwrap();
        assert!(merged.ends_with("merged.wav"));
        assert!(Path::new(merged).exists());
    }
}
