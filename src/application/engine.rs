//! Synthesis Engine Facade
//!
//! - EngineHandle: 进程级引擎句柄，启动时构造一次，之后只读共享
//! - SynthesisEngineFacade: 单条/批量推理，把音频写到输出路径

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::application::ports::{EngineVariant, InferRequest, TtsEnginePort, TtsError};
use crate::domain::EmotionParams;

/// 进程级引擎句柄
///
/// 加载失败时为 `Unavailable`，请求路径只检查、不重试加载。
pub enum EngineHandle {
    Ready(Arc<dyn TtsEnginePort>),
    Unavailable { reason: String },
}

impl EngineHandle {
    pub fn ready(engine: Arc<dyn TtsEnginePort>) -> Self {
        EngineHandle::Ready(engine)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        EngineHandle::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, EngineHandle::Ready(_))
    }

    pub fn variant(&self) -> Option<EngineVariant> {
        match self {
            EngineHandle::Ready(engine) => Some(engine.variant()),
            EngineHandle::Unavailable { .. } => None,
        }
    }

    /// 获取引擎，不可用时返回原因
    pub fn engine(&self) -> Result<&Arc<dyn TtsEnginePort>, TtsError> {
        match self {
            EngineHandle::Ready(engine) => Ok(engine),
            EngineHandle::Unavailable { reason } => Err(TtsError::Unavailable(reason.clone())),
        }
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            EngineHandle::Ready(_) => None,
            EngineHandle::Unavailable { reason } => Some(reason),
        }
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineHandle::Ready(engine) => f
                .debug_tuple("Ready")
                .field(&engine.variant())
                .finish(),
            EngineHandle::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// 一次成功推理的产物
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub size_bytes: usize,
    pub duration_ms: Option<u64>,
    pub sample_rate: Option<u32>,
}

/// 批量输出文件名
pub fn unit_file_name(index: usize) -> String {
    format!("output_{:03}.wav", index)
}

/// 引擎门面
///
/// 引擎按不可重入处理：所有推理经过同一个信号量。
#[derive(Clone)]
pub struct SynthesisEngineFacade {
    handle: Arc<EngineHandle>,
    gate: Arc<Semaphore>,
}

impl SynthesisEngineFacade {
    pub fn new(handle: Arc<EngineHandle>, max_concurrent: usize) -> Self {
        Self {
            handle,
            gate: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    pub fn handle(&self) -> &Arc<EngineHandle> {
        &self.handle
    }

    /// 合成一条文本并写入 `output_path`
    pub async fn synthesize_one(
        &self,
        text: &str,
        reference_audio: &Path,
        emotion: &EmotionParams,
        use_random: bool,
        output_path: &Path,
    ) -> Result<AudioArtifact, TtsError> {
        let engine = self.handle.engine()?;

        let request = InferRequest {
            text: text.to_string(),
            reference_audio: reference_audio.to_path_buf(),
            emotion: emotion.clone(),
            use_random,
        };

        let response = {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| TtsError::Unavailable("Inference gate closed".to_string()))?;
            engine.infer(request).await?
        };

        if response.audio_data.is_empty() {
            return Err(TtsError::InvalidResponse("Engine returned no audio".to_string()));
        }

        tokio::fs::write(output_path, &response.audio_data)
            .await
            .map_err(|e| TtsError::OutputWrite(format!("{}: {}", output_path.display(), e)))?;

        tracing::debug!(
            path = %output_path.display(),
            size = response.audio_data.len(),
            duration_ms = ?response.duration_ms,
            "Audio written"
        );

        Ok(AudioArtifact {
            path: output_path.to_path_buf(),
            size_bytes: response.audio_data.len(),
            duration_ms: response.duration_ms,
            sample_rate: response.sample_rate,
        })
    }

    /// 按输入顺序逐条合成，单条失败不影响后续
    ///
    /// 第 i 条写入 `output_dir/output_{i:03}.wav`。
    pub async fn synthesize_many(
        &self,
        texts: &[String],
        reference_audio: &Path,
        emotion: &EmotionParams,
        use_random: bool,
        output_dir: &Path,
    ) -> Vec<Result<AudioArtifact, TtsError>> {
        let mut results = Vec::with_capacity(texts.len());

        for (index, text) in texts.iter().enumerate() {
            let output_path = output_dir.join(unit_file_name(index));
            let result = self
                .synthesize_one(text, reference_audio, emotion, use_random, &output_path)
                .await;

            if let Err(e) = &result {
                tracing::warn!(index, error = %e, "Unit synthesis failed");
            }
            results.push(result);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::InferResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 文本包含 "FAIL" 时推理失败
    #[derive(Default)]
    struct ScriptedEngine {
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl TtsEnginePort for ScriptedEngine {
        async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.calls.lock().unwrap().push(request.text.clone());
            if request.text.contains("FAIL") {
                return Err(TtsError::ServiceError("scripted failure".to_string()));
            }
            Ok(InferResponse {
                audio_data: request.text.into_bytes(),
                duration_ms: Some(100),
                sample_rate: Some(22050),
            })
        }

        fn variant(&self) -> EngineVariant {
            EngineVariant::V2
        }
    }

    fn facade(engine: Arc<ScriptedEngine>) -> SynthesisEngineFacade {
        SynthesisEngineFacade::new(Arc::new(EngineHandle::ready(engine)), 1)
    }

    #[test]
    fn test_handle_states() {
        let handle = EngineHandle::unavailable("model missing");
        assert!(!handle.is_ready());
        assert_eq!(handle.variant(), None);
        assert_eq!(handle.unavailable_reason(), Some("model missing"));
        assert!(matches!(handle.engine(), Err(TtsError::Unavailable(_))));

        let ready = EngineHandle::ready(Arc::new(ScriptedEngine::default()));
        assert!(ready.is_ready());
        assert_eq!(ready.variant(), Some(EngineVariant::V2));
    }

    #[tokio::test]
    async fn test_synthesize_one_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::default());
        let output = dir.path().join("out.wav");

        let artifact = facade(engine)
            .synthesize_one("你好", Path::new("/ref.wav"), &EmotionParams::Neutral, false, &output)
            .await
            .unwrap();

        assert_eq!(artifact.path, output);
        assert_eq!(std::fs::read(&output).unwrap(), "你好".as_bytes());
    }

    #[tokio::test]
    async fn test_unavailable_engine_is_not_called() {
        let dir = tempfile::tempdir().unwrap();
        let facade =
            SynthesisEngineFacade::new(Arc::new(EngineHandle::unavailable("load failed")), 1);
        assert!(!facade.is_ready());

        let result = facade
            .synthesize_one(
                "text",
                Path::new("/ref.wav"),
                &EmotionParams::Neutral,
                false,
                &dir.path().join("out.wav"),
            )
            .await;
        assert!(matches!(result, Err(TtsError::Unavailable(_))));
        assert!(!dir.path().join("out.wav").exists());
    }

    #[tokio::test]
    async fn test_synthesize_many_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::default());
        let texts = vec!["A.".to_string(), "FAIL".to_string(), "C.".to_string()];

        let results = facade(engine.clone())
            .synthesize_many(&texts, Path::new("/ref.wav"), &EmotionParams::Neutral, false, dir.path())
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(
            results[2].as_ref().unwrap().path,
            dir.path().join("output_002.wav")
        );
        assert_eq!(*engine.calls.lock().unwrap(), texts);
        assert!(!dir.path().join("output_001.wav").exists());
    }

    #[tokio::test]
    async fn test_gate_serializes_concurrent_calls() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::default());
        let facade = facade(engine.clone());

        let mut tasks = Vec::new();
        for i in 0..4 {
            let facade = facade.clone();
            let output = dir.path().join(format!("{}.wav", i));
            tasks.push(tokio::spawn(async move {
                facade
                    .synthesize_one("x", Path::new("/ref.wav"), &EmotionParams::Neutral, false, &output)
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(engine.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unit_file_name() {
        assert_eq!(unit_file_name(0), "output_000.wav");
        assert_eq!(unit_file_name(42), "output_042.wav");
    }
}
