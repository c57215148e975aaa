//! Synthesis Command Handlers - 请求编排
//!
//! 每个请求的状态流转：
//! Received → Validating → ResourceStaged → EmotionResolved → Synthesizing → Completed，
//! 任一非终止状态都可能转入 Failed(kind)。
//! 暂存的参考音频由 StagingGuard 持有，无论从哪个分支结束都恰好释放一次。

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{
    BatchSynthesis, BatchSynthesizeCommand, BatchUnits, LongFormSynthesis, ReferenceAudio,
    SingleSynthesis, SynthesizeCommand, UnitFailure, UnitOutput,
};
use crate::application::engine::SynthesisEngineFacade;
use crate::application::error::SynthesisError;
use crate::application::ports::{AudioClip, AudioCodecPort, CodecError, ResourceStagingPort, StagingGuard};
use crate::domain::{split_lines, EmotionInput, EmotionParams, EmotionResolver, TextSegmenter};

/// 合并后的长文本输出文件名
pub const MERGED_FILE_NAME: &str = "merged.wav";

/// 输出命名序号，进程内单调递增
static OUTPUT_SEQ: AtomicU64 = AtomicU64::new(0);

/// 生成输出命名用的区分值：UTC 毫秒时间戳 + 序号
pub fn output_stamp() -> String {
    let seq = OUTPUT_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}", Utc::now().format("%Y%m%d%H%M%S%3f"), seq)
}

/// 请求状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Validating,
    ResourceStaged,
    EmotionResolved,
    Synthesizing,
    Completed,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Received => "received",
            RequestState::Validating => "validating",
            RequestState::ResourceStaged => "resource_staged",
            RequestState::EmotionResolved => "emotion_resolved",
            RequestState::Synthesizing => "synthesizing",
            RequestState::Completed => "completed",
        }
    }
}

/// 单个请求的状态跟踪（仅用于日志）
struct RequestTrace {
    request_id: Uuid,
    mode: &'static str,
    state: RequestState,
}

impl RequestTrace {
    fn start(mode: &'static str) -> Self {
        let trace = Self {
            request_id: Uuid::new_v4(),
            mode,
            state: RequestState::Received,
        };
        tracing::debug!(request_id = %trace.request_id, mode, state = trace.state.as_str(), "Request state");
        trace
    }

    fn advance(&mut self, state: RequestState) {
        self.state = state;
        tracing::debug!(
            request_id = %self.request_id,
            mode = self.mode,
            state = state.as_str(),
            "Request state"
        );
    }

    fn fail(&self, error: SynthesisError) -> SynthesisError {
        tracing::warn!(
            request_id = %self.request_id,
            mode = self.mode,
            from = self.state.as_str(),
            kind = %error.kind(),
            error = %error,
            "Request failed"
        );
        error
    }
}

/// 编排器配置
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// 输出目录
    pub output_dir: PathBuf,
    /// 长文本合并输出的采样率
    pub sample_rate: u32,
    /// 长文本合并时是否峰值归一化
    pub normalize: bool,
    /// 长文本分段上限
    pub max_length: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            sample_rate: 22050,
            normalize: true,
            max_length: crate::domain::DEFAULT_MAX_LENGTH,
        }
    }
}

/// 请求编排器
pub struct RequestOrchestrator {
    engine: SynthesisEngineFacade,
    staging: Arc<dyn ResourceStagingPort>,
    codec: Arc<dyn AudioCodecPort>,
    resolver: EmotionResolver,
    segmenter: TextSegmenter,
    config: OrchestratorConfig,
}

impl RequestOrchestrator {
    pub fn new(
        engine: SynthesisEngineFacade,
        staging: Arc<dyn ResourceStagingPort>,
        codec: Arc<dyn AudioCodecPort>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            engine,
            staging,
            codec,
            resolver: EmotionResolver::new(),
            segmenter: TextSegmenter::new(config.max_length),
            config,
        }
    }

    pub fn engine(&self) -> &SynthesisEngineFacade {
        &self.engine
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// 单条合成：一次引擎调用
    pub async fn synthesize(
        &self,
        command: SynthesizeCommand,
    ) -> Result<SingleSynthesis, SynthesisError> {
        let mut trace = RequestTrace::start("single");

        trace.advance(RequestState::Validating);
        let reference = self
            .validate(&command.text, command.reference_audio.as_ref())
            .map_err(|e| trace.fail(e))?;

        let guard = self
            .stage(trace.request_id, reference)
            .await
            .map_err(|e| trace.fail(e))?;
        trace.advance(RequestState::ResourceStaged);

        let emotion = self
            .resolve_emotion(&command.emotion)
            .map_err(|e| trace.fail(e))?;
        trace.advance(RequestState::EmotionResolved);

        trace.advance(RequestState::Synthesizing);
        ensure_dir(&self.config.output_dir)
            .await
            .map_err(|e| trace.fail(e))?;
        let output_path = self
            .config
            .output_dir
            .join(format!("api_output_{}.wav", output_stamp()));

        let artifact = self
            .engine
            .synthesize_one(
                command.text.trim(),
                guard.path(),
                &emotion,
                command.use_random,
                &output_path,
            )
            .await
            .map_err(|e| trace.fail(e.into()))?;

        guard.release();
        trace.advance(RequestState::Completed);

        tracing::info!(
            request_id = %trace.request_id,
            output = %artifact.path.display(),
            size = artifact.size_bytes,
            "Synthesis completed"
        );

        Ok(SingleSynthesis {
            request_id: trace.request_id,
            output_path: artifact.path,
            duration_ms: artifact.duration_ms,
        })
    }

    /// 批量合成：逐条调用引擎，部分失败仍返回成功结果
    pub async fn batch_synthesize(
        &self,
        command: BatchSynthesizeCommand,
    ) -> Result<BatchSynthesis, SynthesisError> {
        let mut trace = RequestTrace::start("batch");
        self.run_batch(&mut trace, command).await
    }

    /// 长文本合成：分段、批量合成，再将成功片段合并为一个文件
    pub async fn synthesize_long(
        &self,
        command: SynthesizeCommand,
    ) -> Result<LongFormSynthesis, SynthesisError> {
        let mut trace = RequestTrace::start("long_form");
        let batch = self
            .run_batch(&mut trace, BatchSynthesizeCommand::long_form(command))
            .await?;

        let merged_path = batch.output_dir.join(MERGED_FILE_NAME);
        let (merged_file, merge_error) = match self.merge(&batch, &merged_path).await {
            Ok(()) => (Some(merged_path), None),
            Err(e) => {
                tracing::warn!(
                    request_id = %trace.request_id,
                    error = %e,
                    "Failed to merge long-form output"
                );
                (None, Some(e))
            }
        };

        Ok(LongFormSynthesis {
            batch,
            merged_file,
            merge_error,
        })
    }

    async fn run_batch(
        &self,
        trace: &mut RequestTrace,
        command: BatchSynthesizeCommand,
    ) -> Result<BatchSynthesis, SynthesisError> {
        trace.advance(RequestState::Validating);
        let units = self.split_units(&command.units);
        let reference = self
            .validate_units(&units, command.reference_audio.as_ref())
            .map_err(|e| trace.fail(e))?;

        let guard = self
            .stage(trace.request_id, reference)
            .await
            .map_err(|e| trace.fail(e))?;
        trace.advance(RequestState::ResourceStaged);

        let emotion = self
            .resolve_emotion(&command.emotion)
            .map_err(|e| trace.fail(e))?;
        trace.advance(RequestState::EmotionResolved);

        trace.advance(RequestState::Synthesizing);
        let output_dir = self
            .config
            .output_dir
            .join(format!("batch_{}", output_stamp()));
        ensure_dir(&output_dir).await.map_err(|e| trace.fail(e))?;

        let results = self
            .engine
            .synthesize_many(&units, guard.path(), &emotion, command.use_random, &output_dir)
            .await;
        guard.release();

        let total_count = units.len();
        let mut outputs = Vec::new();
        let mut failures = Vec::new();
        for (index, (text, result)) in units.into_iter().zip(results).enumerate() {
            match result {
                Ok(artifact) => outputs.push(UnitOutput {
                    index,
                    path: artifact.path,
                }),
                Err(e) => failures.push(UnitFailure {
                    index,
                    text,
                    error: e.to_string(),
                }),
            }
        }

        if outputs.is_empty() {
            return Err(trace.fail(SynthesisError::AllUnitsFailed {
                total: total_count,
                failures,
            }));
        }

        trace.advance(RequestState::Completed);
        tracing::info!(
            request_id = %trace.request_id,
            total = total_count,
            succeeded = outputs.len(),
            failed = failures.len(),
            output_dir = %output_dir.display(),
            "Batch synthesis completed"
        );

        Ok(BatchSynthesis {
            request_id: trace.request_id,
            output_dir,
            total_count,
            outputs,
            failures,
        })
    }

    fn split_units(&self, units: &BatchUnits) -> Vec<String> {
        match units {
            BatchUnits::Presplit(texts) => texts
                .iter()
                .flat_map(|text| split_lines(text))
                .collect(),
            BatchUnits::Segment(text) => self
                .segmenter
                .segment(text)
                .into_iter()
                .map(|chunk| chunk.content)
                .collect(),
        }
    }

    /// 基础校验，在暂存之前完成
    fn validate<'a>(
        &self,
        text: &str,
        reference: Option<&'a ReferenceAudio>,
    ) -> Result<&'a ReferenceAudio, SynthesisError> {
        self.check_engine()?;
        if text.trim().is_empty() {
            return Err(SynthesisError::validation("Text cannot be empty"));
        }
        require_reference(reference)
    }

    fn validate_units<'a>(
        &self,
        units: &[String],
        reference: Option<&'a ReferenceAudio>,
    ) -> Result<&'a ReferenceAudio, SynthesisError> {
        self.check_engine()?;
        if units.is_empty() {
            return Err(SynthesisError::validation("Text list cannot be empty"));
        }
        require_reference(reference)
    }

    /// 引擎未加载时直接返回 EngineUnavailable，先于任何表单解析与暂存
    pub fn check_engine(&self) -> Result<(), SynthesisError> {
        match self.engine.handle().unavailable_reason() {
            None => Ok(()),
            Some(reason) => Err(SynthesisError::EngineUnavailable(format!(
                "TTS model not loaded: {}",
                reason
            ))),
        }
    }

    async fn stage(
        &self,
        request_id: Uuid,
        reference: &ReferenceAudio,
    ) -> Result<StagingGuard, SynthesisError> {
        let resource = self
            .staging
            .stage(request_id, &reference.data, &reference.extension())
            .await?;
        Ok(StagingGuard::new(self.staging.clone(), resource))
    }

    fn resolve_emotion(&self, input: &EmotionInput) -> Result<EmotionParams, SynthesisError> {
        Ok(self.resolver.resolve_input(input)?)
    }

    /// 合并成功片段：转单声道、统一采样率、可选归一化
    async fn merge(&self, batch: &BatchSynthesis, merged_path: &Path) -> Result<(), String> {
        let codec = self.codec.clone();
        let paths = batch.output_files();
        let target_rate = self.config.sample_rate;
        let normalize = self.config.normalize;
        let merged_path = merged_path.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<(), CodecError> {
            let clips = paths
                .iter()
                .map(|path| {
                    codec
                        .load(path)
                        .map(|clip| codec.resample(&clip.to_mono(), target_rate))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let mut merged = AudioClip::concat(&clips)?;
            if normalize {
                merged.normalize();
            }
            codec.save(&merged, &merged_path)
        })
        .await
        .map_err(|e| format!("Merge task failed: {}", e))?
        .map_err(|e| e.to_string())
    }
}

fn require_reference(
    reference: Option<&ReferenceAudio>,
) -> Result<&ReferenceAudio, SynthesisError> {
    match reference {
        Some(audio) if !audio.data.is_empty() => Ok(audio),
        _ => Err(SynthesisError::validation("Reference audio file is required")),
    }
}

async fn ensure_dir(dir: &Path) -> Result<(), SynthesisError> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        SynthesisError::ResourceStaging(format!(
            "Failed to create output directory {}: {}",
            dir.display(),
            e
        ))
    })
}
