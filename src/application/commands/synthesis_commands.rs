//! Synthesis Commands - 合成请求命令与结果

use std::path::{Path, PathBuf};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::EmotionInput;

/// 默认参考音频扩展名
pub const DEFAULT_REFERENCE_EXTENSION: &str = "wav";

/// 上传的参考音频
#[derive(Debug, Clone)]
pub struct ReferenceAudio {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
}

impl ReferenceAudio {
    pub fn new(data: Vec<u8>, file_name: Option<String>) -> Self {
        Self { data, file_name }
    }

    /// 暂存文件扩展名，取自上传文件名，无法识别时为 wav
    pub fn extension(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .unwrap_or_else(|| DEFAULT_REFERENCE_EXTENSION.to_string())
    }
}

/// 单条合成命令
#[derive(Debug, Clone, Default)]
pub struct SynthesizeCommand {
    pub text: String,
    pub reference_audio: Option<ReferenceAudio>,
    pub emotion: EmotionInput,
    pub use_random: bool,
}

/// 批量合成的文本单元来源
#[derive(Debug, Clone)]
pub enum BatchUnits {
    /// 调用方已拆分好的文本列表
    Presplit(Vec<String>),
    /// 由分段器拆分的长文本
    Segment(String),
}

/// 批量合成命令
#[derive(Debug, Clone)]
pub struct BatchSynthesizeCommand {
    pub units: BatchUnits,
    pub reference_audio: Option<ReferenceAudio>,
    pub emotion: EmotionInput,
    pub use_random: bool,
}

impl BatchSynthesizeCommand {
    /// 长文本命令：分段后批量合成
    pub fn long_form(command: SynthesizeCommand) -> Self {
        Self {
            units: BatchUnits::Segment(command.text),
            reference_audio: command.reference_audio,
            emotion: command.emotion,
            use_random: command.use_random,
        }
    }
}

/// 单条合成结果
#[derive(Debug, Clone)]
pub struct SingleSynthesis {
    pub request_id: Uuid,
    pub output_path: PathBuf,
    pub duration_ms: Option<u64>,
}

impl SingleSynthesis {
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "output.wav".to_string())
    }
}

/// 批量合成中成功的单元
#[derive(Debug, Clone, Serialize)]
pub struct UnitOutput {
    pub index: usize,
    pub path: PathBuf,
}

/// 批量合成中失败的单元
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub index: usize,
    pub text: String,
    pub error: String,
}

/// 批量合成结果（至少一个单元成功）
#[derive(Debug, Clone)]
pub struct BatchSynthesis {
    pub request_id: Uuid,
    pub output_dir: PathBuf,
    pub total_count: usize,
    /// 按原始顺序排列
    pub outputs: Vec<UnitOutput>,
    /// 按原始顺序排列
    pub failures: Vec<UnitFailure>,
}

impl BatchSynthesis {
    pub fn success_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        self.outputs.iter().map(|o| o.path.clone()).collect()
    }
}

/// 长文本合成结果
#[derive(Debug, Clone)]
pub struct LongFormSynthesis {
    pub batch: BatchSynthesis,
    /// 合并后的单个音频文件
    pub merged_file: Option<PathBuf>,
    /// 合并失败原因（不影响各片段结果）
    pub merge_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_extension() {
        let audio = |name: Option<&str>| ReferenceAudio::new(vec![1], name.map(str::to_string));

        assert_eq!(audio(Some("voice.MP3")).extension(), "mp3");
        assert_eq!(audio(Some("speaker.flac")).extension(), "flac");
        assert_eq!(audio(Some("no_extension")).extension(), "wav");
        assert_eq!(audio(Some("weird.w@v")).extension(), "wav");
        assert_eq!(audio(Some("x.toolongext")).extension(), "wav");
        assert_eq!(audio(None).extension(), "wav");
    }

    #[test]
    fn test_long_form_command_segments_text() {
        let command = SynthesizeCommand {
            text: "很长的文本".to_string(),
            use_random: true,
            ..Default::default()
        };
        let batch = BatchSynthesizeCommand::long_form(command);
        assert!(matches!(batch.units, BatchUnits::Segment(ref t) if t == "很长的文本"));
        assert!(batch.use_random);
    }
}
