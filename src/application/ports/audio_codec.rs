//! Audio Codec Port - 音频读写抽象
//!
//! 读取/写入音频文件，以及重采样

use std::path::Path;
use thiserror::Error;

/// 编解码错误
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// 解码后的 PCM 音频（交错采样）
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    /// 多声道取平均合并为单声道
    pub fn to_mono(&self) -> AudioClip {
        if self.channels <= 1 {
            return self.clone();
        }
        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();
        AudioClip::new(samples, self.sample_rate, 1)
    }

    /// 峰值归一化，静音保持不变
    pub fn normalize(&mut self) {
        let peak = self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        if peak > 0.0 {
            for sample in &mut self.samples {
                *sample /= peak;
            }
        }
    }

    /// 按顺序拼接，要求采样率与声道数一致
    pub fn concat(clips: &[AudioClip]) -> Result<AudioClip, CodecError> {
        let first = clips
            .first()
            .ok_or_else(|| CodecError::InvalidInput("No clips to concatenate".to_string()))?;

        let mut samples = Vec::with_capacity(clips.iter().map(|c| c.samples.len()).sum());
        for clip in clips {
            if clip.sample_rate != first.sample_rate || clip.channels != first.channels {
                return Err(CodecError::InvalidInput(format!(
                    "Clip format mismatch: {}Hz/{}ch vs {}Hz/{}ch",
                    clip.sample_rate, clip.channels, first.sample_rate, first.channels
                )));
            }
            samples.extend_from_slice(&clip.samples);
        }

        Ok(AudioClip::new(samples, first.sample_rate, first.channels))
    }
}

/// Audio Codec Port
pub trait AudioCodecPort: Send + Sync {
    /// 读取音频文件
    fn load(&self, path: &Path) -> Result<AudioClip, CodecError>;

    /// 写入音频文件（WAV）
    fn save(&self, clip: &AudioClip, path: &Path) -> Result<(), CodecError>;

    /// 重采样到目标采样率
    fn resample(&self, clip: &AudioClip, target_rate: u32) -> AudioClip;
}
