//! WAV Codec - 基于 symphonia 的音频读写
//!
//! - 读取：symphonia 探测并解码为交错 f32 PCM
//! - 写入：16-bit PCM WAV
//! - 重采样：线性插值

use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioClip, AudioCodecPort, CodecError};

/// WAV 编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl WavCodec {
    pub fn new() -> Self {
        Self
    }
}

impl AudioCodecPort for WavCodec {
    fn load(&self, path: &Path) -> Result<AudioClip, CodecError> {
        let data = std::fs::read(path)
            .map_err(|e| CodecError::IoError(format!("{}: {}", path.display(), e)))?;
        let extension = path.extension().and_then(|ext| ext.to_str());
        decode(data, extension)
    }

    fn save(&self, clip: &AudioClip, path: &Path) -> Result<(), CodecError> {
        if clip.channels == 0 || clip.sample_rate == 0 {
            return Err(CodecError::InvalidInput(format!(
                "Cannot encode {}Hz/{}ch audio",
                clip.sample_rate, clip.channels
            )));
        }
        std::fs::write(path, encode_wav(clip))
            .map_err(|e| CodecError::IoError(format!("{}: {}", path.display(), e)))
    }

    fn resample(&self, clip: &AudioClip, target_rate: u32) -> AudioClip {
        if clip.sample_rate == target_rate || clip.sample_rate == 0 || clip.channels == 0 {
            return clip.clone();
        }

        let ratio = target_rate as f64 / clip.sample_rate as f64;
        let channel_count = clip.channels as usize;
        let frame_count = clip.frames();
        if frame_count == 0 {
            return AudioClip::new(Vec::new(), target_rate, clip.channels);
        }
        let new_frame_count = (frame_count as f64 * ratio) as usize;
        let mut resampled = Vec::with_capacity(new_frame_count * channel_count);

        for i in 0..new_frame_count {
            let src_pos = i as f64 / ratio;
            let src_idx = src_pos as usize;
            let frac = (src_pos - src_idx as f64) as f32;

            for ch in 0..channel_count {
                let idx0 = src_idx * channel_count + ch;
                let idx1 = (src_idx + 1).min(frame_count - 1) * channel_count + ch;

                let s0 = clip.samples.get(idx0).copied().unwrap_or(0.0);
                let s1 = clip.samples.get(idx1).copied().unwrap_or(s0);
                resampled.push(s0 + (s1 - s0) * frac);
            }
        }

        AudioClip::new(resampled, target_rate, clip.channels)
    }
}

/// 解码任意 symphonia 支持的容器（当前启用 WAV）
fn decode(data: Vec<u8>, extension: Option<&str>) -> Result<AudioClip, CodecError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(extension.unwrap_or("wav"));

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| CodecError::DecodingError(format!("Probe failed: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| CodecError::DecodingError("No audio track found".to_string()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| CodecError::DecodingError("Unknown sample rate".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .ok_or_else(|| CodecError::DecodingError("Unknown channel count".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| CodecError::DecodingError(format!("Decoder creation failed: {}", e)))?;

    let track_id = track.id;
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(CodecError::DecodingError(format!(
                    "Packet read error: {}",
                    e
                )));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "Decode error, skipping packet");
                continue;
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let actual_samples = num_frames * spec.channels.count();
        samples.extend(&sample_buf.samples()[..actual_samples]);
    }

    Ok(AudioClip::new(samples, sample_rate, channels))
}

/// 将 PCM f32 样本编码为 16-bit WAV
pub fn encode_wav(clip: &AudioClip) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let num_channels = clip.channels;
    let sample_rate = clip.sample_rate;
    let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = num_channels * (bits_per_sample / 8);

    let data_size = clip.samples.len() * 2;
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(44 + data_size);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(file_size as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&num_channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());

    for &s in &clip.samples {
        let sample = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}
