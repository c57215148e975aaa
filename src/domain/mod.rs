//! 领域层
//!
//! - text_segmenter: 长文本分段
//! - emotion: 情感控制参数的校验与整形

pub mod emotion;
pub mod text_segmenter;

pub use emotion::{
    EmotionError, EmotionInput, EmotionParams, EmotionResolver, EmotionSpec, DEFAULT_EMO_ALPHA,
    EMOTION_DIMENSIONS, EMOTION_LABELS,
};
pub use text_segmenter::{segment_text, split_lines, TextChunk, TextSegmenter, DEFAULT_MAX_LENGTH};
