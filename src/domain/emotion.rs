//! 情感控制参数
//!
//! 将调用方提交的情感字段整理为引擎可直接使用的参数：
//! - 显式情感向量
//! - 由文本推断情感（带强度 alpha）
//! - 不指定（中性）
//!
//! 解析器只做校验和整形，不调用引擎。

use thiserror::Error;

/// 情感向量维度
pub const EMOTION_DIMENSIONS: usize = 8;

/// 情感向量各维度含义，顺序与引擎一致
pub const EMOTION_LABELS: [&str; EMOTION_DIMENSIONS] = [
    "happy",
    "angry",
    "sad",
    "afraid",
    "disgusted",
    "melancholic",
    "surprised",
    "calm",
];

/// 情感强度默认值
pub const DEFAULT_EMO_ALPHA: f32 = 0.6;

/// 情感参数错误
#[derive(Debug, Error, PartialEq)]
pub enum EmotionError {
    #[error("emotion_vector and use_emo_text cannot be used together")]
    ConflictingModes,

    #[error("Malformed emotion vector: {0}")]
    MalformedVector(String),

    #[error("Emotion vector must have {expected} components, got {actual}")]
    WrongDimensions { expected: usize, actual: usize },

    #[error("Emotion vector component {index} is invalid: {value}")]
    InvalidComponent { index: usize, value: f32 },

    #[error("emo_text is required when use_emo_text is enabled")]
    MissingEmotionText,

    #[error("emo_alpha must be within [0, 1], got {0}")]
    AlphaOutOfRange(f32),
}

/// 调用方提交的原始情感字段
#[derive(Debug, Clone, Default)]
pub struct EmotionInput {
    /// JSON 数组字符串，例如 `[0.8, 0, 0, 0, 0, 0, 0.2, 0]`
    pub emotion_vector: Option<String>,
    pub use_emo_text: bool,
    pub emo_text: Option<String>,
    pub emo_alpha: Option<f32>,
}

/// 情感控制模式（同一时刻至多一种）
#[derive(Debug, Clone, PartialEq)]
pub enum EmotionSpec {
    Explicit(Vec<f32>),
    FromText { text: String, alpha: f32 },
    None,
}

impl EmotionSpec {
    /// 从原始字段构造，检查模式互斥并解码向量
    pub fn from_input(input: &EmotionInput) -> Result<Self, EmotionError> {
        // 空字段与 JSON null 都视为未提供
        let vector_raw = input
            .emotion_vector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "null");

        if vector_raw.is_some() && input.use_emo_text {
            return Err(EmotionError::ConflictingModes);
        }

        if let Some(raw) = vector_raw {
            let vector: Vec<f32> = serde_json::from_str(raw)
                .map_err(|e| EmotionError::MalformedVector(e.to_string()))?;
            return Ok(EmotionSpec::Explicit(vector));
        }

        if input.use_emo_text {
            return Ok(EmotionSpec::FromText {
                text: input.emo_text.clone().unwrap_or_default(),
                alpha: input.emo_alpha.unwrap_or(DEFAULT_EMO_ALPHA),
            });
        }

        Ok(EmotionSpec::None)
    }

    pub fn mode(&self) -> &'static str {
        match self {
            EmotionSpec::Explicit(_) => "explicit",
            EmotionSpec::FromText { .. } => "from_text",
            EmotionSpec::None => "none",
        }
    }
}

/// 校验后的情感参数
#[derive(Debug, Clone, PartialEq)]
pub enum EmotionParams {
    /// 使用引擎默认（中性）参数
    Neutral,
    Vector(Vec<f32>),
    Text { text: String, alpha: f32 },
}

impl EmotionParams {
    pub fn vector(&self) -> Option<&[f32]> {
        match self {
            EmotionParams::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn use_emo_text(&self) -> bool {
        matches!(self, EmotionParams::Text { .. })
    }

    pub fn emo_text(&self) -> Option<&str> {
        match self {
            EmotionParams::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// 非文本模式下返回默认强度
    pub fn alpha(&self) -> f32 {
        match self {
            EmotionParams::Text { alpha, .. } => *alpha,
            _ => DEFAULT_EMO_ALPHA,
        }
    }
}

/// 情感参数解析器
#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionResolver;

impl EmotionResolver {
    pub fn new() -> Self {
        Self
    }

    /// 原始字段 → 校验后的参数
    pub fn resolve_input(&self, input: &EmotionInput) -> Result<EmotionParams, EmotionError> {
        if let Some(alpha) = input.emo_alpha {
            check_alpha(alpha)?;
        }
        self.resolve(EmotionSpec::from_input(input)?)
    }

    pub fn resolve(&self, spec: EmotionSpec) -> Result<EmotionParams, EmotionError> {
        match spec {
            EmotionSpec::Explicit(vector) => {
                if vector.len() != EMOTION_DIMENSIONS {
                    return Err(EmotionError::WrongDimensions {
                        expected: EMOTION_DIMENSIONS,
                        actual: vector.len(),
                    });
                }
                if let Some((index, value)) = vector
                    .iter()
                    .enumerate()
                    .find(|(_, v)| !v.is_finite() || **v < 0.0)
                {
                    return Err(EmotionError::InvalidComponent {
                        index,
                        value: *value,
                    });
                }
                Ok(EmotionParams::Vector(vector))
            }
            EmotionSpec::FromText { text, alpha } => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(EmotionError::MissingEmotionText);
                }
                check_alpha(alpha)?;
                Ok(EmotionParams::Text {
                    text: text.to_string(),
                    alpha,
                })
            }
            EmotionSpec::None => Ok(EmotionParams::Neutral),
        }
    }
}

fn check_alpha(alpha: f32) -> Result<(), EmotionError> {
    if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(EmotionError::AlphaOutOfRange(alpha))
    }
}
