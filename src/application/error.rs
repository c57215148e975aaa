//! 应用层错误定义
//!
//! 调用方可见的合成失败分类，各端口错误在编排器边界转换为此类型

use serde::Serialize;
use thiserror::Error;

use crate::application::commands::UnitFailure;
use crate::application::ports::{StagingError, TtsError};
use crate::domain::EmotionError;

/// 失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ValidationError,
    ResourceStagingError,
    EngineUnavailable,
    EngineError,
    AllUnitsFailed,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ValidationError => "validation_error",
            FailureKind::ResourceStagingError => "resource_staging_error",
            FailureKind::EngineUnavailable => "engine_unavailable",
            FailureKind::EngineError => "engine_error",
            FailureKind::AllUnitsFailed => "all_units_failed",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 合成请求错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// 调用方输入错误
    #[error("Validation error: {0}")]
    Validation(String),

    /// 暂存/输出文件 IO 错误
    #[error("Resource staging error: {0}")]
    ResourceStaging(String),

    /// 引擎加载失败
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// 单次推理失败
    #[error("Engine error: {0}")]
    Engine(String),

    /// 批量模式下所有单元均失败
    #[error("All {total} units failed")]
    AllUnitsFailed {
        total: usize,
        failures: Vec<UnitFailure>,
    },
}

impl SynthesisError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            SynthesisError::Validation(_) => FailureKind::ValidationError,
            SynthesisError::ResourceStaging(_) => FailureKind::ResourceStagingError,
            SynthesisError::EngineUnavailable(_) => FailureKind::EngineUnavailable,
            SynthesisError::Engine(_) => FailureKind::EngineError,
            SynthesisError::AllUnitsFailed { .. } => FailureKind::AllUnitsFailed,
        }
    }
}

impl From<EmotionError> for SynthesisError {
    fn from(err: EmotionError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StagingError> for SynthesisError {
    fn from(err: StagingError) -> Self {
        Self::ResourceStaging(err.to_string())
    }
}

impl From<TtsError> for SynthesisError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::Unavailable(msg) => Self::EngineUnavailable(msg),
            other => Self::Engine(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            SynthesisError::validation("empty").kind(),
            FailureKind::ValidationError
        );
        assert_eq!(
            SynthesisError::from(TtsError::Timeout).kind(),
            FailureKind::EngineError
        );
        assert_eq!(
            SynthesisError::from(TtsError::Unavailable("not loaded".into())).kind(),
            FailureKind::EngineUnavailable
        );
        assert_eq!(
            SynthesisError::from(StagingError::IoError("disk full".into())).kind(),
            FailureKind::ResourceStagingError
        );
        assert_eq!(
            SynthesisError::from(EmotionError::ConflictingModes).kind(),
            FailureKind::ValidationError
        );
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::AllUnitsFailed).unwrap();
        assert_eq!(json, "\"all_units_failed\"");
        assert_eq!(FailureKind::EngineError.to_string(), "engine_error");
    }
}
