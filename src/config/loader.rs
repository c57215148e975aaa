//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量（固定白名单）
//! 2. 配置文件（config.yaml / config.toml 等）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::types::{AppConfig, TtsBackend};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径（扩展名由 config crate 自动识别）
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "INDEXTTS_CONFIG";

/// 允许覆盖配置的环境变量白名单：(环境变量, 配置键)
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("TTS_URL", "tts.url"),
    ("TTS_MODEL_DIR", "tts.model_dir"),
    ("TTS_CONFIG_PATH", "tts.config_path"),
    ("AUDIO_SAMPLE_RATE", "audio.sample_rate"),
    ("AUDIO_OUTPUT_DIR", "audio.output_dir"),
    ("API_HOST", "api.host"),
    ("API_PORT", "api.port"),
    ("API_WORKERS", "api.workers"),
    ("LOG_LEVEL", "log.level"),
];

/// 加载应用配置
///
/// 若设置了 `INDEXTTS_CONFIG`，则从该路径读取配置文件，否则搜索默认文件名。
///
/// # 环境变量示例
/// - `API_PORT=9000`
/// - `TTS_URL=http://gpu-box:9880`
/// - `AUDIO_OUTPUT_DIR=/data/outputs`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let explicit = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    load_config_with(explicit.as_deref(), |key| std::env::var(key).ok())
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_config_with(config_path, |key| std::env::var(key).ok())
}

/// 加载配置，环境变量通过 `lookup_env` 读取
pub(crate) fn load_config_with<F>(
    config_path: Option<&Path>,
    lookup_env: F,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("api.host", "127.0.0.1")?
        .set_default("api.port", 8000)?
        .set_default("api.workers", 1)?
        .set_default("tts.backend", "http")?
        .set_default("tts.url", "http://127.0.0.1:9880")?
        .set_default("tts.model_dir", "index-tts/checkpoints")?
        .set_default("tts.config_path", "index-tts/checkpoints/config.yaml")?
        .set_default("tts.use_v2", true)?
        .set_default("audio.sample_rate", 22050)?
        .set_default("audio.output_dir", "outputs")?
        .set_default("text.max_length", 500)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量白名单（最高优先级）
    for (env_key, config_key) in ENV_OVERRIDES {
        builder = builder.set_override_option(*config_key, lookup_env(env_key))?;
    }

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.api.port == 0 {
        return Err(ConfigError::ValidationError(
            "API port cannot be 0".to_string(),
        ));
    }

    if config.api.workers == 0 {
        return Err(ConfigError::ValidationError(
            "API workers must be at least 1".to_string(),
        ));
    }

    if config.tts.backend == TtsBackend::Http && config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.tts.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "TTS max_concurrent must be at least 1".to_string(),
        ));
    }

    if config.audio.sample_rate == 0 {
        return Err(ConfigError::ValidationError(
            "Audio sample rate cannot be 0".to_string(),
        ));
    }

    if config.text.max_length == 0 {
        return Err(ConfigError::ValidationError(
            "Text max_length cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("API: {}:{} (workers={})", config.api.host, config.api.port, config.api.workers);
    tracing::info!("TTS Backend: {:?}", config.tts.backend);
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS Model Dir: {}", config.tts.model_dir);
    tracing::info!("TTS V2: {}", config.tts.use_v2);
    tracing::info!("Sample Rate: {}", config.audio.sample_rate);
    tracing::info!("Output Directory: {:?}", config.audio.output_dir);
    tracing::info!("Staging Directory: {:?}", config.audio.staging_dir);
    tracing::info!("Text Max Length: {}", config.text.max_length);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.api.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_tts_url() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());

        // fake 后端不需要 URL
        config.tts.backend = TtsBackend::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_max_length() {
        let mut config = AppConfig::default();
        config.text.max_length = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "api:\n  port: 9001\ntts:\n  backend: fake\n  use_v2: false").unwrap();

        let config = load_config_with(Some(&path), no_env).unwrap();
        assert_eq!(config.api.port, 9001);
        assert_eq!(config.tts.backend, TtsBackend::Fake);
        assert!(!config.tts.use_v2);
        assert_eq!(config.api.host, "127.0.0.1");
    }

    #[test]
    fn test_env_allow_list_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "api:\n  port: 9001\naudio:\n  sample_rate: 16000\n").unwrap();

        let env: HashMap<&str, &str> = [
            ("API_PORT", "9100"),
            ("AUDIO_SAMPLE_RATE", "24000"),
            ("TTS_MODEL_DIR", "/models/index-tts"),
        ]
        .into_iter()
        .collect();

        let config =
            load_config_with(Some(&path), |key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api.port, 9100);
        assert_eq!(config.audio.sample_rate, 24000);
        assert_eq!(config.tts.model_dir, "/models/index-tts");
    }

    #[test]
    fn test_unlisted_env_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "log:\n  level: warn\n").unwrap();

        let config = load_config_with(Some(&path), |key| match key {
            "LOG_JSON" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.log.level, "warn");
        assert!(!config.log.json);
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "text:\n  max_length: 0\n").unwrap();

        let result = load_config_with(Some(&path), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
