//! Configuration Module
//!
//! 提供应用配置管理功能，支持多层级配置来源：
//! - 环境变量白名单（最高优先级）
//! - 配置文件（YAML / TOML / JSON）
//! - 默认值（最低优先级）

mod loader;
mod types;

pub use loader::{
    load_config, load_config_from_path, print_config, ConfigError, CONFIG_PATH_ENV, ENV_OVERRIDES,
};
pub use types::{
    ApiConfig, AppConfig, AudioConfig, LogConfig, TextConfig, TtsBackend, TtsConfig,
};
