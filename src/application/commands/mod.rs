//! 应用层 - 命令
//!
//! 合成请求命令及其处理器

mod synthesis_commands;

pub mod handlers;

pub use synthesis_commands::*;
