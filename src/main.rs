//! IndexTTS Server
//!
//! 启动顺序：配置 → 日志 → 输出目录 → 加载引擎（一次）→ HTTP 服务

use indextts_server::config::{load_config, print_config, AppConfig};
use indextts_server::infrastructure::http::{AppState, HttpServer, ServerConfig};
use indextts_server::infrastructure::load_engine;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},indextts_server={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.api.workers)
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("IndexTTS Server v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    tokio::fs::create_dir_all(&config.audio.output_dir).await?;

    // 引擎只在启动时加载；失败时服务照常启动，合成请求返回 503
    let engine = load_engine(&config.tts).await;
    if let Some(reason) = engine.unavailable_reason() {
        tracing::warn!(reason = %reason, "Serving without a loaded TTS model");
    }

    let state = AppState::from_config(&config, engine)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prepare staging directory: {}", e))?;

    let server = HttpServer::new(ServerConfig::from(&config.api), state);

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
