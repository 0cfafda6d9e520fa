use std::sync::Arc;

use ops_mcp_rs::config::{load_config, AppConfig};
use ops_mcp_rs::mcp::serve;
use ops_mcp_rs::observability::init_tracing;
use ops_mcp_rs::session::OpsSession;
use tokio::io::BufReader;

const CONFIG_PATH_ENV: &str = "OPS_MCP_CONFIG";

fn main() {
    // A missing .env file is normal; credentials may come from the real environment.
    let _ = dotenv::dotenv();

    let config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => load_config(&path).unwrap_or_else(|e| {
            eprintln!("Failed to load configuration from {path}: {e}");
            std::process::exit(1);
        }),
        Err(_) => AppConfig::default(),
    };

    init_tracing(&config.features.log_level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Failed to initialize Tokio runtime: {e}");
            std::process::exit(1);
        });

    runtime.block_on(async move {
        run(config).await;
    });
}

async fn run(config: AppConfig) {
    tracing::info!(
        "ops-mcp starting on stdio (base_url='{}', timeout={}s)",
        config.ops.base_url,
        config.ops.timeout
    );

    let session = Arc::new(OpsSession::new(config));
    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(err) = serve(session, stdin, tokio::io::stdout()).await {
        tracing::error!(error = %err, "stdio transport failed");
        std::process::exit(1);
    }

    tracing::info!("stdin closed, shutting down");
}
