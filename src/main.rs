use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use parish::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "parish",
        "Parish starting: RUST_LOG='{}', port={}, api_url='{}', data_dir='{}'",
        rust_log, config.port, config.api_url, config.data_dir
    );

    parish::server::run(config).await
}
