use hls_proxy::{config, server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Optional .env file; real environment variables take precedence
    let dotenv = dotenvy::dotenv();

    // Setup logging
    tracing_subscriber::fmt::init();

    if let Err(e) = dotenv
        && !e.not_found()
    {
        error!("Failed to read .env file: {}", e);
    }

    info!("🚀 Starting HLS proxy");

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Upstream referer: {}, cache TTL: {}s",
        config.referer_url, config.cache_ttl_secs
    );

    if let Err(e) = server::start(config).await {
        error!("Failed to start server: {}", e);
        std::process::exit(1);
    }
}
