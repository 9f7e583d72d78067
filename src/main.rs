use std::path::PathBuf;

use sitecrawler::config::Config;
use sitecrawler::crawler::CrawlOptions;
use sitecrawler::storage::{PgStore, StorageConfig};
use sitecrawler::tracker;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().expect("failed to load configuration");

    let store = PgStore::connect(StorageConfig {
        database_url: config.database_url.clone(),
    })
    .await
    .expect("failed to connect to database");

    let crawl_options = CrawlOptions {
        num_workers: config.num_workers,
        user_agent: config.user_agent.clone(),
        timeout_secs: config.timeout_secs,
    };
    let results_dir = PathBuf::from(config.results_dir.clone());

    tracing::info!(
        num_workers = config.num_workers,
        results_dir = %config.results_dir,
        "task tracker starting"
    );

    tracker::run_forever(&store, &crawl_options, &results_dir).await;
}
