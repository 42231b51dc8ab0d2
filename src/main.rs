use anyhow::Context;
use reddit_client::{Collector, CollectorConfig};
use threadscout_core::{AppConfig, ErrorExt, FileConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("threadscout=info,reddit_client=info")
        .init();

    tracing::info!("Starting Threadscout - Reddit content collector");

    let mut config = AppConfig::from_env().context("loading configuration from environment")?;
    if let Ok(path) = std::env::var("THREADSCOUT_CONFIG") {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path))?;
        config.apply_file(FileConfig::from_toml_str(&raw)?);
    }
    config.validate()?;

    let collector = Collector::with_http_api(&config, CollectorConfig::default());
    let result = match collector
        .run(&config.subreddits, config.per_source_limit)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            e.log_error();
            anyhow::bail!(e.user_friendly_message());
        }
    };

    tracing::info!(
        "Collected {} unique posts across {} subreddits",
        result.total,
        result.counts_by_subreddit.len()
    );
    for (subreddit, count) in &result.counts_by_subreddit {
        tracing::info!("r/{}: {} posts", subreddit, count);
    }
    for failure in &result.failures {
        tracing::warn!("r/{} contributed nothing: {}", failure.subreddit, failure.detail);
    }

    Ok(())
}
