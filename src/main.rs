use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wp_pub_rs::{Config, PostPublisher, PublishOutcome, WpHttpClient, utils};

/// Publish a Markdown article, with its images, as a blog post.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Markdown file to publish; its file name is the post slug
    markdown: PathBuf,

    /// Settings file
    #[arg(short, long, env = "WP_PUB_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::from_file(path).with_context(|| format!("loading settings from {}", path.display()))
}

/// The line printed to stdout once the post is saved.
fn completion_line(outcome: &PublishOutcome) -> String {
    let action = if outcome.created { "created" } else { "updated" };
    format!("Published post id={} ({action})", outcome.id)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wp_pub_rs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let markdown = std::path::absolute(&cli.markdown)
        .with_context(|| format!("resolving {}", cli.markdown.display()))?;
    if !utils::is_markdown_file(&markdown) {
        warn!("{} does not look like a Markdown file", markdown.display());
    }

    info!("Using API {}", config.url.api);
    let backend = Arc::new(WpHttpClient::new(config.clone())?);
    let publisher = PostPublisher::new(config, backend)?;

    let outcome = publisher
        .publish(&markdown)
        .await
        .with_context(|| format!("publishing {}", markdown.display()))?;

    println!("{}", completion_line(&outcome));
    Ok(())
}
