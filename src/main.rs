//! newswire-sentiment: fetch the NYT wire, score each article, chart the
//! most positive and most negative facets.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newswire_sentiment::config::AppConfig;
use newswire_sentiment::ingest::newswire::NewswireSource;
use newswire_sentiment::metrics::Metrics;
use newswire_sentiment::pipeline::{self, ChartRequest, DataOrigin, RunOptions};
use newswire_sentiment::{build_provider, ArticleSource};

/// Default to info-level logs; override via RUST_LOG.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env for NYT_API_KEY / GOOGLE_APPLICATION_CREDENTIALS; no-op if absent.
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();
    init_tracing(cli.log_json);

    let mut cfg = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut cfg);

    let metrics = match cli.metrics_file {
        Some(_) => Some(Metrics::init()?),
        None => None,
    };

    let source = if cli.offline {
        None
    } else {
        match cfg.wire.resolved_api_key() {
            Ok(key) => Some(NewswireSource::from_config(&cfg.wire, key)?),
            Err(e) => {
                tracing::warn!(error = %e, "no wire API key; skipping live fetch");
                None
            }
        }
    };

    let mut opts = RunOptions::from_config(&cfg.run);
    opts.save_snapshot = cli.save_snapshot.clone();
    opts.seed = cli.seed;
    if let Some(facet) = cli.facet {
        opts.charts = ChartRequest::both(facet).to_vec();
    }

    let sentiment_cfg = cfg.sentiment.clone();
    let report = pipeline::run(
        source.as_ref().map(|s| s as &dyn ArticleSource),
        || build_provider(&sentiment_cfg),
        &opts,
    )
    .await?;

    if report.origin == DataOrigin::Live && !report.failed_articles.is_empty() {
        tracing::warn!(failed = ?report.failed_articles, "some articles were not analysed");
    }
    if let (Some(m), Some(path)) = (&metrics, &cli.metrics_file) {
        m.write_to(path)?;
    }

    println!("{}", report.gallery.display());
    Ok(())
}
