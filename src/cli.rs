use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use newswire_sentiment::config::{AppConfig, ProviderKind};
use newswire_sentiment::Facet;

#[derive(Parser)]
#[command(
    name = "newswire-sentiment",
    version,
    about = "Rank NYT wire facets by article sentiment and chart the top/bottom 10"
)]
pub struct Cli {
    /// Config file (TOML). Defaults to $NEWSWIRE_CONFIG, then config/newswire.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Number of wire items to request.
    #[arg(long)]
    pub limit: Option<u32>,
    /// Articles to analyse, sampled at random from the feed (0 = all).
    #[arg(long)]
    pub sample: Option<usize>,
    /// Snapshot CSV used when the live fetch fails.
    #[arg(long)]
    pub fallback: Option<PathBuf>,
    /// Directory the charts and index.html are written to.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,
    /// Only chart this facet (positive and negative). Accepts the facet name
    /// (`geo`) or its column (`geo_facet`).
    #[arg(long, value_parser = parse_facet)]
    pub facet: Option<Facet>,
    /// Skip the live fetch and chart the fallback snapshot.
    #[arg(long)]
    pub offline: bool,
    /// Write the joined table of a live run to this CSV.
    #[arg(long)]
    pub save_snapshot: Option<PathBuf>,
    /// Seed for article sampling.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Write Prometheus exposition text here at the end of the run.
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,
    /// JSON log lines instead of compact text.
    #[arg(long)]
    pub log_json: bool,
}

fn parse_facet(s: &str) -> Result<Facet, String> {
    Facet::from_str(s, true)
        .ok()
        .or_else(|| Facet::from_column(s))
        .ok_or_else(|| {
            let names: Vec<String> = Facet::value_variants()
                .iter()
                .filter_map(|f| f.to_possible_value().map(|v| v.get_name().to_string()))
                .collect();
            format!("unknown facet {s:?}; expected one of {} or a column name", names.join(", "))
        })
}

impl Cli {
    /// Flags win over the config file.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(limit) = self.limit {
            cfg.wire.limit = limit;
        }
        if let Some(n) = self.sample {
            cfg.run.sample_size = n;
        }
        if let Some(p) = &self.fallback {
            cfg.run.fallback_path = p.clone();
        }
        if let Some(p) = &self.out_dir {
            cfg.run.out_dir = p.clone();
        }
        if let Some(kind) = self.provider {
            cfg.sentiment.provider = kind;
        }
    }
}
