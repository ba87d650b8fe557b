// src/pipeline.rs
//! One run: fetch (or fall back) -> analyse -> join -> rank -> render.

use anyhow::Context;
use rand::{rngs::StdRng, SeedableRng};
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::ingest::snapshot::{read_snapshot, write_snapshot};
use crate::ingest::types::{Article, ArticleSource};
use crate::ingest::{fetch_articles, sample_articles};
use crate::join::{join, JoinedRow};
use crate::rank::{rank, Direction, Facet};
use crate::render::{render_chart, write_gallery, RenderedChart};
use crate::sentiment::{analyze_batch, probe, DynProvider};

/// One chart: a facet ranked in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRequest {
    pub facet: Facet,
    pub direction: Direction,
}

impl ChartRequest {
    pub fn title(&self) -> String {
        let polarity = match self.direction {
            Direction::Descending => "Positive",
            Direction::Ascending => "Negative",
        };
        let by = match self.facet {
            Facet::Organization => "Organisation",
            Facet::Geo => "Geo Location",
            Facet::Descriptor => "Entities",
            Facet::Person => "Person",
            Facet::Title => "Text",
            Facet::Section => "Section",
            Facet::MaterialType => "Material Type",
        };
        format!("Ranked {polarity} by {by}")
    }

    /// Positive then negative for each facet.
    pub fn both(facet: Facet) -> [ChartRequest; 2] {
        [
            ChartRequest {
                facet,
                direction: Direction::Descending,
            },
            ChartRequest {
                facet,
                direction: Direction::Ascending,
            },
        ]
    }
}

/// Organisation, geo, descriptor and title, each positive and negative.
pub fn default_charts() -> Vec<ChartRequest> {
    [Facet::Organization, Facet::Geo, Facet::Descriptor, Facet::Title]
        .into_iter()
        .flat_map(ChartRequest::both)
        .collect()
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub sample_size: usize,
    pub fallback_path: PathBuf,
    pub out_dir: PathBuf,
    pub save_snapshot: Option<PathBuf>,
    pub seed: Option<u64>,
    pub charts: Vec<ChartRequest>,
}

impl RunOptions {
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            sample_size: cfg.sample_size,
            fallback_path: cfg.fallback_path.clone(),
            out_dir: cfg.out_dir.clone(),
            save_snapshot: None,
            seed: None,
            charts: default_charts(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Live,
    Fallback,
}

#[derive(Debug)]
pub struct RunReport {
    pub origin: DataOrigin,
    pub rows: usize,
    pub failed_articles: Vec<String>,
    pub charts: Vec<RenderedChart>,
    pub gallery: PathBuf,
}

/// Analyse the (sampled) live articles and join the records back onto them.
pub async fn analyze_live(
    articles: Vec<Article>,
    provider: &DynProvider,
    sample_size: usize,
    seed: Option<u64>,
) -> (Vec<JoinedRow>, Vec<String>) {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let fetched = articles.len();
    let articles = sample_articles(articles, sample_size, &mut rng);
    tracing::info!(fetched, analysing = articles.len(), "articles selected for analysis");

    probe(provider.as_ref()).await;
    let outcome = analyze_batch(provider.as_ref(), &articles).await;
    (join(outcome.records, &articles), outcome.failed)
}

/// Rank and render every requested chart, then the gallery page.
pub fn render_all(
    rows: &[JoinedRow],
    charts: &[ChartRequest],
    out_dir: &Path,
) -> anyhow::Result<(Vec<RenderedChart>, PathBuf)> {
    let mut rendered = Vec::with_capacity(charts.len());
    for req in charts {
        let ranking = rank(rows, req.facet, req.direction);
        if ranking.is_empty() {
            tracing::warn!(facet = req.facet.column(), "no document-level rows for facet");
        }
        let title = req.title();
        let chart = render_chart(&ranking.labels(), &ranking.scores(), &title, out_dir)
            .with_context(|| format!("rendering chart {title:?}"))?;
        rendered.push(chart);
    }
    let gallery = write_gallery(out_dir, &rendered).context("writing chart gallery")?;
    Ok((rendered, gallery))
}

/// Full run. `source: None` skips the live fetch and goes straight to the
/// fallback snapshot. The provider is only built when live articles arrive.
pub async fn run<F>(
    source: Option<&dyn ArticleSource>,
    make_provider: F,
    opts: &RunOptions,
) -> anyhow::Result<RunReport>
where
    F: FnOnce() -> anyhow::Result<DynProvider>,
{
    let fetched = match source {
        Some(src) => match fetch_articles(src).await {
            Ok(articles) => Some(articles),
            Err(e) => {
                tracing::warn!(error = %e, "error fetching articles from the wire feed; using fallback snapshot");
                None
            }
        },
        None => {
            tracing::info!("offline run; using fallback snapshot");
            None
        }
    };

    let (origin, rows, failed_articles) = match fetched {
        Some(articles) => {
            let provider = make_provider().context("building sentiment provider")?;
            let (rows, failed) = analyze_live(articles, &provider, opts.sample_size, opts.seed).await;
            if let Some(path) = &opts.save_snapshot {
                write_snapshot(path, &rows)?;
            }
            (DataOrigin::Live, rows, failed)
        }
        None => {
            let rows = read_snapshot(&opts.fallback_path)?;
            (DataOrigin::Fallback, rows, Vec::new())
        }
    };

    let (charts, gallery) = render_all(&rows, &opts.charts, &opts.out_dir)?;
    tracing::info!(
        origin = ?origin,
        rows = rows.len(),
        charts = charts.len(),
        gallery = %gallery.display(),
        "run finished"
    );

    Ok(RunReport {
        origin,
        rows: rows.len(),
        failed_articles,
        charts,
        gallery,
    })
}
