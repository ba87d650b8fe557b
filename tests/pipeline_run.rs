// tests/pipeline_run.rs
//
// End-to-end runs: live fixture feed with the offline lexicon provider, and
// the fallback path when the feed is unavailable.
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use newswire_sentiment::error::FetchError;
use newswire_sentiment::ingest::newswire::NewswireSource;
use newswire_sentiment::ingest::snapshot::read_snapshot;
use newswire_sentiment::pipeline::{self, ChartRequest, DataOrigin, RunOptions};
use newswire_sentiment::render::BarChart;
use newswire_sentiment::sentiment::{DynProvider, LexiconProvider};
use newswire_sentiment::{rank, Article, ArticleSource, Direction, Facet, Granularity};

const WIRE_JSON: &str = include_str!("fixtures/wire_feed.json");

fn fixture_snapshot() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/dfOut.csv")
}

fn options(out_dir: &Path) -> RunOptions {
    RunOptions {
        sample_size: 0,
        fallback_path: fixture_snapshot(),
        out_dir: out_dir.to_path_buf(),
        save_snapshot: None,
        seed: Some(7),
        charts: pipeline::default_charts(),
    }
}

fn lexicon() -> anyhow::Result<DynProvider> {
    Ok(Arc::new(LexiconProvider::new()))
}

fn no_provider() -> anyhow::Result<DynProvider> {
    anyhow::bail!("provider must not be built on the fallback path")
}

struct Unavailable;

#[async_trait]
impl ArticleSource for Unavailable {
    async fn fetch_latest(&self) -> Result<Vec<Article>, FetchError> {
        Err(FetchError::Status { status: 503 })
    }
    fn name(&self) -> &'static str {
        "unavailable"
    }
}

struct Empty;

#[async_trait]
impl ArticleSource for Empty {
    async fn fetch_latest(&self) -> Result<Vec<Article>, FetchError> {
        Ok(Vec::new())
    }
    fn name(&self) -> &'static str {
        "empty"
    }
}

#[tokio::test]
async fn fetch_failure_charts_the_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let opts = options(tmp.path());

    let report = pipeline::run(Some(&Unavailable), no_provider, &opts)
        .await
        .expect("fallback run succeeds");
    assert_eq!(report.origin, DataOrigin::Fallback);
    assert_eq!(report.charts.len(), 8);
    assert!(report.gallery.exists());

    // Each chart is exactly what ranking the snapshot directly would draw.
    let rows = read_snapshot(&fixture_snapshot()).unwrap();
    for (req, chart) in opts.charts.iter().zip(&report.charts) {
        let ranking = rank(&rows, req.facet, req.direction);
        let expected = BarChart::new(&ranking.labels(), &ranking.scores(), &req.title()).to_svg();
        assert_eq!(chart.svg, expected, "chart {:?} differs", req.title());
        assert!(chart.path.exists());
    }
}

#[tokio::test]
async fn offline_and_empty_feed_match_fetch_failure() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let c = tempfile::tempdir().unwrap();

    let failed = pipeline::run(Some(&Unavailable), no_provider, &options(a.path())).await.unwrap();
    let empty = pipeline::run(Some(&Empty), no_provider, &options(b.path())).await.unwrap();
    let offline = pipeline::run(None, no_provider, &options(c.path())).await.unwrap();

    assert_eq!(empty.origin, DataOrigin::Fallback);
    assert_eq!(offline.origin, DataOrigin::Fallback);
    for ((x, y), z) in failed.charts.iter().zip(&empty.charts).zip(&offline.charts) {
        assert_eq!(x.svg, y.svg);
        assert_eq!(x.svg, z.svg);
    }
}

#[tokio::test]
async fn missing_snapshot_after_fetch_failure_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut opts = options(tmp.path());
    opts.fallback_path = tmp.path().join("nope.csv");

    let err = pipeline::run(Some(&Unavailable), no_provider, &opts)
        .await
        .expect_err("no data at all");
    assert!(format!("{err:#}").contains("nope.csv"), "{err:#}");
}

#[tokio::test]
async fn live_run_with_lexicon_ranks_fixture_articles() {
    let tmp = tempfile::tempdir().unwrap();
    let mut opts = options(tmp.path());
    opts.charts = ChartRequest::both(Facet::Geo).to_vec();
    opts.save_snapshot = Some(tmp.path().join("saved.csv"));

    let src = NewswireSource::from_fixture(WIRE_JSON);
    let report = pipeline::run(Some(&src), lexicon, &opts).await.expect("live run");

    assert_eq!(report.origin, DataOrigin::Live);
    assert!(report.failed_articles.is_empty());
    assert_eq!(report.charts.len(), 2);
    assert!(report.charts[0].path.ends_with("ranked-positive-by-geo-location.svg"));

    // The saved snapshot reproduces the live ranking.
    let saved = read_snapshot(&tmp.path().join("saved.csv")).unwrap();
    let docs = saved.iter().filter(|r| r.record.level == Granularity::Document).count();
    assert_eq!(docs, 4, "one document record per article");
    assert!(saved.iter().all(|r| r.article.is_some()));

    let positive = rank(&saved, Facet::Geo, Direction::Descending);
    let negative = rank(&saved, Facet::Geo, Direction::Ascending);
    assert_eq!(negative.entries[0].label, "Florida", "storm article scores lowest");
    assert!(positive.entries[0].score > 0.0);
    let expected = BarChart::new(&positive.labels(), &positive.scores(), "Ranked Positive by Geo Location").to_svg();
    assert_eq!(report.charts[0].svg, expected);
}

#[tokio::test]
async fn sample_size_limits_analysed_articles() {
    let tmp = tempfile::tempdir().unwrap();
    let mut opts = options(tmp.path());
    opts.sample_size = 2;
    opts.save_snapshot = Some(tmp.path().join("saved.csv"));

    let src = NewswireSource::from_fixture(WIRE_JSON);
    pipeline::run(Some(&src), lexicon, &opts).await.unwrap();

    let saved = read_snapshot(&tmp.path().join("saved.csv")).unwrap();
    let mut ids: Vec<&str> = saved.iter().map(|r| r.record.article_id.as_str()).collect();
    ids.dedup();
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn feed_missing_a_facet_column_falls_back() {
    let mut feed: serde_json::Value = serde_json::from_str(WIRE_JSON).unwrap();
    for item in feed["results"].as_array_mut().unwrap() {
        item.as_object_mut().unwrap().remove("org_facet");
    }
    let src = NewswireSource::from_fixture(&feed.to_string());

    let tmp = tempfile::tempdir().unwrap();
    let report = pipeline::run(Some(&src), no_provider, &options(tmp.path()))
        .await
        .expect("fallback run succeeds");
    assert_eq!(report.origin, DataOrigin::Fallback);
}
