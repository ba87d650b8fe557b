// src/ingest/mod.rs
pub mod newswire;
pub mod snapshot;
pub mod types;

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::{Europe::London, Tz};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use rand::Rng;

use crate::error::FetchError;
use crate::ingest::types::{Article, ArticleSource};

/// Format the wire feed documents for `first_published_date`.
pub const FEED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One-time metrics registration (so series show up in the exposition).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("wire_articles_total", "Articles parsed from the wire feed.");
        describe_counter!(
            "wire_fetch_errors_total",
            "Wire feed fetch/parse failures (run fell back to the snapshot)."
        );
        describe_histogram!("wire_fetch_ms", "Wire feed fetch + parse time in milliseconds.");
    });
}

/// Parse a feed timestamp into Europe/London.
///
/// Naive `YYYY-MM-DD HH:MM:SS` values are taken as UTC; RFC 3339 values keep
/// their own offset before conversion.
pub fn parse_first_published(raw: &str) -> Option<DateTime<Tz>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&London));
    }
    NaiveDateTime::parse_from_str(raw, FEED_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc().with_timezone(&London))
}

/// Clean article text before it goes to the sentiment service:
/// decode HTML entities, drop tags, fold quotes and whitespace.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Keep a random `n` of the fetched articles, in feed order.
/// `n == 0` or `n >= len` keeps everything.
pub fn sample_articles<R: Rng + ?Sized>(articles: Vec<Article>, n: usize, rng: &mut R) -> Vec<Article> {
    if n == 0 || n >= articles.len() {
        return articles;
    }
    let mut picked = rand::seq::index::sample(rng, articles.len(), n).into_vec();
    picked.sort_unstable();
    let mut picked = picked.into_iter().peekable();
    articles
        .into_iter()
        .enumerate()
        .filter_map(|(i, a)| {
            if picked.peek() == Some(&i) {
                picked.next();
                Some(a)
            } else {
                None
            }
        })
        .collect()
}

/// Fetch once from `source`. An empty feed is reported as `FetchError::EmptyFeed`
/// so the caller can tell it apart from a transport failure in the logs.
pub async fn fetch_articles(source: &dyn ArticleSource) -> Result<Vec<Article>, FetchError> {
    ensure_metrics_described();

    match source.fetch_latest().await {
        Ok(articles) if articles.is_empty() => {
            counter!("wire_fetch_errors_total").increment(1);
            Err(FetchError::EmptyFeed)
        }
        Ok(articles) => {
            tracing::info!(target: "ingest", source = source.name(), articles = articles.len(), "wire feed fetched");
            Ok(articles)
        }
        Err(e) => {
            counter!("wire_fetch_errors_total").increment(1);
            Err(e)
        }
    }
}
