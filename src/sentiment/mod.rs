// src/sentiment/mod.rs
//! Sentiment analysis: provider abstraction, per-text analysis and the
//! sequential per-article batch.

pub mod auth;
pub mod google;
pub mod lexicon;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AnalyzeError;
use crate::ingest::clean_text;
use crate::ingest::types::Article;

pub use google::GoogleLanguageProvider;
pub use lexicon::LexiconProvider;

/// Level a sentiment score applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Document,
    Sentence,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Document => "document",
            Granularity::Sentence => "sentence",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" => Some(Granularity::Document),
            "sentence" => Some(Granularity::Sentence),
            _ => None,
        }
    }
}

/// One row per (article, granularity) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentRecord {
    pub article_id: String,
    pub level: Granularity,
    /// Sentence level only.
    pub sentence_text: Option<String>,
    pub score: f64,
    pub magnitude: f64,
    /// Document level only.
    pub language: Option<String>,
}

impl SentimentRecord {
    pub fn document(article_id: &str, score: f64, magnitude: f64, language: String) -> Self {
        Self {
            article_id: article_id.to_string(),
            level: Granularity::Document,
            sentence_text: None,
            score,
            magnitude,
            language: Some(language),
        }
    }

    pub fn sentence(article_id: &str, text: String, score: f64, magnitude: f64) -> Self {
        Self {
            article_id: article_id.to_string(),
            level: Granularity::Sentence,
            sentence_text: Some(text),
            score,
            magnitude,
            language: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentenceSentiment {
    pub text: String,
    pub score: f64,
    pub magnitude: f64,
}

/// What a provider returns for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSentiment {
    pub score: f64,
    pub magnitude: f64,
    pub language: String,
    pub sentences: Vec<SentenceSentiment>,
}

impl DocumentSentiment {
    /// One document record followed by one record per sentence, in order.
    pub fn into_records(self, article_id: &str) -> Vec<SentimentRecord> {
        let mut out = Vec::with_capacity(1 + self.sentences.len());
        out.push(SentimentRecord::document(
            article_id,
            self.score,
            self.magnitude,
            self.language,
        ));
        out.extend(
            self.sentences
                .into_iter()
                .map(|s| SentimentRecord::sentence(article_id, s.text, s.score, s.magnitude)),
        );
        out
    }
}

#[async_trait::async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<DocumentSentiment, AnalyzeError>;
    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn SentimentProvider>;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sentiment_requests_total", "Texts sent to the sentiment provider.");
        describe_counter!("sentiment_failures_total", "Texts whose analysis failed.");
        describe_counter!("sentiment_records_total", "Sentiment records produced.");
        describe_histogram!("sentiment_request_ms", "Sentiment call latency in milliseconds.");
    });
}

/// Analyse one text: exactly one document record plus one per sentence.
pub async fn analyze_text(
    provider: &dyn SentimentProvider,
    text: &str,
    article_id: &str,
) -> Result<Vec<SentimentRecord>, AnalyzeError> {
    ensure_metrics_described();
    counter!("sentiment_requests_total").increment(1);

    let t0 = std::time::Instant::now();
    let result = provider.analyze(text).await;
    histogram!("sentiment_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    match result {
        Ok(doc) => {
            let records = doc.into_records(article_id);
            counter!("sentiment_records_total").increment(records.len() as u64);
            Ok(records)
        }
        Err(e) => {
            counter!("sentiment_failures_total").increment(1);
            Err(e)
        }
    }
}

/// Result of a batch run. Failed articles contribute no records.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<SentimentRecord>,
    pub failed: Vec<String>,
}

/// Analyse every article in order, one request at a time. A failure is logged
/// against its article slug and the batch moves on.
pub async fn analyze_batch(provider: &dyn SentimentProvider, articles: &[Article]) -> BatchOutcome {
    let mut out = BatchOutcome::default();
    let total = articles.len();

    for (i, article) in articles.iter().enumerate() {
        let text = clean_text(&article.analysis_text());
        match analyze_text(provider, &text, &article.slug).await {
            Ok(mut records) => {
                tracing::debug!(
                    target: "sentiment",
                    article = %article.slug,
                    records = records.len(),
                    index = i + 1,
                    total,
                    "article analysed"
                );
                out.records.append(&mut records);
            }
            Err(e) if e.is_auth() => {
                tracing::error!(target: "sentiment", article = %article.slug, error = %e, "sentiment auth failure");
                out.failed.push(article.slug.clone());
            }
            Err(e) => {
                tracing::warn!(target: "sentiment", article = %article.slug, error = %e, "error analysing article");
                out.failed.push(article.slug.clone());
            }
        }
    }

    tracing::info!(
        target: "sentiment",
        provider = provider.name(),
        articles = total,
        failed = out.failed.len(),
        records = out.records.len(),
        "sentiment batch finished"
    );
    out
}

/// One throwaway call to surface credential problems before the batch.
/// Never panics; the outcome is only logged.
pub async fn probe(provider: &dyn SentimentProvider) -> bool {
    match provider.analyze("Test").await {
        Ok(doc) => {
            tracing::info!(target: "sentiment", provider = provider.name(), language = %doc.language, "sentiment probe ok");
            true
        }
        Err(e) => {
            tracing::warn!(target: "sentiment", provider = provider.name(), error = %e, "sentiment probe failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_first_published;
    use std::sync::Mutex;

    /// Fails for any text containing "boom", otherwise splits on '.'.
    struct Scripted {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl SentimentProvider for Scripted {
        async fn analyze(&self, text: &str) -> Result<DocumentSentiment, AnalyzeError> {
            self.seen.lock().unwrap().push(text.to_string());
            if text.contains("boom") {
                return Err(AnalyzeError::Parse("scripted".into()));
            }
            if text.contains("denied") {
                return Err(AnalyzeError::Status {
                    status: 403,
                    body: "PERMISSION_DENIED".into(),
                });
            }
            let sentences = text
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| SentenceSentiment {
                    text: s.to_string(),
                    score: 0.5,
                    magnitude: 0.5,
                })
                .collect();
            Ok(DocumentSentiment {
                score: 0.5,
                magnitude: 1.0,
                language: "en".into(),
                sentences,
            })
        }
        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn article(slug: &str, title: &str, abs: &str) -> Article {
        Article {
            slug: slug.into(),
            byline: String::new(),
            section: String::new(),
            item_type: String::new(),
            material_type_facet: String::new(),
            des_facet: vec![],
            org_facet: vec![],
            per_facet: vec![],
            geo_facet: vec![],
            title: title.into(),
            abstract_text: abs.into(),
            first_published_raw: String::new(),
            first_published: parse_first_published("2020-01-01 00:00:00").unwrap(),
        }
    }

    #[tokio::test]
    async fn one_document_record_then_sentences() {
        let p = Scripted {
            seen: Mutex::new(vec![]),
        };
        let recs = analyze_text(&p, "One. Two. Three.", "a1").await.unwrap();
        assert_eq!(recs.len(), 4);
        assert_eq!(recs[0].level, Granularity::Document);
        assert!(recs[0].sentence_text.is_none());
        assert_eq!(recs[0].language.as_deref(), Some("en"));
        assert!(recs[1..].iter().all(|r| r.level == Granularity::Sentence));
        assert!(recs.iter().all(|r| r.article_id == "a1"));
    }

    #[tokio::test]
    async fn batch_skips_failed_article_and_continues() {
        let p = Scripted {
            seen: Mutex::new(vec![]),
        };
        let arts = vec![
            article("a1", "Good", "Fine"),
            article("a2", "boom", "bad"),
            article("a3", "Also good", "Nice"),
        ];
        let out = analyze_batch(&p, &arts).await;
        assert_eq!(out.failed, vec!["a2".to_string()]);
        let ids: Vec<&str> = out
            .records
            .iter()
            .filter(|r| r.level == Granularity::Document)
            .map(|r| r.article_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a1", "a3"]);
        // title and abstract go out as one text
        assert_eq!(p.seen.lock().unwrap()[0], "Good. Fine");
    }

    #[tokio::test]
    async fn auth_failure_does_not_stop_the_batch() {
        let p = Scripted {
            seen: Mutex::new(vec![]),
        };
        let arts = vec![
            article("a1", "denied", "x"),
            article("a2", "denied", "y"),
            article("a3", "Fine", "z"),
        ];
        let out = analyze_batch(&p, &arts).await;
        assert_eq!(out.failed, vec!["a1".to_string(), "a2".to_string()]);
        assert_eq!(p.seen.lock().unwrap().len(), 3, "every article is still tried");
        assert!(out.records.iter().any(|r| r.article_id == "a3"));
    }

    #[test]
    fn granularity_parse_is_case_insensitive() {
        assert_eq!(Granularity::parse(" Document "), Some(Granularity::Document));
        assert_eq!(Granularity::parse("SENTENCE"), Some(Granularity::Sentence));
        assert_eq!(Granularity::parse("word"), None);
    }
}
