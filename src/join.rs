// src/join.rs
//! Join sentiment records back onto the articles they came from.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ingest::types::Article;
use crate::sentiment::SentimentRecord;

/// A sentiment record with its article's columns, when the article is known.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub record: SentimentRecord,
    pub article: Option<Arc<Article>>,
}

/// Left join on `record.article_id == article.slug`. Records whose article is
/// unknown are kept with `article: None`; they never reach a facet group.
pub fn join(records: Vec<SentimentRecord>, articles: &[Article]) -> Vec<JoinedRow> {
    let mut by_slug: HashMap<&str, Arc<Article>> = HashMap::with_capacity(articles.len());
    for a in articles {
        if by_slug.contains_key(a.slug.as_str()) {
            tracing::warn!(target: "join", slug = %a.slug, "duplicate article slug; keeping first");
            continue;
        }
        by_slug.insert(a.slug.as_str(), Arc::new(a.clone()));
    }

    let mut unmatched = 0usize;
    let rows: Vec<JoinedRow> = records
        .into_iter()
        .map(|record| {
            let article = by_slug.get(record.article_id.as_str()).cloned();
            if article.is_none() {
                unmatched += 1;
            }
            JoinedRow { record, article }
        })
        .collect();

    if unmatched > 0 {
        tracing::warn!(target: "join", unmatched, "sentiment records without a matching article");
    }
    rows
}
