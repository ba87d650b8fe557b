// src/ingest/types.rs
use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};

use crate::error::FetchError;

/// One wire item, flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub slug: String,
    pub byline: String,
    pub section: String,
    pub item_type: String,
    pub material_type_facet: String,
    pub des_facet: Vec<String>,
    pub org_facet: Vec<String>,
    pub per_facet: Vec<String>,
    pub geo_facet: Vec<String>,
    pub title: String,
    pub abstract_text: String,
    /// Exactly as the feed sent it.
    pub first_published_raw: String,
    /// Europe/London.
    pub first_published: DateTime<Tz>,
}

impl Article {
    /// Text submitted for sentiment analysis: `"{title}. {abstract}"`.
    pub fn analysis_text(&self) -> String {
        format!("{}. {}", self.title, self.abstract_text)
    }
}

#[async_trait::async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<Article>, FetchError>;
    fn name(&self) -> &'static str;
}

/// Facet fields arrive as a list of strings, or `""` when the item has none.
pub(crate) fn facet_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        One(String),
    }

    let raw: Option<Raw> = Option::deserialize(d)?;
    let items = match raw {
        None => Vec::new(),
        Some(Raw::List(v)) => v,
        Some(Raw::One(s)) => vec![s],
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// `null` and missing both become an empty string.
pub(crate) fn text_or_empty<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
