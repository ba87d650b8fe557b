// src/ingest/newswire.rs
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

use crate::config::WireConfig;
use crate::error::FetchError;
use crate::ingest::parse_first_published;
use crate::ingest::types::{facet_list, text_or_empty, Article, ArticleSource};

const FEED_PATH: &str = "/svc/news/v3/content/all/all.json";

#[derive(Debug, Deserialize)]
struct Feed {
    results: Vec<Item>,
}

/// Every column must be present; `""` and `null` values are fine.
#[derive(Debug, Deserialize)]
struct Item {
    slug_name: String,
    #[serde(deserialize_with = "text_or_empty")]
    byline: String,
    #[serde(deserialize_with = "text_or_empty")]
    section: String,
    #[serde(deserialize_with = "text_or_empty")]
    item_type: String,
    #[serde(deserialize_with = "text_or_empty")]
    material_type_facet: String,
    #[serde(deserialize_with = "facet_list")]
    des_facet: Vec<String>,
    #[serde(deserialize_with = "facet_list")]
    org_facet: Vec<String>,
    #[serde(deserialize_with = "facet_list")]
    per_facet: Vec<String>,
    #[serde(deserialize_with = "facet_list")]
    geo_facet: Vec<String>,
    title: String,
    #[serde(rename = "abstract", deserialize_with = "text_or_empty")]
    abstract_text: String,
    first_published_date: String,
}

impl Item {
    fn into_article(self) -> Result<Article, FetchError> {
        let first_published = parse_first_published(&self.first_published_date).ok_or_else(|| {
            FetchError::Timestamp {
                slug: self.slug_name.clone(),
                value: self.first_published_date.clone(),
            }
        })?;
        Ok(Article {
            slug: self.slug_name,
            byline: self.byline,
            section: self.section,
            item_type: self.item_type,
            material_type_facet: self.material_type_facet,
            des_facet: self.des_facet,
            org_facet: self.org_facet,
            per_facet: self.per_facet,
            geo_facet: self.geo_facet,
            title: self.title,
            abstract_text: self.abstract_text,
            first_published_raw: self.first_published_date,
            first_published,
        })
    }
}

/// Parse a wire-feed response body. One article per `results` entry.
pub fn parse_feed(body: &str) -> Result<Vec<Article>, FetchError> {
    let feed: Feed = serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    feed.results.into_iter().map(Item::into_article).collect()
}

/// NYT "Times Wire" source: live HTTP, or a captured response body.
pub struct NewswireSource {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        client: reqwest::Client,
        url: String,
        api_key: String,
        limit: u32,
    },
}

impl NewswireSource {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
        }
    }

    pub fn from_config(cfg: &WireConfig, api_key: String) -> Result<Self, FetchError> {
        if !cfg.verify_tls {
            tracing::warn!(target: "ingest", "TLS certificate verification disabled for wire feed");
        }
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("newswire-sentiment/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!cfg.verify_tls);
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(FetchError::Network)?;
        Ok(Self {
            mode: Mode::Http {
                client,
                url: format!("{}{}", cfg.base_url.trim_end_matches('/'), FEED_PATH),
                api_key,
                limit: cfg.limit,
            },
        })
    }

    async fn body(&self) -> Result<String, FetchError> {
        match &self.mode {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http {
                client,
                url,
                api_key,
                limit,
            } => {
                let limit = limit.to_string();
                let resp = client
                    .get(url)
                    .query(&[("api-key", api_key.as_str()), ("limit", limit.as_str())])
                    .send()
                    .await
                    .map_err(FetchError::Network)?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                    });
                }
                resp.text().await.map_err(FetchError::Network)
            }
        }
    }
}

#[async_trait]
impl ArticleSource for NewswireSource {
    async fn fetch_latest(&self) -> Result<Vec<Article>, FetchError> {
        let t0 = std::time::Instant::now();
        let body = self.body().await?;
        let articles = parse_feed(&body)?;

        histogram!("wire_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("wire_articles_total").increment(articles.len() as u64);
        Ok(articles)
    }

    fn name(&self) -> &'static str {
        "nyt-wire"
    }
}
