// src/sentiment/google.rs
//! Google Cloud Natural Language `documents:analyzeSentiment` (REST v1).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::auth::{Authenticator, Credential};
use super::{DocumentSentiment, SentenceSentiment, SentimentProvider};
use crate::config::SentimentConfig;
use crate::error::AnalyzeError;

const ANALYZE_PATH: &str = "/v1/documents:analyzeSentiment";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    document: Document<'a>,
    encoding_type: &'static str,
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    language: &'a str,
    content: &'a str,
}

// proto3 JSON omits zero values, hence the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Sentiment {
    score: f64,
    magnitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    #[serde(default)]
    document_sentiment: Option<Sentiment>,
    #[serde(default)]
    language: String,
    #[serde(default)]
    sentences: Vec<Sentence>,
}

#[derive(Debug, Deserialize)]
struct Sentence {
    text: TextSpan,
    #[serde(default)]
    sentiment: Sentiment,
}

#[derive(Debug, Deserialize)]
struct TextSpan {
    #[serde(default)]
    content: String,
}

/// Map a raw response body into a `DocumentSentiment`.
pub fn parse_response(body: &str) -> Result<DocumentSentiment, AnalyzeError> {
    let resp: Response = serde_json::from_str(body).map_err(|e| AnalyzeError::Parse(e.to_string()))?;
    let doc = resp
        .document_sentiment
        .ok_or_else(|| AnalyzeError::Parse("missing documentSentiment".to_string()))?;
    Ok(DocumentSentiment {
        score: clamp_score(doc.score),
        magnitude: doc.magnitude.max(0.0),
        language: resp.language,
        sentences: resp
            .sentences
            .into_iter()
            .map(|s| SentenceSentiment {
                text: s.text.content,
                score: clamp_score(s.sentiment.score),
                magnitude: s.sentiment.magnitude.max(0.0),
            })
            .collect(),
    })
}

fn clamp_score(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

pub struct GoogleLanguageProvider {
    http: reqwest::Client,
    url: String,
    language: String,
    auth: Authenticator,
}

impl GoogleLanguageProvider {
    pub fn new(cfg: &SentimentConfig, auth: Authenticator) -> Result<Self, AnalyzeError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("newswire-sentiment/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(AnalyzeError::Network)?;
        Ok(Self {
            http,
            url: format!("{}{}", cfg.base_url.trim_end_matches('/'), ANALYZE_PATH),
            language: cfg.language.clone(),
            auth,
        })
    }
}

#[async_trait]
impl SentimentProvider for GoogleLanguageProvider {
    async fn analyze(&self, text: &str) -> Result<DocumentSentiment, AnalyzeError> {
        let req = Request {
            document: Document {
                kind: "PLAIN_TEXT",
                language: &self.language,
                content: text,
            },
            encoding_type: "UTF8",
        };

        let builder = self.http.post(&self.url).json(&req);
        let builder = match self.auth.credential(&self.http).await? {
            Credential::ApiKey(key) => builder.query(&[("key", key)]),
            Credential::Bearer(token) => builder.bearer_auth(token),
        };

        let resp = builder.send().await.map_err(AnalyzeError::Network)?;
        let status = resp.status();
        let body = resp.text().await.map_err(AnalyzeError::Network)?;
        if !status.is_success() {
            return Err(AnalyzeError::Status {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }
        parse_response(&body)
    }

    fn name(&self) -> &'static str {
        "google-language"
    }
}
