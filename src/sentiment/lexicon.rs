// src/sentiment/lexicon.rs
//! Offline word-lexicon scorer. Deterministic; used for dry runs without
//! cloud credentials.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::{DocumentSentiment, SentenceSentiment, SentimentProvider};
use crate::error::AnalyzeError;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

static RE_SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+(?:[.!?]+|$)").unwrap());

/// Squash constant: raw score 4 maps to ~0.72.
const ALPHA: f64 = 15.0;

#[derive(Debug, Clone, Default)]
pub struct LexiconProvider;

impl LexiconProvider {
    pub fn new() -> Self {
        Self
    }

    /// Returns (raw score, sum of absolute word scores).
    /// A negator in the previous 1..=3 tokens flips a word's sign.
    pub fn score_text(&self, text: &str) -> (i32, i32) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score = 0;
        let mut volume = 0;

        for i in 0..tokens.len() {
            let base = *LEXICON.get(tokens[i].as_str()).unwrap_or(&0);
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            score += if negated { -base } else { base };
            volume += base.abs();
        }

        (score, volume)
    }
}

/// Map an unbounded raw score into (-1, 1).
fn normalize(raw: i32) -> f64 {
    let x = raw as f64;
    x / (x * x + ALPHA).sqrt()
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> + '_ {
    RE_SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| s.chars().any(char::is_alphanumeric))
}

fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
            | "didn't"
            | "doesn't"
    )
}

#[async_trait]
impl SentimentProvider for LexiconProvider {
    async fn analyze(&self, text: &str) -> Result<DocumentSentiment, AnalyzeError> {
        let mut sentences = Vec::new();
        let mut doc_raw = 0;
        let mut doc_volume = 0;

        for s in split_sentences(text) {
            let (raw, volume) = self.score_text(s);
            doc_raw += raw;
            doc_volume += volume;
            sentences.push(SentenceSentiment {
                text: s.to_string(),
                score: normalize(raw),
                magnitude: volume as f64 / 4.0,
            });
        }

        Ok(DocumentSentiment {
            score: normalize(doc_raw),
            magnitude: doc_volume as f64 / 4.0,
            language: "en".to_string(),
            sentences,
        })
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}
