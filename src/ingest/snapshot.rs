// src/ingest/snapshot.rs
//! Static fallback table (`dfOut.csv`): a previously joined run, used when the
//! live feed is unavailable. Also written by `--save-snapshot`.

use chrono::DateTime;
use chrono_tz::{Europe::London, Tz};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::SnapshotError;
use crate::ingest::parse_first_published;
use crate::ingest::types::Article;
use crate::join::JoinedRow;
use crate::sentiment::{Granularity, SentimentRecord};

/// Column layout shared by reader and writer. Unknown columns are ignored on
/// read; missing ones default to empty.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SnapshotRow {
    articleid: String,
    level: String,
    sentence_text: String,
    sentiment_score: Option<f64>,
    sentiment_magnitude: Option<f64>,
    language: String,
    byline: String,
    section: String,
    item_type: String,
    material_type_facet: String,
    des_facet: String,
    org_facet: String,
    per_facet: String,
    geo_facet: String,
    title: String,
    #[serde(rename = "abstract")]
    abstract_text: String,
    first_published_date: String,
    #[serde(skip_serializing)]
    first_published_date_parsed: String,
}

/// Parse one facet cell: a JSON list, a Python list literal, or a scalar.
pub fn parse_facet_cell(cell: &str) -> Vec<String> {
    static RE_QUOTED: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)""#).unwrap());

    let cell = cell.trim();
    if cell.is_empty() || cell == "[]" || cell.eq_ignore_ascii_case("nan") {
        return Vec::new();
    }
    if cell.starts_with('[') && cell.ends_with(']') {
        if let Ok(v) = serde_json::from_str::<Vec<String>>(cell) {
            return clean(v);
        }
        let items = RE_QUOTED
            .captures_iter(cell)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().replace("\\'", "'").replace("\\\"", "\""))
            .collect();
        return clean(items);
    }
    vec![cell.to_string()]
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_snapshot_timestamp(row: &SnapshotRow) -> Option<DateTime<Tz>> {
    parse_first_published(&row.first_published_date).or_else(|| {
        // pandas writes tz-aware values as `2020-07-01 13:00:00+01:00`
        DateTime::parse_from_str(row.first_published_date_parsed.trim(), "%Y-%m-%d %H:%M:%S%:z")
            .ok()
            .map(|dt| dt.with_timezone(&London))
    })
}

impl SnapshotRow {
    fn has_article_columns(&self) -> bool {
        !self.title.is_empty() || !self.first_published_date.is_empty()
    }

    fn into_joined(self, path: &Path, row: usize) -> Result<Option<JoinedRow>, SnapshotError> {
        let level = if self.level.trim().is_empty() {
            if self.sentence_text.trim().is_empty() {
                Granularity::Document
            } else {
                Granularity::Sentence
            }
        } else {
            Granularity::parse(&self.level).ok_or_else(|| SnapshotError::Level {
                path: path.to_path_buf(),
                row,
                level: self.level.clone(),
            })?
        };

        let Some(score) = self.sentiment_score else {
            tracing::debug!(target: "ingest", row, "snapshot row without sentiment_score skipped");
            return Ok(None);
        };

        let record = SentimentRecord {
            article_id: self.articleid.clone(),
            level,
            sentence_text: match level {
                Granularity::Sentence => Some(self.sentence_text.clone()),
                Granularity::Document => None,
            },
            score,
            magnitude: self.sentiment_magnitude.unwrap_or(0.0),
            language: match level {
                Granularity::Document if !self.language.is_empty() => Some(self.language.clone()),
                _ => None,
            },
        };

        let article = if self.has_article_columns() {
            match parse_snapshot_timestamp(&self) {
                Some(first_published) => Some(Arc::new(Article {
                    slug: self.articleid,
                    byline: self.byline,
                    section: self.section,
                    item_type: self.item_type,
                    material_type_facet: self.material_type_facet,
                    des_facet: parse_facet_cell(&self.des_facet),
                    org_facet: parse_facet_cell(&self.org_facet),
                    per_facet: parse_facet_cell(&self.per_facet),
                    geo_facet: parse_facet_cell(&self.geo_facet),
                    title: self.title,
                    abstract_text: self.abstract_text,
                    first_published_raw: self.first_published_date,
                    first_published,
                })),
                None => {
                    tracing::warn!(target: "ingest", row, article = %record.article_id, "snapshot row has unparseable timestamp; facets dropped");
                    None
                }
            }
        } else {
            None
        };

        Ok(Some(JoinedRow { record, article }))
    }
}

fn list_cell(items: &[String]) -> String {
    if items.is_empty() {
        String::new()
    } else {
        serde_json::to_string(items).unwrap_or_default()
    }
}

/// Read the fallback table.
pub fn read_snapshot(path: &Path) -> Result<Vec<JoinedRow>, SnapshotError> {
    let file = std::fs::File::open(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_snapshot_from(file, path)
}

fn read_snapshot_from<R: std::io::Read>(rdr: R, path: &Path) -> Result<Vec<JoinedRow>, SnapshotError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let mut out = Vec::new();
    for (i, result) in reader.deserialize::<SnapshotRow>().enumerate() {
        let row = i + 1;
        let raw = result.map_err(|source| SnapshotError::Csv {
            path: path.to_path_buf(),
            row,
            source,
        })?;
        if let Some(joined) = raw.into_joined(path, row)? {
            out.push(joined);
        }
    }
    tracing::info!(target: "ingest", path = %path.display(), rows = out.len(), "snapshot loaded");
    Ok(out)
}

/// Write joined rows in the same layout `read_snapshot` accepts.
pub fn write_snapshot(path: &Path, rows: &[JoinedRow]) -> Result<(), SnapshotError> {
    let err = |source: csv::Error| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(err)?;
    for r in rows {
        let mut row = SnapshotRow {
            articleid: r.record.article_id.clone(),
            level: r.record.level.as_str().to_string(),
            sentence_text: r.record.sentence_text.clone().unwrap_or_default(),
            sentiment_score: Some(r.record.score),
            sentiment_magnitude: Some(r.record.magnitude),
            language: r.record.language.clone().unwrap_or_default(),
            ..SnapshotRow::default()
        };
        if let Some(a) = r.article.as_deref() {
            row.byline = a.byline.clone();
            row.section = a.section.clone();
            row.item_type = a.item_type.clone();
            row.material_type_facet = a.material_type_facet.clone();
            row.des_facet = list_cell(&a.des_facet);
            row.org_facet = list_cell(&a.org_facet);
            row.per_facet = list_cell(&a.per_facet);
            row.geo_facet = list_cell(&a.geo_facet);
            row.title = a.title.clone();
            row.abstract_text = a.abstract_text.clone();
            row.first_published_date = a.first_published_raw.clone();
        }
        writer.serialize(&row).map_err(err)?;
    }
    writer.flush().map_err(|e| err(e.into()))?;
    tracing::info!(target: "ingest", path = %path.display(), rows = rows.len(), "snapshot written");
    Ok(())
}
