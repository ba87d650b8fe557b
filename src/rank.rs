// src/rank.rs
//! Facet ranking: mean document-level sentiment per facet value, top/bottom 10.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::ingest::types::Article;
use crate::join::JoinedRow;
use crate::sentiment::Granularity;

pub const TOP_N: usize = 10;
pub const LABEL_MAX_CHARS: usize = 40;

/// Article column used as the grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Organization,
    Geo,
    Descriptor,
    Person,
    Title,
    Section,
    MaterialType,
}

impl Facet {
    pub fn column(&self) -> &'static str {
        match self {
            Facet::Organization => "org_facet",
            Facet::Geo => "geo_facet",
            Facet::Descriptor => "des_facet",
            Facet::Person => "per_facet",
            Facet::Title => "title",
            Facet::Section => "section",
            Facet::MaterialType => "material_type_facet",
        }
    }

    pub fn from_column(col: &str) -> Option<Self> {
        [
            Facet::Organization,
            Facet::Geo,
            Facet::Descriptor,
            Facet::Person,
            Facet::Title,
            Facet::Section,
            Facet::MaterialType,
        ]
        .into_iter()
        .find(|f| f.column() == col)
    }

    /// Group keys this article contributes to. List facets yield each distinct
    /// value; scalar facets yield the value when non-empty.
    pub fn values<'a>(&self, a: &'a Article) -> Vec<&'a str> {
        let scalar = |s: &'a String| {
            let s = s.trim();
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s]
            }
        };
        let mut out: Vec<&'a str> = match self {
            Facet::Organization => a.org_facet.iter().map(String::as_str).collect(),
            Facet::Geo => a.geo_facet.iter().map(String::as_str).collect(),
            Facet::Descriptor => a.des_facet.iter().map(String::as_str).collect(),
            Facet::Person => a.per_facet.iter().map(String::as_str).collect(),
            Facet::Title => scalar(&a.title),
            Facet::Section => scalar(&a.section),
            Facet::MaterialType => scalar(&a.material_type_facet),
        };
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Smallest means first (most negative).
    Ascending,
    /// Largest means first (most positive).
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    /// Truncated to `LABEL_MAX_CHARS`.
    pub label: String,
    /// Rounded to 2 decimals.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacetRanking {
    pub facet: Facet,
    pub direction: Direction,
    /// Selection order.
    pub entries: Vec<RankEntry>,
}

impl FacetRanking {
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.score).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Two decimals, exact halves to even (0.125 -> 0.12).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

pub fn truncate_label(s: &str) -> String {
    s.chars().take(LABEL_MAX_CHARS).collect()
}

/// Truncated labels that collide with an earlier one get a ` (n)` suffix,
/// still within `LABEL_MAX_CHARS`.
fn distinct_labels<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    keys.map(|key| {
        let label = truncate_label(key);
        let n = seen.entry(label.clone()).or_insert(0);
        *n += 1;
        if *n == 1 {
            return label;
        }
        let suffix = format!(" ({n})");
        let keep = LABEL_MAX_CHARS.saturating_sub(suffix.chars().count());
        let head: String = label.chars().take(keep).collect();
        format!("{}{suffix}", head.trim_end())
    })
    .collect()
}

/// Mean document-level score per facet value, then the `TOP_N` largest
/// (`Descending`) or smallest (`Ascending`). Equal means order by label.
pub fn rank(rows: &[JoinedRow], facet: Facet, direction: Direction) -> FacetRanking {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.record.level == Granularity::Document) {
        let Some(article) = row.article.as_deref() else {
            continue;
        };
        for key in facet.values(article) {
            let g = groups.entry(key).or_insert((0.0, 0));
            g.0 += row.record.score;
            g.1 += 1;
        }
    }

    let mut means: Vec<(&str, f64)> = groups
        .into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect();
    means.sort_by(|a, b| {
        let by_score = match direction {
            Direction::Descending => b.1.total_cmp(&a.1),
            Direction::Ascending => a.1.total_cmp(&b.1),
        };
        by_score.then_with(|| a.0.cmp(b.0))
    });

    means.truncate(TOP_N);
    let labels = distinct_labels(means.iter().map(|(key, _)| *key));
    let entries = labels
        .into_iter()
        .zip(means)
        .map(|(label, (_, mean))| RankEntry {
            label,
            score: round2(mean),
        })
        .collect();

    FacetRanking {
        facet,
        direction,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_first_published;
    use crate::sentiment::SentimentRecord;
    use std::sync::Arc;

    fn row(org: &[&str], title: &str, level: Granularity, score: f64) -> JoinedRow {
        let article = Article {
            slug: title.into(),
            byline: String::new(),
            section: String::new(),
            item_type: String::new(),
            material_type_facet: String::new(),
            des_facet: vec![],
            org_facet: org.iter().map(|s| s.to_string()).collect(),
            per_facet: vec![],
            geo_facet: vec![],
            title: title.into(),
            abstract_text: String::new(),
            first_published_raw: String::new(),
            first_published: parse_first_published("2020-01-01 00:00:00").unwrap(),
        };
        let record = match level {
            Granularity::Document => SentimentRecord::document(title, score, 1.0, "en".into()),
            Granularity::Sentence => SentimentRecord::sentence(title, "s".into(), score, 1.0),
        };
        JoinedRow {
            record,
            article: Some(Arc::new(article)),
        }
    }

    #[test]
    fn acme_mean_comes_first_descending() {
        let rows = vec![
            row(&["Acme"], "t1", Granularity::Document, 0.8),
            row(&["Acme"], "t2", Granularity::Document, 0.6),
            row(&["Globex"], "t3", Granularity::Document, -0.3),
        ];
        let r = rank(&rows, Facet::Organization, Direction::Descending);
        assert_eq!(r.labels(), vec!["Acme".to_string(), "Globex".to_string()]);
        assert_eq!(r.scores(), vec![0.7, -0.3]);
    }

    #[test]
    fn sentence_rows_never_counted() {
        let rows = vec![
            row(&["Acme"], "t1", Granularity::Document, 0.2),
            row(&["Acme"], "t1", Granularity::Sentence, -1.0),
            row(&["Initech"], "t2", Granularity::Sentence, 0.9),
        ];
        let r = rank(&rows, Facet::Organization, Direction::Descending);
        assert_eq!(r.labels(), vec!["Acme".to_string()]);
        assert_eq!(r.scores(), vec![0.2]);
    }

    #[test]
    fn at_most_ten_and_monotone() {
        let rows: Vec<JoinedRow> = (0..25)
            .map(|i| {
                let name = format!("Org{i:02}");
                row(&[name.as_str()], &name, Granularity::Document, (i as f64 - 12.0) / 13.0)
            })
            .collect();
        let down = rank(&rows, Facet::Organization, Direction::Descending);
        assert_eq!(down.entries.len(), TOP_N);
        assert!(down.scores().windows(2).all(|w| w[0] >= w[1]));
        let up = rank(&rows, Facet::Organization, Direction::Ascending);
        assert_eq!(up.entries.len(), TOP_N);
        assert!(up.scores().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(up.labels()[0], "Org00");
    }

    #[test]
    fn ties_break_by_label_and_labels_truncate() {
        let long = "A".repeat(60);
        let rows = vec![
            row(&["Zeta"], "t1", Granularity::Document, 0.5),
            row(&["Alpha"], "t2", Granularity::Document, 0.5),
            row(&[long.as_str()], "t3", Granularity::Document, 0.1),
        ];
        let r = rank(&rows, Facet::Organization, Direction::Descending);
        assert_eq!(r.labels()[..2], ["Alpha".to_string(), "Zeta".to_string()]);
        assert_eq!(r.labels()[2].chars().count(), LABEL_MAX_CHARS);
    }

    #[test]
    fn ranking_is_idempotent() {
        let rows = vec![
            row(&["Acme", "Globex"], "t1", Granularity::Document, 0.333),
            row(&["Globex"], "t2", Granularity::Document, -0.777),
        ];
        let a = rank(&rows, Facet::Organization, Direction::Ascending);
        let b = rank(&rows, Facet::Organization, Direction::Ascending);
        assert_eq!(a, b);
        assert_eq!(a.scores(), vec![-0.22, 0.33]);
    }

    #[test]
    fn title_facet_uses_scalar_column() {
        let rows = vec![row(&[], "Markets rally", Granularity::Document, 0.4)];
        let r = rank(&rows, Facet::Title, Direction::Descending);
        assert_eq!(r.labels(), vec!["Markets rally".to_string()]);
        assert!(rank(&rows, Facet::Organization, Direction::Descending).is_empty());
    }

    #[test]
    fn round2_sends_exact_halves_to_even() {
        let got: Vec<f64> = [0.125, 0.375, -0.125, 0.625].into_iter().map(round2).collect();
        assert_eq!(got, vec![0.12, 0.38, -0.12, 0.62]);
        assert_eq!(round2(0.7000000000000001), 0.7);
    }

    #[test]
    fn mean_on_a_half_rounds_to_even() {
        let rows = vec![
            row(&["Acme"], "t1", Granularity::Document, 0.25),
            row(&["Acme"], "t2", Granularity::Document, 0.0),
        ];
        let r = rank(&rows, Facet::Organization, Direction::Descending);
        assert_eq!(r.scores(), vec![0.12]);
    }

    #[test]
    fn long_titles_sharing_a_prefix_stay_distinct() {
        let prefix = "Live Updates: Markets Around the World T";
        let a = format!("{prefix}oday");
        let b = format!("{prefix}omorrow");
        let rows = vec![
            row(&[], &a, Granularity::Document, 0.4),
            row(&[], &b, Granularity::Document, 0.2),
        ];
        let r = rank(&rows, Facet::Title, Direction::Descending);
        let labels = r.labels();
        assert_eq!(labels[0], prefix);
        assert_ne!(labels[0], labels[1]);
        assert!(labels[1].ends_with(" (2)"));
        assert!(labels.iter().all(|l| l.chars().count() <= LABEL_MAX_CHARS));
    }

    #[test]
    fn column_names_round_trip() {
        assert_eq!(Facet::from_column("geo_facet"), Some(Facet::Geo));
        assert_eq!(Facet::from_column("nope"), None);
    }
}
