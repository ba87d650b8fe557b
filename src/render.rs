// src/render.rs
//! Bar-chart rendering to standalone SVG, plus an HTML page that inlines every
//! chart of a run (inline so the hover tooltips keep working).

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use metrics::counter;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CHART_TITLE: &str = "The New York Times Wire - Sentiment Analysis";
pub const Y_AXIS_LABEL: &str = "Sentiment Score";
pub const WIDTH: f64 = 1000.0;
pub const HEIGHT: f64 = 800.0;

/// ColorBrewer Set3, 10 classes. Assigned in ranking order.
pub const SET3: [&str; 10] = [
    "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
    "#d9d9d9", "#bc80bd",
];

const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 330.0;
const Y_MIN: f64 = -1.0;
const Y_MAX: f64 = 1.0;
const BAR_WIDTH: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub score: f64,
    pub color: &'static str,
}

/// A chart ready to draw: bars already in display order (ascending score).
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub x_label: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    /// Colours follow the order received; display order is re-sorted by
    /// ascending score (stable, so equal scores keep their ranking order).
    pub fn new(labels: &[String], scores: &[f64], x_label: &str) -> Self {
        let mut bars: Vec<Bar> = labels
            .iter()
            .zip(scores)
            .enumerate()
            .map(|(i, (label, &score))| Bar {
                label: label.clone(),
                score,
                color: SET3[i % SET3.len()],
            })
            .collect();
        bars.sort_by(|a, b| a.score.total_cmp(&b.score));
        Self {
            x_label: x_label.to_string(),
            bars,
        }
    }

    fn plot_width() -> f64 {
        WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height() -> f64 {
        HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    /// Vertical pixel for a score; values outside [-1, 1] are clipped.
    fn y(v: f64) -> f64 {
        let v = v.clamp(Y_MIN, Y_MAX);
        MARGIN_TOP + (Y_MAX - v) / (Y_MAX - Y_MIN) * Self::plot_height()
    }

    pub fn to_svg(&self) -> String {
        let plot_w = Self::plot_width();
        let bottom = MARGIN_TOP + Self::plot_height();
        let mut s = String::with_capacity(8 * 1024);

        let _ = writeln!(
            s,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="Helvetica, Arial, sans-serif">"#
        );
        let _ = writeln!(s, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            s,
            r#"<text x="{MARGIN_LEFT}" y="30" font-size="14px" font-weight="bold">{}</text>"#,
            text(CHART_TITLE)
        );

        // y axis, ticks and grid
        for i in 0..=4 {
            let v = Y_MIN + i as f64 * 0.5;
            let y = Self::y(v);
            let _ = writeln!(
                s,
                r##"<line x1="{MARGIN_LEFT}" x2="{}" y1="{y}" y2="{y}" stroke="#e5e5e5"/>"##,
                MARGIN_LEFT + plot_w
            );
            let _ = writeln!(
                s,
                r#"<text x="{}" y="{}" font-size="11px" text-anchor="end">{}</text>"#,
                MARGIN_LEFT - 6.0,
                y + 4.0,
                v
            );
        }
        let _ = writeln!(
            s,
            r#"<line x1="{MARGIN_LEFT}" x2="{MARGIN_LEFT}" y1="{MARGIN_TOP}" y2="{bottom}" stroke="black"/>"#
        );
        let _ = writeln!(
            s,
            r#"<line x1="{MARGIN_LEFT}" x2="{}" y1="{bottom}" y2="{bottom}" stroke="black"/>"#,
            MARGIN_LEFT + plot_w
        );
        let _ = writeln!(
            s,
            r#"<text transform="translate(25 {}) rotate(-90)" font-size="13pt" text-anchor="middle">{}</text>"#,
            MARGIN_TOP + Self::plot_height() / 2.0,
            text(Y_AXIS_LABEL)
        );

        if self.bars.is_empty() {
            let _ = writeln!(
                s,
                r##"<text x="{}" y="{}" font-size="13pt" text-anchor="middle" fill="#777">no data</text>"##,
                MARGIN_LEFT + plot_w / 2.0,
                Self::y(0.0)
            );
        }

        let band = plot_w / self.bars.len().max(1) as f64;
        let zero = Self::y(0.0);
        for (i, bar) in self.bars.iter().enumerate() {
            let cx = MARGIN_LEFT + band * (i as f64 + 0.5);
            let w = band * BAR_WIDTH;
            let top = Self::y(bar.score);
            let (y, h) = if top < zero { (top, zero - top) } else { (zero, top - zero) };

            let _ = writeln!(s, "<g>");
            let _ = writeln!(
                s,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"><title>sentiment_score: {}</title></rect>"#,
                cx - w / 2.0,
                y,
                w,
                h,
                attr(bar.color),
                bar.score
            );
            let label_y = if bar.score >= 0.0 { top - 5.0 } else { top + 14.0 };
            let _ = writeln!(
                s,
                r#"<text x="{cx:.2}" y="{label_y:.2}" font-size="12px" text-anchor="middle">{}</text>"#,
                bar.score
            );
            let _ = writeln!(
                s,
                r#"<text transform="translate({cx:.2} {:.2}) rotate(-60)" font-size="13pt" text-anchor="end">{}</text>"#,
                bottom + 12.0,
                text(&bar.label)
            );
            let _ = writeln!(s, "</g>");
        }

        let _ = writeln!(
            s,
            r#"<text x="{}" y="{}" font-size="13pt" text-anchor="middle">{}</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            HEIGHT - 12.0,
            text(&self.x_label)
        );
        s.push_str("</svg>\n");
        s
    }
}

/// A chart written to disk.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub title: String,
    pub path: PathBuf,
    pub svg: String,
}

/// `Ranked Positive by Organisation` -> `ranked-positive-by-organisation`
pub fn file_stem(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Build the chart for one ranking and write `<out_dir>/<stem>.svg`.
pub fn render_chart(
    labels: &[String],
    scores: &[f64],
    x_label: &str,
    out_dir: &Path,
) -> io::Result<RenderedChart> {
    let chart = BarChart::new(labels, scores, x_label);
    let svg = chart.to_svg();
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!("{}.svg", file_stem(x_label)));
    fs::write(&path, &svg)?;
    counter!("charts_rendered_total").increment(1);
    tracing::info!(target: "render", chart = x_label, bars = chart.bars.len(), path = %path.display(), "chart written");
    Ok(RenderedChart {
        title: x_label.to_string(),
        path,
        svg,
    })
}

/// Write `<out_dir>/index.html` with every chart inlined.
pub fn write_gallery(out_dir: &Path, charts: &[RenderedChart]) -> io::Result<PathBuf> {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">");
    let _ = writeln!(html, "<title>{}</title>\n</head>\n<body>", text(CHART_TITLE));
    let _ = writeln!(html, "<h1>{}</h1>", text(CHART_TITLE));
    for c in charts {
        let _ = writeln!(
            html,
            "<section id=\"{}\">\n<h2>{}</h2>\n{}</section>",
            attr(&file_stem(&c.title)),
            text(&c.title),
            c.svg
        );
    }
    html.push_str("</body>\n</html>\n");

    fs::create_dir_all(out_dir)?;
    let path = out_dir.join("index.html");
    fs::write(&path, html)?;
    Ok(path)
}
