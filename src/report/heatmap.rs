//! Annotated confusion-matrix heatmap
//!
//! Cells are shaded on a yellow-green-blue ramp scaled to the largest count.
//! The same layout renders to a truecolor terminal string or to SVG.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::error::util::create_output_file;
use crate::metrics::ConfusionMatrix;

/// Default heatmap title
pub const HEATMAP_TITLE: &str = "Confusion Matrix - Balanced Gradient Boosting";

const ACTUAL_CAPTION: &str = "Actual";
const PREDICTED_CAPTION: &str = "Predicted";

/// Colour stops from lightest to darkest
const YL_GN_BU: [(u8, u8, u8); 9] = [
    (255, 255, 217),
    (237, 248, 177),
    (199, 233, 180),
    (127, 205, 187),
    (65, 182, 196),
    (29, 145, 192),
    (34, 94, 168),
    (37, 52, 148),
    (8, 29, 88),
];

const SVG_CELL: usize = 90;
const SVG_MARGIN_LEFT: usize = 150;
const SVG_MARGIN_TOP: usize = 110;
const SVG_MARGIN: usize = 40;

/// Confusion matrix prepared for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heatmap {
    title: String,
    labels: Vec<String>,
    counts: Vec<Vec<usize>>,
}

impl Heatmap {
    /// Build a heatmap with the default title; `labels[k]` names class `k`
    #[must_use]
    pub fn new(matrix: &ConfusionMatrix, labels: &[String]) -> Self {
        Self {
            title: HEATMAP_TITLE.to_string(),
            labels: labels.to_vec(),
            counts: matrix.rows().to_vec(),
        }
    }

    /// Replace the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Title shown above the grid
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Axis labels
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Fill colour for a count
    #[must_use]
    pub fn colour(&self, count: usize) -> (u8, u8, u8) {
        let max = self.max_count();
        let t = if max == 0 { 0.0 } else { count as f64 / max as f64 };
        interpolate(t)
    }

    /// Render with ANSI truecolor escapes for a terminal
    #[must_use]
    pub fn render_ansi(&self) -> String {
        let label_width = self
            .labels
            .iter()
            .map(String::len)
            .chain(std::iter::once(ACTUAL_CAPTION.len()))
            .max()
            .unwrap_or(0);
        let cell_width = self
            .labels
            .iter()
            .map(String::len)
            .chain(std::iter::once(self.max_count().to_string().len()))
            .max()
            .unwrap_or(0)
            + 4;
        let grid_width = cell_width * self.labels.len();

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out);
        let _ = writeln!(out, "{:label_width$} {PREDICTED_CAPTION:^grid_width$}", "");

        let _ = write!(out, "{ACTUAL_CAPTION:<label_width$} ");
        for label in &self.labels {
            let _ = write!(out, "{label:^cell_width$}");
        }
        let _ = writeln!(out);

        for (label, row) in self.labels.iter().zip(&self.counts) {
            let _ = write!(out, "{label:>label_width$} ");
            for &count in row {
                let (r, g, b) = self.colour(count);
                let (fr, fg, fb) = text_colour((r, g, b));
                let _ = write!(
                    out,
                    "\x1b[48;2;{r};{g};{b}m\x1b[38;2;{fr};{fg};{fb}m{count:^cell_width$}\x1b[0m"
                );
            }
            let _ = writeln!(out);
        }
        out
    }

    /// Render as a standalone SVG document
    #[must_use]
    pub fn to_svg(&self) -> String {
        let n = self.labels.len();
        let width = SVG_MARGIN_LEFT + n * SVG_CELL + SVG_MARGIN;
        let height = SVG_MARGIN_TOP + n * SVG_CELL + SVG_MARGIN + 30;
        let grid_mid_x = SVG_MARGIN_LEFT + n * SVG_CELL / 2;
        let grid_mid_y = SVG_MARGIN_TOP + n * SVG_CELL / 2;

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="30" text-anchor="middle" font-size="18" font-weight="bold">{}</text>"#,
            width / 2,
            escape_xml(&self.title)
        );
        let _ = writeln!(
            svg,
            r#"<text x="{grid_mid_x}" y="{}" text-anchor="middle" font-size="14">{PREDICTED_CAPTION}</text>"#,
            SVG_MARGIN_TOP + n * SVG_CELL + 35
        );
        let _ = writeln!(
            svg,
            r#"<text x="30" y="{grid_mid_y}" text-anchor="middle" font-size="14" transform="rotate(-90 30 {grid_mid_y})">{ACTUAL_CAPTION}</text>"#
        );

        for (k, label) in self.labels.iter().enumerate() {
            let label = escape_xml(label);
            let column_x = SVG_MARGIN_LEFT + k * SVG_CELL + SVG_CELL / 2;
            let row_y = SVG_MARGIN_TOP + k * SVG_CELL + SVG_CELL / 2;
            let _ = writeln!(
                svg,
                r#"<text x="{column_x}" y="{}" text-anchor="middle" font-size="13">{label}</text>"#,
                SVG_MARGIN_TOP - 10
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{row_y}" text-anchor="end" dominant-baseline="middle" font-size="13">{label}</text>"#,
                SVG_MARGIN_LEFT - 10
            );
        }

        for (i, row) in self.counts.iter().enumerate() {
            for (j, &count) in row.iter().enumerate() {
                let x = SVG_MARGIN_LEFT + j * SVG_CELL;
                let y = SVG_MARGIN_TOP + i * SVG_CELL;
                let fill = self.colour(count);
                let text = text_colour(fill);
                let _ = writeln!(
                    svg,
                    r#"<rect x="{x}" y="{y}" width="{SVG_CELL}" height="{SVG_CELL}" fill="{}" stroke="white"/>"#,
                    hex(fill)
                );
                let _ = writeln!(
                    svg,
                    r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle" font-size="16" fill="{}">{count}</text>"#,
                    x + SVG_CELL / 2,
                    y + SVG_CELL / 2,
                    hex(text)
                );
            }
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Write the SVG rendering to `path`, creating parent directories
    pub fn write_svg(&self, path: &Path) -> Result<()> {
        let mut file = create_output_file(path)?;
        file.write_all(self.to_svg().as_bytes())
            .map_err(|e| PipelineError::io(path, e))?;
        log::info!("Wrote confusion-matrix heatmap to {}", path.display());
        Ok(())
    }
}

/// Piecewise-linear lookup on the colour stops, `t` clamped to [0, 1]
fn interpolate(t: f64) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    let scaled = t * (YL_GN_BU.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(YL_GN_BU.len() - 2);
    let frac = scaled - lower as f64;
    let (a, b) = (YL_GN_BU[lower], YL_GN_BU[lower + 1]);
    let mix = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * frac).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Black on light fills, white on dark ones
fn text_colour((r, g, b): (u8, u8, u8)) -> (u8, u8, u8) {
    let luminance = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    if luminance > 140.0 { (0, 0, 0) } else { (255, 255, 255) }
}

fn hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
