//! HTML report rendering.
//!
//! Turns a staged report directory (metadata.xml plus pulled tile images)
//! into a browsable `index.html`. The stylesheet and the jQuery glue are
//! embedded in the binary and copied next to the report so the result is
//! self-contained apart from the CDN includes.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::metadata::{self, Screenshot};

const JQUERY_JS: &str = "https://ajax.googleapis.com/ajax/libs/jquery/2.1.3/jquery.min.js";
const JQUERY_UI_JS: &str = "https://ajax.googleapis.com/ajax/libs/jqueryui/1.11.3/jquery-ui.min.js";
const JQUERY_UI_CSS: &str =
    "https://ajax.googleapis.com/ajax/libs/jqueryui/1.11.3/themes/smoothness/jquery-ui.css";

const DEFAULT_CSS: &str = include_str!("assets/default.css");
const DEFAULT_JS: &str = include_str!("assets/default.js");

/// File name of the tile at grid position (x, y). The origin tile is plain
/// `{name}.png`; every other tile carries its coordinates.
pub fn tile_file_name(name: &str, x: u32, y: u32) -> String {
    if x == 0 && y == 0 {
        format!("{name}.png")
    } else {
        format!("{name}_{x}_{y}.png")
    }
}

/// Write the embedded static assets into the report directory.
pub fn copy_assets(dir: &Path) -> Result<()> {
    for (file, content) in [("default.css", DEFAULT_CSS), ("default.js", DEFAULT_JS)] {
        let dest = dir.join(file);
        std::fs::write(&dest, content)
            .with_context(|| format!("cannot write asset {}", dest.display()))?;
    }
    Ok(())
}

/// Render the report document for `records`. Tile `<img>` elements are only
/// emitted for tiles that actually exist in `dir`.
pub fn render_report(dir: &Path, records: &[Screenshot]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>");
    html.push_str("<html>");
    html.push_str("<head>");
    let _ = write!(html, "<script src=\"{JQUERY_JS}\"></script>");
    let _ = write!(html, "<script src=\"{JQUERY_UI_JS}\"></script>");
    html.push_str("<script src=\"default.js\"></script>");
    let _ = write!(html, "<link rel=\"stylesheet\" href=\"{JQUERY_UI_CSS}\" />");
    html.push_str("<link rel=\"stylesheet\" href=\"default.css\"></head>");
    html.push_str("<body>");

    html.push_str("<!-- begin results -->");
    let mut alternate = false;
    for rec in records {
        alternate = !alternate;
        let class = if alternate { "screenshot alternate" } else { "screenshot" };
        let name = escape(&rec.name);
        let _ = write!(html, "<div class=\"{class}\">");
        let _ = write!(html, "<div class=\"screenshot_name\">{name}</div>");
        let _ = write!(
            html,
            "<button class=\"view_dump\" data-name=\"{name}\">Dump view hierarchy</button>"
        );

        let extras = render_extras(rec);
        if !extras.is_empty() {
            let _ = write!(
                html,
                "<button class=\"extra\" data=\"{}\">Extra info</button>",
                escape(extras.trim())
            );
        }

        if let Some(description) = &rec.description {
            let _ = write!(
                html,
                "<div class=\"screenshot_description\">{}</div>",
                escape(description)
            );
        }

        match &rec.error {
            Some(error) => {
                let _ = write!(html, "<div class=\"screenshot_error\">{}</div>", escape(error));
            }
            None => write_tiles(&mut html, dir, rec),
        }

        html.push_str("</div>");
    }

    html.push_str("</body></html>");
    html
}

/// Join the extras into the `*****tag*****\n\ntext` blob shown by the
/// "Extra info" button. Extras with empty text are skipped; an empty result
/// means the button is omitted entirely.
fn render_extras(rec: &Screenshot) -> String {
    let mut blob = String::new();
    for (tag, text) in &rec.extras {
        if text.is_empty() {
            continue;
        }
        let _ = write!(blob, "*****{tag}*****\n\n{text}\n\n\n");
    }
    blob
}

fn write_tiles(html: &mut String, dir: &Path, rec: &Screenshot) {
    html.push_str("<table class=\"img-wrapper\">");
    for y in 0..rec.tile_height {
        html.push_str("<tr>");
        for x in 0..rec.tile_width {
            html.push_str("<td>");
            let file = tile_file_name(&rec.name, x, y);
            if dir.join(&file).exists() {
                let _ = write!(html, "<img src=\"./{}\" />", escape(&file));
            }
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
}

/// Render the report for pre-parsed records and write `{dir}/index.html`.
pub fn generate_report_from(dir: &Path, records: &[Screenshot]) -> Result<PathBuf> {
    let html = render_report(dir, records);
    let index = dir.join("index.html");
    std::fs::write(&index, &html)
        .with_context(|| format!("cannot write report {}", index.display()))?;
    info!(records = records.len(), report = %index.display(), "report generated");
    Ok(index)
}

/// Read `{dir}/metadata.xml` and write `{dir}/index.html`.
pub fn generate_report(dir: &Path) -> Result<PathBuf> {
    let metadata_path = dir.join("metadata.xml");
    let records = metadata::parse_metadata(&metadata_path)
        .with_context(|| format!("cannot parse {}", metadata_path.display()))?;
    generate_report_from(dir, &records)
}

/// Minimal HTML attribute/text escaping.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_set_renders_html_document() {
        let dir = tempfile::tempdir().unwrap();
        let html = render_report(dir.path(), &[]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<html>"));
        assert!(html.contains("</body></html>"));
    }

    #[test]
    fn records_alternate_background_classes() {
        let records = vec![
            Screenshot::named("first"),
            Screenshot::named("second"),
            Screenshot::named("third"),
        ];
        let dir = tempfile::tempdir().unwrap();
        let html = render_report(dir.path(), &records);
        assert_eq!(html.matches("class=\"screenshot alternate\"").count(), 2);
        assert_eq!(html.matches("class=\"screenshot\"").count(), 1);
    }

    #[test]
    fn error_record_renders_error_div_and_no_tiles() {
        let mut rec = Screenshot::named("broken");
        rec.error = Some("inflate failed".to_string());
        let dir = tempfile::tempdir().unwrap();
        let html = render_report(dir.path(), &[rec]);
        assert!(html.contains("<div class=\"screenshot_error\">inflate failed</div>"));
        assert!(!html.contains("img-wrapper"));
    }

    #[test]
    fn tiles_only_reference_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = Screenshot::named("grid");
        rec.tile_width = 2;
        rec.tile_height = 1;
        std::fs::write(dir.path().join("grid.png"), b"png").unwrap();
        // grid_1_0.png deliberately absent

        let html = render_report(dir.path(), &[rec]);
        assert!(html.contains("<img src=\"./grid.png\" />"));
        assert!(!html.contains("grid_1_0.png"));
        // Cell for the missing tile still exists to keep the grid shape.
        assert_eq!(html.matches("<td>").count(), 2);
    }

    #[test]
    fn origin_tile_has_no_coordinates() {
        assert_eq!(tile_file_name("shot", 0, 0), "shot.png");
        assert_eq!(tile_file_name("shot", 1, 0), "shot_1_0.png");
        assert_eq!(tile_file_name("shot", 0, 2), "shot_0_2.png");
    }

    #[test]
    fn extras_with_only_empty_text_omit_the_button() {
        let mut rec = Screenshot::named("plain");
        rec.extras = vec![("note".to_string(), String::new())];
        let dir = tempfile::tempdir().unwrap();
        let html = render_report(dir.path(), &[rec]);
        assert!(!html.contains("Extra info"));
    }

    #[test]
    fn extras_blob_carries_tag_markers() {
        let mut rec = Screenshot::named("annotated");
        rec.extras = vec![("theme".to_string(), "Theme.Light".to_string())];
        let dir = tempfile::tempdir().unwrap();
        let html = render_report(dir.path(), &[rec]);
        assert!(html.contains("*****theme*****"));
        assert!(html.contains("Theme.Light"));
    }

    #[test]
    fn names_are_escaped() {
        let rec = Screenshot::named("a<b>&c");
        let dir = tempfile::tempdir().unwrap();
        let html = render_report(dir.path(), &[rec]);
        assert!(html.contains("a&lt;b&gt;&amp;c"));
        assert!(!html.contains("a<b>&c"));
    }
}
