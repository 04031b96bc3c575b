//! End-to-end pull orchestration.
//!
//! Stages a report directory, pulls metadata and images from the device,
//! applies the optional name filter, and renders the report (or converts it
//! to a PNG).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::adb::Puller;
use crate::metadata::{self, Screenshot};
use crate::png;
use crate::report;

const ROOT_SCREENSHOT_DIR: &str = "/sdcard/screenshots";
const OLD_ROOT_SCREENSHOT_DIR: &str = "/data/data";

/// Everything `pull_screenshots` needs beyond the puller itself.
pub struct PullOptions {
    /// Instrumentation package the results belong to.
    pub package: String,
    /// Keep only screenshots whose name matches.
    pub filter_name_regex: Option<Regex>,
    /// Convert the report to this PNG and discard the staging dir.
    pub generate_png: Option<PathBuf>,
    /// Stage here instead of a fresh temp dir.
    pub temp_dir: Option<PathBuf>,
    pub wkhtmltoimage_path: String,
    /// Print a machine-readable JSON summary instead of the browser hint.
    pub json: bool,
    pub quiet: bool,
}

/// Pull metadata.xml into `dir`, trying the modern device path first and the
/// legacy one second. Writes the empty document when neither exists, so the
/// report step always has something to render.
pub async fn pull_metadata(package: &str, dir: &Path, puller: &dyn Puller) -> Result<PathBuf> {
    let dest = dir.join("metadata.xml");
    let current = format!("{ROOT_SCREENSHOT_DIR}/{package}/screenshots-default/metadata.xml");
    let legacy = format!("{OLD_ROOT_SCREENSHOT_DIR}/{package}/app_screenshots-default/metadata.xml");

    if puller.remote_file_exists(&current).await? {
        puller.pull(&current, &dest).await?;
    } else if puller.remote_file_exists(&legacy).await? {
        debug!(package, "using legacy screenshot directory");
        puller.pull(&legacy, &dest).await?;
    } else {
        info!(package, "no metadata on device — writing empty result set");
        tokio::fs::write(&dest, metadata::EMPTY_METADATA)
            .await
            .with_context(|| format!("cannot write {}", dest.display()))?;
    }
    Ok(dest)
}

/// Pull every tile image and view-hierarchy dump referenced by the records
/// into `dir`, keyed by their device-side file name.
pub async fn pull_images(dir: &Path, records: &[Screenshot], puller: &dyn Puller) -> Result<()> {
    for rec in records {
        for remote in &rec.absolute_file_names {
            puller.pull(remote, &dir.join(file_name_of(remote))).await?;
        }
        if let Some(remote) = &rec.view_hierarchy {
            puller.pull(remote, &dir.join(file_name_of(remote))).await?;
        }
    }
    Ok(())
}

fn file_name_of(remote: &str) -> &str {
    remote.rsplit('/').next().unwrap_or(remote)
}

/// Machine-readable `--json` summary: the report path plus every pulled
/// record.
pub fn json_summary(index: &Path, records: &[Screenshot]) -> serde_json::Value {
    serde_json::json!({
        "report": index,
        "screenshots": records,
    })
}

/// Pull results from the device and render the report.
pub async fn pull_screenshots(opts: &PullOptions, puller: &dyn Puller) -> Result<()> {
    // Staging dir: caller-provided, or a fresh temp dir that outlives the
    // run so the browser can read it.
    let (dir, staged_temp) = match &opts.temp_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("cannot create {}", dir.display()))?;
            (dir.clone(), None)
        }
        None => {
            let temp = tempfile::Builder::new()
                .prefix("screenshots")
                .tempdir()
                .context("cannot create staging directory")?;
            (temp.path().to_path_buf(), Some(temp))
        }
    };

    report::copy_assets(&dir)?;

    let metadata_path = pull_metadata(&opts.package, &dir, puller).await?;
    if let Some(name_regex) = &opts.filter_name_regex {
        metadata::filter_screenshots(&metadata_path, name_regex)?;
    }

    let records = metadata::parse_metadata(&metadata_path)
        .with_context(|| format!("cannot parse {}", metadata_path.display()))?;
    pull_images(&dir, &records, puller).await?;

    let index = report::generate_report_from(&dir, &records)?;
    let index = index.canonicalize().unwrap_or(index);

    if opts.json {
        println!("{}", serde_json::to_string(&json_summary(&index, &records))?);
    }

    if let Some(png_path) = &opts.generate_png {
        png::generate_png(&opts.wkhtmltoimage_path, &index, png_path).await?;
        // The PNG is the deliverable — the staging dir is disposable.
        drop(staged_temp);
        if !opts.quiet && !opts.json {
            println!("Wrote {}", png_path.display());
        }
    } else {
        // Keep the temp dir around for the browser.
        if let Some(temp) = staged_temp {
            let _ = temp.keep();
        }
        if !opts.quiet && !opts.json {
            println!("Open the following url in a browser to view the results:");
            println!("  file://{}", index.display());
        }
    }

    Ok(())
}
