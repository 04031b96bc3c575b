//! Report-to-PNG conversion via wkhtmltoimage.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::info;

/// Verify the converter binary is runnable before invoking it, so the
/// failure message names the missing tool instead of a spawn error.
pub async fn check_converter(bin: &str) -> Result<()> {
    let runnable = Command::new(bin)
        .arg("--version")
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false);

    if !runnable {
        bail!(
            "could not run '{bin}' — PNG generation needs wkhtmltoimage\n  \
             Download an appropriate version from: http://wkhtmltopdf.org/downloads.html"
        );
    }
    Ok(())
}

/// Convert the HTML report at `html` into a PNG at `png`.
pub async fn generate_png(bin: &str, html: &Path, png: &Path) -> Result<()> {
    check_converter(bin).await?;

    let status = Command::new(bin)
        .arg(html)
        .arg(png)
        .status()
        .await
        .with_context(|| format!("failed to spawn '{bin}'"))?;

    if !status.success() {
        bail!("'{bin}' exited with {status} converting {}", html.display());
    }
    info!(png = %png.display(), "report converted to PNG");
    Ok(())
}
