//! Package-name resolution from an APK via aapt.
//!
//! With `--apk` the CLI target is an APK path rather than a package name;
//! the package is read out of `aapt dump badging`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tokio::process::Command;
use tracing::debug;

/// Locate the aapt binary under `$ANDROID_SDK` (or `$ANDROID_HOME`)
/// build-tools. Plain versioned directories are preferred over the legacy
/// `android-*` ones; within each group the highest version wins.
pub fn find_aapt() -> Result<PathBuf> {
    let sdk = std::env::var("ANDROID_SDK")
        .or_else(|_| std::env::var("ANDROID_HOME"))
        .context("ANDROID_SDK or ANDROID_HOME must be set to locate aapt")?;
    let build_tools = Path::new(&sdk).join("build-tools");

    let mut good: Vec<PathBuf> = Vec::new();
    let mut bad: Vec<PathBuf> = Vec::new();
    let entries = std::fs::read_dir(&build_tools)
        .with_context(|| format!("cannot read {}", build_tools.display()))?;
    for entry in entries {
        let entry = entry?;
        let aapt = entry.path().join("aapt");
        if !aapt.exists() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with("android-") {
            bad.push(aapt);
        } else {
            good.push(aapt);
        }
    }

    good.sort();
    bad.sort();
    let aapt = good
        .pop()
        .or_else(|| bad.pop())
        .ok_or_else(|| anyhow!("no aapt binary under {}", build_tools.display()))?;
    debug!(aapt = %aapt.display(), "resolved aapt");
    Ok(aapt)
}

/// Parse the package name out of an `aapt dump badging` package line.
///
/// The line looks like:
/// `package: name='com.example.tests' versionCode='1' versionName=''`
pub fn parse_package_line(line: &str) -> Option<String> {
    line.split_whitespace().find_map(|word| {
        word.strip_prefix("name='")
            .map(|rest| rest.trim_end_matches('\'').to_string())
    })
}

/// Resolve the package name declared by `apk`.
pub async fn package_from_apk(apk: &Path) -> Result<String> {
    let aapt = find_aapt()?;
    let out = Command::new(&aapt)
        .args(["dump", "badging"])
        .arg(apk)
        .output()
        .await
        .with_context(|| format!("failed to run {}", aapt.display()))?;

    if !out.status.success() {
        bail!(
            "aapt dump badging failed for {}: {}",
            apk.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }

    let stdout = String::from_utf8_lossy(&out.stdout);
    for line in stdout.lines() {
        if line.starts_with("package:") {
            if let Some(package) = parse_package_line(line) {
                return Ok(package);
            }
        }
    }
    bail!("no package line in aapt output for {}", apk.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_package_line() {
        let line = "package: name='com.facebook.testing.tests' versionCode='1' versionName=''";
        assert_eq!(
            parse_package_line(line).as_deref(),
            Some("com.facebook.testing.tests")
        );
    }

    #[test]
    fn ignores_lines_without_a_name() {
        assert_eq!(parse_package_line("package: versionCode='1'"), None);
    }
}
