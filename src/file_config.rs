//! Optional TOML config file.
//!
//! Keeps per-machine defaults (tool paths, a default device serial) out of
//! the command line. Priority: CLI flag / env var > TOML > built-in default.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_ADB: &str = "adb";
pub const DEFAULT_WKHTMLTOIMAGE: &str = "wkhtmltoimage";

/// `--config` / `$SHOTPULL_CONFIG` TOML file — all fields are optional
/// overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// adb binary to use (default: "adb" from $PATH).
    pub adb_path: Option<String>,
    /// wkhtmltoimage binary for --generate-png (default: from $PATH).
    pub wkhtmltoimage_path: Option<String>,
    /// Default device serial, as if -s had been passed.
    pub serial: Option<String>,
}

/// Load the config file, or defaults when no path is given.
///
/// A present-but-broken file is reported and ignored rather than aborting
/// the pull — the CLI flags still work without it.
pub fn load(path: Option<&Path>) -> FileConfig {
    let Some(path) = path else {
        return FileConfig::default();
    };

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %path.display(), %err, "cannot read config file — using defaults");
            return FileConfig::default();
        }
    };

    match toml::from_str(&raw) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), %err, "cannot parse config file — using defaults");
            FileConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load(None);
        assert!(config.adb_path.is_none());
        assert!(config.serial.is_none());
    }

    #[test]
    fn parses_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "adb_path = \"/opt/android/adb\"").unwrap();
        writeln!(file, "serial = \"emulator-5554\"").unwrap();

        let config = load(Some(file.path()));
        assert_eq!(config.adb_path.as_deref(), Some("/opt/android/adb"));
        assert_eq!(config.serial.as_deref(), Some("emulator-5554"));
        assert!(config.wkhtmltoimage_path.is_none());
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "adb_path = [not toml").unwrap();
        let config = load(Some(file.path()));
        assert!(config.adb_path.is_none());
    }
}
