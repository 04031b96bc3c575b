//! Device file access over adb.
//!
//! The `Puller` trait is the seam between the pull orchestration and the
//! actual device: production code uses `AdbPuller` (shells out to `adb`),
//! tests substitute an in-memory fake.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Which attached device adb should talk to.
///
/// Mirrors the adb selector flags: `-e` (the single running emulator),
/// `-d` (the single USB device), `-s <serial>` (an explicit serial).
#[derive(Debug, Clone, Default)]
pub struct DeviceSelector {
    pub emulator: bool,
    pub device: bool,
    pub serial: Option<String>,
}

impl DeviceSelector {
    /// adb arguments for this selector, in the order adb expects them.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.emulator {
            args.push("-e".to_string());
        }
        if self.device {
            args.push("-d".to_string());
        }
        if let Some(serial) = &self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdbError {
    #[error("failed to run '{bin}': {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("adb pull of {remote} failed: {stderr}")]
    Pull { remote: String, stderr: String },
}

/// Read access to files on the device under test.
#[async_trait]
pub trait Puller: Send + Sync {
    /// Whether `remote` exists on the device.
    async fn remote_file_exists(&self, remote: &str) -> Result<bool, AdbError>;

    /// Copy `remote` from the device to the local path `local`.
    async fn pull(&self, remote: &str, local: &Path) -> Result<(), AdbError>;
}

/// Production puller that shells out to the adb binary.
pub struct AdbPuller {
    adb_path: String,
    selector: DeviceSelector,
}

impl AdbPuller {
    pub fn new(adb_path: impl Into<String>, selector: DeviceSelector) -> Self {
        Self {
            adb_path: adb_path.into(),
            selector,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        cmd.args(self.selector.to_args());
        cmd
    }
}

#[async_trait]
impl Puller for AdbPuller {
    async fn remote_file_exists(&self, remote: &str) -> Result<bool, AdbError> {
        // `test -e` exit codes do not survive every adb version's shell
        // transport, so echo a marker and look for it in stdout instead.
        let out = self
            .command()
            .arg("shell")
            .arg(format!("test -e '{remote}' && echo exists"))
            .output()
            .await
            .map_err(|source| AdbError::Spawn {
                bin: self.adb_path.clone(),
                source,
            })?;

        let exists = String::from_utf8_lossy(&out.stdout).contains("exists");
        debug!(remote, exists, "remote_file_exists");
        Ok(exists)
    }

    async fn pull(&self, remote: &str, local: &Path) -> Result<(), AdbError> {
        debug!(remote, local = %local.display(), "adb pull");
        let out = self
            .command()
            .arg("pull")
            .arg(remote)
            .arg(local)
            .output()
            .await
            .map_err(|source| AdbError::Spawn {
                bin: self.adb_path.clone(),
                source,
            })?;

        if !out.status.success() {
            return Err(AdbError::Pull {
                remote: remote.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
