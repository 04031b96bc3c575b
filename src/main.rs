use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Parser;
use regex::Regex;

use shotpull::adb::{AdbPuller, DeviceSelector};
use shotpull::file_config::{self, DEFAULT_ADB, DEFAULT_WKHTMLTOIMAGE};
use shotpull::pull::{self, PullOptions};
use shotpull::apk;

#[derive(Parser)]
#[command(
    name = "shotpull",
    about = "Pull screenshot-test results from an Android device and render an HTML report",
    version
)]
struct Args {
    /// Instrumentation package name (e.g. com.example.app.tests), or an APK
    /// path when --apk is given.
    target: String,

    /// Treat TARGET as an APK path and resolve the package name via aapt.
    ///
    /// Requires $ANDROID_SDK or $ANDROID_HOME to locate the build-tools.
    #[arg(long)]
    apk: bool,

    /// Render the report to this PNG (via wkhtmltoimage) instead of keeping
    /// the HTML around.
    #[arg(long, value_name = "PATH")]
    generate_png: Option<PathBuf>,

    /// Only pull screenshots whose name matches this regex.
    ///
    /// Examples:
    ///   shotpull com.example.tests --filter-name-regex LoginView
    #[arg(long, value_name = "REGEX")]
    filter_name_regex: Option<String>,

    /// Stage the report in this directory instead of a fresh temp dir.
    #[arg(long, env = "SHOTPULL_TEMP_DIR", value_name = "DIR")]
    temp_dir: Option<PathBuf>,

    /// Direct adb to the single running emulator.
    #[arg(short = 'e', long, conflicts_with_all = ["device", "serial"])]
    emulator: bool,

    /// Direct adb to the single attached USB device.
    #[arg(short = 'd', long, conflicts_with = "serial")]
    device: bool,

    /// Direct adb to the device with this serial.
    #[arg(short = 's', long, value_name = "SERIAL")]
    serial: Option<String>,

    /// adb binary to use (default: "adb" from $PATH).
    #[arg(long, env = "SHOTPULL_ADB", value_name = "PATH")]
    adb: Option<String>,

    /// TOML config file with per-machine defaults (adb_path,
    /// wkhtmltoimage_path, serial).
    #[arg(long, env = "SHOTPULL_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SHOTPULL_LOG")]
    log: Option<String>,

    /// Print a machine-readable JSON summary of the pulled screenshots.
    #[arg(long)]
    json: bool,

    /// Suppress progress and informational output.
    ///
    /// Errors are still printed to stderr. --json output is unaffected.
    #[arg(long, short = 'q')]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Init once — must happen before any tracing calls.
    let log_level = args.log.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let file_cfg = file_config::load(args.config.as_deref());
    let adb_path = args
        .adb
        .or(file_cfg.adb_path)
        .unwrap_or_else(|| DEFAULT_ADB.to_string());
    let wkhtmltoimage_path = file_cfg
        .wkhtmltoimage_path
        .unwrap_or_else(|| DEFAULT_WKHTMLTOIMAGE.to_string());
    let serial = args.serial.or(file_cfg.serial);

    let package = if args.apk {
        apk::package_from_apk(Path::new(&args.target)).await?
    } else {
        args.target.clone()
    };

    let filter_name_regex = args
        .filter_name_regex
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --filter-name-regex")?;

    let selector = DeviceSelector {
        emulator: args.emulator,
        device: args.device,
        serial,
    };
    let puller = AdbPuller::new(adb_path, selector);

    let opts = PullOptions {
        package,
        filter_name_regex,
        generate_png: args.generate_png,
        temp_dir: args.temp_dir,
        wkhtmltoimage_path,
        json: args.json,
        quiet: args.quiet,
    };
    pull::pull_screenshots(&opts, &puller).await
}
