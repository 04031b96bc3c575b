pub mod adb;
pub mod apk;
pub mod file_config;
pub mod metadata;
pub mod png;
pub mod pull;
pub mod report;
