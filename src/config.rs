use std::env;
use std::sync::OnceLock;
use std::time::Duration;

/// File extensions accepted for upload, compared case-insensitively.
pub const SUPPORTED_FILE_FORMATS: [&str; 6] =
    [".tif", ".tiff", ".geotiff", ".jpg", ".jpeg", ".png"];

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub analysis_server_url: String,
    pub max_file_size: u64,
    pub download_dir: String,
    pub results_dir: String,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let analysis_server_url = env::var("ANALYSIS_SERVER_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let max_file_size_mb: u64 = env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        let poll_interval_secs: u64 = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let poll_max_attempts: u32 = env::var("POLL_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self {
            database_url,
            analysis_server_url,
            max_file_size: max_file_size_mb * 1024 * 1024,
            download_dir: env::var("DOWNLOAD_DIR").unwrap_or_else(|_| "downloads".to_string()),
            results_dir: env::var("RESULTS_DIR").unwrap_or_else(|_| "results".to_string()),
            poll_interval: Duration::from_secs(poll_interval_secs),
            poll_max_attempts,
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}
