use std::env;
use std::path::PathBuf;

const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Runtime configuration, read once in `main` and handed to the components
/// that need it.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_size: u64,
    pub confidence_threshold: f64,
    pub detector_url: String,
    pub detector_model: String,
    pub detector_timeout_secs: u64,
    pub frontend_dist: String,
}

impl Config {
    pub fn from_env() -> Self {
        let frontend_dist = env::var("FRONTEND_DIST").unwrap_or_else(|_| {
            if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
                format!("{}/../frontend/dist", manifest_dir)
            } else {
                "/usr/src/app/frontend/dist".to_string()
            }
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 8000),
            database_path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "storage/app.db".to_string()),
            ),
            upload_dir: PathBuf::from(
                env::var("UPLOAD_DIR").unwrap_or_else(|_| "storage/uploads".to_string()),
            ),
            max_upload_size: parse_or("MAX_UPLOAD_SIZE", DEFAULT_MAX_UPLOAD_SIZE),
            confidence_threshold: parse_or("CONFIDENCE_THRESHOLD", DEFAULT_CONFIDENCE_THRESHOLD)
                .clamp(0.0, 1.0),
            detector_url: env::var("DETECTOR_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            detector_model: env::var("DETECTOR_MODEL").unwrap_or_else(|_| "yolos-tiny".to_string()),
            detector_timeout_secs: parse_or("DETECTOR_TIMEOUT_SECS", 120),
            frontend_dist,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
