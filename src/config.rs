use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: String,
    /// Base URL under which stored blobs are reachable (`{public_url}/blobs/{key}`).
    pub public_url: String,
    pub max_upload_size: u64,
    pub snapshot_interval_secs: u64,
    pub log_level: String,
    pub cors_allowed_origins: String,
    pub insights_api_key: Option<String>,
    pub insights_base_url: String,
    pub insights_model: String,
    pub insights_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "/data".into()),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            max_upload_size: parse_env("MAX_UPLOAD_SIZE", 104_857_600),
            snapshot_interval_secs: parse_env("SNAPSHOT_INTERVAL_SECS", 300),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".into()),
            insights_api_key: env::var("INSIGHTS_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            insights_base_url: env::var("INSIGHTS_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".into()),
            insights_model: env::var("INSIGHTS_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".into()),
            insights_timeout_secs: parse_env("INSIGHTS_TIMEOUT_SECS", 60),
        }
    }

    pub fn blobs_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("blobs")
    }

    pub fn metadata_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("metadata")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.metadata_dir().join("snapshot.bin")
    }

    pub fn wal_dir(&self) -> PathBuf {
        self.metadata_dir().join("wal")
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
