use serde::Deserialize;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 30 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// "local" or "s3".
    pub backend: String,
    pub upload_dir: String,
    pub public_base_url: String,
    pub s3_endpoint: String,
    pub s3_bucket: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub s3_region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_upload_bytes: u64,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        let storage = StorageConfig {
            backend: std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".into()),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/uploads".into()),
            s3_endpoint: std::env::var("S3_ENDPOINT").unwrap_or_default(),
            s3_bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "ladle".into()),
            s3_access_key: std::env::var("S3_ACCESS_KEY").unwrap_or_default(),
            s3_secret_key: std::env::var("S3_SECRET_KEY").unwrap_or_default(),
            s3_region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };
        Ok(Self {
            database_url,
            max_upload_bytes,
            storage,
        })
    }
}
