use std::path::PathBuf;

use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;

use crate::config::StorageConfig;

/// External file-storage collaborator. `store` returns a durable, publicly
/// resolvable URL usable as an image row's `url`; `delete` takes that URL
/// back and reports whether anything was removed.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn store(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String>;
    async fn delete(&self, url: &str) -> anyhow::Result<bool>;
}

pub async fn from_config(cfg: &StorageConfig) -> anyhow::Result<Box<dyn StorageClient>> {
    match cfg.backend.as_str() {
        "local" => Ok(Box::new(LocalStorage::new(
            &cfg.upload_dir,
            &cfg.public_base_url,
        ))),
        "s3" => Ok(Box::new(S3Storage::new(cfg).await?)),
        other => anyhow::bail!("unknown storage backend {other:?}"),
    }
}

// ---- S3 / MinIO ----

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.s3_region.clone()))
            .credentials_provider(Credentials::new(
                cfg.s3_access_key.clone(),
                cfg.s3_secret_key.clone(),
                None,
                None,
                "static",
            ))
            .endpoint_url(cfg.s3_endpoint.clone())
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.s3_endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.s3_bucket.clone(),
            public_base_url: cfg.public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn store(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, url: &str) -> anyhow::Result<bool> {
        let prefix = format!("{}/", self.public_base_url);
        let Some(key) = url.strip_prefix(&prefix) else {
            return Ok(false);
        };
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(true)
    }
}

// ---- Local disk ----

pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn store(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<String> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, url: &str) -> anyhow::Result<bool> {
        let prefix = format!("{}/", self.public_base_url);
        let Some(key) = url.strip_prefix(&prefix) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context("remove file"),
        }
    }
}

#[cfg(test)]
mod storage_tests {
    use super::*;

    #[tokio::test]
    async fn local_store_and_delete_round_trip() {
        let root = std::env::temp_dir().join(format!("ladle-storage-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(&root, "http://localhost:8080/uploads/");

        let url = storage
            .store("images/a.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8080/uploads/images/a.jpg");
        assert!(root.join("images/a.jpg").exists());

        assert!(storage.delete(&url).await.unwrap());
        assert!(!root.join("images/a.jpg").exists());
        // already gone
        assert!(!storage.delete(&url).await.unwrap());

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn local_delete_rejects_foreign_urls() {
        let storage = LocalStorage::new("/tmp/ladle-none", "http://localhost:8080/uploads");
        assert!(!storage
            .delete("https://elsewhere.example/images/a.jpg")
            .await
            .unwrap());
    }
}
