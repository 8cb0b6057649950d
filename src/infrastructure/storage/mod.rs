use async_trait::async_trait;

pub mod s3;

/// Where published artifacts go.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key`. Must fail rather than overwrite an existing key.
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> anyhow::Result<()>;

    fn public_url(&self, key: &str) -> String;
}
