//! Fakes shared by the unit tests.

use crate::config::settings::{AppConfig, TranscoderConfig};
use crate::infrastructure::http::fetcher::Fetcher;
use crate::infrastructure::storage::ObjectStore;
use crate::state::AppState;
use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves canned bodies; any unknown URL fails like a 404.
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, Bytes>,
    delay: Duration,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: &'static [u8]) -> Self {
        self.bodies.insert(url.to_string(), Bytes::from_static(body));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<Bytes> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP status client error (404 Not Found) for url ({})", url))
    }
}

/// In-memory bucket. `fail_on` makes the n-th upload (1-based) fail.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<Vec<(String, Vec<u8>, String)>>,
    calls: AtomicUsize,
    fail_on: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> anyhow::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(call) {
            return Err(anyhow!("connection reset by peer"));
        }

        let mut objects = self.objects.lock().unwrap();
        if objects.iter().any(|(k, _, _)| k == key) {
            return Err(anyhow!("object {} already exists", key));
        }
        objects.push((key.to_string(), body, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://storage.test/outputs/{}", key)
    }
}

/// Runs `/bin/sh -c <script>` in place of ffmpeg. The user's arguments arrive
/// as `$1..$n`.
pub fn sh_transcoder(temp_root: &Path, script: &str) -> TranscoderConfig {
    TranscoderConfig {
        binary_name: "ffmpeg".to_string(),
        binary_path: PathBuf::from("/bin/sh"),
        global_args: vec!["-c".to_string(), script.to_string(), "ffmpeg".to_string()],
        timeout: Duration::from_secs(10),
        temp_root: temp_root.to_path_buf(),
        download_concurrency: 12,
        download_timeout: Duration::from_secs(5),
        execution_concurrency: 2,
        max_output_bytes: 100 * 1024 * 1024,
    }
}

pub fn app_config(transcoder: TranscoderConfig) -> AppConfig {
    AppConfig {
        server_port: 0,
        minio_url: "http://storage.test".to_string(),
        minio_public_url: "http://storage.test".to_string(),
        minio_bucket: "outputs".to_string(),
        minio_access_key: "test".to_string(),
        minio_secret_key: "test".to_string(),
        transcoder,
    }
}

pub fn app_state(
    transcoder: TranscoderConfig,
    store: Arc<dyn ObjectStore>,
    fetcher: Arc<dyn Fetcher>,
) -> AppState {
    AppState::new(app_config(transcoder), store, fetcher)
}
