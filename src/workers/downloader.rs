use crate::common::error::{PipelineError, PipelineResult};
use crate::infrastructure::http::fetcher::Fetcher;
use crate::infrastructure::queue::pool::WorkerPool;
use futures_util::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info};
use url::Url;
use uuid::Uuid;

/// Pulls remote inputs into a workspace through the process-wide download pool.
#[derive(Clone)]
pub struct DownloadCoordinator {
    pool: WorkerPool,
    fetcher: Arc<dyn Fetcher>,
}

impl DownloadCoordinator {
    pub fn new(fetcher: Arc<dyn Fetcher>, capacity: usize) -> Self {
        Self {
            pool: WorkerPool::new("download", capacity),
            fetcher,
        }
    }

    /// Fetches every locator into `target_dir`. The first failure fails the
    /// whole call; fetches still in flight are dropped and give back their slots.
    pub async fn download_all(
        &self,
        locators: &[String],
        target_dir: &Path,
    ) -> PipelineResult<HashMap<String, PathBuf>> {
        let names = local_names(locators);

        let fetches = locators.iter().zip(names).map(|(url, name)| {
            let path = target_dir.join(name);
            async move {
                self.pool
                    .run(async {
                        info!("⬇️ Downloading {}", url);
                        let body = self.fetcher.fetch(url).await.map_err(|e| {
                            error!("❌ Download of {} failed: {:#}", url, e);
                            PipelineError::download(url.as_str(), format!("{:#}", e))
                        })?;
                        fs::write(&path, &body).await?;
                        info!("⬇️ Downloaded {} bytes to {}", body.len(), path.display());
                        Ok::<_, PipelineError>((url.clone(), path))
                    })
                    .await
            }
        });

        Ok(try_join_all(fetches).await?.into_iter().collect())
    }
}

/// File name taken from the last path segment when it carries an extension.
pub fn local_file_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;

    let sanitized: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let (stem, ext) = sanitized.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(sanitized)
}

fn local_names(locators: &[String]) -> Vec<String> {
    let mut used = HashSet::new();
    locators
        .iter()
        .enumerate()
        .map(|(index, url)| {
            let name = local_file_name(url)
                .unwrap_or_else(|| format!("input_{}", Uuid::new_v4().simple()));
            let name = if used.contains(&name) {
                format!("{}_{}", index, name)
            } else {
                name
            };
            used.insert(name.clone());
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::test_support::FakeFetcher;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn names_come_from_the_url_path() {
        assert_eq!(
            local_file_name("https://cdn.example.com/media/clip.mp4?sig=abc").as_deref(),
            Some("clip.mp4")
        );
        assert_eq!(
            local_file_name("https://x.org/a/my%20video.mov").as_deref(),
            Some("my_20video.mov")
        );
        assert_eq!(local_file_name("https://x.org/stream"), None);
        assert_eq!(local_file_name("https://x.org/"), None);
        assert_eq!(local_file_name("https://x.org/.hidden"), None);
    }

    #[test]
    fn colliding_names_get_an_index_prefix() {
        let names = local_names(&[
            "https://a.com/x/video.mp4".to_string(),
            "https://b.com/y/video.mp4".to_string(),
            "https://c.com/live".to_string(),
        ]);
        assert_eq!(names[0], "video.mp4");
        assert_eq!(names[1], "1_video.mp4");
        assert!(names[2].starts_with("input_"));
    }

    #[tokio::test]
    async fn downloads_every_locator() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new()
            .with_body("https://h/a.mp4", b"aaaa")
            .with_body("https://h/b", b"bb");
        let coordinator = DownloadCoordinator::new(Arc::new(fetcher), 4);

        let locators = vec!["https://h/a.mp4".to_string(), "https://h/b".to_string()];
        let local = coordinator.download_all(&locators, dir.path()).await.unwrap();

        assert_eq!(local.len(), 2);
        assert_eq!(local["https://h/a.mp4"], dir.path().join("a.mp4"));
        assert_eq!(std::fs::read(&local["https://h/a.mp4"]).unwrap(), b"aaaa");
        assert_eq!(std::fs::read(&local["https://h/b"]).unwrap(), b"bb");
        assert_eq!(coordinator.pool.active(), 0);
    }

    #[tokio::test]
    async fn one_failed_fetch_fails_the_call() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new().with_body("https://h/a.mp4", b"aaaa");
        let coordinator = DownloadCoordinator::new(Arc::new(fetcher), 4);

        let locators = vec!["https://h/a.mp4".to_string(), "https://h/missing.mp4".to_string()];
        let err = coordinator.download_all(&locators, dir.path()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Download);
        assert!(err.to_string().contains("https://h/missing.mp4"));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn concurrent_fetches_are_bounded_by_the_pool() {
        let dir = TempDir::new().unwrap();
        let mut fetcher = FakeFetcher::new().with_delay(Duration::from_millis(20));
        let locators: Vec<String> = (0..10).map(|i| format!("https://h/{}.mp4", i)).collect();
        for url in &locators {
            fetcher = fetcher.with_body(url, b"x");
        }
        let fetcher = Arc::new(fetcher);
        let coordinator = DownloadCoordinator::new(fetcher.clone(), 3);

        coordinator.download_all(&locators, dir.path()).await.unwrap();

        let peak = fetcher.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak was {}", peak);
        assert!(peak >= 2, "fetches did not overlap");
    }

    #[tokio::test]
    async fn no_locators_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let coordinator = DownloadCoordinator::new(Arc::new(FakeFetcher::new()), 1);
        assert!(coordinator.download_all(&[], dir.path()).await.unwrap().is_empty());
    }
}
