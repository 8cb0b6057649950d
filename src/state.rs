use crate::config::settings::AppConfig;
use crate::infrastructure::http::fetcher::Fetcher;
use crate::infrastructure::storage::ObjectStore;
use crate::workers::downloader::DownloadCoordinator;
use crate::workers::transcoder::{ExecutionQueue, ProcessRunner};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: Arc<dyn ObjectStore>,
    pub downloads: DownloadCoordinator,
    pub executions: ExecutionQueue,
}

impl AppState {
    /// Builds the process-wide pools once; every clone shares them.
    pub fn new(config: AppConfig, storage: Arc<dyn ObjectStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        let transcoder = &config.transcoder;
        let downloads = DownloadCoordinator::new(fetcher, transcoder.download_concurrency);
        let executions = ExecutionQueue::new(
            ProcessRunner::from_config(transcoder),
            transcoder.execution_concurrency,
        );

        Self {
            config,
            storage,
            downloads,
            executions,
        }
    }
}
