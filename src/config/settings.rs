use crate::config::env::{self, EnvKey};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Hard ceiling for a single produced file (100 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 100 * 1024 * 1024;
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 12;
pub const DEFAULT_FFMPEG_TIMEOUT_SECS: u64 = 5 * 60;
pub const DEFAULT_FFMPEG_GLOBAL_ARGS: &str = "-hide_banner -nostdin";

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub minio_url: String,
    pub minio_public_url: String,
    pub minio_bucket: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub transcoder: TranscoderConfig,
}

/// Knobs of the job pipeline itself, independent of the storage backend.
#[derive(Clone, Debug, Deserialize)]
pub struct TranscoderConfig {
    /// Name the inbound command text must start with.
    pub binary_name: String,
    /// Executable actually spawned.
    pub binary_path: PathBuf,
    /// Arguments placed before the user's arguments on every run.
    pub global_args: Vec<String>,
    pub timeout: Duration,
    pub temp_root: PathBuf,
    pub download_concurrency: usize,
    pub download_timeout: Duration,
    pub execution_concurrency: usize,
    pub max_output_bytes: u64,
}

impl AppConfig {
    pub fn new() -> Result<Self, anyhow::Error> {
        let minio_url = env::require(EnvKey::MinioUrl)?;

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            minio_public_url: env::get_or(EnvKey::MinioPublicUrl, &minio_url),
            minio_url,
            minio_bucket: env::require(EnvKey::MinioBucket)?,
            minio_access_key: env::require(EnvKey::MinioAccessKey)?,
            minio_secret_key: env::require(EnvKey::MinioSecretKey)?,
            transcoder: TranscoderConfig::from_env()?,
        })
    }
}

impl TranscoderConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let global_args = shell_words::split(&env::get_or(
            EnvKey::FfmpegGlobalArgs,
            DEFAULT_FFMPEG_GLOBAL_ARGS,
        ))?;

        let default_root = std::env::temp_dir().join("ffmpeg-jobs");

        Ok(Self {
            binary_name: "ffmpeg".to_string(),
            binary_path: PathBuf::from(env::get_or(EnvKey::FfmpegPath, "ffmpeg")),
            global_args,
            timeout: Duration::from_secs(env::get_parsed(
                EnvKey::FfmpegTimeoutSecs,
                DEFAULT_FFMPEG_TIMEOUT_SECS,
            )),
            temp_root: env::get_optional::<PathBuf>(EnvKey::JobTempRoot).unwrap_or(default_root),
            download_concurrency: env::get_parsed(
                EnvKey::DownloadConcurrency,
                DEFAULT_DOWNLOAD_CONCURRENCY,
            ),
            download_timeout: Duration::from_secs(env::get_parsed(EnvKey::DownloadTimeoutSecs, 120)),
            execution_concurrency: env::get_optional(EnvKey::ExecutionConcurrency)
                .unwrap_or_else(|| execution_capacity(available_cores())),
            max_output_bytes: env::get_parsed(EnvKey::MaxOutputBytes, DEFAULT_MAX_OUTPUT_BYTES),
        })
    }
}

pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// ffmpeg is itself heavily multi-threaded, so only half the cores get a slot,
/// never fewer than 2 and never more than 8.
pub fn execution_capacity(cores: usize) -> usize {
    (cores / 2).clamp(2, 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_capacity_is_clamped() {
        assert_eq!(execution_capacity(1), 2);
        assert_eq!(execution_capacity(4), 2);
        assert_eq!(execution_capacity(6), 3);
        assert_eq!(execution_capacity(12), 6);
        assert_eq!(execution_capacity(64), 8);
    }
}
