use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    MinioUrl,
    MinioPublicUrl,
    MinioBucket,
    MinioAccessKey,
    MinioSecretKey,
    FfmpegPath,
    FfmpegGlobalArgs,
    FfmpegTimeoutSecs,
    JobTempRoot,
    DownloadConcurrency,
    DownloadTimeoutSecs,
    ExecutionConcurrency,
    MaxOutputBytes,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::MinioUrl => "MINIO_ENDPOINT",
            EnvKey::MinioPublicUrl => "MINIO_PUBLIC_URL",
            EnvKey::MinioBucket => "MINIO_BUCKET_OUTPUTS",
            EnvKey::MinioAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::MinioSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::FfmpegGlobalArgs => "FFMPEG_GLOBAL_ARGS",
            EnvKey::FfmpegTimeoutSecs => "FFMPEG_TIMEOUT_SECS",
            EnvKey::JobTempRoot => "JOB_TEMP_ROOT",
            EnvKey::DownloadConcurrency => "DOWNLOAD_CONCURRENCY",
            EnvKey::DownloadTimeoutSecs => "DOWNLOAD_TIMEOUT_SECS",
            EnvKey::ExecutionConcurrency => "EXECUTION_CONCURRENCY",
            EnvKey::MaxOutputBytes => "MAX_OUTPUT_BYTES",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

pub fn get_optional<T: FromStr>(key: EnvKey) -> Option<T> {
    get(key).ok().and_then(|val| val.parse::<T>().ok())
}

pub fn require(key: EnvKey) -> anyhow::Result<String> {
    let name = key.as_str();
    env::var(name).map_err(|_| anyhow::anyhow!("{} must be set", name))
}
