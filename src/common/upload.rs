use crate::common::error::{PipelineError, PipelineResult};
use crate::infrastructure::storage::ObjectStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// A file ffmpeg left in the workspace outputs directory.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub path: PathBuf,
    /// Name as written in the command, or the file name for undeclared outputs.
    pub declared_name: String,
    pub size: u64,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublishedArtifact {
    pub key: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
}

fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or(mime::APPLICATION_OCTET_STREAM)
        .to_string()
}

fn unix_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

/// Regular files in `outputs_dir`, sorted by name. Segment files and other
/// outputs ffmpeg derived on its own are included under their file name.
pub async fn collect_outputs(outputs_dir: &Path, declared: &[String]) -> PipelineResult<Vec<OutputFile>> {
    let mut entries = fs::read_dir(outputs_dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let declared_name = declared
            .iter()
            .find(|d| Path::new(d.as_str()).file_name() == Some(entry.file_name().as_os_str()))
            .cloned()
            .unwrap_or_else(|| file_name.clone());

        files.push(OutputFile {
            path: entry.path(),
            declared_name,
            size: metadata.len(),
            content_type: content_type_for(&file_name),
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Publishes a job's outputs as one unit.
///
/// The backend has no multi-object transaction, so a failure part-way leaves
/// earlier objects in place; the job is still reported as failed.
pub struct UploadPipeline<'a> {
    store: &'a dyn ObjectStore,
    max_file_bytes: u64,
}

impl<'a> UploadPipeline<'a> {
    pub fn new(store: &'a dyn ObjectStore, max_file_bytes: u64) -> Self {
        Self {
            store,
            max_file_bytes,
        }
    }

    pub async fn publish(&self, files: Vec<OutputFile>) -> PipelineResult<Vec<PublishedArtifact>> {
        // Size limit is checked for the whole batch before anything is sent.
        if let Some(oversized) = files.iter().find(|f| f.size > self.max_file_bytes) {
            return Err(PipelineError::storage(format!(
                "output '{}' is {} bytes, limit is {} bytes",
                oversized.declared_name, oversized.size, self.max_file_bytes
            )));
        }

        let mut published = Vec::with_capacity(files.len());

        for file in files {
            match self.publish_one(&file).await {
                Ok(artifact) => published.push(artifact),
                Err(e) => {
                    if !published.is_empty() {
                        warn!(
                            "Upload batch failed after {} object(s) were stored; they are left in place",
                            published.len()
                        );
                    }
                    return Err(e);
                }
            }
        }

        Ok(published)
    }

    async fn publish_one(&self, file: &OutputFile) -> PipelineResult<PublishedArtifact> {
        let body = fs::read(&file.path).await.map_err(|e| {
            PipelineError::storage(format!("failed to read output '{}': {}", file.declared_name, e))
        })?;
        let size = body.len() as u64;

        let base_name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.declared_name.clone());
        let key = format!("{}-{}", unix_millis(), base_name);

        self.store
            .upload(&key, body, &file.content_type)
            .await
            .map_err(|e| {
                error!("❌ Upload of {} failed: {:#}", key, e);
                PipelineError::storage(format!("failed to upload '{}': {:#}", file.declared_name, e))
            })?;

        info!("⬆️ Uploaded {} ({} bytes, {})", key, size, file.content_type);

        Ok(PublishedArtifact {
            url: self.store.public_url(&key),
            key,
            size,
            content_type: file.content_type.clone(),
        })
    }
}
