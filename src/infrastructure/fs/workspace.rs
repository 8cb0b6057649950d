use crate::common::error::PipelineResult;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Per-request scratch directory: `{root}/{id}/inputs` and `{root}/{id}/outputs`.
///
/// Request ids are fresh v4 UUIDs, so two live requests never share a path and
/// no locking is needed between workspaces.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    inputs_dir: PathBuf,
    outputs_dir: PathBuf,
}

impl Workspace {
    pub async fn create(temp_root: &Path, id: Uuid) -> PipelineResult<Self> {
        let root = temp_root.join(id.to_string());
        let inputs_dir = root.join("inputs");
        let outputs_dir = root.join("outputs");

        if let Err(e) = create_dirs(&inputs_dir, &outputs_dir).await {
            // Drop whatever part of the layout was created.
            if let Err(cleanup) = fs::remove_dir_all(&root).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial workspace {}: {}", root.display(), cleanup);
                }
            }
            return Err(e.into());
        }

        debug!("Created workspace {}", root.display());

        Ok(Self {
            root,
            inputs_dir,
            outputs_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn inputs_dir(&self) -> &Path {
        &self.inputs_dir
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs_dir
    }

    /// Best-effort removal. Consumes the workspace so it can only run once;
    /// failures are logged and never replace the job's own result.
    pub async fn destroy(self) {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => debug!("Removed workspace {}", self.root.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove workspace {}: {}", self.root.display(), e),
        }
    }
}

async fn create_dirs(inputs_dir: &Path, outputs_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(inputs_dir).await?;
    fs::create_dir_all(outputs_dir).await
}
