use crate::common::error::{PipelineError, PipelineResult};
use crate::config::settings::TranscoderConfig;
use crate::infrastructure::queue::pool::WorkerPool;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Spawns the transcoder binary and waits for it under a deadline.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    global_args: Vec<String>,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>, global_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            global_args,
        }
    }

    pub fn from_config(config: &TranscoderConfig) -> Self {
        Self::new(&config.binary_path, config.global_args.clone())
    }

    pub async fn run(
        &self,
        args: &[String],
        working_dir: &Path,
        timeout: Duration,
    ) -> PipelineResult<ProcessOutput> {
        debug!(
            "Running: {} {}",
            self.program.display(),
            shell_words::join(self.global_args.iter().chain(args))
        );

        let mut child = Command::new(&self.program)
            .args(&self.global_args)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PipelineError::Spawn(format!("{}: {}", self.program.display(), e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PipelineError::Internal("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| PipelineError::Internal("stderr not captured".to_string()))?;

        // Drain both pipes independently so a chatty stderr cannot stall stdout.
        let stdout_task = tokio::spawn(read_to_string(stdout));
        let stderr_task = tokio::spawn(read_to_string(stderr));
        let readers = [stdout_task.abort_handle(), stderr_task.abort_handle()];

        // The deadline covers exit and both drains, since a forked child can keep
        // the pipes open after ffmpeg itself is gone. Whichever of completion and
        // deadline resolves first decides the outcome.
        let completed = tokio::time::timeout(timeout, async {
            let status = child.wait().await?;
            let stdout = join_stream(stdout_task).await?;
            let stderr = join_stream(stderr_task).await?;
            Ok::<_, PipelineError>((status, stdout, stderr))
        })
        .await;

        let (status, stdout, stderr) = match completed {
            Ok(result) => result?,
            Err(_) => {
                warn!("⏱️ ffmpeg timed out after {:?}, killing process", timeout);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed out ffmpeg: {}", e);
                }
                for reader in &readers {
                    reader.abort();
                }
                return Err(PipelineError::Timeout(timeout));
            }
        };

        let exit_code = status.code().unwrap_or(-1);

        if exit_code != 0 {
            return Err(PipelineError::Execution { stderr, exit_code });
        }

        Ok(ProcessOutput {
            stdout,
            stderr,
            exit_code,
        })
    }
}

async fn read_to_string<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn join_stream(task: JoinHandle<std::io::Result<String>>) -> PipelineResult<String> {
    let text = task
        .await
        .map_err(|e| PipelineError::Internal(format!("output reader failed: {}", e)))??;
    Ok(text)
}

/// Process-wide admission queue for transcoder runs. A job holds its slot for
/// the whole lifetime of the subprocess.
#[derive(Clone)]
pub struct ExecutionQueue {
    pool: WorkerPool,
    runner: ProcessRunner,
}

impl ExecutionQueue {
    pub fn new(runner: ProcessRunner, capacity: usize) -> Self {
        Self {
            pool: WorkerPool::new("execution", capacity),
            runner,
        }
    }

    pub async fn submit(
        &self,
        args: &[String],
        working_dir: &Path,
        timeout: Duration,
    ) -> PipelineResult<ProcessOutput> {
        self.pool
            .run(async {
                info!(
                    "🎥 ffmpeg admitted ({}/{} slots busy)",
                    self.pool.active(),
                    self.pool.capacity()
                );
                self.runner.run(args, working_dir, timeout).await
            })
            .await
    }
}
