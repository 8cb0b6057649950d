use super::model::{Job, JobOutput};
use crate::common::error::PipelineResult;
use crate::common::upload::{UploadPipeline, collect_outputs};
use crate::infrastructure::fs::workspace::Workspace;
use crate::state::AppState;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct FfmpegService;

impl FfmpegService {
    /// Runs one command end to end: parse, stage inputs, transcode, publish.
    ///
    /// Parse failures return before any workspace exists. Once the workspace
    /// is created it is removed on every path out of this function.
    pub async fn execute(
        state: AppState,
        command: String,
        request_id: Uuid,
    ) -> PipelineResult<JobOutput> {
        let transcoder = &state.config.transcoder;
        let mut job = Job::parse(
            command,
            request_id,
            &transcoder.binary_name,
            transcoder.timeout,
        )?;

        info!("🎬 Job {} accepted: {}", job.id, job.raw_command);

        let workspace = Workspace::create(&transcoder.temp_root, job.id).await?;
        debug!("Job {} workspace at {}", job.id, workspace.root().display());
        let result = Self::run_in_workspace(&state, &mut job, &workspace).await;
        workspace.destroy().await;

        match &result {
            Ok(output) => info!(
                "✅ Job {} finished, {} output(s) published",
                job.id,
                output.outputs.len()
            ),
            Err(e) => warn!("❌ Job {} failed ({:?}): {}", job.id, e.kind(), e),
        }

        result
    }

    async fn run_in_workspace(
        state: &AppState,
        job: &mut Job,
        workspace: &Workspace,
    ) -> PipelineResult<JobOutput> {
        let locators = job.args.locators();
        if !locators.is_empty() {
            let local = state
                .downloads
                .download_all(&locators, workspace.inputs_dir())
                .await?;
            job.args.rewrite_inputs(&local);
        }

        let declared = job.args.outputs();
        job.args.rewrite_outputs(workspace.outputs_dir())?;

        // cwd is the outputs dir so files ffmpeg names on its own (segments,
        // playlists) land next to the declared ones.
        let process = state
            .executions
            .submit(job.args.tokens(), workspace.outputs_dir(), job.deadline)
            .await?;

        let files = collect_outputs(workspace.outputs_dir(), &declared).await?;
        let outputs = UploadPipeline::new(
            state.storage.as_ref(),
            state.config.transcoder.max_output_bytes,
        )
        .publish(files)
        .await?;

        Ok(JobOutput {
            stdout: process.stdout,
            stderr: process.stderr,
            exit_code: process.exit_code,
            outputs,
        })
    }
}
