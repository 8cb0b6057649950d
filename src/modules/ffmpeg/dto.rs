use super::model::JobOutput;
use crate::common::error::{ErrorKind, PipelineError, Severity};
use crate::common::upload::PublishedArtifact;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ExecuteRequest {
    /// Full command line, starting with `ffmpeg `.
    #[validate(length(min = 1, max = 10000))]
    pub command: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExecuteResponse {
    pub request_id: Uuid,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub outputs: Vec<PublishedArtifact>,
}

impl ExecuteResponse {
    pub fn new(request_id: Uuid, output: JobOutput) -> Self {
        Self {
            request_id,
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            outputs: output.outputs,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExecuteFailure {
    pub request_id: Uuid,
    pub kind: ErrorKind,
    pub severity: Severity,
    pub retriable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl ExecuteFailure {
    pub fn new(request_id: Uuid, err: &PipelineError) -> Self {
        let kind = err.kind();
        Self {
            request_id,
            kind,
            severity: kind.severity(),
            retriable: kind.retriable(),
            exit_code: err.exit_code(),
            stderr: err.stderr().map(str::to_string),
        }
    }
}
