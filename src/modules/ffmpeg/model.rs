use crate::common::command::parse_command;
use crate::common::error::PipelineResult;
use crate::common::references::ArgumentVector;
use crate::common::upload::PublishedArtifact;
use std::time::Duration;
use uuid::Uuid;

/// One transcode request, from parsed command to final result.
#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub raw_command: String,
    pub args: ArgumentVector,
    pub deadline: Duration,
}

impl Job {
    pub fn parse(
        raw_command: String,
        id: Uuid,
        binary_name: &str,
        deadline: Duration,
    ) -> PipelineResult<Self> {
        let tokens = parse_command(&raw_command, binary_name)?;
        Ok(Self {
            id,
            raw_command,
            args: ArgumentVector::new(tokens),
            deadline,
        })
    }
}

#[derive(Debug, Clone)]
pub struct JobOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub outputs: Vec<PublishedArtifact>,
}
