//! Failure taxonomy for the job pipeline.
//!
//! Every stage returns a [`PipelineError`] built at the point of failure, so the
//! boundary layer picks a response from the variant alone and never looks at
//! message text.

use axum::http::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Failed to spawn ffmpeg: {0}")]
    Spawn(String),

    #[error("ffmpeg timed out after {0:?}")]
    Timeout(Duration),

    #[error("ffmpeg exited with code {exit_code}")]
    Execution { stderr: String, exit_code: i32 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Closed set of externally visible failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Parse,
    Spawn,
    Timeout,
    Execution,
    Storage,
    Download,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    ClientFault,
    ServerFault,
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn download(url: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Download {
            url: url.into(),
            message: cause.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Spawn(_) => ErrorKind::Spawn,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Execution { .. } => ErrorKind::Execution,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Download { .. } => ErrorKind::Download,
            Self::Io(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Execution { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Execution { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

impl ErrorKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::Validation | Self::Parse | Self::Execution => Severity::ClientFault,
            Self::Spawn | Self::Timeout | Self::Storage | Self::Download | Self::Internal => {
                Severity::ServerFault
            }
        }
    }

    pub fn retriable(self) -> bool {
        matches!(self, Self::Timeout | Self::Storage | Self::Download)
    }

    pub fn status_code(self) -> StatusCode {
        match self {
            Self::Validation | Self::Parse => StatusCode::BAD_REQUEST,
            Self::Execution => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Storage | Self::Download => StatusCode::BAD_GATEWAY,
            Self::Spawn | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_variant_not_the_message() {
        let err = PipelineError::parse("timeout while uploading to storage");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.kind().status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn execution_carries_exit_code_and_stderr() {
        let err = PipelineError::Execution {
            stderr: "Unknown encoder".to_string(),
            exit_code: 1,
        };
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(err.stderr(), Some("Unknown encoder"));
        assert_eq!(err.kind().severity(), Severity::ClientFault);
    }

    #[test]
    fn server_side_kinds() {
        for kind in [ErrorKind::Spawn, ErrorKind::Timeout, ErrorKind::Storage] {
            assert_eq!(kind.severity(), Severity::ServerFault);
        }
        assert!(ErrorKind::Timeout.retriable());
        assert!(!ErrorKind::Spawn.retriable());
        assert_eq!(
            PipelineError::Timeout(Duration::from_secs(300)).kind().status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn io_failures_are_internal() {
        let err = PipelineError::from(std::io::Error::other("disk full"));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.exit_code(), None);
    }
}
