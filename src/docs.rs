use crate::common::error::{ErrorKind, Severity};
use crate::common::upload::PublishedArtifact;
use crate::modules::ffmpeg::dto::{ExecuteFailure, ExecuteRequest, ExecuteResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::ffmpeg::handler::execute_command,
    ),
    components(
        schemas(
            ExecuteRequest, ExecuteResponse, ExecuteFailure,
            PublishedArtifact, ErrorKind, Severity,
        )
    ),
    tags(
        (name = "FFmpeg", description = "Run ffmpeg commands and publish their outputs")
    )
)]
pub struct ApiDoc;
