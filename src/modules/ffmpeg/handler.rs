use super::dto::{ExecuteFailure, ExecuteRequest, ExecuteResponse};
use super::model::JobOutput;
use super::service::FfmpegService;
use crate::common::error::{PipelineError, PipelineResult};
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;
use validator::Validate;

/// Execute an ffmpeg command
///
/// Remote `http(s)` inputs are downloaded first; every file the command
/// produces is uploaded to object storage and listed in the response.
#[utoipa::path(
    post,
    path = "/api/v1/ffmpeg",
    request_body = ExecuteRequest,
    responses(
        (status = 200, description = "Command succeeded", body = ApiResponse<ExecuteResponse>),
        (status = 400, description = "Invalid or disallowed command", body = ApiResponse<ExecuteFailure>),
        (status = 422, description = "ffmpeg exited with a non-zero code", body = ApiResponse<ExecuteFailure>),
        (status = 500, description = "ffmpeg could not be started", body = ApiResponse<ExecuteFailure>),
        (status = 502, description = "Download or upload failed", body = ApiResponse<ExecuteFailure>),
        (status = 504, description = "ffmpeg exceeded its deadline", body = ApiResponse<ExecuteFailure>)
    ),
    tag = "FFmpeg"
)]
pub async fn execute_command(
    State(state): State<AppState>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();

    let result = match payload {
        Ok(Json(req)) => match req.validate() {
            Ok(()) => run_detached(state, req.command, request_id).await,
            Err(e) => Err(PipelineError::validation(e.to_string())),
        },
        Err(rejection) => Err(PipelineError::validation(rejection.body_text())),
    };

    match result {
        Ok(output) => ApiSuccess(
            ApiResponse::success(
                ExecuteResponse::new(request_id, output),
                "Command executed successfully",
            ),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => {
            let status = e.kind().status_code();
            ApiError(
                ApiResponse::failure(ExecuteFailure::new(request_id, &e), &e.to_string()),
                status,
            )
            .into_response()
        }
    }
}

/// The job runs on its own task, so a client that goes away mid-request does
/// not interrupt it and its workspace is still cleaned up.
async fn run_detached(state: AppState, command: String, request_id: Uuid) -> PipelineResult<JobOutput> {
    tokio::spawn(FfmpegService::execute(state, command, request_id))
        .await
        .map_err(|e| {
            error!("Job {} task failed: {}", request_id, e);
            PipelineError::Internal(format!("job task failed: {}", e))
        })?
}
