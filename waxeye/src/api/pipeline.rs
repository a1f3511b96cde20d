//! Pipeline trigger handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use super::ui::{failure_page, render_page, Action};
use crate::pipeline::PipelineError;
use crate::AppState;

/// GET /do
///
/// Runs the capture → recognize → search → play pipeline once. An
/// overlapping trigger gets 409 rather than a queued duplicate run.
pub async fn run_pipeline(State(state): State<AppState>) -> Response {
    match state.pipeline.run().await {
        Ok(outcome) => {
            let actions = vec![Action {
                text: format!("Found \"{}\", now playing {}", outcome.label, outcome.context_uri),
                path: "/".to_string(),
            }];
            render_page("Enjoy the record!", &actions).into_response()
        }
        Err(PipelineError::Busy) => {
            warn!("pipeline trigger rejected, a run is already in flight");
            (
                StatusCode::CONFLICT,
                render_page("Hold on, already working on one...", &[]),
            )
                .into_response()
        }
        Err(e @ PipelineError::Stage { .. }) => {
            error!("{}", e);
            failure_page().into_response()
        }
    }
}
