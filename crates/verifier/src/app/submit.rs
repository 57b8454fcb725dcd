use std::time::Instant;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::{error, info, instrument, warn};
use zkbridge_types::{RejectionReason, Submission, SubmitResponse};

use crate::{VerifierError, app::AppState, metrics::record_submit};

/// HTTP handler for the `/submit` endpoint.
///
/// Rejections are answered with `400` and a [`SubmitResponse::Rejected`] body, including
/// bodies that do not decode. A store failure is a `500`: nothing was admitted and the
/// relayer may resubmit.
#[instrument(skip_all)]
pub(crate) async fn submit_deposit(
    State(state): State<AppState>,
    body: Result<Json<Submission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), (StatusCode, String)> {
    let start = Instant::now();

    let submission = match body {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Undecodable submission");
            record_submit(RejectionReason::Malformed.as_str(), start.elapsed());
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(SubmitResponse::Rejected {
                    deposit_id: None,
                    reason: RejectionReason::Malformed,
                    detail: rejection.body_text(),
                }),
            ));
        }
    };
    let deposit_id = submission.deposit_id.clone();

    let err = match state.verifier.submit(&submission).await {
        Ok(admission) => {
            info!(
                deposit_id = %admission.deposit_id,
                credited_to = %admission.credited_to,
                watcher = submission.metadata.get("watcher").map(String::as_str).unwrap_or("-"),
                "Deposit admitted"
            );
            record_submit("admitted", start.elapsed());
            return Ok((StatusCode::OK, Json(SubmitResponse::Admitted(admission))));
        }
        Err(err) => err,
    };

    if let VerifierError::AlreadyProcessed(deposit_id) = &err {
        info!(%deposit_id, "Deposit already processed");
        record_submit("already_processed", start.elapsed());
        return Ok((
            StatusCode::OK,
            Json(SubmitResponse::AlreadyProcessed {
                deposit_id: deposit_id.clone(),
            }),
        ));
    }

    let Some(reason) = err.reason() else {
        error!(%deposit_id, error = %err, "Submission failed");
        record_submit("error", start.elapsed());
        return Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string()));
    };

    warn!(%deposit_id, %reason, error = %err, "Submission rejected");
    record_submit(reason.as_str(), start.elapsed());
    Ok((
        StatusCode::BAD_REQUEST,
        Json(SubmitResponse::Rejected {
            deposit_id: (!deposit_id.is_empty()).then_some(deposit_id),
            reason,
            detail: err.to_string(),
        }),
    ))
}
