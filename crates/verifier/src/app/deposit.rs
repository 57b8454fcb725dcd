use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::error;
use zkbridge_types::{DepositId, DepositStatusResponse};

use crate::app::AppState;

/// HTTP handler for the `/deposits/{deposit_id}` endpoint.
pub(crate) async fn get_deposit_status(
    State(state): State<AppState>,
    Path(deposit_id): Path<DepositId>,
) -> Result<Json<DepositStatusResponse>, (StatusCode, String)> {
    let processed = state.verifier.is_processed(&deposit_id).map_err(|e| {
        error!(%deposit_id, error = %e, "Failed to read processed set");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(DepositStatusResponse {
        deposit_id,
        processed,
    }))
}
