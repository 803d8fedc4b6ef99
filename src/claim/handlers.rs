use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{ClaimRequest, ClaimResponse},
    services,
};
use crate::{error::AppResult, extract::ValidJson, state::AppState};

pub fn claim_routes() -> Router<AppState> {
    Router::new().route("/claim", post(submit_claim))
}

#[instrument(skip(state, payload))]
pub async fn submit_claim(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ClaimRequest>,
) -> AppResult<Json<ClaimResponse>> {
    let id = services::submit_claim(&state, payload).await?;
    Ok(Json(ClaimResponse { ok: true, id }))
}
