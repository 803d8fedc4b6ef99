use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use super::{
    dto::{
        CreateTreeRequest, CreateTreeResponse, MineResponse, OkResponse, PatchTreeRequest,
        ResendCodeResponse, SearchParams, SearchResponse, VerifyRequest, VerifyResponse,
    },
    search, services,
};
use crate::{auth::AuthSession, error::AppResult, extract::ValidJson, state::AppState};

pub fn tree_routes() -> Router<AppState> {
    Router::new()
        .route("/tree", post(create_tree))
        .route("/tree/mine", get(my_tree))
        .route("/tree/mine/code", post(resend_code))
        .route("/tree/verify", post(verify_tree))
        .route("/tree/search", get(search_trees))
        .route("/tree/:id", patch(patch_tree))
}

#[instrument(skip(state, session, payload), fields(user_id = %session.user_id))]
pub async fn create_tree(
    State(state): State<AppState>,
    session: AuthSession,
    ValidJson(payload): ValidJson<CreateTreeRequest>,
) -> AppResult<(StatusCode, Json<CreateTreeResponse>)> {
    let created =
        services::create_tree(&state, &session, payload, OffsetDateTime::now_utc()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateTreeResponse {
            ok: true,
            tree_id: created.tree_id,
            emailed: created.emailed,
        }),
    ))
}

/// Reports the caller's tree id. Anonymous callers get `ok: false` rather than a 401.
#[instrument(skip(state, session))]
pub async fn my_tree(
    State(state): State<AppState>,
    session: Option<AuthSession>,
) -> AppResult<Json<MineResponse>> {
    let Some(session) = session else {
        return Ok(Json(MineResponse {
            ok: false,
            tree_id: None,
        }));
    };
    let tree_id = services::my_tree_id(&state, session.user_id).await?;
    Ok(Json(MineResponse { ok: true, tree_id }))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn resend_code(
    State(state): State<AppState>,
    session: AuthSession,
) -> AppResult<Json<ResendCodeResponse>> {
    let emailed = services::resend_code(&state, &session, OffsetDateTime::now_utc()).await?;
    Ok(Json(ResendCodeResponse { ok: true, emailed }))
}

#[instrument(skip(state, payload))]
pub async fn verify_tree(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<VerifyRequest>,
) -> AppResult<Json<VerifyResponse>> {
    let tree = services::verify_tree(&state, payload, OffsetDateTime::now_utc()).await?;
    Ok(Json(VerifyResponse { ok: true, tree }))
}

// Query is a national identifier; keep it out of spans.
#[instrument(skip(state, params))]
pub async fn search_trees(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let results = search::search(&state, &params.cnic).await?;
    Ok(Json(SearchResponse { ok: true, results }))
}

#[instrument(skip(state, session, payload), fields(user_id = %session.user_id))]
pub async fn patch_tree(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<PatchTreeRequest>,
) -> AppResult<Json<OkResponse>> {
    services::patch_tree(&state, &session, &id, payload).await?;
    Ok(Json(OkResponse { ok: true }))
}
