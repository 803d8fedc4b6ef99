use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::Redirect,
    routing::post,
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument};

use super::{
    dto::{LoginRequest, LoginResponse, SignupRequest, SignupResponse},
    services,
    session::SessionKeys,
};
use crate::{error::AppResult, extract::ValidJson, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let user_id = services::signup(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse { ok: true, user_id }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let user = services::authenticate(&state, payload).await?;

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;
    let has_tree = services::has_tree(&state, user.id).await?;

    info!(user_id = %user.id, has_tree, "user logged in");
    Ok((
        jar.add(keys.cookie(token)),
        Json(LoginResponse { ok: true, has_tree }),
    ))
}

/// Clears the session cookie; works with or without a live session.
#[instrument(skip(state, jar))]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let keys = SessionKeys::from_ref(&state);
    let target = format!("{}/login", state.config.app_url.trim_end_matches('/'));
    (jar.add(keys.removal_cookie()), Redirect::to(&target))
}
