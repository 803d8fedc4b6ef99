use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{normalize_email, LoginRequest, SignupRequest},
    password::{hash_password, verify_password},
    repo_types::User,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    validation::Validate,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Registers a new user and returns its id.
pub async fn signup(state: &AppState, mut req: SignupRequest) -> AppResult<Uuid> {
    req.email = normalize_email(&req.email);
    req.validate()?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::Conflict("Email already in use".into()));
    }

    let hash = hash_password(&req.password)?;
    let user = state.users.create(&req.email, &hash).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user.id)
}

/// Checks credentials. Unknown email and wrong password fail identically.
pub async fn authenticate(state: &AppState, mut req: LoginRequest) -> AppResult<User> {
    req.email = normalize_email(&req.email);
    req.validate()?;

    let Some(user) = state.users.find_by_email(&req.email).await? else {
        warn!(email = %req.email, "login unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    }

    Ok(user)
}

/// Whether the user already owns a tree.
pub async fn has_tree(state: &AppState, user_id: Uuid) -> AppResult<bool> {
    Ok(state.trees.find_by_owner(user_id).await?.is_some())
}
