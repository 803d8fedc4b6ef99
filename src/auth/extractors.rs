use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use tracing::warn;
use uuid::Uuid;

use super::session::SessionKeys;
use crate::error::AppError;

/// Authenticated caller, read from the signed session cookie.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(&keys.cookie_name)
            .map(|c| c.value().to_owned())
            .ok_or(AppError::Unauthorized("Unauthorized"))?;

        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired session");
            AppError::Unauthorized("Unauthorized")
        })?;

        Ok(AuthSession {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
