use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::password::check_strength;
use crate::error::{AppError, AppResult};
use crate::validation::{is_valid_email, Validate};

/// Request body for account creation.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub ok: bool,
    pub user_id: Uuid,
}

/// `hasTree` is true once the user has created a tree.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub ok: bool,
    pub has_tree: bool,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Validate for SignupRequest {
    fn validate(&self) -> AppResult<()> {
        if !is_valid_email(&self.email) {
            return Err(AppError::validation("Invalid email"));
        }
        check_strength(&self.password)
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> AppResult<()> {
        if !is_valid_email(&self.email) {
            return Err(AppError::validation("Invalid email"));
        }
        if self.password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }
        Ok(())
    }
}
