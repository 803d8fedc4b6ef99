use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::validation::Validate;

/// Body of `POST /claim`. Every field is optional at the wire level so that
/// gaps surface as one validation message instead of a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClaimRequest {
    pub name: Option<String>,
    pub prev_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact_pref: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub ok: bool,
    pub id: String,
}

impl ClaimRequest {
    fn required(&self) -> [Option<&str>; 5] {
        [
            &self.name,
            &self.email,
            &self.phone,
            &self.address,
            &self.contact_pref,
        ]
        .map(|f| f.as_deref().map(str::trim).filter(|v| !v.is_empty()))
    }
}

impl Validate for ClaimRequest {
    fn validate(&self) -> AppResult<()> {
        if self.required().iter().any(Option::is_none) {
            return Err(AppError::validation("Missing required fields."));
        }
        Ok(())
    }
}
