use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, AppResult};

lazy_static! {
    static ref CNIC_RE: Regex = Regex::new(r"^[0-9]{5}-[0-9]{7}-[0-9]$|^[0-9]{13}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub const CNIC_MESSAGE: &str = "Invalid CNIC (#####-#######-# or 13 digits)";

/// Request bodies that check themselves before reaching a store.
pub trait Validate {
    /// Returns the first violated field as [`AppError::Validation`].
    fn validate(&self) -> AppResult<()>;
}

pub fn is_valid_cnic(cnic: &str) -> bool {
    CNIC_RE.is_match(cnic)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn min_chars(value: &str, min: usize, field: &str) -> AppResult<()> {
    if value.trim().chars().count() < min {
        return Err(AppError::Validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(())
}

pub(crate) fn cnic(value: &str) -> AppResult<()> {
    if !is_valid_cnic(value.trim()) {
        return Err(AppError::validation(CNIC_MESSAGE));
    }
    Ok(())
}
