//! Access codes that gate viewing a tree: six random digits, stored only as a
//! SHA-256 hex digest, valid for ten minutes, newest-per-tree wins.

use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{
    repo::OtpStore,
    repo_types::{NewOtp, TreeOtp},
};
use crate::{error::AppResult, mailer::OutboundEmail};

pub const CODE_LEN: usize = 6;
pub const CODE_TTL: Duration = Duration::minutes(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("Code not found")]
    NotFound,
    #[error("Code expired")]
    Expired,
    #[error("Invalid code")]
    InvalidCode,
}

pub fn generate_code() -> String {
    let mut rng = OsRng;
    (0..CODE_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

pub fn hash_code(code: &str) -> String {
    format!("{:x}", Sha256::digest(code.as_bytes()))
}

pub fn is_code_shaped(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Checks `code` against the newest issued record for a tree.
pub fn check(latest: Option<&TreeOtp>, code: &str, now: OffsetDateTime) -> Result<(), OtpError> {
    let otp = latest.ok_or(OtpError::NotFound)?;
    if otp.expires_at < now {
        return Err(OtpError::Expired);
    }
    if !is_code_shaped(code) || otp.code_hash != hash_code(code) {
        return Err(OtpError::InvalidCode);
    }
    Ok(())
}

/// Stores a fresh code for `tree_id`, superseding earlier ones, and returns the plaintext.
pub async fn issue(store: &dyn OtpStore, tree_id: Uuid, now: OffsetDateTime) -> AppResult<String> {
    let code = generate_code();
    store
        .issue(NewOtp {
            tree_id,
            code_hash: hash_code(&code),
            expires_at: now + CODE_TTL,
            issued_at: now,
        })
        .await?;
    Ok(code)
}

pub fn code_email(to: &str, code: &str, tree_title: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Your Family Tree access code".into(),
        html: format!(
            "<p>Hello,</p>\
             <p>Your access code for <b>{}</b> is:</p>\
             <h2>{}</h2>\
             <p>This code expires in {} minutes.</p>",
            crate::mailer::escape_html(tree_title),
            code,
            CODE_TTL.whole_minutes()
        ),
        text: None,
        reply_to: None,
    }
}
