use tracing::{info, warn};

use super::dto::ClaimRequest;
use crate::{
    error::{AppError, AppResult},
    mailer::{escape_html, OutboundEmail},
    state::AppState,
    validation::Validate,
};

pub const CLAIM_SUBJECT: &str = "New Claim Inquiry";

/// Forwards a claim inquiry to the claims inbox and returns the message id.
/// Nothing is stored.
pub async fn submit_claim(state: &AppState, req: ClaimRequest) -> AppResult<String> {
    req.validate()?;

    let email = claim_email(&state.config.claims_inbox, &req);
    match state.mailer.send(email).await {
        Ok(id) => {
            info!(message_id = %id, "claim forwarded");
            Ok(id)
        }
        Err(e) => {
            warn!(error = %e, "claim email failed");
            Err(AppError::Upstream(e.to_string()))
        }
    }
}

fn field(value: &Option<String>) -> &str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
}

pub fn claim_email(inbox: &str, req: &ClaimRequest) -> OutboundEmail {
    let rows = [
        ("Name", field(&req.name)),
        ("Previous Name", field(&req.prev_name)),
        ("Email", field(&req.email)),
        ("Phone", field(&req.phone)),
        ("Mailing Address", field(&req.address)),
        ("Contact Preference", field(&req.contact_pref)),
        ("Notes / Claim Details", field(&req.notes)),
    ];

    let mut html = format!("<h2>{CLAIM_SUBJECT}</h2>");
    for (label, value) in rows {
        html.push_str(&format!("<p><b>{label}:</b> {}</p>", escape_html(value)));
    }
    let text = rows
        .iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .collect::<Vec<_>>()
        .join("\n");

    OutboundEmail {
        to: inbox.to_string(),
        subject: CLAIM_SUBJECT.into(),
        html,
        text: Some(text),
        reply_to: req.email.as_deref().map(|e| e.trim().to_string()),
    }
}
