//! Outbound email. Services depend on the [`Mailer`] trait; production uses
//! [`SmtpMailer`], and [`DisabledMailer`] stands in when SMTP is not configured.

use async_trait::async_trait;
use lazy_static::lazy_static;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::MailConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email delivery is not configured")]
    NotConfigured,

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("email build error: {0}")]
    Build(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    /// Plain-text alternative; derived from `html` when absent.
    pub text: Option<String>,
    pub reply_to: Option<String>,
}

impl OutboundEmail {
    pub fn plain_text(&self) -> String {
        self.text.clone().unwrap_or_else(|| html_to_text(&self.html))
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the message and returns its message id.
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: config.from_address.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError> {
        let id = Uuid::new_v4().to_string();
        let text = email.plain_text();

        let mut builder = Message::builder()
            .message_id(Some(format!("<{}@{}>", id, self.from.email.domain())))
            .from(self.from.clone())
            .to(email.to.parse()?)
            .subject(email.subject.as_str());
        if let Some(reply_to) = email.reply_to.as_deref() {
            match reply_to.parse::<Mailbox>() {
                Ok(mbox) => builder = builder.reply_to(mbox),
                Err(e) => warn!(error = %e, "ignoring unparseable reply-to"),
            }
        }
        let message = builder
            .multipart(MultiPart::alternative_plain_html(text, email.html))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport.send(message).await?;
        info!(message_id = %id, subject = %email.subject, "email sent");
        Ok(id)
    }
}

/// Used when `SMTP_HOST` is unset: every send fails without touching the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError> {
        warn!(subject = %email.subject, "email not sent: SMTP not configured");
        Err(MailError::NotConfigured)
    }
}

lazy_static! {
    static ref STYLE_RE: Regex = Regex::new(r"(?is)<style.*?</style>").unwrap();
    static ref SCRIPT_RE: Regex = Regex::new(r"(?is)<script.*?</script>").unwrap();
    static ref BR_RE: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref P_CLOSE_RE: Regex = Regex::new(r"(?i)</p>").unwrap();
    static ref BLOCK_CLOSE_RE: Regex =
        Regex::new(r"(?i)</(h[1-6]|li|div|section|article|tr)>").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref BLANK_RUN_RE: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Minimal HTML to plain-text conversion for the text/plain alternative.
pub fn html_to_text(html: &str) -> String {
    let s = STYLE_RE.replace_all(html, "");
    let s = SCRIPT_RE.replace_all(&s, "");
    let s = BR_RE.replace_all(&s, "\n");
    let s = P_CLOSE_RE.replace_all(&s, "\n\n");
    let s = BLOCK_CLOSE_RE.replace_all(&s, "\n");
    let s = TAG_RE.replace_all(&s, "");
    let s = BLANK_RUN_RE.replace_all(&s, "\n\n");
    s.trim().to_string()
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
