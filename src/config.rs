use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

/// SMTP settings. Absent when `SMTP_HOST` is not set.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub mail: Option<MailConfig>,
    pub claims_inbox: String,
    pub app_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "claimtree".into()),
            audience: std::env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "claimtree-web".into()),
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "sid".into()),
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(production),
        };
        let mail = MailConfig::from_env();
        Ok(Self {
            database_url,
            session,
            mail,
            claims_inbox: std::env::var("CLAIMS_INBOX")
                .unwrap_or_else(|_| "claims@claimtree.local".into()),
            app_url: std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
        })
    }
}

impl MailConfig {
    fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            from_address: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@claimtree.local".into()),
        })
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
