use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    /// HS256 secret shared with the identity provider that issues bearer tokens.
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    /// Balance granted at signup and restored on the first access of each calendar month.
    pub monthly_credits: i32,
    /// Lower-cased emails allowed to use the admin endpoints.
    pub admin_emails: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            jwt_secret: require_env("JWT_SECRET")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            monthly_credits: std::env::var("MONTHLY_CREDITS")
                .unwrap_or_else(|_| "3".to_string())
                .parse::<i32>()
                .context("MONTHLY_CREDITS must be an integer")?,
            admin_emails: parse_admin_emails(
                &std::env::var("ADMIN_EMAILS").unwrap_or_default(),
            ),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (5 * 1024 * 1024).to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
        })
    }

    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|a| *a == email)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/tailor_test".to_string(),
        anthropic_api_key: "test-key".to_string(),
        jwt_secret: "test-secret".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        monthly_credits: 3,
        admin_emails: vec!["admin@tailor.dev".to_string()],
        max_upload_bytes: 1024 * 1024,
    }
}
