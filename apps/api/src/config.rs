use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Shortest HMAC key accepted for signing session tokens.
const MIN_SECRET_BYTES: usize = 32;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
/// One year.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Clone)]
pub struct Config {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Decoded HMAC key bytes. Never logged.
    pub jwt_secret: Vec<u8>,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub port: u16,
    pub rust_log: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            jwt_secret: decode_secret(&require_env("JWT_SECRET")?)?,
            token_ttl_hours: parse_ttl(std::env::var("TOKEN_TTL_HOURS").ok())?,
            bcrypt_cost: parse_cost(std::env::var("BCRYPT_COST").ok())?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Decodes the base64 signing key and enforces the minimum key length.
fn decode_secret(encoded: &str) -> Result<Vec<u8>> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .context("JWT_SECRET must be standard base64")?;
    if bytes.len() < MIN_SECRET_BYTES {
        bail!(
            "JWT_SECRET must decode to at least {MIN_SECRET_BYTES} bytes (got {})",
            bytes.len()
        );
    }
    Ok(bytes)
}

fn parse_ttl(raw: Option<String>) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TOKEN_TTL_HOURS);
    };
    let hours = raw
        .parse::<i64>()
        .context("TOKEN_TTL_HOURS must be an integer")?;
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        bail!("TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS} (got {hours})");
    }
    Ok(hours)
}

fn parse_cost(raw: Option<String>) -> Result<u32> {
    let Some(raw) = raw else {
        return Ok(bcrypt::DEFAULT_COST);
    };
    let cost = raw
        .parse::<u32>()
        .context("BCRYPT_COST must be an integer")?;
    if !(4..=31).contains(&cost) {
        bail!("BCRYPT_COST must be between 4 and 31 (got {cost})");
    }
    Ok(cost)
}
