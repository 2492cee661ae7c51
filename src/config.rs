use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and never
/// mutated afterwards. It is pulled into handlers and extractors via FromRef, as part of
/// the Unified State Pattern.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // SQLite connection string, e.g. `sqlite://portal.db` or `sqlite::memory:`.
    pub db_url: String,
    // Runtime environment marker. Controls feature activation (e.g., Dev Bypass).
    pub env: Env,
    // HMAC secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // Lifetime of an issued token, in seconds.
    pub token_ttl_secs: u64,
    // bcrypt work factor for password hashing.
    pub bcrypt_cost: u32,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context, used to switch between development utilities (Bypass,
/// pretty logs) and production behaviour (mandatory secrets, JSON logs).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
pub const DEFAULT_DB_URL: &str = "sqlite://portal.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for test scaffolding: in-memory database and the
    /// cheapest bcrypt cost so password hashing stays fast under test.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            bcrypt_cost: 4,
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables, following the **fail-fast**
    /// principle.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `DATABASE_URL` or `JWT_SECRET` is missing, so the
    /// service never starts with a guessable secret or an implicit database file.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL must be set in production."),
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string()),
                env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        Self {
            env,
            db_url,
            jwt_secret,
            token_ttl_secs: parse_or("TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS),
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}

/// Reads a numeric variable, keeping the default when it is absent or malformed.
fn parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{key}={raw:?} is not valid, using default {default}");
            default
        }),
        Err(_) => default,
    }
}
