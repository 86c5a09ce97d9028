use anyhow::{anyhow, Context};
use log::warn;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

const DEV_JWT_SECRET: &str = "dev-secret-key-change-in-production-minimum-32-chars";
/// Upper bound for token and reset-code lifetimes: one year.
const MAX_TTL_MINUTES: i64 = 525_600;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub classifier: ClassifierConfig,
    pub auth: AuthSettings,
    /// Admin account created on startup when missing. It has no password and
    /// must go through the reset-code flow before first login.
    pub bootstrap_admin_email: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    pub api_url: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub password_code_ttl: chrono::Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, anyhow::Error> {
        let get_str = |key: &str, default: &str| -> String {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let database_url = vars
            .get("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let jwt_secret = match vars.get("JWT_SECRET").filter(|v| !v.is_empty()) {
            Some(secret) => secret.clone(),
            None => {
                warn!("JWT_SECRET not set, using the development secret (not for production)");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(AppConfig {
            server: ServerConfig {
                host: get_str("SERVER_HOST", "0.0.0.0"),
                port: parse_var(vars, "SERVER_PORT", 8080)?,
            },
            database_url,
            classifier: ClassifierConfig {
                api_url: get_str("CLASSIFIER_API_URL", "http://localhost:8090"),
                timeout: Duration::from_secs(parse_var(vars, "CLASSIFIER_TIMEOUT_SECS", 5)?),
            },
            auth: AuthSettings {
                jwt_secret,
                token_ttl: parse_ttl(vars, "JWT_TTL_MINUTES", 720)?,
                password_code_ttl: parse_ttl(vars, "PASSWORD_CODE_TTL_MINUTES", 60)?,
            },
            bootstrap_admin_email: vars
                .get("BOOTSTRAP_ADMIN_EMAIL")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

fn parse_var<T>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match vars.get(key).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

/// Lifetime in minutes, between one minute and [`MAX_TTL_MINUTES`].
fn parse_ttl(
    vars: &HashMap<String, String>,
    key: &str,
    default: i64,
) -> Result<chrono::Duration, anyhow::Error> {
    let minutes: i64 = parse_var(vars, key, default)?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        return Err(anyhow!(
            "{key} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}"
        ));
    }
    chrono::Duration::try_minutes(minutes).ok_or_else(|| anyhow!("{key} is out of range"))
}
