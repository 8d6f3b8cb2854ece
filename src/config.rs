use std::net::IpAddr;

use crate::password::MIN_PASSWORD_LEN;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    /// Reset token lifetime in seconds.
    pub token_ttl_secs: i64,
    pub min_password_len: usize,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let host: IpAddr = env_or("PASSGATE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid PASSGATE_HOST: {e}"))?;

        let port: u16 = env_or("PASSGATE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid PASSGATE_PORT: {e}"))?;

        let base_url = env_or("PASSGATE_BASE_URL", &format!("http://{host}:{port}"));

        let token_ttl_secs: i64 = env_or("PASSGATE_TOKEN_TTL_SECS", "3600")
            .parse()
            .map_err(|e| format!("Invalid PASSGATE_TOKEN_TTL_SECS: {e}"))?;
        if token_ttl_secs <= 0 {
            return Err("PASSGATE_TOKEN_TTL_SECS must be positive".to_string());
        }

        let min_password_len: usize =
            env_or("PASSGATE_MIN_PASSWORD_LEN", &MIN_PASSWORD_LEN.to_string())
                .parse()
                .map_err(|e| format!("Invalid PASSGATE_MIN_PASSWORD_LEN: {e}"))?;
        if min_password_len < MIN_PASSWORD_LEN {
            return Err(format!(
                "PASSGATE_MIN_PASSWORD_LEN must be at least {MIN_PASSWORD_LEN}"
            ));
        }

        let log_level = env_or("PASSGATE_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("PASSGATE_SMTP_HOST").ok(),
            std::env::var("PASSGATE_SMTP_PORT").ok(),
            std::env::var("PASSGATE_SMTP_USER").ok(),
            std::env::var("PASSGATE_SMTP_PASS").ok(),
            std::env::var("PASSGATE_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid PASSGATE_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            host,
            port,
            base_url,
            token_ttl_secs,
            min_password_len,
            log_level,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
