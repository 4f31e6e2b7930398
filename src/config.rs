use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::session::{SessionConfig, DEFAULT_COOKIE_NAME};

/// Ten years.
const MAX_SESSION_LIFETIME_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub request_timeout_secs: u64,
    pub session_lifetime_hours: i64,
    pub session_sliding_expiry: bool,
    pub session_cookie_name: String,
    pub session_cookie_secure: bool,
    pub session_sweep_interval_secs: u64,
    pub store_timeout_secs: u64,
    pub static_dir: String,
    pub login_url: String,
}

/// Reads `name`, falling back to `default` when unset.
fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var_or(name, default)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e)))
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Config {
            server_host: var_or("SERVER_HOST", "127.0.0.1"),
            server_port: parse_var("SERVER_PORT", "8080")?,
            database_url: var_or("DATABASE_URL", "sqlite://memegrab.db"),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "20")?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", "1")?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "30")?,
            session_lifetime_hours: parse_var("SESSION_LIFETIME_HOURS", "720")?,
            session_sliding_expiry: parse_var("SESSION_SLIDING_EXPIRY", "false")?,
            session_cookie_name: var_or("SESSION_COOKIE_NAME", DEFAULT_COOKIE_NAME),
            session_cookie_secure: parse_var("SESSION_COOKIE_SECURE", "false")?,
            session_sweep_interval_secs: parse_var("SESSION_SWEEP_INTERVAL_SECS", "3600")?,
            store_timeout_secs: parse_var("STORE_TIMEOUT_SECS", "5")?,
            static_dir: var_or("STATIC_DIR", "static"),
            login_url: var_or("LOGIN_URL", "/login"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if !(1..=MAX_SESSION_LIFETIME_HOURS).contains(&self.session_lifetime_hours) {
            return Err(AppError::Config(format!(
                "SESSION_LIFETIME_HOURS must be between 1 and {}",
                MAX_SESSION_LIFETIME_HOURS
            )));
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            default_lifetime: chrono::Duration::hours(self.session_lifetime_hours),
            sliding_expiry: self.session_sliding_expiry,
            store_timeout: Duration::from_secs(self.store_timeout_secs),
            cookie_name: self.session_cookie_name.clone(),
            secure_cookie: self.session_cookie_secure,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            database_url: "sqlite://memegrab.db".to_string(),
            db_max_connections: 20,
            db_min_connections: 1,
            request_timeout_secs: 30,
            session_lifetime_hours: 720,
            session_sliding_expiry: false,
            session_cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            session_cookie_secure: false,
            session_sweep_interval_secs: 3600,
            store_timeout_secs: 5,
            static_dir: "static".to_string(),
            login_url: "/login".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_projection() {
        let config = Config {
            session_lifetime_hours: 2,
            session_sliding_expiry: true,
            store_timeout_secs: 3,
            ..Config::default()
        };

        let session = config.session_config();
        assert_eq!(session.default_lifetime, chrono::Duration::hours(2));
        assert!(session.sliding_expiry);
        assert_eq!(session.store_timeout, Duration::from_secs(3));
        assert_eq!(session.cookie_name, "memegrab");
    }

    #[test]
    fn test_session_lifetime_bounds() {
        let with_hours = |hours| Config {
            session_lifetime_hours: hours,
            ..Config::default()
        };

        assert!(with_hours(720).validate().is_ok());
        assert!(with_hours(MAX_SESSION_LIFETIME_HOURS).validate().is_ok());
        for hours in [0, -1, MAX_SESSION_LIFETIME_HOURS + 1, 10_000_000_000] {
            assert!(matches!(with_hours(hours).validate(), Err(AppError::Config(_))));
        }
    }

    #[test]
    fn test_server_address() {
        assert_eq!(Config::default().server_address(), "127.0.0.1:8080");
    }
}
