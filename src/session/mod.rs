pub mod cookie;
pub mod manager;
pub mod store;

pub use manager::SessionManager;
pub use store::SessionStore;

use std::time::Duration;

pub const DEFAULT_COOKIE_NAME: &str = "memegrab";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime applied when a login does not ask for a specific expiry.
    pub default_lifetime: chrono::Duration,
    /// Push expiry forward on every successful validation.
    pub sliding_expiry: bool,
    /// Upper bound on any single store call.
    pub store_timeout: Duration,
    pub cookie_name: String,
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_lifetime: chrono::Duration::hours(720),
            sliding_expiry: false,
            store_timeout: Duration::from_secs(5),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secure_cookie: false,
        }
    }
}
