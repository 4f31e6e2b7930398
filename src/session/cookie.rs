//! Reading and writing the session cookie.

use axum::http::header::{InvalidHeaderValue, COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};

use crate::db::models::Session;
use crate::error::SessionError;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const EXPIRED_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// RFC 6265 cookie-octet.
fn is_cookie_octet(c: char) -> bool {
    matches!(c, '\x21' | '\x23'..='\x2B' | '\x2D'..='\x3A' | '\x3C'..='\x5B' | '\x5D'..='\x7E')
}

/// Pull the value of cookie `name` out of the request headers.
pub fn extract_token(headers: &HeaderMap, name: &str) -> Result<String, SessionError> {
    for header in headers.get_all(COOKIE) {
        let raw = header
            .to_str()
            .map_err(|_| SessionError::InvalidCookie("non-ascii cookie header".to_string()))?;

        for pair in raw.split(';') {
            let Some((key, value)) = pair.trim().split_once('=') else {
                continue;
            };
            if key != name {
                continue;
            }

            let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
            if value.is_empty() {
                return Err(SessionError::InvalidCookie("empty value".to_string()));
            }
            if !value.chars().all(is_cookie_octet) {
                return Err(SessionError::InvalidCookie("malformed value".to_string()));
            }
            return Ok(value.to_string());
        }
    }

    Err(SessionError::InvalidCookie(format!("missing {}", name)))
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE).to_string()
}

/// `Set-Cookie` value handing `session` to the client.
pub fn session_cookie(
    name: &str,
    session: &Session,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    let mut value = format!(
        "{}={}; Expires={}; Max-Age={}; HttpOnly; Path=/; SameSite=Lax",
        name,
        session.token,
        http_date(session.expires_at),
        max_age,
    );
    if secure {
        value.push_str("; Secure");
    }
    HeaderValue::from_str(&value)
}

/// `Set-Cookie` value removing the session cookie client-side.
pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut value = format!(
        "{}=; Expires={}; Max-Age=0; HttpOnly; Path=/; SameSite=Lax",
        name, EXPIRED_DATE
    );
    if secure {
        value.push_str("; Secure");
    }
    HeaderValue::from_str(&value)
}
