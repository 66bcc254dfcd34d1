//! Cookie plumbing shared by the handlers. Values we issue are all
//! cookie-safe (base64url or plain flags), so nothing here percent-encodes.

use axum::http::HeaderMap;

pub const SESSION_COOKIE: &str = "quill_session";
pub const FLASH_COOKIE: &str = "quill_flash";
pub const SHOW_FOLLOWED_COOKIE: &str = "show_followed";

pub const THIRTY_DAYS: i64 = 30 * 24 * 60 * 60;

/// Pulls a single cookie value out of the `Cookie` request header.
pub fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(name) {
            return Some(parts.next().unwrap_or("").to_string());
        }
    }
    None
}

/// Builds a `Set-Cookie` header value scoped to the whole site.
pub fn build(name: &str, value: &str, max_age: Option<i64>, http_only: bool) -> String {
    let mut parts = vec![format!("{name}={value}"), "Path=/".to_string()];
    if http_only {
        parts.push("HttpOnly".to_string());
    }
    parts.push("SameSite=Lax".to_string());
    if let Some(age) = max_age {
        parts.push(format!("Max-Age={age}"));
    }
    parts.join("; ")
}

/// A `Set-Cookie` value that removes the cookie on the client.
pub fn clear(name: &str) -> String {
    build(name, "", Some(0), true)
}
