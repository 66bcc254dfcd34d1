//! One-shot notices carried across a redirect in a cookie. The payload is
//! base64url-encoded JSON so it survives cookie value rules; the page that
//! renders the notices clears the cookie in the same response.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::cookies;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: Level::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: Level::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into() }
    }
}

pub fn encode(flashes: &[Flash]) -> String {
    let json = serde_json::to_string(flashes).unwrap_or_else(|_| "[]".to_string());
    URL_SAFE_NO_PAD.encode(json)
}

/// Tolerant of garbage: a cookie we cannot decode is an empty list, not an error.
pub fn decode(value: &str) -> Vec<Flash> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|json| serde_json::from_slice(&json).ok())
        .unwrap_or_default()
}

/// A `Set-Cookie` value carrying the given notices to the next page.
pub fn cookie(flashes: &[Flash]) -> String {
    cookies::build(cookies::FLASH_COOKIE, &encode(flashes), None, true)
}
