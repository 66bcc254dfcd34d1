use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use domains::{AppError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const B64: base64::engine::general_purpose::GeneralPurpose =
    base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// A freshly signed session token and its expiry.
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies the stateless session cookie value.
///
/// The token is `b64(user_id.expiry)` + `.` + `b64(hmac-sha256 tag)`; the
/// server keeps no session table. Verification is constant-time on the tag
/// and rejects expired or reshaped tokens.
pub struct SessionSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl SessionSigner {
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
            ttl: Duration::hours(ttl_hours as i64),
        }
    }

    /// Cookie Max-Age in seconds.
    pub fn max_age(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, user_id: Uuid) -> Result<IssuedSession> {
        let expires_at = Utc::now() + self.ttl;
        let payload = format!("{}.{}", user_id, expires_at.timestamp());

        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(AppError::internal)?;
        mac.update(payload.as_bytes());
        let tag = mac.finalize().into_bytes();

        Ok(IssuedSession {
            token: format!("{}.{}", B64.encode(&payload), B64.encode(tag)),
            expires_at,
        })
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        let (payload_b64, tag_b64) = token.split_once('.')?;
        let payload = B64.decode(payload_b64).ok()?;
        let tag = B64.decode(tag_b64).ok()?;

        let mut mac = HmacSha256::new_from_slice(&self.key).ok()?;
        mac.update(&payload);
        mac.verify_slice(&tag).ok()?;

        let payload = String::from_utf8(payload).ok()?;
        let (user_id, exp) = payload.split_once('.')?;
        let exp: i64 = exp.parse().ok()?;
        if Utc::now().timestamp() >= exp {
            return None;
        }

        Uuid::parse_str(user_id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> SessionSigner {
        SessionSigner::new("test-secret", 1)
    }

    #[test]
    fn issued_token_round_trips() {
        let signer = signer();
        let user_id = Uuid::now_v7();
        let session = signer.issue(user_id).unwrap();
        assert_eq!(signer.verify(&session.token), Some(user_id));
        assert!(session.expires_at > Utc::now());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let signer = signer();
        let own = signer.issue(Uuid::now_v7()).unwrap();
        let other = signer.issue(Uuid::now_v7()).unwrap();

        let tag = own.token.split_once('.').unwrap().1;
        let forged_payload = other.token.split_once('.').unwrap().0;
        let forged = format!("{forged_payload}.{tag}");
        assert_eq!(signer.verify(&forged), None);
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let session = SessionSigner::new("key-a", 1)
            .issue(Uuid::now_v7())
            .unwrap();
        assert_eq!(SessionSigner::new("key-b", 1).verify(&session.token), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = SessionSigner::new("test-secret", 0);
        let session = signer.issue(Uuid::now_v7()).unwrap();
        assert_eq!(signer.verify(&session.token), None);
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let signer = signer();
        assert_eq!(signer.verify(""), None);
        assert_eq!(signer.verify("no-dot"), None);
        assert_eq!(signer.verify("bad!base64.bad!base64"), None);
    }
}
