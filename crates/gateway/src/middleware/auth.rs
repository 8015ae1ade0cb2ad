//! Tenant authentication extractor.
//!
//! Session issuance belongs to the authentication collaborator; the
//! gateway only verifies its HMAC-signed bearer tokens and then treats
//! the embedded tenant identity as opaque and trusted. [`mint_token`] is
//! exported for that collaborator and for tests.
//!
//! Token format: `base64url(payload_json) "." hex(hmac_sha256(secret, payload_b64))`
//! where the payload is `{"sub": email, "exp": unix_seconds}`.

use axum::{extract::FromRequestParts, http::request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use storedeck_core::Email;

use crate::error::AppError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Extractor for the authenticated tenant identity.
///
/// Rejects with 401 when the bearer token is absent, malformed, badly
/// signed, or expired.
pub struct Tenant(pub Email);

impl FromRequestParts<AppState> for Tenant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthenticated)?;

        let email = verify_token(token, state.config().session_secret.expose_secret())
            .ok_or(AppError::Unauthenticated)?;

        Ok(Self(email))
    }
}

/// Verify a session token and return the tenant identity it carries.
///
/// Returns `None` for any defect: wrong shape, bad signature, expired,
/// or an unparseable identity.
#[must_use]
pub fn verify_token(token: &str, secret: &str) -> Option<Email> {
    let (payload_b64, sig_hex) = token.split_once('.')?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload_b64.as_bytes());
    let sig = hex::decode(sig_hex).ok()?;
    mac.verify_slice(&sig).ok()?;

    let payload = BASE64URL.decode(payload_b64).ok()?;
    let claims: Claims = serde_json::from_slice(&payload).ok()?;

    if claims.exp <= chrono::Utc::now().timestamp() {
        return None;
    }

    Email::parse(&claims.sub).ok()
}

/// Mint a session token for `tenant`, valid until `expires_at`.
///
/// Lives here so the authentication collaborator and the test harness
/// produce tokens the gateway accepts.
#[must_use]
pub fn mint_token(tenant: &Email, expires_at: chrono::DateTime<chrono::Utc>, secret: &SecretString) -> String {
    let claims = Claims {
        sub: tenant.as_str().to_owned(),
        exp: expires_at.timestamp(),
    };
    // Claims serialization cannot fail: two plain fields.
    #[allow(clippy::unwrap_used)]
    let payload_b64 = BASE64URL.encode(serde_json::to_vec(&claims).unwrap());

    // HMAC accepts keys of any length.
    #[allow(clippy::unwrap_used)]
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()).unwrap();
    mac.update(payload_b64.as_bytes());
    let sig_hex = hex::encode(mac.finalize().into_bytes());

    format!("{payload_b64}.{sig_hex}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn secret() -> SecretString {
        SecretString::from("k9#mQ2$vX7!pL4@wR8&nT1*zB5^cF3(d")
    }

    #[test]
    fn test_round_trip() {
        let tenant = Email::parse("operator@example.com").unwrap();
        let token = mint_token(&tenant, Utc::now() + Duration::hours(1), &secret());

        let verified = verify_token(&token, secret().expose_secret()).unwrap();
        assert_eq!(verified, tenant);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tenant = Email::parse("operator@example.com").unwrap();
        let token = mint_token(&tenant, Utc::now() - Duration::seconds(1), &secret());
        assert!(verify_token(&token, secret().expose_secret()).is_none());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tenant = Email::parse("operator@example.com").unwrap();
        let token = mint_token(&tenant, Utc::now() + Duration::hours(1), &secret());

        let (_, sig) = token.split_once('.').unwrap();
        let forged_payload = BASE64URL.encode(
            serde_json::to_vec(&Claims {
                sub: "other@example.com".to_string(),
                exp: (Utc::now() + Duration::hours(1)).timestamp(),
            })
            .unwrap(),
        );
        let forged = format!("{forged_payload}.{sig}");
        assert!(verify_token(&forged, secret().expose_secret()).is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let tenant = Email::parse("operator@example.com").unwrap();
        let token = mint_token(&tenant, Utc::now() + Duration::hours(1), &secret());
        assert!(verify_token(&token, "a completely different secret!!").is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(verify_token("", secret().expose_secret()).is_none());
        assert!(verify_token("no-dot-here", secret().expose_secret()).is_none());
        assert!(verify_token("abc.nothex", secret().expose_secret()).is_none());
    }
}
