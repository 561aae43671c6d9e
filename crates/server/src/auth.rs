//! Bearer/HMAC/JWT verification for the three authenticated webhook routes
//! (§6). This service only verifies tokens minted elsewhere; it never
//! issues them.

use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing or malformed Authorization header")]
    MissingCredentials,
    #[error("invalid bearer token")]
    InvalidBearerToken,
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("source IP is not on the allowlist")]
    IpNotAllowed,
    #[error("invalid or expired token: {0}")]
    InvalidJwt(String),
    #[error("token lacks the required permission: {0}")]
    MissingPermission(String),
    #[error("authentication is not configured")]
    NotConfigured,
}

/// Constant-time byte comparison; timing-safe even when lengths differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Verifies the `Authorization: Bearer <token>` header on `/call/event`
/// against the configured shared secret.
pub fn verify_bearer(header: Option<&str>, expected: &str) -> Result<(), AuthError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingCredentials)?;
    if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidBearerToken)
    }
}

/// Verifies the HMAC-SHA-256 signature on `/v1/apaleo/webhook`, computed
/// over the raw request body, and checks the caller's IP against the
/// configured allowlist. The IP check runs first (§6).
pub fn verify_apaleo_webhook(
    source_ip: &str,
    allowlist: &[String],
    raw_body: &[u8],
    signature_header: Option<&str>,
    secret: &str,
) -> Result<(), AuthError> {
    if !allowlist.is_empty() && !allowlist.iter().any(|ip| ip == source_ip) {
        return Err(AuthError::IpNotAllowed);
    }

    let provided = signature_header.ok_or(AuthError::MissingCredentials)?;
    let provided_bytes = hex_decode(provided).map_err(|_| AuthError::InvalidSignature)?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidSignature)?;
    mac.update(raw_body);
    let expected = mac.finalize().into_bytes();

    if constant_time_eq(&provided_bytes, &expected) {
        Ok(())
    } else {
        Err(AuthError::InvalidSignature)
    }
}

fn hex_decode(s: &str) -> Result<Vec<u8>, ()> {
    if s.len() % 2 != 0 {
        return Err(());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| ()))
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
struct CallStartClaims {
    sub: String,
    exp: usize,
    #[serde(default)]
    permissions: Vec<String>,
}

/// Verifies a `call:start` JWT issued by an upstream identity service.
/// Returns the authenticated subject on success.
pub fn verify_call_start_jwt(header: Option<&str>, secret: &str) -> Result<String, AuthError> {
    let token = header.and_then(|h| h.strip_prefix("Bearer ")).ok_or(AuthError::MissingCredentials)?;

    let data = decode::<CallStartClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| AuthError::InvalidJwt(e.to_string()))?;

    if !data.claims.permissions.iter().any(|p| p == "call:start") {
        return Err(AuthError::MissingPermission("call:start".to_string()));
    }

    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn constant_time_eq_rejects_mismatched_lengths() {
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn bearer_rejects_missing_header() {
        assert!(matches!(verify_bearer(None, "secret"), Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn bearer_accepts_matching_token() {
        assert!(verify_bearer(Some("Bearer secret"), "secret").is_ok());
    }

    #[test]
    fn bearer_rejects_wrong_token() {
        assert!(matches!(verify_bearer(Some("Bearer wrong"), "secret"), Err(AuthError::InvalidBearerToken)));
    }

    #[test]
    fn apaleo_webhook_rejects_ip_outside_allowlist() {
        let result = verify_apaleo_webhook("10.0.0.9", &["10.0.0.1".to_string()], b"{}", Some("deadbeef"), "secret");
        assert!(matches!(result, Err(AuthError::IpNotAllowed)));
    }

    #[test]
    fn apaleo_webhook_accepts_correct_signature() {
        let body = b"{\"topic\":\"system/healthcheck\"}";
        let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec").unwrap();
        mac.update(body);
        let signature = hex_encode(&mac.finalize().into_bytes());

        let result = verify_apaleo_webhook("10.0.0.1", &["10.0.0.1".to_string()], body, Some(&signature), "whsec");
        assert!(result.is_ok());
    }

    #[test]
    fn apaleo_webhook_rejects_tampered_body() {
        let body = b"{\"topic\":\"system/healthcheck\"}";
        let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec").unwrap();
        mac.update(body);
        let signature = hex_encode(&mac.finalize().into_bytes());

        let result = verify_apaleo_webhook("10.0.0.1", &[], b"{\"topic\":\"tampered\"}", Some(&signature), "whsec");
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn call_start_jwt_round_trips_with_permission() {
        let claims = CallStartClaims {
            sub: "hotel-123".to_string(),
            exp: 9_999_999_999,
            permissions: vec!["call:start".to_string()],
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(b"jwt-secret")).unwrap();

        let subject = verify_call_start_jwt(Some(&format!("Bearer {token}")), "jwt-secret").unwrap();
        assert_eq!(subject, "hotel-123");
    }

    #[test]
    fn call_start_jwt_rejects_missing_permission() {
        let claims = CallStartClaims { sub: "hotel-123".to_string(), exp: 9_999_999_999, permissions: vec![] };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(b"jwt-secret")).unwrap();

        let result = verify_call_start_jwt(Some(&format!("Bearer {token}")), "jwt-secret");
        assert!(matches!(result, Err(AuthError::MissingPermission(_))));
    }

    fn hex_encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
