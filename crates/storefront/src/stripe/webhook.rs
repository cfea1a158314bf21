//! Webhook signature verification.
//!
//! Stripe signs each delivery with a `Stripe-Signature` header of the form
//! `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. The signed payload is
//! `"{t}.{raw body}"` keyed with the endpoint's signing secret.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

/// Maximum age (either direction) of a signed timestamp, in seconds.
pub const TOLERANCE_SECS: i64 = 300;

/// Reasons a webhook delivery is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing or malformed Stripe-Signature header")]
    MalformedHeader,

    #[error("signature timestamp outside tolerance")]
    TimestampOutOfRange,

    #[error("no matching v1 signature")]
    Mismatch,

    #[error("invalid signing key")]
    InvalidKey,
}

/// Verify a delivery against the current time.
///
/// # Errors
///
/// Returns `SignatureError` if the header is malformed, too old, or no `v1`
/// signature matches.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &SecretString,
) -> Result<(), SignatureError> {
    verify_signature_at(payload, header, secret, chrono::Utc::now().timestamp())
}

/// Verify a delivery against an explicit clock.
///
/// # Errors
///
/// See [`verify_signature`].
pub fn verify_signature_at(
    payload: &[u8],
    header: &str,
    secret: &SecretString,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    if now.abs_diff(ts) > TOLERANCE_SECS.unsigned_abs() {
        return Err(SignatureError::TimestampOutOfRange);
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    if signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_760_000_000;

    fn secret() -> SecretString {
        SecretString::from(SECRET.to_string())
    }

    fn sign(ts: i64, payload: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).expect("valid key length");
        mac.update(format!("{ts}.").as_bytes());
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_valid_signature() {
        let body = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;
        let header = format!("t={NOW},v1={}", sign(NOW, body));
        assert_eq!(verify_signature_at(body, &header, &secret(), NOW), Ok(()));
    }

    #[test]
    fn test_any_v1_may_match() {
        let body = b"{}";
        let header = format!("t={NOW},v1=deadbeef,v0=ignored,v1={}", sign(NOW, body));
        assert_eq!(verify_signature_at(body, &header, &secret(), NOW), Ok(()));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let header = format!("t={NOW},v1={}", sign(NOW, b"{\"amount\":1}"));
        assert_eq!(
            verify_signature_at(b"{\"amount\":2}", &header, &secret(), NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"{}";
        let header = format!("t={NOW},v1={}", sign(NOW, body));
        let other = SecretString::from("whsec_other".to_string());
        assert_eq!(
            verify_signature_at(body, &header, &other, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_timestamp_tolerance() {
        let body = b"{}";
        let old = NOW - TOLERANCE_SECS - 1;
        let header = format!("t={old},v1={}", sign(old, body));
        assert_eq!(
            verify_signature_at(body, &header, &secret(), NOW),
            Err(SignatureError::TimestampOutOfRange)
        );

        let edge = NOW - TOLERANCE_SECS;
        let header = format!("t={edge},v1={}", sign(edge, body));
        assert_eq!(verify_signature_at(body, &header, &secret(), NOW), Ok(()));
    }

    #[test]
    fn test_extreme_timestamps_are_out_of_range() {
        for ts in [i64::MIN, i64::MAX, -1] {
            let header = format!("t={ts},v1=00");
            assert_eq!(
                verify_signature_at(b"{}", &header, &secret(), NOW),
                Err(SignatureError::TimestampOutOfRange),
                "timestamp {ts}"
            );
        }
    }

    #[test]
    fn test_malformed_headers() {
        for header in ["", "garbage", "v1=abc", "t=notanumber,v1=abc", "t=123"] {
            assert_eq!(
                verify_signature_at(b"{}", header, &secret(), NOW),
                Err(SignatureError::MalformedHeader),
                "header {header:?}"
            );
        }
    }
}
