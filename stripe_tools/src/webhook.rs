//! Verification of the `Stripe-Signature` header sent with every webhook call.
//!
//! The header has the form `t=<unix timestamp>,v1=<hex signature>[,v1=<hex signature>...]`. Each `v1` value is the
//! HMAC-SHA256 of `"{t}.{raw body}"` keyed with the endpoint's signing secret. Several `v1` entries appear while a
//! secret is being rolled, and the event is authentic if any of them match.
use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use crate::{SignatureError, StripeEvent};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(SignatureError::MalformedHeader(format!("'{part}' is not a key=value pair")));
        };
        match key {
            "t" => {
                let t = value
                    .parse::<i64>()
                    .map_err(|e| SignatureError::MalformedHeader(format!("Invalid timestamp '{value}'. {e}")))?;
                timestamp = Some(t);
            },
            // Signatures that are not valid hex can never match, so they are skipped rather than rejected.
            "v1" => match hex::decode(value) {
                Ok(sig) => signatures.push(sig),
                Err(e) => debug!("💳️ Ignoring undecodable v1 signature. {e}"),
            },
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or_else(|| SignatureError::MalformedHeader("No timestamp".into()))?;
    if signatures.is_empty() && !header.contains("v1=") {
        return Err(SignatureError::MalformedHeader("No v1 signature".into()));
    }
    Ok(SignatureHeader { timestamp, signatures })
}

fn mac_for(payload: &[u8], secret: &str, timestamp: i64) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Calculates the hex-encoded `v1` signature for a payload. This is what Stripe does on its side, and what tests use
/// to produce valid webhook calls.
pub fn compute_signature(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    Ok(hex::encode(mac_for(payload, secret, timestamp)?.finalize().into_bytes()))
}

/// Produces a complete `Stripe-Signature` header value for the payload, signed at `timestamp`.
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    Ok(format!("t={timestamp},v1={}", compute_signature(payload, secret, timestamp)?))
}

/// Checks the signature header against the raw request body.
///
/// `now` is the current unix time. Events signed more than `tolerance` before (or after) `now` are rejected so that
/// captured requests cannot be replayed.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: i64,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }
    let header = parse_header(header)?;
    let age = now - header.timestamp;
    if age.unsigned_abs() > tolerance.as_secs() {
        return Err(SignatureError::TimestampOutsideTolerance { age });
    }
    let mac = mac_for(payload, secret, header.timestamp)?;
    let matched = header.signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok());
    if matched {
        Ok(())
    } else {
        Err(SignatureError::NoMatchingSignature)
    }
}

/// Verifies the signature and then deserializes the body into a [`StripeEvent`].
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
) -> Result<StripeEvent, SignatureError> {
    verify_signature(payload, header, secret, tolerance, Utc::now().timestamp())?;
    serde_json::from_slice::<StripeEvent>(payload).map_err(|e| SignatureError::InvalidPayload(e.to_string()))
}
