//! HMAC-SHA256 message authentication
//!
//! Every inbound message is signed with the listener's shared secret over the
//! concatenation of message id, timestamp and raw body. The signature header
//! has the form `sha256=<lowercase hex>`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

fn mac_for(secret: &[u8], message_id: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(message_id.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(body);
    mac
}

/// Compute the signature header value for a message.
pub fn compute_signature(secret: &str, message_id: &str, timestamp: &str, body: &[u8]) -> String {
    let digest = mac_for(secret.as_bytes(), message_id, timestamp, body).finalize();
    format!("{SIGNATURE_PREFIX}{}", hex::encode(digest.into_bytes()))
}

/// Check a signature header against the message, in constant time.
pub fn verify_signature(
    secret: &str,
    message_id: &str,
    timestamp: &str,
    body: &[u8],
    signature_header: &str,
) -> Result<(), SignatureError> {
    let hex_part = signature_header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(SignatureError::MalformedSignature)?;
    let expected = hex::decode(hex_part).map_err(|_| SignatureError::MalformedSignature)?;

    mac_for(secret.as_bytes(), message_id, timestamp, body)
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Reject timestamps further than `max_age` from `now` in either direction.
pub fn check_freshness(
    timestamp: &str,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let sent = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| SignatureError::InvalidTimestamp(e.to_string()))?
        .with_timezone(&Utc);

    let age = now.signed_duration_since(sent);
    let skew = if age < chrono::Duration::zero() { -age } else { age };
    match skew.to_std() {
        Ok(skew) if skew <= max_age => Ok(()),
        _ => Err(SignatureError::Stale(timestamp.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "s3cretvalue";
    const ID: &str = "befa7b53-d79d-478f-86b9-120f112b044e";
    const TS: &str = "2019-11-16T10:11:12.634234626Z";
    const BODY: &[u8] = br#"{"event":{"user_id":"1234"}}"#;

    #[test]
    fn test_signature_roundtrip() {
        let header = compute_signature(SECRET, ID, TS, BODY);
        assert!(header.starts_with("sha256="));
        assert_eq!(header.len(), "sha256=".len() + 64);
        assert!(verify_signature(SECRET, ID, TS, BODY, &header).is_ok());
    }

    #[test]
    fn test_known_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let header = compute_signature("key", "The quick brown ", "fox jumps over ", b"the lazy dog");
        assert_eq!(
            header,
            "sha256=f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_wrong_secret_is_mismatch() {
        let header = compute_signature("another-secret", ID, TS, BODY);
        assert_eq!(
            verify_signature(SECRET, ID, TS, BODY, &header),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(
            verify_signature(SECRET, ID, TS, BODY, "md5=abcd"),
            Err(SignatureError::MalformedSignature)
        );
        assert_eq!(
            verify_signature(SECRET, ID, TS, BODY, "sha256=not-hex"),
            Err(SignatureError::MalformedSignature)
        );
    }

    #[test]
    fn test_freshness_window() {
        let sent: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let window = Duration::from_secs(600);

        assert!(check_freshness("2024-05-01T12:00:00Z", window, sent).is_ok());
        assert!(check_freshness("2024-05-01T12:00:00Z", window, sent + chrono::Duration::minutes(9)).is_ok());
        assert!(matches!(
            check_freshness("2024-05-01T12:00:00Z", window, sent + chrono::Duration::minutes(11)),
            Err(SignatureError::Stale(_))
        ));
        assert!(matches!(
            check_freshness("2024-05-01T12:00:00Z", window, sent - chrono::Duration::minutes(11)),
            Err(SignatureError::Stale(_))
        ));
        assert!(matches!(
            check_freshness("yesterday", window, sent),
            Err(SignatureError::InvalidTimestamp(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_any_body_mutation_fails(
            body in proptest::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let header = compute_signature(SECRET, ID, TS, &body);
            let mut mutated = body.clone();
            let i = index.index(mutated.len());
            mutated[i] ^= flip;

            prop_assert_eq!(
                verify_signature(SECRET, ID, TS, &mutated, &header),
                Err(SignatureError::Mismatch)
            );
        }

        #[test]
        fn prop_message_id_is_authenticated(suffix in "[a-z0-9]{1,8}") {
            let header = compute_signature(SECRET, ID, TS, BODY);
            let other_id = format!("{ID}{suffix}");
            prop_assert!(verify_signature(SECRET, &other_id, TS, BODY, &header).is_err());
        }
    }
}
