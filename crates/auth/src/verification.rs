//! Signed email-verification links.
//!
//! The signature is an HMAC-SHA256 keyed by the application key over the user
//! id and the address being verified, so changing the email invalidates older
//! links.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use adminhub_core::UserId;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("verification key rejected")]
    InvalidKey,
}

fn link_mac(app_key: &str, user_id: UserId, email: &str) -> Result<HmacSha256, VerificationError> {
    let mut mac =
        HmacSha256::new_from_slice(app_key.as_bytes()).map_err(|_| VerificationError::InvalidKey)?;
    mac.update(user_id.to_string().as_bytes());
    mac.update(b"|");
    mac.update(email.trim().to_lowercase().as_bytes());
    Ok(mac)
}

/// Hex-encoded signature for the verification link of `user_id`/`email`.
pub fn verification_signature(
    app_key: &str,
    user_id: UserId,
    email: &str,
) -> Result<String, VerificationError> {
    let mac = link_mac(app_key, user_id, email)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a presented signature. Malformed input never verifies.
pub fn verify_signature(app_key: &str, user_id: UserId, email: &str, signature: &str) -> bool {
    let Ok(presented) = hex::decode(signature) else {
        return false;
    };
    match link_mac(app_key, user_id, email) {
        Ok(mac) => mac.verify_slice(&presented).is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "cannot check verification signature");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_bound_to_key_user_and_email() {
        let user = UserId::new();
        let sig = verification_signature("key", user, "ada@example.com").unwrap();

        assert_eq!(sig.len(), 64);
        assert!(verify_signature("key", user, "ADA@example.com ", &sig));
        assert!(!verify_signature("other-key", user, "ada@example.com", &sig));
        assert!(!verify_signature("key", UserId::new(), "ada@example.com", &sig));
        assert!(!verify_signature("key", user, "eve@example.com", &sig));
    }

    #[test]
    fn truncated_or_non_hex_signatures_are_rejected() {
        let user = UserId::new();
        let sig = verification_signature("key", user, "ada@example.com").unwrap();

        assert!(!verify_signature("key", user, "ada@example.com", &sig[..32]));
        assert!(!verify_signature("key", user, "ada@example.com", "forged"));
        assert!(!verify_signature("key", user, "ada@example.com", ""));
    }

    #[test]
    fn matches_a_reference_hmac() {
        let user = UserId::new();
        let mut mac = HmacSha256::new_from_slice(b"key").unwrap();
        mac.update(format!("{user}|ada@example.com").as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(verification_signature("key", user, "ada@example.com").unwrap(), expected);
    }
}
