//! `adminhub-auth` — authentication and the request access gate.
//!
//! Decoupled from HTTP and storage: the API layer resolves credentials through
//! the [`TokenStore`] trait and maps [`GateDenial`]s to responses.

pub mod gate;
pub mod password;
pub mod principal;
pub mod token;
pub mod verification;

pub use gate::{GateDenial, check, ensure_authenticated, ensure_email_verified, ensure_not_deactivated};
pub use password::{PasswordError, hash_password, verify_password};
pub use principal::Principal;
pub use token::{
    NewAccessToken, PersonalAccessToken, TokenStore, TokenStoreError, TokenValidationError,
    hash_token_secret, split_plain_token,
};
pub use verification::{VerificationError, verification_signature, verify_signature};
