//! Access gate for protected routes.
//!
//! Three ordered, short-circuiting checks over an already-resolved principal:
//! authenticated, then email verified, then not soft-deleted. The order is part
//! of the contract: an unverified *and* deleted account reports
//! `EmailNotVerified`.
//!
//! - No IO
//! - No side effects on admit or deny

use thiserror::Error;

use crate::Principal;

/// Terminal reasons for refusing a request. None of them is retryable.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum GateDenial {
    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("Your email address is not verified.")]
    EmailNotVerified,

    #[error("Your account has been deactivated.")]
    AccountDeactivated,
}

impl GateDenial {
    /// HTTP-equivalent status code.
    pub fn status_code(self) -> u16 {
        match self {
            GateDenial::Unauthenticated => 401,
            GateDenial::EmailNotVerified | GateDenial::AccountDeactivated => 403,
        }
    }

    /// Machine-readable error code; `Unauthenticated` has none.
    pub fn error_code(self) -> Option<&'static str> {
        match self {
            GateDenial::Unauthenticated => None,
            GateDenial::EmailNotVerified => Some("email_not_verified"),
            GateDenial::AccountDeactivated => Some("account_deactivated"),
        }
    }
}

pub fn ensure_authenticated(principal: Option<&Principal>) -> Result<&Principal, GateDenial> {
    principal.ok_or(GateDenial::Unauthenticated)
}

pub fn ensure_email_verified(principal: &Principal) -> Result<(), GateDenial> {
    if principal.has_verified_email() {
        Ok(())
    } else {
        Err(GateDenial::EmailNotVerified)
    }
}

pub fn ensure_not_deactivated(principal: &Principal) -> Result<(), GateDenial> {
    if principal.is_deactivated() {
        Err(GateDenial::AccountDeactivated)
    } else {
        Ok(())
    }
}

/// Run every check in order; the admitted principal is returned unchanged.
pub fn check(principal: Option<&Principal>) -> Result<&Principal, GateDenial> {
    let principal = ensure_authenticated(principal)?;
    ensure_email_verified(principal)?;
    ensure_not_deactivated(principal)?;
    Ok(principal)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    use adminhub_core::{TokenId, UserId};

    use super::*;

    fn principal(verified: Option<DateTime<Utc>>, deleted: Option<DateTime<Utc>>) -> Principal {
        Principal {
            user_id: UserId::new(),
            username: "ada".to_string(),
            is_admin: false,
            email_verified_at: verified,
            deleted_at: deleted,
            token_id: TokenId::new(),
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn missing_principal_is_unauthenticated() {
        assert_eq!(check(None), Err(GateDenial::Unauthenticated));
        assert_eq!(GateDenial::Unauthenticated.status_code(), 401);
        assert_eq!(GateDenial::Unauthenticated.error_code(), None);
    }

    #[test]
    fn each_step_is_usable_on_its_own() {
        let unverified = principal(None, None);
        let deleted = principal(Some(ts(1)), Some(ts(2)));

        assert_eq!(ensure_email_verified(&unverified), Err(GateDenial::EmailNotVerified));
        assert_eq!(ensure_not_deactivated(&unverified), Ok(()));
        assert_eq!(ensure_email_verified(&deleted), Ok(()));
        assert_eq!(ensure_not_deactivated(&deleted), Err(GateDenial::AccountDeactivated));
    }

    #[test]
    fn unverified_wins_over_deactivated() {
        let p = principal(None, Some(ts(10)));
        assert_eq!(check(Some(&p)), Err(GateDenial::EmailNotVerified));
    }

    #[test]
    fn denial_messages_and_codes() {
        assert_eq!(GateDenial::EmailNotVerified.to_string(), "Your email address is not verified.");
        assert_eq!(GateDenial::EmailNotVerified.error_code(), Some("email_not_verified"));
        assert_eq!(GateDenial::AccountDeactivated.to_string(), "Your account has been deactivated.");
        assert_eq!(GateDenial::AccountDeactivated.error_code(), Some("account_deactivated"));
        assert_eq!(GateDenial::AccountDeactivated.status_code(), 403);
    }

    proptest! {
        #[test]
        fn decision_follows_precedence(
            verified in proptest::option::of(0i64..4_000_000_000),
            deleted in proptest::option::of(0i64..4_000_000_000),
        ) {
            let p = principal(verified.map(ts), deleted.map(ts));
            let expected = match (verified, deleted) {
                (None, _) => Err(GateDenial::EmailNotVerified),
                (Some(_), Some(_)) => Err(GateDenial::AccountDeactivated),
                (Some(_), None) => Ok(&p),
            };
            prop_assert_eq!(check(Some(&p)), expected);
        }
    }
}
