//! Input validation shared by the user and company records.

use adminhub_core::{DomainError, DomainResult};

/// Route segments that sit beside `/:key` and therefore cannot be keys.
pub const RESERVED_KEYS: &[&str] = &["statistics", "me", "restore", "force"];

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn name(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    if value.chars().count() > 255 {
        return Err(DomainError::validation(format!("{field} must be at most 255 characters")));
    }
    Ok(value.to_string())
}

pub fn email(value: &str) -> DomainResult<String> {
    let value = value.trim().to_lowercase();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || value.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(value)
}

/// Lowercase `[a-z0-9._-]`, 3 to 32 characters, not a reserved route segment.
pub fn route_key(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim().to_lowercase();
    let len = value.chars().count();
    if !(3..=32).contains(&len) {
        return Err(DomainError::validation(format!("{field} must be 3 to 32 characters")));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(DomainError::validation(format!(
            "{field} may only contain letters, digits, '.', '_' and '-'"
        )));
    }
    if RESERVED_KEYS.contains(&value.as_str()) {
        return Err(DomainError::validation(format!("{field} '{value}' is reserved")));
    }
    Ok(value)
}

pub fn password(value: &str) -> DomainResult<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Derive a URL slug from a display name ("Acme & Co." -> "acme-co").
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug: String = slug.chars().take(32).collect();
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Acme & Co. "), "acme-co");
        assert_eq!(slugify("Über GmbH"), "ber-gmbh");
    }

    #[test]
    fn route_key_rules() {
        assert_eq!(route_key("username", " Ada.L ").unwrap(), "ada.l");
        assert!(route_key("username", "ab").is_err());
        assert!(route_key("username", "has space").is_err());
        assert!(route_key("username", "statistics").is_err());
    }

    #[test]
    fn email_rules() {
        assert_eq!(email(" Ada@Example.COM ").unwrap(), "ada@example.com");
        for bad in ["", "ada", "@example.com", "ada@", "ada@example", "a b@example.com", "a@b@c.com"] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn password_length() {
        assert!(password("short").is_err());
        assert!(password("long enough").is_ok());
    }
}
