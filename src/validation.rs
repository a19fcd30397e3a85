//! Request validation
//!
//! Everything here runs before any collaborator is touched.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ClientError;

const MAX_OTP_LEN: usize = 16;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9\-]+(\.[a-z0-9\-]+)+$")
            .unwrap_or_else(|e| panic!("email pattern does not compile: {}", e))
    })
}

/// Accepts addresses on one institutional domain and its subdomains.
#[derive(Debug, Clone)]
pub struct EmailPolicy {
    suffix: String,
}

impl EmailPolicy {
    pub fn new(suffix: &str) -> Self {
        let suffix = suffix
            .trim()
            .trim_start_matches('@')
            .trim_start_matches('.')
            .to_lowercase();
        Self { suffix }
    }

    /// Returns the normalized (trimmed, lowercased) email when accepted.
    pub fn check(&self, email: &str) -> Result<String, ClientError> {
        let email = normalize_email(email);
        if !email_regex().is_match(&email) {
            return Err(ClientError::Validation("malformed email address".to_string()));
        }

        let domain = email.rsplit('@').next().unwrap_or_default();
        let accepted = domain == self.suffix || domain.ends_with(&format!(".{}", self.suffix));
        if !accepted {
            return Err(ClientError::InvalidDomain);
        }

        Ok(email)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn check_otp_format(otp: &str) -> Result<String, ClientError> {
    let otp = otp.trim();
    if otp.is_empty() || otp.len() > MAX_OTP_LEN || !otp.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ClientError::Validation("malformed OTP".to_string()));
    }
    Ok(otp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_domain_and_subdomain() {
        let policy = EmailPolicy::new("org.example");
        assert_eq!(
            policy.check("  Alice@Org.Example ").unwrap(),
            "alice@org.example"
        );
        assert_eq!(
            policy.check("bob@cs.org.example").unwrap(),
            "bob@cs.org.example"
        );
    }

    #[test]
    fn test_rejects_other_domains() {
        let policy = EmailPolicy::new("@org.example");
        assert_eq!(
            policy.check("mallory@evil.example"),
            Err(ClientError::InvalidDomain)
        );
        // Suffix match must fall on a label boundary.
        assert_eq!(
            policy.check("mallory@notorg.example"),
            Err(ClientError::InvalidDomain)
        );
        assert_eq!(
            policy.check("mallory@org.example.evil"),
            Err(ClientError::InvalidDomain)
        );
    }

    #[test]
    fn test_rejects_malformed_email() {
        let policy = EmailPolicy::new("org.example");
        for bad in ["", "alice", "alice@", "@org.example", "a b@org.example"] {
            assert!(
                matches!(policy.check(bad), Err(ClientError::Validation(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_otp_format() {
        assert_eq!(check_otp_format(" 4821 ").unwrap(), "4821");
        assert!(check_otp_format("").is_err());
        assert!(check_otp_format("12 34").is_err());
        assert!(check_otp_format(&"1".repeat(17)).is_err());
    }
}
