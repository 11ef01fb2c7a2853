//! Email address utilities

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// Basic syntactic shape: something@something.tld, no whitespace
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap()
});

/// Government of Canada domain suffixes recognised as work email domains
pub const DEFAULT_WORK_EMAIL_DOMAINS: &[&str] = &[
    "gc.ca",
    "canada.ca",
    "elections.ca",
    "ccc.ca",
    "scics.ca",
    "canadacouncil.ca",
];

static DEFAULT_WORK_EMAIL_PATTERN: Lazy<WorkEmailPattern> = Lazy::new(|| {
    WorkEmailPattern::new(DEFAULT_WORK_EMAIL_DOMAINS).unwrap()
});

/// Normalize an optional address so that absence and blank input compare equal
///
/// Surrounding whitespace is trimmed; an empty result becomes `None`.
pub fn normalize_address(address: Option<&str>) -> Option<String> {
    address
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Compare two optional addresses under [`normalize_address`]
pub fn addresses_match(left: Option<&str>, right: Option<&str>) -> bool {
    normalize_address(left) == normalize_address(right)
}

/// Check if an email address is syntactically valid
pub fn is_valid_email(address: &str) -> bool {
    EMAIL_REGEX.is_match(address.trim())
}

/// Extract the domain part of an address (everything after the last `@`)
pub fn email_domain(address: &str) -> Option<&str> {
    address
        .trim()
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}

/// Mask an email address for logging (e.g., us***@example.com)
pub fn mask_email(address: &str) -> String {
    match address.trim().rsplit_once('@') {
        Some((local, domain)) if local.chars().count() > 2 => {
            let prefix: String = local.chars().take(2).collect();
            format!("{}***@{}", prefix, domain)
        }
        Some((_, domain)) => format!("***@{}", domain),
        None => "***".to_string(),
    }
}

/// Errors raised while building a [`WorkEmailPattern`]
#[derive(Debug, Error)]
pub enum WorkEmailPatternError {
    #[error("Work email domain list is empty")]
    EmptyDomainList,

    #[error("Invalid work email domain: {domain}")]
    InvalidDomain { domain: String },

    #[error("Failed to compile work email pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Allow-list matcher for work (employer-domain) email addresses
///
/// An address matches when its domain equals one of the configured suffixes
/// or is a subdomain of one. Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct WorkEmailPattern {
    regex: Regex,
    domains: Vec<String>,
}

impl WorkEmailPattern {
    /// Build a pattern from a list of domain suffixes
    ///
    /// Leading `@` or `.` characters are ignored, so `@gc.ca`, `.gc.ca` and
    /// `gc.ca` are equivalent.
    pub fn new<S: AsRef<str>>(domains: &[S]) -> Result<Self, WorkEmailPatternError> {
        if domains.is_empty() {
            return Err(WorkEmailPatternError::EmptyDomainList);
        }

        let mut normalized = Vec::with_capacity(domains.len());
        for domain in domains {
            let raw = domain.as_ref();
            let cleaned = raw
                .trim()
                .trim_start_matches(['@', '.'])
                .to_ascii_lowercase();
            let well_formed = !cleaned.is_empty()
                && cleaned.contains('.')
                && cleaned
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
            if !well_formed {
                return Err(WorkEmailPatternError::InvalidDomain {
                    domain: raw.to_string(),
                });
            }
            normalized.push(cleaned);
        }

        let alternatives = normalized
            .iter()
            .map(|domain| regex::escape(domain))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!(
            r"(?i)^[^\s@]+@(?:[a-z0-9-]+\.)*(?:{})$",
            alternatives
        ))?;

        Ok(Self {
            regex,
            domains: normalized,
        })
    }

    /// Check whether an address belongs to a work email domain
    pub fn is_match(&self, address: &str) -> bool {
        self.regex.is_match(address.trim())
    }

    /// The normalized domain suffixes this pattern accepts
    pub fn domains(&self) -> &[String] {
        &self.domains
    }
}

impl Default for WorkEmailPattern {
    fn default() -> Self {
        DEFAULT_WORK_EMAIL_PATTERN.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address(None), None);
        assert_eq!(normalize_address(Some("")), None);
        assert_eq!(normalize_address(Some("   ")), None);
        assert_eq!(
            normalize_address(Some("  user@example.com ")),
            Some("user@example.com".to_string())
        );
    }

    #[test]
    fn test_addresses_match_treats_empty_as_absent() {
        assert!(addresses_match(None, Some("")));
        assert!(addresses_match(Some(" "), None));
        assert!(addresses_match(Some("a@b.ca"), Some("a@b.ca ")));
        assert!(!addresses_match(Some("a@b.ca"), None));
        assert!(!addresses_match(Some("a@b.ca"), Some("c@b.ca")));
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@dept.gc.ca"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user example@example.com"));
        assert!(!is_valid_email("no-at-sign.example.com"));
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(email_domain("user@canada.ca"), Some("canada.ca"));
        assert_eq!(email_domain("user@"), None);
        assert_eq!(email_domain("user"), None);
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("user@example.com"), "us***@example.com");
        assert_eq!(mask_email("ab@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[test]
    fn test_default_work_pattern_table() {
        let pattern = WorkEmailPattern::default();
        let cases = [
            ("user@canada.ca", true),
            ("user@gc.ca", true),
            ("first.last@tbs-sct.gc.ca", true),
            ("USER@HRSDC-RHDCC.GC.CA", true),
            ("user@elections.ca", true),
            ("user@example.com", false),
            ("user@notgc.ca", false),
            ("user@gc.ca.example.com", false),
            ("user@canada.ca.evil.org", false),
            ("gc.ca", false),
        ];
        for (address, expected) in cases {
            assert_eq!(pattern.is_match(address), expected, "address: {}", address);
        }
    }

    #[test]
    fn test_custom_work_pattern() {
        let pattern = WorkEmailPattern::new(&["@agency.example", ".other.example"]).unwrap();
        assert_eq!(pattern.domains(), &["agency.example", "other.example"]);
        assert!(pattern.is_match("someone@agency.example"));
        assert!(pattern.is_match("someone@team.other.example"));
        assert!(!pattern.is_match("someone@canada.ca"));
    }

    #[test]
    fn test_work_pattern_rejects_bad_domains() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            WorkEmailPattern::new(&empty),
            Err(WorkEmailPatternError::EmptyDomainList)
        ));
        assert!(matches!(
            WorkEmailPattern::new(&["gc ca"]),
            Err(WorkEmailPatternError::InvalidDomain { .. })
        ));
        assert!(matches!(
            WorkEmailPattern::new(&["localhost"]),
            Err(WorkEmailPatternError::InvalidDomain { .. })
        ));
    }
}
