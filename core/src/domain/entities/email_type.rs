//! Email slot enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which email slot on the user's profile a verification targets
///
/// Serialized as `CONTACT` / `WORK`, matching the API's enum names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailType {
    /// Address used for general platform notifications
    Contact,
    /// Government of Canada employer address, used to confirm employment
    Work,
}

impl EmailType {
    /// Wire name used by the API
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::Contact => "CONTACT",
            EmailType::Work => "WORK",
        }
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a wire string names no known email slot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown email type: {0}")]
pub struct UnknownEmailType(pub String);

impl FromStr for EmailType {
    type Err = UnknownEmailType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONTACT" => Ok(EmailType::Contact),
            "WORK" => Ok(EmailType::Work),
            _ => Err(UnknownEmailType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&EmailType::Contact).unwrap(), "\"CONTACT\"");
        assert_eq!(serde_json::to_string(&EmailType::Work).unwrap(), "\"WORK\"");
        let parsed: EmailType = serde_json::from_str("\"WORK\"").unwrap();
        assert_eq!(parsed, EmailType::Work);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("contact".parse::<EmailType>().unwrap(), EmailType::Contact);
        assert_eq!(" WORK ".parse::<EmailType>().unwrap(), EmailType::Work);
        assert_eq!(
            "PERSONAL".parse::<EmailType>(),
            Err(UnknownEmailType("PERSONAL".to_string()))
        );
    }

    #[test]
    fn test_contact_orders_before_work() {
        assert!(EmailType::Contact < EmailType::Work);
    }
}
