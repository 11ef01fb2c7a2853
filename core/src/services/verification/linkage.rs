//! Contact/work slot linkage

use std::collections::BTreeSet;
use std::sync::Arc;

use ev_shared::WorkEmailPattern;

use crate::domain::entities::email_type::EmailType;
use crate::domain::value_objects::messages::SubmitMessage;

/// Slots a code request should cover, plus the message to show for them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageResolution {
    pub email_types: BTreeSet<EmailType>,
    pub message: Option<SubmitMessage>,
}

impl LinkageResolution {
    /// Whether the request covers both slots
    pub fn is_linked(&self) -> bool {
        self.email_types.len() > 1
    }
}

/// Decides which email slots a code request covers
///
/// A contact address on a work domain fills the work slot as well, so one
/// code verifies both. Work sessions always cover the work slot only.
#[derive(Debug, Clone, Default)]
pub struct EmailTypeLinkageResolver {
    pattern: Arc<WorkEmailPattern>,
}

impl EmailTypeLinkageResolver {
    pub fn new(pattern: Arc<WorkEmailPattern>) -> Self {
        Self { pattern }
    }

    pub fn resolve(&self, email_type: EmailType, address: &str) -> LinkageResolution {
        match email_type {
            EmailType::Contact if self.pattern.is_match(address) => LinkageResolution {
                email_types: BTreeSet::from([EmailType::Contact, EmailType::Work]),
                message: Some(SubmitMessage::ContactMatchesWork),
            },
            EmailType::Contact => LinkageResolution {
                email_types: BTreeSet::from([EmailType::Contact]),
                message: None,
            },
            EmailType::Work => LinkageResolution {
                email_types: BTreeSet::from([EmailType::Work]),
                message: None,
            },
        }
    }
}
