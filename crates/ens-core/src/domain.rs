//! Normalized domain names

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::EnsError;
use crate::namehash::{labelhash, namehash};
use crate::types::{LabelHash, Node};

/// A dot-separated domain name in canonical form.
///
/// Canonical form is trimmed, ASCII-lowercased, and has no trailing dot.
/// Every label is non-empty and free of whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    pub fn parse(name: &str) -> Result<Self, EnsError> {
        let trimmed = name.trim();
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
        let invalid = |reason: &str| EnsError::InvalidDomain {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("name is empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(invalid("name contains whitespace"));
        }
        if trimmed.split('.').any(str::is_empty) {
            return Err(invalid("name contains an empty label"));
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Leftmost label
    pub fn first_label(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Enclosing domain, or `None` for a top-level domain
    pub fn parent(&self) -> Option<DomainName> {
        self.0
            .split_once('.')
            .map(|(_, rest)| DomainName(rest.to_string()))
    }

    pub fn is_top_level(&self) -> bool {
        !self.0.contains('.')
    }

    /// `label.self`; `label` must be exactly one label
    pub fn child(&self, label: &str) -> Result<DomainName, EnsError> {
        let label = DomainName::parse(label)?;
        if !label.is_top_level() {
            return Err(EnsError::InvalidDomain {
                name: label.0,
                reason: "expected a single label".to_string(),
            });
        }
        Ok(DomainName(format!("{}.{}", label.0, self.0)))
    }

    pub fn node(&self) -> Node {
        namehash(&self.0)
    }

    /// Fingerprint of the leftmost label
    pub fn label_hash(&self) -> LabelHash {
        labelhash(self.first_label())
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DomainName {
    type Error = EnsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DomainName> for String {
    fn from(value: DomainName) -> Self {
        value.0
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
