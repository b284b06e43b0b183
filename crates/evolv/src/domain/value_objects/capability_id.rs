//! CapabilityId - `(category, name)` identity of a capability

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Normalize free text into a capability identifier.
///
/// Lowercases, turns every space into `_` and drops anything outside
/// `[a-z0-9_]`. Applying it twice yields the same result as applying it once.
pub fn sanitize(text: &str) -> String {
    text.to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// Identity of a capability within the repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapabilityId {
    category: String,
    name: String,
}

impl CapabilityId {
    /// Build an identity from raw parts, sanitizing both.
    ///
    /// Fails when either part is empty after sanitization.
    pub fn new(category: &str, name: &str) -> Result<Self, DomainError> {
        let category = sanitize(category);
        let name = sanitize(name);

        if category.is_empty() {
            return Err(DomainError::Validation(
                "capability category is empty after sanitization".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(DomainError::Validation(
                "capability name is empty after sanitization".to_string(),
            ));
        }

        Ok(Self { category, name })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}
