//! Validated name type for supervised services.

use super::SupervisionDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a service name.
const MAX_SERVICE_NAME_LENGTH: usize = 64;

/// Validated service name, unique within one supervision run.
///
/// # Examples
///
///     use foreman::supervision::domain::ServiceName;
///
///     let name = ServiceName::new(" db ").expect("valid");
///     assert_eq!(name.as_str(), "db");
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    /// Creates a validated service name.
    ///
    /// The input is trimmed. Only characters in `[A-Za-z0-9_.-]` are
    /// accepted; case is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisionDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, SupervisionDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if normalized.is_empty() {
            return Err(SupervisionDomainError::EmptyServiceName);
        }

        let is_valid = normalized.chars().all(|character| {
            character.is_ascii_alphanumeric() || matches!(character, '_' | '-' | '.')
        });
        if !is_valid {
            return Err(SupervisionDomainError::InvalidServiceName(
                normalized.to_owned(),
            ));
        }

        if normalized.len() > MAX_SERVICE_NAME_LENGTH {
            return Err(SupervisionDomainError::ServiceNameTooLong(
                normalized.to_owned(),
            ));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the service name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for ServiceName {
    type Error = SupervisionDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServiceName> for String {
    fn from(value: ServiceName) -> Self {
        value.0
    }
}
