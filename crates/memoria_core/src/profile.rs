//! Memorial profile (obituary) record.

use chrono::NaiveDate;
use memoria_error::ValidationError;
use serde::{Deserialize, Serialize};

/// Name and dates shown at the top of the memorial page.
///
/// Stored as a single JSON object; saving replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct MemorialProfile {
    /// Name of the one remembered
    name: String,
    /// Date of birth
    birth_date: NaiveDate,
    /// Date of passing
    pass_date: NaiveDate,
}

impl MemorialProfile {
    /// Builds a profile, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the name is blank or the dates are reversed.
    pub fn new(
        name: impl Into<String>,
        birth_date: NaiveDate,
        pass_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let profile = Self {
            name: name.into().trim().to_string(),
            birth_date,
            pass_date,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Checks the invariants a deserialized profile may not satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the name is blank or `passDate` precedes
    /// `birthDate`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name must not be empty"));
        }
        if self.pass_date < self.birth_date {
            return Err(ValidationError::new(format!(
                "passDate {} precedes birthDate {}",
                self.pass_date, self.birth_date
            )));
        }
        Ok(())
    }
}
