//! Customer records and the validated form used to create or update them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::types::text::{blank_as_none, blank_text_as_none, opaque_text};
use crate::types::{CustomerId, Gender, Phone};

/// A customer as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Server-assigned identifier.
    pub id: CustomerId,
    /// Full name.
    #[serde(deserialize_with = "opaque_text")]
    pub name: String,
    /// Contact number as entered.
    #[serde(default, deserialize_with = "opaque_text")]
    pub phone: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub gender: Option<Gender>,
    /// Date of birth.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_text_as_none")]
    pub notes: Option<String>,
}

impl Customer {
    /// One-line label used in pickers, e.g. `"Asha Rao - 98450 11223"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.phone)
    }

    /// Start an edit of this customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored name or phone would not pass validation
    /// (legacy rows); the caller must fix them before saving.
    pub fn to_form(&self) -> ValidationResult<CustomerForm> {
        Ok(CustomerForm::new(&self.name, &self.phone)?
            .with_gender(self.gender)
            .with_dob(self.dob)
            .with_notes(self.notes.clone()))
    }
}

/// Validated customer fields, without an id.
///
/// Used as the body of both the create and the update call. Name and phone
/// are checked on construction; optional fields serialize as `null` when
/// absent so the backend always receives the full field set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerForm {
    name: String,
    phone: Phone,
    gender: Option<Gender>,
    dob: Option<NaiveDate>,
    notes: Option<String>,
}

impl CustomerForm {
    /// Create a form from the two required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NameRequired`] for a blank name and
    /// [`ValidationError::Phone`] for an invalid phone.
    pub fn new(name: &str, phone: &str) -> ValidationResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired);
        }
        Ok(Self {
            name: name.to_owned(),
            phone: Phone::parse(phone)?,
            gender: None,
            dob: None,
            notes: None,
        })
    }

    #[must_use]
    pub const fn with_gender(mut self, gender: Option<Gender>) -> Self {
        self.gender = gender;
        self
    }

    #[must_use]
    pub const fn with_dob(mut self, dob: Option<NaiveDate>) -> Self {
        self.dob = dob;
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn phone(&self) -> &Phone {
        &self.phone
    }
}
