// Registration record and the form state it is built from

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CSV header row, in storage order
pub const FIELD_NAMES: [&str; 13] = [
    "Registration No",
    "Name",
    "Father's Name",
    "Mother's Name",
    "DOB",
    "Mobile",
    "Aadhaar",
    "Address",
    "City",
    "State",
    "PIN",
    "Course",
    "Photo",
];

/// Date of birth format shown on the form
pub const DOB_FORMAT: &str = "%d-%m-%Y";

/// One student's registration entry
///
/// Field order here is the column order of the store; serde's header names
/// match `FIELD_NAMES`. Records are written once and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "Registration No")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Father's Name")]
    pub father_name: String,

    #[serde(rename = "Mother's Name")]
    pub mother_name: String,

    #[serde(rename = "DOB")]
    pub dob: String,

    #[serde(rename = "Mobile")]
    pub mobile: String,

    #[serde(rename = "Aadhaar")]
    pub aadhaar: String,

    #[serde(rename = "Address")]
    pub address: String,

    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "State")]
    pub state: String,

    #[serde(rename = "PIN")]
    pub pin: String,

    #[serde(rename = "Course")]
    pub course: String,

    /// Path to the student's photo, empty when none was given
    #[serde(rename = "Photo")]
    pub photo: String,
}

impl Registration {
    /// All fields as (header, value) pairs in storage order
    pub fn fields(&self) -> [(&'static str, &str); 13] {
        [
            (FIELD_NAMES[0], &self.id),
            (FIELD_NAMES[1], &self.name),
            (FIELD_NAMES[2], &self.father_name),
            (FIELD_NAMES[3], &self.mother_name),
            (FIELD_NAMES[4], &self.dob),
            (FIELD_NAMES[5], &self.mobile),
            (FIELD_NAMES[6], &self.aadhaar),
            (FIELD_NAMES[7], &self.address),
            (FIELD_NAMES[8], &self.city),
            (FIELD_NAMES[9], &self.state),
            (FIELD_NAMES[10], &self.pin),
            (FIELD_NAMES[11], &self.course),
            (FIELD_NAMES[12], &self.photo),
        ]
    }

    /// Fields shown to people: everything except the photo reference
    pub fn display_fields(&self) -> Vec<(&'static str, &str)> {
        self.fields()
            .into_iter()
            .filter(|(name, _)| *name != "Photo")
            .collect()
    }

    pub fn photo_path(&self) -> Option<&Path> {
        if self.photo.is_empty() {
            None
        } else {
            Some(Path::new(&self.photo))
        }
    }

    /// Whether this record matches a lookup key (identifier or mobile)
    pub fn matches_key(&self, key: &str) -> bool {
        self.id == key || self.mobile == key
    }
}

// ============================================================================
// FORM STATE
// ============================================================================

/// Field values collected by a front end, before an identifier is assigned
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub name: String,
    pub father_name: String,
    pub mother_name: String,
    pub dob: String,
    pub mobile: String,
    pub aadhaar: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pin: String,
    pub course: String,
    pub photo: String,
}

impl RegistrationForm {
    /// Check the required fields, reporting every one that is missing
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();

        if self.name.trim().is_empty() {
            missing.push("Name");
        }
        if self.mobile.trim().is_empty() {
            missing.push("Mobile");
        }
        if self.aadhaar.trim().is_empty() {
            missing.push("Aadhaar");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::missing(missing))
        }
    }

    /// True when the date of birth is empty or a valid DD-MM-YYYY date
    pub fn dob_is_well_formed(&self) -> bool {
        let dob = self.dob.trim();
        dob.is_empty() || NaiveDate::parse_from_str(dob, DOB_FORMAT).is_ok()
    }

    /// Build the stored record under the given identifier, every value trimmed
    pub fn into_registration(self, id: String) -> Registration {
        Registration {
            id,
            name: self.name.trim().to_string(),
            father_name: self.father_name.trim().to_string(),
            mother_name: self.mother_name.trim().to_string(),
            dob: self.dob.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            aadhaar: self.aadhaar.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            pin: self.pin.trim().to_string(),
            course: self.course.trim().to_string(),
            photo: self.photo.trim().to_string(),
        }
    }
}
