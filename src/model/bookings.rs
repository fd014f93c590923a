use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use uuid::Uuid;

use crate::domain::{EmailAddress, PersonName};

/// Raw booking fields as submitted by a client, before any normalization
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookingFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub topic: Option<String>,
    pub message: Option<String>,
}

/// Validated booking, ready to be written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub name: PersonName,
    pub email: EmailAddress,
    pub phone: Option<String>,
    /// Opaque `yyyy-mm-dd` string from the booking form
    pub date: Option<String>,
    /// Opaque `HH:mm` string from the booking form
    pub time: Option<String>,
    pub topic: Option<String>,
    pub message: Option<String>,
}

impl TryFrom<BookingFields> for NewBooking {
    type Error = ValidationError;

    fn try_from(fields: BookingFields) -> Result<Self, Self::Error> {
        let mut errors = ValidationError::default();

        let name = fields
            .name
            .unwrap_or_default()
            .parse::<PersonName>()
            .map_err(|msg| errors.add("name", msg))
            .ok();
        let email = fields
            .email
            .unwrap_or_default()
            .parse::<EmailAddress>()
            .map_err(|msg| errors.add("email", msg))
            .ok();

        match (name, email) {
            (Some(name), Some(email)) => Ok(Self {
                name,
                email,
                phone: trimmed(fields.phone),
                date: trimmed(fields.date),
                time: trimmed(fields.time),
                topic: trimmed(fields.topic),
                message: trimmed(fields.message),
            }),
            _ => Err(errors),
        }
    }
}

/// Trim an optional text field, treating blank values as absent
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Stored booking record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub topic: Option<String>,
    pub message: Option<String>,
    /// Creation and update timestamps
    /// NOTE: Auto-set and updated by database defaults and triggers
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Short human readable description, e.g. `Jane Doe - General (2025-06-01)`
    pub fn summary(&self) -> String {
        format!(
            "{} - {} ({})",
            self.name,
            self.topic.as_deref().unwrap_or("General"),
            self.date.as_deref().unwrap_or("TBD"),
        )
    }
}

/// Field violations found while validating a booking for storage
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationError {
    errors: BTreeMap<&'static str, String>,
}

impl ValidationError {
    fn add(&mut self, field: &'static str, message: String) {
        self.errors.insert(field, message);
    }

    /// Violated fields and their messages
    pub fn errors(&self) -> &BTreeMap<&'static str, String> {
        &self.errors
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = self
            .errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Booking validation failed: {}", details)
    }
}

impl std::error::Error for ValidationError {}
