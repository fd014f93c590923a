use std::fmt;
use std::str::FromStr;

use regex::Regex;

lazy_static::lazy_static! {
    // Loose shape accepted by the store: something@something.something
    static ref STORED_EMAIL_REGEX: Regex = Regex::new(r"^\S+@\S+\.\S+$").unwrap();
    // Stricter shape required of form submissions.
    // Letters in the local part may be non-ASCII, the top-level domain needs two or more letters.
    static ref SUBMITTED_EMAIL_REGEX: Regex = Regex::new(
        r"^[\p{L}\p{N}.!#$%&'*+/=?^_`{|}~-]+@(?:[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?\.)+(?:\p{L}{2,63}|xn--[A-Za-z0-9-]{2,59})$"
    )
    .unwrap();
}

/// A user supplied email-address, normalized for storage
#[derive(Debug, PartialEq, Clone)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Check a raw submitted value against the standard address format.
    /// No trimming is applied, surrounding whitespace makes the value invalid.
    pub fn is_well_formed(value: &str) -> bool {
        SUBMITTED_EMAIL_REGEX.is_match(value)
    }
}

impl FromStr for EmailAddress {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Normalize
        let value = value.trim().to_lowercase();

        if value.is_empty() {
            return Err("Email address is required".into());
        }
        if !STORED_EMAIL_REGEX.is_match(&value) {
            return Err("Please enter a valid email address".into());
        }

        Ok(Self(value))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
