use std::str::FromStr;

/// A client name as stored on a booking, never blank
#[derive(Debug, Clone, PartialEq)]
pub struct PersonName(String);

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PersonName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err("Client name is required".into());
        }
        Ok(Self(value.to_string()))
    }
}
