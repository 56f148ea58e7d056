//! Todo group name and color validation

use super::validation::{required_text, storable};
use super::ValidationError;

/// Maximum length for group names (`VARCHAR(255)`)
const MAX_NAME_LEN: usize = 255;

/// Maximum length for group colors (`VARCHAR(50)`)
const MAX_COLOR_LEN: usize = 50;

/// Validated todo group name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupName(String);

impl GroupName {
    /// Create a new group name.
    ///
    /// # Example
    /// ```
    /// use todoctl_server::models::GroupName;
    ///
    /// assert!(GroupName::new("Work").is_ok());
    /// assert!(GroupName::new("").is_err());
    /// ```
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        required_text(&s, "name", MAX_NAME_LEN)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Validated group color, a free-form display hint (e.g. `#ff8800`, `teal`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupColor(String);

impl GroupColor {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        storable(&s, "color")?;
        if s.chars().count() > MAX_COLOR_LEN {
            return Err(ValidationError::TooLong {
                field: "color",
                max: MAX_COLOR_LEN,
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(GroupName::new("Work").is_ok());
        assert!(GroupName::new("Errands & chores").is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        assert!(matches!(
            GroupName::new("  ").unwrap_err(),
            ValidationError::Empty { field: "name" }
        ));
    }

    #[test]
    fn name_max_length() {
        assert!(GroupName::new("n".repeat(255)).is_ok());
        assert!(GroupName::new("n".repeat(256)).is_err());
    }

    #[test]
    fn color_max_length() {
        assert!(GroupColor::new("#ff8800").is_ok());
        assert!(GroupColor::new("c".repeat(50)).is_ok());

        let err = GroupColor::new("c".repeat(51)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLong {
                field: "color",
                max: 50
            }
        );
    }

    #[test]
    fn rejects_nul_in_name_and_color() {
        assert!(matches!(
            GroupName::new("ok\0").unwrap_err(),
            ValidationError::InvalidFormat { field: "name", .. }
        ));
        assert!(matches!(
            GroupColor::new("x\0").unwrap_err(),
            ValidationError::InvalidFormat { field: "color", .. }
        ));
    }
}
