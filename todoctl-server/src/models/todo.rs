//! Todo title validation

use super::validation::required_text;
use super::ValidationError;

/// Maximum length for todo titles (`VARCHAR(255)`)
const MAX_TITLE_LEN: usize = 255;

/// Validated todo title
///
/// Stored exactly as supplied; only blank titles are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoTitle(String);

impl TodoTitle {
    /// Create a new todo title.
    ///
    /// # Rules
    /// - Not empty or whitespace only
    /// - Max 255 characters
    /// - No NUL characters
    ///
    /// # Example
    /// ```
    /// use todoctl_server::models::TodoTitle;
    ///
    /// assert!(TodoTitle::new("Draft report").is_ok());
    /// assert!(TodoTitle::new("").is_err());
    /// assert!(TodoTitle::new("   ").is_err());  // whitespace only
    /// ```
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        required_text(&s, "title", MAX_TITLE_LEN)?;
        Ok(Self(s))
    }

    /// Get the title as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}
