//! Validation and sanitisation of interactive text input.

use crate::config::InventoryConfig;
use crate::error::InventoryError;

/// Characters refused in free-text input.
const UNSAFE_CHARS: &[char] = &['<', '>', '"', '\'', '&', ';', '(', ')', '|', '`', '$'];

/// Length and character rules for text typed into the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPolicy {
    pub max_length: usize,
}

impl InputPolicy {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn from_config(config: &InventoryConfig) -> Self {
        Self::new(config.max_input_length)
    }

    /// True if `input` is within the length limit and free of shell/markup metacharacters.
    pub fn is_safe(&self, input: &str) -> bool {
        input.chars().count() <= self.max_length && !input.contains(UNSAFE_CHARS)
    }

    /// Trims `input` and checks it, naming the offending `field` on failure.
    pub fn check<'a>(&self, field: &str, input: &'a str) -> Result<&'a str, InventoryError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InventoryError::validation(format!("{field} cannot be empty")));
        }
        if trimmed.chars().count() > self.max_length {
            return Err(InventoryError::validation(format!(
                "{field} is longer than {} characters",
                self.max_length
            )));
        }
        if trimmed.contains(UNSAFE_CHARS) {
            return Err(InventoryError::validation(format!(
                "{field} contains characters that are not allowed"
            )));
        }
        Ok(trimmed)
    }

    /// Drops control characters, truncates to the limit, and HTML-escapes the rest.
    pub fn sanitize(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        for c in input.chars().filter(|c| !c.is_control()).take(self.max_length) {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#x27;"),
                _ => out.push(c),
            }
        }
        out
    }
}

impl Default for InputPolicy {
    fn default() -> Self {
        Self::from_config(&InventoryConfig::default())
    }
}
