//! Validated text fields for stores and items.
//!
//! Both [`Name`] and [`Description`] are required, non-blank strings.
//! Surrounding whitespace is trimmed on construction.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a text field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// The input is empty or only whitespace.
    #[error("{field} cannot be empty")]
    Empty {
        /// Name of the rejected field.
        field: &'static str,
    },
    /// The input is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Name of the rejected field.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
}

fn validate(field: &'static str, max: usize, s: &str) -> Result<String, TextError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(TextError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(TextError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// Display name of a store or item.
///
/// ## Constraints
///
/// - Not empty after trimming
/// - At most 200 characters
///
/// ## Examples
///
/// ```
/// use storekeep_core::Name;
///
/// assert_eq!(Name::parse("  Joe's Diner ").unwrap().as_str(), "Joe's Diner");
/// assert!(Name::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    /// Maximum length of a name, in characters.
    pub const MAX_LENGTH: usize = 200;

    /// Parse a `Name` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or longer than 200 characters.
    pub fn parse(s: &str) -> Result<Self, TextError> {
        validate("name", Self::MAX_LENGTH, s).map(Self)
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free-form description of a store or item.
///
/// ## Constraints
///
/// - Not empty after trimming
/// - At most 2000 characters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    /// Maximum length of a description, in characters.
    pub const MAX_LENGTH: usize = 2000;

    /// Parse a `Description` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or longer than 2000 characters.
    pub fn parse(s: &str) -> Result<Self, TextError> {
        validate("description", Self::MAX_LENGTH, s).map(Self)
    }

    /// Returns the description as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_text_conversions {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = TextError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TextError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_text_conversions!(Name);
impl_text_conversions!(Description);
