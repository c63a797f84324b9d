use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const NOT_AUTHORIZED_MESSAGE: &str = "Not authorized to see this page";
pub const NOT_LOCALIZED_MESSAGE: &str = "This page is not localized for the current language. You have to create a new page for this language using the same identifier:";

/// Field name -> messages, in the order the rules produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl PageError {
    pub fn unauthorized() -> Self {
        PageError::Unauthorized(NOT_AUTHORIZED_MESSAGE.to_string())
    }

    pub fn not_localized(page: &str) -> Self {
        PageError::NotFound(format!("{}{}", NOT_LOCALIZED_MESSAGE, page))
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        PageError::Validation(ValidationErrors::single(field, message))
    }
}

pub type PageResult<T> = std::result::Result<T, PageError>;
