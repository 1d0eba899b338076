// Error taxonomy for the registry
// Every error is terminal for the operation that raised it, never for the process.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Required form fields that were empty at submission time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: Vec<&'static str>,
}

impl ValidationError {
    pub fn missing(fields: Vec<&'static str>) -> Self {
        Self { fields }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "please fill {}", join_fields(&self.fields))
    }
}

impl std::error::Error for ValidationError {}

fn join_fields(fields: &[&str]) -> String {
    match fields {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The last stored identifier does not look like `REG<digits>`
    #[error("malformed registration identifier '{value}' in last row")]
    Format { value: String },

    #[error("no student found with '{key}'")]
    NotFound { key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to render document: {0}")]
    Render(String),

    #[error("failed to load configuration: {0}")]
    Config(Box<figment::Error>),

    #[error("invalid configuration: {message}")]
    ConfigValidation { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl Error {
    pub fn format(value: impl Into<String>) -> Self {
        Self::Format { value: value.into() }
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// True for errors caused by user input rather than the environment
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = ValidationError::missing(vec!["Name", "Mobile", "Aadhaar"]);
        assert_eq!(err.to_string(), "please fill Name, Mobile and Aadhaar");

        let err = ValidationError::missing(vec!["Mobile"]);
        assert_eq!(err.to_string(), "please fill Mobile");
    }

    #[test]
    fn test_user_errors() {
        assert!(Error::not_found("REG009").is_user_error());
        assert!(Error::from(ValidationError::missing(vec!["Name"])).is_user_error());
        assert!(!Error::format("XYZ").is_user_error());
    }

    #[test]
    fn test_format_error_message() {
        let err = Error::format("XYZ");
        assert_eq!(
            err.to_string(),
            "malformed registration identifier 'XYZ' in last row"
        );
    }
}
