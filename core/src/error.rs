use std::error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    MissingField(&'static str),
    InvalidValue(&'static str, std::string::String),
    UnknownParent(&'static str, i32),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::MissingField(field) => write!(f, "Missing field: {}", field),
            ModelError::InvalidValue(field, msg) => write!(f, "Invalid {}: {}", field, msg),
            ModelError::UnknownParent(field, id) => write!(f, "Unknown {}: {}", field, id),
        }
    }
}

impl error::Error for ModelError {}
