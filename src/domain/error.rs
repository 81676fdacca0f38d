use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("rating `{value}` is outside the accepted range 1..=5")]
    InvalidRating { value: i32 },
    #[error("unknown {kind} `{value}`")]
    UnknownVariant { kind: &'static str, value: String },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }
}
