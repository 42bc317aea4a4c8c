use thiserror::Error;

/// Failures surfaced by the API client, the providers and the view logic.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// A required field is missing or a value is out of range.
    #[error("{0}")]
    Validation(String),

    /// No record or location matched the request.
    #[error("{0}")]
    NotFound(String),

    /// A third-party lookup failed or answered with a non-success status.
    #[error("{service} request failed: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl WeatherError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
