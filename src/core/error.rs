use thiserror::Error;

/// Failure to turn a service payload into typed data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The whole response body could not be read as a JSON object.
    #[error("malformed response body: {0}")]
    Body(String),
    /// A single column's encoded statistics could not be decoded.
    #[error("column '{column}': {reason}")]
    Column { column: String, reason: String },
}

/// Errors surfaced by the upload and analysis controllers.
///
/// Every variant is caught at the controller boundary, logged, recorded in
/// [`WorkflowState`](crate::core::WorkflowState) and returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("unexpected response shape: {0}")]
    UnexpectedResponseShape(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("select at least {required} columns (currently {selected})")]
    InsufficientSelection { required: usize, selected: usize },
}

impl ClientError {
    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self::UnexpectedResponseShape(detail.into())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::NetworkFailure(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
