use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Project is not supported by the coverage service")]
    ProjectUnsupported,

    #[error("Coverage service is disabled")]
    ServiceDisabled,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed coverage response: {0}")]
    MalformedResponse(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Fetch task failed: {0}")]
    Task(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl CoverageError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        CoverageError::MalformedResponse(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CoverageError>;
