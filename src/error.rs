use reqwest::StatusCode;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SeedError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Row `{code}` in `{table}` has no id")]
    MissingRowId { table: String, code: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Table listed more than once in dataset: {0}")]
    DuplicateTable(String),

    #[error("No lookup table is reachable")]
    NoTablesAvailable,
}

impl From<figment::Error> for SeedError {
    fn from(e: figment::Error) -> Self {
        SeedError::Config(Box::new(e))
    }
}

impl SeedError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SeedError::UnexpectedStatus { status, .. } => Some(*status),
            SeedError::Reqwest(e) => e.status(),
            _ => None,
        }
    }
}

/// Transient failures worth another attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for SeedError {
    fn is_retryable(&self) -> bool {
        match self {
            SeedError::Reqwest(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(is_transient_status)
            }
            SeedError::UnexpectedStatus { status, .. } => is_transient_status(*status),
            _ => false,
        }
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
