use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DashError>;
