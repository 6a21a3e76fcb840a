use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Geometry lookup failed: {0}")]
    GeometryLookup(String),

    #[error("Geometry provider error: {0}")]
    Provider(String),

    #[error("Queue mode violation: {0}")]
    QueueMode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
