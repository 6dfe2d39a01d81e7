use thiserror::Error;

#[derive(Error, Debug)]
pub enum PertoError {
    #[error("Search error: {0}")]
    Search(#[from] crate::search::SearchError),
    #[cfg(feature = "backfill")]
    #[error("Backfill error: {0}")]
    Backfill(#[from] crate::backfill::BackfillError),
    #[error("Data error: {0}")]
    Data(#[from] perto_datasets::DataError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PertoError>;
