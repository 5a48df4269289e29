use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Scan root {} does not exist", path.display())]
    RootNotFound { path: PathBuf },

    #[error("Scan root {} is not a directory", path.display())]
    RootNotADirectory { path: PathBuf },

    #[error("Error reading scan root {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Database query error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Interrupted before the update plan was complete")]
    Interrupted,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
