use thiserror::Error;

/// Errors that can occur while extracting dataset links.
#[derive(Error, Debug)]
pub enum DsnLinksError {
    #[error("host error: {message} (operation: {operation})")]
    Host { message: String, operation: String },

    #[error("database error: {message} (operation: {operation})")]
    Database { message: String, operation: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("missing script text for link {link}")]
    MissingScript { link: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `DsnLinksError`.
pub type Result<T> = std::result::Result<T, DsnLinksError>;
