//! Error types for imap-messages-exporter

use crate::session::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connect(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Login failed: {0}")]
    Auth(String),

    #[error("Mailbox listing failed: {0}")]
    Enumerate(String),

    #[error("Status of mailbox {mailbox} failed: {message}")]
    Status { mailbox: String, message: String },

    #[error("Collection task failed: {0}")]
    Task(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// The protocol stage that raised this error, if it came from an
    /// account session.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Connect(_) | Self::Tls(_) => Some(Stage::Connecting),
            Self::Auth(_) => Some(Stage::Authenticating),
            Self::Enumerate(_) => Some(Stage::Enumerating),
            Self::Status { .. } => Some(Stage::FetchingStatus),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
