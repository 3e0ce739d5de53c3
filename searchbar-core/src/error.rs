use std::{error, fmt, io, path::PathBuf};

use crate::registry::SlotKey;

#[derive(Debug)]
pub enum Error {
    UnknownSourceKind(String),
    NoSuchOwner(SlotKey),
    SlotAlreadyOwned(SlotKey),
    NotOwner,
    ConfigError(String),
    HistoryNotFound(PathBuf),
    HistoryError(Box<dyn error::Error + Send>),
    NetworkError(Box<dyn error::Error + Send>),
    JsonError(Box<dyn error::Error + Send>),
    ProviderPanicked,
    IoError(io::Error),
}

impl Error {
    /// Errors that degrade a fetch to an empty result instead of breaking the
    /// view.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            Self::HistoryNotFound(_)
                | Self::HistoryError(_)
                | Self::NetworkError(_)
                | Self::ProviderPanicked
                | Self::IoError(_)
        )
    }
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSourceKind(kind) => write!(f, "Unknown source kind: {kind:?}"),
            Self::NoSuchOwner(key) => write!(f, "No such owner: {key}"),
            Self::SlotAlreadyOwned(key) => write!(f, "Slot already has an owner: {key}"),
            Self::NotOwner => write!(f, "View is not the owner of its slot"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            Self::HistoryNotFound(path) => write!(f, "History file not found: {path:?}"),
            Self::ProviderPanicked => write!(f, "Title provider panicked"),
            Self::HistoryError(err) | Self::NetworkError(err) | Self::JsonError(err) => {
                write!(f, "{err}")
            }
            Self::IoError(err) => write!(f, "{err}"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(Box::new(err))
    }
}
