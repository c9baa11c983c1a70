// Gestion des erreurs personnalisées

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub enum RouterError {
    Network(String),
    Command(String),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::Network(msg) => write!(f, "network error: {}", msg),
            RouterError::Command(msg) => write!(f, "command error: {}", msg),
            RouterError::Io(err) => write!(f, "IO error: {}", err),
            RouterError::Serialization(err) => write!(f, "serialization error: {}", err),
        }
    }
}

impl StdError for RouterError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            RouterError::Io(err) => Some(err),
            RouterError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RouterError {
    fn from(err: std::io::Error) -> Self {
        RouterError::Io(err)
    }
}

impl From<serde_json::Error> for RouterError {
    fn from(err: serde_json::Error) -> Self {
        RouterError::Serialization(err)
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
