//! Unified error type.

use std::fmt;

/// The error type returned by healthz's fallible operations.
///
/// A failing health check is not an `Error`: it becomes an unhealthy outcome
/// and, ultimately, an HTTP response. This type surfaces assembly and
/// infrastructure failures: a bad check registry, an unparsable bind address,
/// binding to a port or accepting a connection.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    InvalidAddress(String),
    InvalidCheckName { name: String, reason: &'static str },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::InvalidAddress(addr) => write!(f, "invalid socket address `{addr}`"),
            Self::InvalidCheckName { name, reason } => {
                write!(f, "invalid health check name {name:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
