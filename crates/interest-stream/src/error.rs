use thiserror::Error;

/// Error type for chunk queues and the sequences built on top of them.
///
/// `Clone` so that a single terminal fault can be re-raised to every
/// pending and future reader of a queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A write was attempted after the queue was closed or errored.
    #[error("cannot write to a closed queue")]
    Closed,

    /// The producer terminated the queue (or a sequence) with a fault.
    #[error("{0}")]
    Fault(String),
}

impl Error {
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into())
    }

    /// Returns `true` for the write-after-close protocol fault.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Fault(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Fault(s.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
