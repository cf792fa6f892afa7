use enlist::transport::TransportError;
use thiserror::Error;

/// Error type for in-memory transport operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The subject was marked as rejected.
    #[error("subscribe to '{0}' was rejected")]
    Rejected(String),

    /// The handle no longer refers to a live registration.
    #[error("subscription is not registered")]
    UnknownSubscription,
}

impl TransportError for Error {}
