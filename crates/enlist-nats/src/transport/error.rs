use enlist::transport::TransportError;
use thiserror::Error;

/// Error type for NATS transport operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Connecting to the server failed.
    #[error("failed to connect to nats: {0}")]
    Connect(String),

    /// The server rejected a subscribe call.
    #[error("failed to subscribe: {0}")]
    Subscribe(String),

    /// The server rejected teardown of a subscription.
    #[error("failed to unsubscribe: {0}")]
    Unsubscribe(String),

    /// The delivery pump had already exited when teardown was requested.
    #[error("subscription already stopped")]
    AlreadyStopped,
}

impl TransportError for Error {}
