//! NATS implementation of the enlist transport seam.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// The NATS transport and its subscription handles.
pub mod transport;

pub use transport::{Error, NatsSubscriptionHandle, NatsTransport};
