use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::handler::SharedHandler;

/// Marker trait for transport errors.
pub trait TransportError: Error + Send + Sync + 'static {}

/// A live subscription as returned by the transport.
///
/// Consuming `self` on unsubscribe makes releasing a subscription a
/// once-only operation.
#[async_trait]
pub trait SubscriptionHandle: Debug + Send + Sync + 'static {
    /// The error type for teardown failures.
    type Error: TransportError;

    /// Removes the subscription from the bus.
    async fn unsubscribe(self) -> Result<(), Self::Error>;
}

/// A connected message-bus transport.
///
/// The transport owns connection lifecycle, payload delivery and callback
/// dispatch; this crate only issues subscribe calls against it and releases
/// the handles it returns.
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    /// The error type for subscribe failures.
    type Error: TransportError;

    /// The handle type representing a live subscription.
    type Handle: SubscriptionHandle;

    /// Subscribes the handler to a subject individually.
    async fn subscribe(
        &self,
        subject: &str,
        handler: SharedHandler,
    ) -> Result<Self::Handle, Self::Error>;

    /// Subscribes the handler to a subject as a member of a queue group.
    async fn queue_subscribe(
        &self,
        subject: &str,
        queue: &str,
        handler: SharedHandler,
    ) -> Result<Self::Handle, Self::Error>;
}
