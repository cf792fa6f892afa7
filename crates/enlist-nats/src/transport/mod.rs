mod error;

pub use error::Error;

use std::fmt;

use async_trait::async_trait;
use enlist::handler::{Envelope, SharedHandler};
use enlist::transport::{SubscriptionHandle, Transport};
use futures::StreamExt;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

/// A transport backed by a NATS connection.
#[derive(Clone, Debug)]
pub struct NatsTransport {
    client: async_nats::Client,
}

impl NatsTransport {
    /// Wraps an already connected client.
    #[must_use]
    pub const fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    /// Connects to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        info!(url = %url, "connecting to nats");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| Error::Connect(e.to_string()))?;
        Ok(Self { client })
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &async_nats::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for NatsTransport {
    type Error = Error;
    type Handle = NatsSubscriptionHandle;

    async fn subscribe(
        &self,
        subject: &str,
        handler: SharedHandler,
    ) -> Result<NatsSubscriptionHandle, Error> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| Error::Subscribe(e.to_string()))?;
        debug!(subject, "subscribed");
        Ok(spawn_pump(subscriber, handler))
    }

    async fn queue_subscribe(
        &self,
        subject: &str,
        queue: &str,
        handler: SharedHandler,
    ) -> Result<NatsSubscriptionHandle, Error> {
        let subscriber = self
            .client
            .queue_subscribe(subject.to_string(), queue.to_string())
            .await
            .map_err(|e| Error::Subscribe(e.to_string()))?;
        debug!(subject, queue, "subscribed to queue group");
        Ok(spawn_pump(subscriber, handler))
    }
}

/// Forwards messages to the handler until stopped or the server closes the
/// subscription, then unsubscribes and reports the result to the handle.
fn spawn_pump(
    mut subscriber: async_nats::Subscriber,
    handler: SharedHandler,
) -> NatsSubscriptionHandle {
    let (stop_sender, mut stop_receiver) = watch::channel(());
    let (done_sender, done_receiver) = oneshot::channel();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop_receiver.changed() => {
                    break;
                }
                message = subscriber.next() => {
                    match message {
                        Some(message) => {
                            let envelope = Envelope {
                                subject: message.subject.to_string(),
                                reply: message.reply.map(|r| r.to_string()),
                                payload: message.payload,
                            };
                            handler.handle(envelope).await;
                        }
                        None => break,
                    }
                }
            }
        }

        let result = subscriber
            .unsubscribe()
            .await
            .map_err(|e| Error::Unsubscribe(e.to_string()));
        let _ = done_sender.send(result);
    });

    NatsSubscriptionHandle {
        stop_sender,
        done_receiver,
    }
}

/// Handle to one live NATS subscription.
pub struct NatsSubscriptionHandle {
    stop_sender: watch::Sender<()>,
    done_receiver: oneshot::Receiver<Result<(), Error>>,
}

impl fmt::Debug for NatsSubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NatsSubscriptionHandle").finish_non_exhaustive()
    }
}

#[async_trait]
impl SubscriptionHandle for NatsSubscriptionHandle {
    type Error = Error;

    async fn unsubscribe(self) -> Result<(), Error> {
        // The pump may already have exited if the server closed the
        // subscription; the oneshot then carries its teardown result.
        let _ = self.stop_sender.send(());
        self.done_receiver
            .await
            .unwrap_or(Err(Error::AlreadyStopped))
    }
}
