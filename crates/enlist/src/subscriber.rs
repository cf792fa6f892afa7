use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

use crate::handler::SharedHandler;
use crate::service::ServiceMethods;
use crate::transport::{SubscriptionHandle, Transport};

/// Outcome of one registration attempt within a batch.
///
/// Subscribe failures are local to their entry: they are logged, recorded
/// here, and never abort the rest of the batch.
pub struct Registration<B: Transport> {
    /// The subject the entry was registered under.
    pub subject: String,
    /// The queue-group name, for queued registrations.
    pub queue: Option<String>,
    /// The result of the subscribe call.
    pub result: Result<(), B::Error>,
}

impl<B: Transport> fmt::Debug for Registration<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("subject", &self.subject)
            .field("queue", &self.queue)
            .field("result", &self.result)
            .finish()
    }
}

/// Registers handlers on the bus and ties every live subscription to a
/// shared cancellation signal.
///
/// Each successful subscribe spawns a watcher task that parks on the
/// cancellation token and unsubscribes exactly once when it fires. Watchers
/// never coordinate with each other; the token is the sole teardown
/// mechanism, and [`drain`](Self::drain) offers an explicit join on their
/// completion.
pub struct Subscriber<B: Transport> {
    transport: B,
    cancel: CancellationToken,
    watchers: TaskTracker,
}

impl<B: Transport> Subscriber<B> {
    /// Creates a subscriber over a connected transport.
    ///
    /// The token stays caller-owned; cancelling it tears down every
    /// subscription registered through this value.
    #[must_use]
    pub fn new(transport: B, cancel: CancellationToken) -> Self {
        Self {
            transport,
            cancel,
            watchers: TaskTracker::new(),
        }
    }

    /// Registers every convention-matching member of the service.
    ///
    /// Queued members subscribe under their derived queue-group name; the
    /// rest subscribe individually. Returns one outcome per descriptor, in
    /// descriptor order.
    pub async fn subscribe_service(&self, service: ServiceMethods) -> Vec<Registration<B>> {
        let mut outcomes = Vec::new();
        for descriptor in service.descriptors() {
            let subject = descriptor.subject();
            if descriptor.queued() {
                let queue = descriptor.queue_name();
                let result = self
                    .register_queued(&subject, &queue, descriptor.into_handler())
                    .await;
                outcomes.push(Registration {
                    subject,
                    queue: Some(queue),
                    result,
                });
            } else {
                let result = self
                    .register_individual(&subject, descriptor.into_handler())
                    .await;
                outcomes.push(Registration {
                    subject,
                    queue: None,
                    result,
                });
            }
        }
        outcomes
    }

    /// Registers an explicit subject-to-handler mapping.
    ///
    /// With a non-empty queue name every entry joins that one shared queue
    /// group; otherwise every entry subscribes individually. Entry order
    /// follows map iteration order, which is unspecified.
    pub async fn subscribe_map(
        &self,
        entries: HashMap<String, SharedHandler>,
        queue: Option<&str>,
    ) -> Vec<Registration<B>> {
        let queue = queue.filter(|q| !q.is_empty());
        let mut outcomes = Vec::new();
        for (subject, handler) in entries {
            let result = match queue {
                Some(queue) => self.register_queued(&subject, queue, handler).await,
                None => self.register_individual(&subject, handler).await,
            };
            outcomes.push(Registration {
                subject,
                queue: queue.map(String::from),
                result,
            });
        }
        outcomes
    }

    /// Subscribes a handler to a subject individually and starts its
    /// watcher.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the subscribe call is rejected; the
    /// attempt is logged and abandoned, never retried.
    pub async fn register_individual(
        &self,
        subject: &str,
        handler: SharedHandler,
    ) -> Result<(), B::Error> {
        match self.transport.subscribe(subject, handler).await {
            Ok(handle) => {
                debug!(subject, "subscribed");
                self.watch(subject.to_string(), handle);
                Ok(())
            }
            Err(e) => {
                error!(subject, error = %e, "subscribe failed");
                Err(e)
            }
        }
    }

    /// Subscribes a handler to a subject as a queue-group member and starts
    /// its watcher.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the subscribe call is rejected; the
    /// attempt is logged and abandoned, never retried.
    pub async fn register_queued(
        &self,
        subject: &str,
        queue: &str,
        handler: SharedHandler,
    ) -> Result<(), B::Error> {
        match self.transport.queue_subscribe(subject, queue, handler).await {
            Ok(handle) => {
                debug!(subject, queue, "subscribed to queue group");
                self.watch(subject.to_string(), handle);
                Ok(())
            }
            Err(e) => {
                error!(subject, queue, error = %e, "queue subscribe failed");
                Err(e)
            }
        }
    }

    fn watch(&self, subject: String, handle: B::Handle) {
        let cancel = self.cancel.clone();
        self.watchers.spawn(async move {
            cancel.cancelled().await;
            if let Err(e) = handle.unsubscribe().await {
                error!(subject = %subject, error = %e, "unsubscribe failed");
            }
        });
    }

    /// Waits up to `grace` for all watchers to finish tearing down.
    ///
    /// Intended for shutdown, after the cancellation token has fired.
    /// Returns whether every watcher exited within the grace period.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.watchers.close();
        tokio::time::timeout(grace, self.watchers.wait())
            .await
            .is_ok()
    }

    /// The cancellation token shared by every watcher.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}
