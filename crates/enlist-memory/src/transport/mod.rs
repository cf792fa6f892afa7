mod error;

pub use error::Error;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use enlist::handler::{Envelope, SharedHandler};
use enlist::transport::{SubscriptionHandle, Transport};
use tokio::sync::Mutex;
use tracing::debug;

type Registry = Arc<Mutex<HashMap<String, SubjectChannels>>>;

#[derive(Default)]
struct SubjectChannels {
    individuals: Vec<(u64, SharedHandler)>,
    queues: HashMap<String, QueueGroup>,
}

impl SubjectChannels {
    fn is_empty(&self) -> bool {
        self.individuals.is_empty() && self.queues.is_empty()
    }
}

#[derive(Default)]
struct QueueGroup {
    members: Vec<(u64, SharedHandler)>,
    cursor: usize,
}

/// An in-memory transport.
///
/// Every individual subscriber on a subject receives each published message;
/// each queue group delivers to exactly one of its members, round robin.
/// State lives in the transport value, so independent instances never
/// interfere.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    subjects: Registry,
    rejected: Arc<Mutex<HashSet<String>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a subject so that subscribe calls against it fail.
    pub async fn reject(&self, subject: &str) {
        self.rejected.lock().await.insert(subject.to_string());
    }

    /// Publishes a payload to a subject.
    ///
    /// Handlers run on spawned tasks; the returned count is the number of
    /// deliveries issued, not completed.
    pub async fn publish(&self, subject: &str, payload: Bytes) -> usize {
        let mut handlers = Vec::new();
        {
            let mut subjects = self.subjects.lock().await;
            let Some(channels) = subjects.get_mut(subject) else {
                return 0;
            };
            for (_, handler) in &channels.individuals {
                handlers.push(Arc::clone(handler));
            }
            for group in channels.queues.values_mut() {
                if group.members.is_empty() {
                    continue;
                }
                let pick = group.cursor % group.members.len();
                group.cursor = group.cursor.wrapping_add(1);
                handlers.push(Arc::clone(&group.members[pick].1));
            }
        }

        let delivered = handlers.len();
        for handler in handlers {
            let envelope = Envelope {
                subject: subject.to_string(),
                reply: None,
                payload: payload.clone(),
            };
            tokio::spawn(async move {
                handler.handle(envelope).await;
            });
        }
        delivered
    }

    /// The number of live registrations, individual and queued combined.
    pub async fn subscription_count(&self) -> usize {
        let subjects = self.subjects.lock().await;
        subjects
            .values()
            .map(|c| {
                c.individuals.len()
                    + c.queues.values().map(|g| g.members.len()).sum::<usize>()
            })
            .sum()
    }

    async fn check_rejected(&self, subject: &str) -> Result<(), Error> {
        if self.rejected.lock().await.contains(subject) {
            return Err(Error::Rejected(subject.to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    type Error = Error;
    type Handle = MemorySubscriptionHandle;

    async fn subscribe(
        &self,
        subject: &str,
        handler: SharedHandler,
    ) -> Result<MemorySubscriptionHandle, Error> {
        self.check_rejected(subject).await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subjects = self.subjects.lock().await;
        subjects
            .entry(subject.to_string())
            .or_default()
            .individuals
            .push((id, handler));
        debug!(subject, id, "registered individual subscription");

        Ok(MemorySubscriptionHandle {
            subjects: Arc::clone(&self.subjects),
            subject: subject.to_string(),
            queue: None,
            id,
        })
    }

    async fn queue_subscribe(
        &self,
        subject: &str,
        queue: &str,
        handler: SharedHandler,
    ) -> Result<MemorySubscriptionHandle, Error> {
        self.check_rejected(subject).await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subjects = self.subjects.lock().await;
        subjects
            .entry(subject.to_string())
            .or_default()
            .queues
            .entry(queue.to_string())
            .or_default()
            .members
            .push((id, handler));
        debug!(subject, queue, id, "registered queue subscription");

        Ok(MemorySubscriptionHandle {
            subjects: Arc::clone(&self.subjects),
            subject: subject.to_string(),
            queue: Some(queue.to_string()),
            id,
        })
    }
}

/// Handle to one in-memory registration.
pub struct MemorySubscriptionHandle {
    subjects: Registry,
    subject: String,
    queue: Option<String>,
    id: u64,
}

impl fmt::Debug for MemorySubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySubscriptionHandle")
            .field("subject", &self.subject)
            .field("queue", &self.queue)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SubscriptionHandle for MemorySubscriptionHandle {
    type Error = Error;

    async fn unsubscribe(self) -> Result<(), Error> {
        let mut subjects = self.subjects.lock().await;
        let Some(channels) = subjects.get_mut(&self.subject) else {
            return Err(Error::UnknownSubscription);
        };

        let removed = match &self.queue {
            None => {
                let before = channels.individuals.len();
                channels.individuals.retain(|(id, _)| *id != self.id);
                channels.individuals.len() != before
            }
            Some(queue) => match channels.queues.get_mut(queue) {
                Some(group) => {
                    let before = group.members.len();
                    group.members.retain(|(id, _)| *id != self.id);
                    let removed = group.members.len() != before;
                    if group.members.is_empty() {
                        channels.queues.remove(queue);
                    }
                    removed
                }
                None => false,
            },
        };

        if channels.is_empty() {
            subjects.remove(&self.subject);
        }

        if removed {
            debug!(subject = %self.subject, id = self.id, "unsubscribed");
            Ok(())
        } else {
            Err(Error::UnknownSubscription)
        }
    }
}
