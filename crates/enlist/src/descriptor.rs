use std::fmt;

use crate::handler::SharedHandler;

/// A resolved subscription, ready to be registered.
///
/// Produced by [`crate::service::ServiceMethods::descriptors`] and consumed
/// exactly once by registration; nothing mutates a descriptor after it is
/// built.
pub struct Descriptor {
    service_name: String,
    message_name: String,
    queued: bool,
    handler: SharedHandler,
}

impl Descriptor {
    pub(crate) const fn new(
        service_name: String,
        message_name: String,
        queued: bool,
        handler: SharedHandler,
    ) -> Self {
        Self {
            service_name,
            message_name,
            queued,
            handler,
        }
    }

    /// The lower-cased service name derived from the target type.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The lower-cased member name with the convention suffixes removed.
    #[must_use]
    pub fn message_name(&self) -> &str {
        &self.message_name
    }

    /// Whether the subscription joins a queue group.
    #[must_use]
    pub const fn queued(&self) -> bool {
        self.queued
    }

    /// The subject to subscribe under: `<service>.<message>`.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("{}.{}", self.service_name, self.message_name)
    }

    /// The queue-group name: `<service>_<message>`. Only meaningful when
    /// [`queued`](Self::queued) is true.
    #[must_use]
    pub fn queue_name(&self) -> String {
        format!("{}_{}", self.service_name, self.message_name)
    }

    /// Takes the handler bound to this descriptor.
    #[must_use]
    pub fn into_handler(self) -> SharedHandler {
        self.handler
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("service_name", &self.service_name)
            .field("message_name", &self.message_name)
            .field("queued", &self.queued)
            .finish_non_exhaustive()
    }
}
