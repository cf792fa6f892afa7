use crate::convention::{resolve_member, service_label};
use crate::descriptor::Descriptor;
use crate::handler::SharedHandler;

/// Records the named handler members of one service.
///
/// This is the explicit stand-in for runtime reflection: the caller lists
/// `(member name, handler)` pairs, usually with each handler closure
/// capturing the service value so that invocation operates on its state. The
/// convention resolver then processes every entry uniformly and silently
/// skips names matching neither `Message` nor `MessageQueue`.
///
/// ```
/// use std::sync::Arc;
///
/// use enlist::handler;
/// use enlist::service::ServiceMethods;
///
/// struct TimeService;
///
/// impl TimeService {
///     async fn tick(&self, payload: bytes::Bytes) {
///         let _ = payload;
///     }
/// }
///
/// let svc = Arc::new(TimeService);
/// let methods = ServiceMethods::of::<TimeService>().method("TickMessage", {
///     let svc = Arc::clone(&svc);
///     handler::from_payload(move |payload| {
///         let svc = Arc::clone(&svc);
///         async move { svc.tick(payload).await }
///     })
/// });
///
/// let descriptors = methods.descriptors();
/// assert_eq!(descriptors[0].subject(), "timeservice.tick");
/// ```
pub struct ServiceMethods {
    service_name: String,
    members: Vec<(String, SharedHandler)>,
}

impl ServiceMethods {
    /// Starts a builder with the service name derived from the type `T`.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::named(service_label::<T>())
    }

    /// Starts a builder with an explicit service name (lower-cased).
    #[must_use]
    pub fn named(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into().to_lowercase(),
            members: Vec::new(),
        }
    }

    /// Records a member by name with its bound handler.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, handler: SharedHandler) -> Self {
        self.members.push((name.into(), handler));
        self
    }

    /// The lower-cased service name used for subject derivation.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Resolves every recorded member against the naming convention.
    ///
    /// Members matching neither suffix are skipped. Descriptor order follows
    /// insertion order, so registration order is stable for a given builder.
    #[must_use]
    pub fn descriptors(self) -> Vec<Descriptor> {
        let service_name = self.service_name;
        self.members
            .into_iter()
            .filter_map(|(name, handler)| {
                resolve_member(&name).map(|m| {
                    Descriptor::new(service_name.clone(), m.message_name, m.queued, handler)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler;

    #[allow(non_camel_case_types)]
    struct someService;

    fn noop() -> SharedHandler {
        handler::from_envelope(|_| async {})
    }

    #[test]
    fn resolves_matching_members_only() {
        let descriptors = ServiceMethods::of::<someService>()
            .method("SubActionMessage", noop())
            .method("RepActionMessageQueue", noop())
            .method("helperFunction", noop())
            .descriptors();

        assert_eq!(descriptors.len(), 2);

        assert_eq!(descriptors[0].subject(), "someservice.subaction");
        assert!(!descriptors[0].queued());

        assert_eq!(descriptors[1].subject(), "someservice.repaction");
        assert!(descriptors[1].queued());
        assert_eq!(descriptors[1].queue_name(), "someservice_repaction");
    }

    #[test]
    fn explicit_name_is_lower_cased() {
        let methods = ServiceMethods::named("TimeService");
        assert_eq!(methods.service_name(), "timeservice");
    }

    #[test]
    fn bare_suffix_member_keeps_trailing_dot_subject() {
        let descriptors = ServiceMethods::named("svc")
            .method("Message", noop())
            .descriptors();

        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].subject(), "svc.");
    }
}
