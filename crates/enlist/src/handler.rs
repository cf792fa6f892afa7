use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

/// A raw message as delivered by the transport.
///
/// The payload stays opaque bytes; decoding it is the handler's business.
#[derive(Clone, Debug)]
pub struct Envelope {
    /// The subject the message was published under.
    pub subject: String,
    /// The reply subject, if the publisher requested one.
    pub reply: Option<String>,
    /// The undecoded message payload.
    pub payload: Bytes,
}

/// A callable bound to a subscription.
///
/// Handlers are discovered and passed along as is; nothing here validates
/// what the callable does with the envelope.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    /// Handles one delivered message.
    async fn handle(&self, envelope: Envelope);
}

/// A shareable handler reference, as stored in descriptors and handed to the
/// transport.
pub type SharedHandler = Arc<dyn MessageHandler>;

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, envelope: Envelope) {
        (self.0)(envelope).await;
    }
}

/// Wraps a closure taking the raw envelope.
pub fn from_envelope<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Wraps a closure taking only the payload.
pub fn from_payload<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnHandler(move |envelope: Envelope| f(envelope.payload)))
}

/// Wraps a closure taking the subject and the payload.
pub fn from_subject_payload<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(String, Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnHandler(move |envelope: Envelope| {
        f(envelope.subject, envelope.payload)
    }))
}

/// Wraps a closure taking the subject, the reply subject and the payload.
pub fn from_subject_reply_payload<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(String, Option<String>, Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnHandler(move |envelope: Envelope| {
        f(envelope.subject, envelope.reply, envelope.payload)
    }))
}
