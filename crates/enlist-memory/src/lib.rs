//! In-memory implementation of the enlist transport seam.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// The in-memory transport and its subscription handles.
pub mod transport;

pub use transport::{Error, MemorySubscriptionHandle, MemoryTransport};

#[cfg(test)]
mod tests {
    use super::MemoryTransport;

    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use bytes::Bytes;
    use enlist::handler::{self, Envelope, SharedHandler};
    use enlist::service::ServiceMethods;
    use enlist::subscriber::Subscriber;
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::Receiver;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    fn probe() -> (SharedHandler, Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(8);
        let handler = handler::from_envelope(move |envelope| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(envelope).await;
            }
        });
        (handler, rx)
    }

    async fn recv(rx: &mut Receiver<Envelope>) -> Envelope {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for delivery")
            .expect("probe channel closed")
    }

    async fn assert_silent(rx: &mut Receiver<Envelope>) {
        assert!(
            timeout(Duration::from_millis(100), rx.recv())
                .await
                .is_err(),
            "unexpected delivery"
        );
    }

    #[allow(non_camel_case_types)]
    struct someService;

    #[tokio::test]
    async fn service_members_receive_on_convention_subjects() {
        let transport = MemoryTransport::new();
        let subscriber = Subscriber::new(transport.clone(), CancellationToken::new());

        let (sub_handler, mut sub_rx) = probe();
        let (rep_handler, mut rep_rx) = probe();

        let outcomes = subscriber
            .subscribe_service(
                ServiceMethods::of::<someService>()
                    .method("SubActionMessage", sub_handler)
                    .method("RepActionMessageQueue", rep_handler)
                    .method("notAHandler", probe().0),
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));

        assert_eq!(
            transport
                .publish("someservice.subaction", Bytes::from_static(b"a"))
                .await,
            1
        );
        assert_eq!(
            transport
                .publish("someservice.repaction", Bytes::from_static(b"b"))
                .await,
            1
        );

        assert_eq!(recv(&mut sub_rx).await.payload, Bytes::from_static(b"a"));
        assert_eq!(recv(&mut rep_rx).await.payload, Bytes::from_static(b"b"));
    }

    #[tokio::test]
    async fn cancellation_unsubscribes_every_registration() {
        let transport = MemoryTransport::new();
        let cancel = CancellationToken::new();
        let subscriber = Subscriber::new(transport.clone(), cancel.clone());

        let (handler_a, mut rx_a) = probe();
        let mut entries = HashMap::new();
        entries.insert("alerts.cpu".to_string(), handler_a);
        entries.insert("alerts.mem".to_string(), probe().0);
        entries.insert("alerts.disk".to_string(), probe().0);

        let outcomes = subscriber.subscribe_map(entries, None).await;
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(transport.subscription_count().await, 3);

        cancel.cancel();
        assert!(subscriber.drain(Duration::from_secs(1)).await);

        assert_eq!(transport.subscription_count().await, 0);
        assert_eq!(
            transport.publish("alerts.cpu", Bytes::from_static(b"x")).await,
            0
        );
        assert_silent(&mut rx_a).await;
    }

    #[tokio::test]
    async fn queue_group_delivers_to_one_member_round_robin() {
        let transport = MemoryTransport::new();
        let subscriber = Subscriber::new(transport.clone(), CancellationToken::new());

        let (handler_a, mut rx_a) = probe();
        let (handler_b, mut rx_b) = probe();

        subscriber
            .register_queued("jobs.build", "workers", handler_a)
            .await
            .unwrap();
        subscriber
            .register_queued("jobs.build", "workers", handler_b)
            .await
            .unwrap();

        assert_eq!(
            transport.publish("jobs.build", Bytes::from_static(b"1")).await,
            1
        );
        assert_eq!(
            transport.publish("jobs.build", Bytes::from_static(b"2")).await,
            1
        );

        assert_eq!(recv(&mut rx_a).await.payload, Bytes::from_static(b"1"));
        assert_eq!(recv(&mut rx_b).await.payload, Bytes::from_static(b"2"));
        assert_silent(&mut rx_a).await;
        assert_silent(&mut rx_b).await;
    }

    #[tokio::test]
    async fn individual_subscribers_all_receive() {
        let transport = MemoryTransport::new();
        let subscriber = Subscriber::new(transport.clone(), CancellationToken::new());

        let (handler_a, mut rx_a) = probe();
        let (handler_b, mut rx_b) = probe();

        subscriber
            .register_individual("alerts.cpu", handler_a)
            .await
            .unwrap();
        subscriber
            .register_individual("alerts.cpu", handler_b)
            .await
            .unwrap();

        assert_eq!(
            transport.publish("alerts.cpu", Bytes::from_static(b"x")).await,
            2
        );
        assert_eq!(recv(&mut rx_a).await.subject, "alerts.cpu");
        assert_eq!(recv(&mut rx_b).await.subject, "alerts.cpu");
    }

    #[tokio::test]
    async fn rejected_subject_does_not_stop_the_batch() {
        let transport = MemoryTransport::new();
        transport.reject("someservice.subaction").await;
        let subscriber = Subscriber::new(transport.clone(), CancellationToken::new());

        let (rep_handler, mut rep_rx) = probe();
        let outcomes = subscriber
            .subscribe_service(
                ServiceMethods::of::<someService>()
                    .method("SubActionMessage", probe().0)
                    .method("RepActionMessageQueue", rep_handler),
            )
            .await;

        assert!(outcomes[0].result.is_err());
        assert!(outcomes[1].result.is_ok());
        assert_eq!(transport.subscription_count().await, 1);

        transport
            .publish("someservice.repaction", Bytes::from_static(b"ok"))
            .await;
        assert_eq!(recv(&mut rep_rx).await.payload, Bytes::from_static(b"ok"));
    }

    #[tokio::test]
    async fn map_with_shared_queue_registers_every_entry() {
        let transport = MemoryTransport::new();
        let subscriber = Subscriber::new(transport.clone(), CancellationToken::new());

        let (handler_a, mut rx_a) = probe();
        let (handler_b, mut rx_b) = probe();
        let mut entries = HashMap::new();
        entries.insert("jobs.build".to_string(), handler_a);
        entries.insert("jobs.test".to_string(), handler_b);

        let outcomes = subscriber.subscribe_map(entries, Some("workers")).await;
        assert!(outcomes.iter().all(|o| o.queue.as_deref() == Some("workers")));
        assert_eq!(transport.subscription_count().await, 2);

        transport.publish("jobs.build", Bytes::from_static(b"b")).await;
        transport.publish("jobs.test", Bytes::from_static(b"t")).await;

        assert_eq!(recv(&mut rx_a).await.payload, Bytes::from_static(b"b"));
        assert_eq!(recv(&mut rx_b).await.payload, Bytes::from_static(b"t"));
    }

    #[tokio::test]
    async fn handle_unsubscribes_at_most_once() {
        use enlist::transport::{SubscriptionHandle, Transport};

        let transport = MemoryTransport::new();
        let handle = transport
            .subscribe("alerts.cpu", probe().0)
            .await
            .unwrap();

        assert_eq!(transport.subscription_count().await, 1);
        handle.unsubscribe().await.unwrap();
        assert_eq!(transport.subscription_count().await, 0);
    }

    #[tokio::test]
    async fn watchers_fire_even_when_cancelled_before_drain_is_called() {
        let transport = MemoryTransport::new();
        let cancel = CancellationToken::new();
        let subscriber = Subscriber::new(transport.clone(), cancel.clone());

        let hits = Arc::new(AtomicUsize::new(0));
        for subject in ["a.one", "a.two", "a.three", "a.four"] {
            let hits = Arc::clone(&hits);
            let handler = handler::from_envelope(move |_| {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::Relaxed);
                }
            });
            subscriber.register_individual(subject, handler).await.unwrap();
        }
        assert_eq!(transport.subscription_count().await, 4);

        cancel.cancel();
        assert!(subscriber.drain(Duration::from_secs(1)).await);
        assert_eq!(transport.subscription_count().await, 0);
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }
}
