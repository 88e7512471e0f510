//! Control-channel plumbing over the transport's pub-sub primitive.
//!
//! The protocol keeps at most one outstanding publication: publishing a
//! new message withdraws the previous one first, so a stale command never
//! lingers beside a fresh one within the TTL window. `shutdown()` is the
//! symmetric teardown and runs exactly once.

use crate::control_message::ControlMessage;
use logging::Logger;
use nearby::{Result, SubscriptionListener, Transport};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Receiver of decoded control messages.
///
/// Delivery is at-least-once; implementations must tolerate duplicates
/// of the same logical message.
pub trait MessageHandler: Send + Sync {
    fn on_control_message(&self, message: ControlMessage);
}

/// Encodes, publishes, and receives [`ControlMessage`]s for one session.
pub struct ControlProtocol {
    transport: Arc<dyn Transport>,
    publish_ttl: Duration,
    shut_down: AtomicBool,
    logger: Logger,
}

impl ControlProtocol {
    pub fn new(transport: Arc<dyn Transport>, publish_ttl: Duration, logger: Logger) -> Self {
        Self {
            transport,
            publish_ttl,
            shut_down: AtomicBool::new(false),
            logger: logger.tagged("protocol"),
        }
    }

    /// Publishes `message`, withdrawing any prior publication first.
    ///
    /// Once the channel is shut down the message is dropped: a payload
    /// published after teardown would linger until TTL expiry with
    /// nobody left to withdraw it.
    pub fn publish(&self, message: ControlMessage) -> Result<()> {
        if self.shut_down.load(Ordering::SeqCst) {
            self.logger
                .debug(&format!("dropping {:?} after shutdown", message));
            return Ok(());
        }
        self.transport.unpublish();
        self.transport.publish(message.encode(), self.publish_ttl)?;
        self.logger.info(&format!("published {:?}", message));
        Ok(())
    }

    /// Registers `handler` for incoming messages. Payloads that do not
    /// decode to a known kind are dropped without error.
    pub fn subscribe(&self, handler: Arc<dyn MessageHandler>) -> Result<()> {
        let listener: Arc<dyn SubscriptionListener> = Arc::new(DecodingListener {
            handler,
            logger: self.logger.clone(),
        });
        self.transport.subscribe(listener, self.publish_ttl)
    }

    /// Withdraws the publication and the subscription. Idempotent; only
    /// the first call reaches the transport.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.transport.unpublish();
        self.transport.unsubscribe();
        self.logger.info("control channel shut down");
    }
}

struct DecodingListener {
    handler: Arc<dyn MessageHandler>,
    logger: Logger,
}

impl SubscriptionListener for DecodingListener {
    fn on_message_found(&self, payload: &[u8]) {
        match ControlMessage::decode(payload) {
            Some(message) => self.handler.on_control_message(message),
            None => self
                .logger
                .debug(&format!("ignoring unknown payload {:?}", payload)),
        }
    }

    fn on_message_lost(&self, payload: &[u8]) {
        self.logger.debug(&format!("payload expired {:?}", payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::LogLevel;
    use nearby::LoopbackTransport;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct Collector {
        received: Mutex<Vec<ControlMessage>>,
    }

    impl Collector {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
            })
        }

        fn received(&self) -> Vec<ControlMessage> {
            self.received.lock().unwrap().clone()
        }
    }

    impl MessageHandler for Collector {
        fn on_control_message(&self, message: ControlMessage) {
            self.received.lock().unwrap().push(message);
        }
    }

    fn test_logger() -> Logger {
        let dir = tempdir().unwrap();
        Logger::new(dir.path().join("protocol.log"), LogLevel::Debug).unwrap()
    }

    fn pair() -> (ControlProtocol, ControlProtocol) {
        let (a, b) = LoopbackTransport::pair();
        let ttl = Duration::from_secs(180);
        (
            ControlProtocol::new(Arc::new(a), ttl, test_logger()),
            ControlProtocol::new(Arc::new(b), ttl, test_logger()),
        )
    }

    #[test]
    fn test_published_message_reaches_subscriber() {
        let (source, controller) = pair();
        let collector = Collector::new();
        controller.subscribe(collector.clone()).unwrap();

        source.publish(ControlMessage::Peered).unwrap();
        assert_eq!(collector.received(), vec![ControlMessage::Peered]);
    }

    #[test]
    fn test_new_publication_replaces_prior() {
        let (source, controller) = pair();
        let collector = Collector::new();
        controller.subscribe(collector.clone()).unwrap();

        source.publish(ControlMessage::Peered).unwrap();
        source.publish(ControlMessage::StartRecording).unwrap();
        assert_eq!(
            collector.received(),
            vec![ControlMessage::Peered, ControlMessage::StartRecording]
        );
    }

    #[test]
    fn test_garbage_payload_never_reaches_handler() {
        let (source, controller) = pair();
        let collector = Collector::new();
        controller.subscribe(collector.clone()).unwrap();

        // Raw transport publish bypassing the codec.
        source
            .transport
            .publish(vec![0xfe], Duration::from_secs(180))
            .unwrap();
        assert!(collector.received().is_empty());

        source.publish(ControlMessage::StopRecording).unwrap();
        assert_eq!(collector.received(), vec![ControlMessage::StopRecording]);
    }

    #[test]
    fn test_shutdown_stops_delivery_and_is_idempotent() {
        let (source, controller) = pair();
        let collector = Collector::new();
        controller.subscribe(collector.clone()).unwrap();

        controller.shutdown();
        controller.shutdown();

        source.publish(ControlMessage::Peered).unwrap();
        assert!(collector.received().is_empty());
    }

    #[test]
    fn test_publish_after_shutdown_leaves_no_publication() {
        let (source, controller) = pair();
        source.shutdown();
        source.publish(ControlMessage::Peered).unwrap();

        // A late subscriber would still see a leaked payload sitting in
        // its visibility window; there must be none.
        let collector = Collector::new();
        controller.subscribe(collector.clone()).unwrap();
        assert!(collector.received().is_empty());
    }
}
