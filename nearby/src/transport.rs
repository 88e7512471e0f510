//! Transport capability surface consumed by the peering layer.
//!
//! The platform provides discovery/advertising of a service id, a
//! request/accept/reject connection handshake, and a publish/subscribe
//! primitive with a bounded visibility window. Delivery is asynchronous,
//! best-effort, at-least-once: payloads may be lost, duplicated, or
//! delayed up to the TTL.

use crate::endpoint::Endpoint;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a connection request reported to the requesting side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The remote side accepted; the connection is established.
    Accepted,
    /// The remote side rejected the request.
    Rejected,
    /// The request could not be delivered or the transport failed.
    Failed,
}

/// Callbacks delivered while advertising.
pub trait AdvertisingListener: Send + Sync {
    /// A remote endpoint found this device and asked to connect.
    fn on_connection_request(&self, endpoint: Endpoint);
}

/// Callbacks delivered while discovering.
pub trait DiscoveryListener: Send + Sync {
    fn on_endpoint_found(&self, endpoint: Endpoint);
    fn on_endpoint_lost(&self, endpoint_id: &str);
}

/// Callback for the response to an outbound connection request.
pub trait ConnectionResponder: Send + Sync {
    fn on_connection_response(&self, endpoint: Endpoint, status: ConnectionStatus);
}

/// Callbacks for the pub-sub message primitive.
pub trait SubscriptionListener: Send + Sync {
    /// A published payload became visible to this subscriber.
    fn on_message_found(&self, payload: &[u8]);
    /// A previously visible payload expired or was withdrawn.
    fn on_message_lost(&self, payload: &[u8]);
}

/// The discovery/pub-sub transport the peering layer drives.
///
/// Implementations deliver listener callbacks asynchronously, possibly on
/// threads other than the one that issued the call.
pub trait Transport: Send + Sync {
    /// True when local network connectivity is present.
    fn is_network_available(&self) -> bool;

    /// Begins broadcasting `service_id` for at most `ttl`.
    fn start_advertising(
        &self,
        service_id: &str,
        ttl: Duration,
        listener: Arc<dyn AdvertisingListener>,
    ) -> Result<()>;

    /// Withdraws the advertising window. No-op when not advertising.
    fn stop_advertising(&self);

    /// Begins scanning for `service_id` for at most `ttl`.
    fn start_discovery(
        &self,
        service_id: &str,
        ttl: Duration,
        listener: Arc<dyn DiscoveryListener>,
    ) -> Result<()>;

    /// Stops the discovery window. No-op when not discovering.
    fn stop_discovery(&self);

    /// Requests a connection to `endpoint_id`; the outcome arrives on
    /// `responder`.
    fn send_connection_request(
        &self,
        endpoint_id: &str,
        responder: Arc<dyn ConnectionResponder>,
    ) -> Result<()>;

    /// Accepts a pending inbound connection request from `endpoint_id`.
    fn accept_connection(&self, endpoint_id: &str) -> Result<()>;

    /// Rejects a pending inbound connection request from `endpoint_id`.
    fn reject_connection(&self, endpoint_id: &str) -> Result<()>;

    /// Publishes `payload`, visible to subscribers for at most `ttl`.
    ///
    /// A transport carries at most one publication per caller; publishing
    /// again replaces the previous payload.
    fn publish(&self, payload: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Withdraws the active publication. No-op when nothing is published.
    fn unpublish(&self);

    /// Registers interest in published payloads for at most `ttl`.
    fn subscribe(&self, listener: Arc<dyn SubscriptionListener>, ttl: Duration) -> Result<()>;

    /// Drops the subscription; no callbacks fire afterwards.
    fn unsubscribe(&self);
}
