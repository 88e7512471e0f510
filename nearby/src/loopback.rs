//! In-memory transport wiring two session halves together.
//!
//! [`LoopbackTransport::pair`] returns two connected halves backed by a
//! shared hub. Callbacks fire synchronously on the calling thread, after
//! the hub lock is released, which keeps tests deterministic and lets a
//! listener call back into the transport. TTL arguments are accepted but
//! not timed out; `unpublish`/`unsubscribe` withdraw immediately.

use crate::endpoint::Endpoint;
use crate::error::{NearbyError, Result};
use crate::transport::{
    AdvertisingListener, ConnectionResponder, ConnectionStatus, DiscoveryListener,
    SubscriptionListener, Transport,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

#[derive(Default)]
struct Half {
    endpoint: Option<Endpoint>,
    advertising: Option<Arc<dyn AdvertisingListener>>,
    discovering: Option<Arc<dyn DiscoveryListener>>,
    responder: Option<Arc<dyn ConnectionResponder>>,
    subscriber: Option<Arc<dyn SubscriptionListener>>,
    publication: Option<Vec<u8>>,
}

struct Hub {
    a: Half,
    b: Half,
}

impl Hub {
    fn half(&mut self, side: Side) -> &mut Half {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }
}

/// One half of an in-memory transport pair.
pub struct LoopbackTransport {
    side: Side,
    local: Endpoint,
    hub: Arc<Mutex<Hub>>,
    network_up: AtomicBool,
}

impl LoopbackTransport {
    /// Creates two connected halves named `device-a` and `device-b`.
    pub fn pair() -> (LoopbackTransport, LoopbackTransport) {
        Self::pair_named("device-a", "device-b")
    }

    /// Creates two connected halves with the given device names.
    pub fn pair_named(name_a: &str, name_b: &str) -> (LoopbackTransport, LoopbackTransport) {
        let endpoint_a = Endpoint::new(format!("ep-{:08x}", rand::random::<u32>()), name_a);
        let endpoint_b = Endpoint::new(format!("ep-{:08x}", rand::random::<u32>()), name_b);

        let hub = Arc::new(Mutex::new(Hub {
            a: Half {
                endpoint: Some(endpoint_a.clone()),
                ..Half::default()
            },
            b: Half {
                endpoint: Some(endpoint_b.clone()),
                ..Half::default()
            },
        }));

        let a = LoopbackTransport {
            side: Side::A,
            local: endpoint_a,
            hub: Arc::clone(&hub),
            network_up: AtomicBool::new(true),
        };
        let b = LoopbackTransport {
            side: Side::B,
            local: endpoint_b,
            hub,
            network_up: AtomicBool::new(true),
        };
        (a, b)
    }

    /// The endpoint identity this half presents to the other side.
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.local
    }

    /// Test hook simulating loss of local connectivity.
    pub fn set_network_available(&self, available: bool) {
        self.network_up.store(available, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Hub> {
        self.hub.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remote_side_of(&self, hub: &mut Hub, endpoint_id: &str) -> Result<Side> {
        let other = self.side.other();
        let matches = hub
            .half(other)
            .endpoint
            .as_ref()
            .is_some_and(|endpoint| endpoint.id == endpoint_id);
        if matches {
            Ok(other)
        } else {
            Err(NearbyError::UnknownEndpoint(endpoint_id.to_string()))
        }
    }
}

impl Transport for LoopbackTransport {
    fn is_network_available(&self) -> bool {
        self.network_up.load(Ordering::SeqCst)
    }

    fn start_advertising(
        &self,
        _service_id: &str,
        _ttl: Duration,
        listener: Arc<dyn AdvertisingListener>,
    ) -> Result<()> {
        let found = {
            let mut hub = self.lock();
            if hub.half(self.side).advertising.is_some() {
                return Err(NearbyError::AlreadyAdvertising);
            }
            hub.half(self.side).advertising = Some(listener);
            // A peer already scanning sees the new advertisement at once.
            hub.half(self.side.other())
                .discovering
                .clone()
                .map(|discoverer| (discoverer, self.local.clone()))
        };
        if let Some((discoverer, endpoint)) = found {
            discoverer.on_endpoint_found(endpoint);
        }
        Ok(())
    }

    fn stop_advertising(&self) {
        self.lock().half(self.side).advertising = None;
    }

    fn start_discovery(
        &self,
        _service_id: &str,
        _ttl: Duration,
        listener: Arc<dyn DiscoveryListener>,
    ) -> Result<()> {
        let found = {
            let mut hub = self.lock();
            if hub.half(self.side).discovering.is_some() {
                return Err(NearbyError::AlreadyDiscovering);
            }
            hub.half(self.side).discovering = Some(Arc::clone(&listener));
            let other = hub.half(self.side.other());
            if other.advertising.is_some() {
                other.endpoint.clone()
            } else {
                None
            }
        };
        if let Some(endpoint) = found {
            listener.on_endpoint_found(endpoint);
        }
        Ok(())
    }

    fn stop_discovery(&self) {
        self.lock().half(self.side).discovering = None;
    }

    fn send_connection_request(
        &self,
        endpoint_id: &str,
        responder: Arc<dyn ConnectionResponder>,
    ) -> Result<()> {
        let delivery = {
            let mut hub = self.lock();
            let target = self.remote_side_of(&mut hub, endpoint_id)?;
            hub.half(self.side).responder = Some(Arc::clone(&responder));
            hub.half(target)
                .advertising
                .clone()
                .map(|advertiser| (advertiser, self.local.clone()))
        };
        match delivery {
            Some((advertiser, requester)) => {
                advertiser.on_connection_request(requester);
                Ok(())
            }
            None => {
                // Nobody advertising behind that endpoint anymore.
                responder.on_connection_response(
                    Endpoint::new(endpoint_id, ""),
                    ConnectionStatus::Failed,
                );
                Ok(())
            }
        }
    }

    fn accept_connection(&self, endpoint_id: &str) -> Result<()> {
        let delivery = {
            let mut hub = self.lock();
            let requester = self.remote_side_of(&mut hub, endpoint_id)?;
            hub.half(requester)
                .responder
                .take()
                .map(|responder| (responder, self.local.clone()))
        };
        if let Some((responder, endpoint)) = delivery {
            responder.on_connection_response(endpoint, ConnectionStatus::Accepted);
        }
        Ok(())
    }

    fn reject_connection(&self, endpoint_id: &str) -> Result<()> {
        let delivery = {
            let mut hub = self.lock();
            let requester = self.remote_side_of(&mut hub, endpoint_id)?;
            hub.half(requester)
                .responder
                .take()
                .map(|responder| (responder, self.local.clone()))
        };
        if let Some((responder, endpoint)) = delivery {
            responder.on_connection_response(endpoint, ConnectionStatus::Rejected);
        }
        Ok(())
    }

    fn publish(&self, payload: Vec<u8>, _ttl: Duration) -> Result<()> {
        let delivery = {
            let mut hub = self.lock();
            hub.half(self.side).publication = Some(payload.clone());
            hub.half(self.side.other()).subscriber.clone()
        };
        if let Some(subscriber) = delivery {
            subscriber.on_message_found(&payload);
        }
        Ok(())
    }

    fn unpublish(&self) {
        self.lock().half(self.side).publication = None;
    }

    fn subscribe(&self, listener: Arc<dyn SubscriptionListener>, _ttl: Duration) -> Result<()> {
        let pending = {
            let mut hub = self.lock();
            hub.half(self.side).subscriber = Some(Arc::clone(&listener));
            // A publication still inside its visibility window is delivered
            // to late subscribers.
            hub.half(self.side.other()).publication.clone()
        };
        if let Some(payload) = pending {
            listener.on_message_found(&payload);
        }
        Ok(())
    }

    fn unsubscribe(&self) {
        self.lock().half(self.side).subscriber = None;
    }
}
