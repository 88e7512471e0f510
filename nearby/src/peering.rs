//! Peering session state machine.
//!
//! Tracks the connection lifecycle to at most one peer endpoint and turns
//! transport callbacks into the small set of [`ConnectionState`]
//! transitions. The session registers itself as the transport listener, so
//! it must live behind an `Arc`; use [`PeeringSession::new`].

use crate::endpoint::Endpoint;
use crate::error::{NearbyError, Result};
use crate::state::ConnectionState;
use crate::transport::{
    AdvertisingListener, ConnectionResponder, ConnectionStatus, DiscoveryListener, Transport,
};
use logging::Logger;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

/// Accept/reject decision for an inbound connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDecision {
    Accept,
    Reject,
}

/// Callbacks the role layer registers with a peering session.
pub trait PeeringCallbacks: Send + Sync {
    /// The single active peer endpoint is established.
    fn on_peered(&self, endpoint: &Endpoint);

    /// A remote endpoint asks to connect while this device advertises.
    ///
    /// The decision is the user's; no timeout is enforced here.
    fn on_connection_request(&self, endpoint: &Endpoint) -> ConnectionDecision;

    /// Peering could not be established; the session is back to
    /// `Disconnected` and may be retried.
    fn on_peering_failed(&self, error: &NearbyError);
}

/// Lifecycle of the connection to a single peer.
pub struct PeeringSession {
    transport: Arc<dyn Transport>,
    service_id: String,
    window_ttl: Duration,
    callbacks: Arc<dyn PeeringCallbacks>,
    state: Mutex<ConnectionState>,
    peer: Mutex<Option<Endpoint>>,
    self_ref: Weak<PeeringSession>,
    logger: Logger,
}

impl PeeringSession {
    /// Creates a session over `transport` for the given service id.
    ///
    /// `window_ttl` bounds both the advertising and the discovery window.
    pub fn new(
        transport: Arc<dyn Transport>,
        service_id: String,
        window_ttl: Duration,
        callbacks: Arc<dyn PeeringCallbacks>,
        logger: Logger,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            transport,
            service_id,
            window_ttl,
            callbacks,
            state: Mutex::new(ConnectionState::Disconnected),
            peer: Mutex::new(None),
            self_ref: weak.clone(),
            logger: logger.tagged("peering"),
        })
    }

    /// Begins broadcasting the service id for the bounded window.
    ///
    /// # Errors
    ///
    /// `TransportUnavailable` when no local connectivity is present,
    /// `AlreadyAdvertising` when the window is already open.
    pub fn advertise(&self) -> Result<()> {
        if !self.transport.is_network_available() {
            self.logger.warn("advertise: no network connectivity");
            return Err(NearbyError::TransportUnavailable);
        }
        // Check and transition under one guard so concurrent callers
        // cannot both pass the check. State moves before the transport
        // call: the transport may deliver callbacks on this very call,
        // and those must observe the advertising window.
        {
            let mut state = self.lock_state();
            if *state == ConnectionState::Advertising {
                return Err(NearbyError::AlreadyAdvertising);
            }
            *state = ConnectionState::Advertising;
        }
        let listener: Arc<dyn AdvertisingListener> = self.strong();
        if let Err(error) =
            self.transport
                .start_advertising(&self.service_id, self.window_ttl, listener)
        {
            *self.lock_state() = ConnectionState::Disconnected;
            return Err(error);
        }
        self.logger.info("advertising started");
        Ok(())
    }

    /// Begins scanning for the service id for the bounded window.
    ///
    /// # Errors
    ///
    /// `TransportUnavailable` when no local connectivity is present,
    /// `AlreadyDiscovering` when the window is already open.
    pub fn discover(&self) -> Result<()> {
        if !self.transport.is_network_available() {
            self.logger.warn("discover: no network connectivity");
            return Err(NearbyError::TransportUnavailable);
        }
        {
            let mut state = self.lock_state();
            if *state == ConnectionState::Discovering {
                return Err(NearbyError::AlreadyDiscovering);
            }
            *state = ConnectionState::Discovering;
        }
        let listener: Arc<dyn DiscoveryListener> = self.strong();
        if let Err(error) =
            self.transport
                .start_discovery(&self.service_id, self.window_ttl, listener)
        {
            *self.lock_state() = ConnectionState::Disconnected;
            return Err(error);
        }
        self.logger.info("discovery started");
        Ok(())
    }

    /// Tears the session down. Idempotent; always ends `Disconnected`.
    pub fn disconnect(&self) {
        self.transport.stop_advertising();
        self.transport.stop_discovery();
        self.peer.lock().unwrap_or_else(|p| p.into_inner()).take();
        let mut state = self.lock_state();
        if *state != ConnectionState::Disconnected {
            self.logger.info("session disconnected");
        }
        *state = ConnectionState::Disconnected;
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.lock_state()
    }

    /// The active peer endpoint, if connected.
    pub fn peer(&self) -> Option<Endpoint> {
        self.peer
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn strong(&self) -> Arc<Self> {
        // The weak reference comes from `Arc::new_cyclic`, so it upgrades
        // for as long as `self` is alive.
        self.self_ref
            .upgrade()
            .unwrap_or_else(|| unreachable!("session listener outlived its Arc"))
    }

    fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn establish(&self, endpoint: Endpoint) {
        // Last writer wins: a new connection silently replaces any prior
        // peer endpoint.
        *self.peer.lock().unwrap_or_else(|p| p.into_inner()) = Some(endpoint.clone());
        *self.lock_state() = ConnectionState::Connected;
        self.logger.info(&format!("peered with {}", endpoint));
        self.callbacks.on_peered(&endpoint);
    }

    fn fail(&self, error: NearbyError) {
        *self.lock_state() = ConnectionState::Disconnected;
        self.logger.warn(&format!("peering failed: {}", error));
        self.callbacks.on_peering_failed(&error);
    }
}

impl AdvertisingListener for PeeringSession {
    fn on_connection_request(&self, endpoint: Endpoint) {
        self.logger
            .info(&format!("connection request from {}", endpoint));
        *self.lock_state() = ConnectionState::ConnectionRequested;

        match self.callbacks.on_connection_request(&endpoint) {
            ConnectionDecision::Accept => match self.transport.accept_connection(&endpoint.id) {
                Ok(()) => self.establish(endpoint),
                Err(error) => self.fail(error),
            },
            ConnectionDecision::Reject => {
                if let Err(error) = self.transport.reject_connection(&endpoint.id) {
                    self.logger.warn(&format!("reject failed: {}", error));
                }
                // Keep the advertising window open for the next request.
                *self.lock_state() = ConnectionState::Advertising;
            }
        }
    }
}

impl DiscoveryListener for PeeringSession {
    fn on_endpoint_found(&self, endpoint: Endpoint) {
        self.logger.info(&format!("endpoint found: {}", endpoint));
        *self.lock_state() = ConnectionState::ConnectionRequested;

        // The discovering side connects without user confirmation.
        let responder: Arc<dyn ConnectionResponder> = self.strong();
        if let Err(error) = self
            .transport
            .send_connection_request(&endpoint.id, responder)
        {
            self.fail(error);
        }
    }

    fn on_endpoint_lost(&self, endpoint_id: &str) {
        self.logger.debug(&format!("endpoint lost: {}", endpoint_id));
    }
}

impl ConnectionResponder for PeeringSession {
    fn on_connection_response(&self, endpoint: Endpoint, status: ConnectionStatus) {
        match status {
            ConnectionStatus::Accepted => self.establish(endpoint),
            ConnectionStatus::Rejected => self.fail(NearbyError::ConnectionRequestRejected),
            ConnectionStatus::Failed => {
                self.fail(NearbyError::PeeringFailed(format!(
                    "no response from {}",
                    endpoint.id
                )));
            }
        }
    }
}
