//! Local peering over a discovery/pub-sub transport.
//!
//! This crate owns the connection side of a videobox session: the
//! [`Transport`] seam consumed from the platform, the [`PeeringSession`]
//! state machine that turns transport callbacks into a single active peer,
//! and an in-memory [`LoopbackTransport`] used by tests.

pub mod endpoint;
pub mod error;
pub mod loopback;
pub mod peering;
pub mod state;
pub mod transport;

pub use endpoint::Endpoint;
pub use error::{NearbyError, Result};
pub use loopback::LoopbackTransport;
pub use peering::{ConnectionDecision, PeeringCallbacks, PeeringSession};
pub use state::ConnectionState;
pub use transport::{
    AdvertisingListener, ConnectionResponder, ConnectionStatus, DiscoveryListener,
    SubscriptionListener, Transport,
};
