//! Error types for peering and transport operations.

use std::fmt;

pub type Result<T> = std::result::Result<T, NearbyError>;

/// Errors raised by the transport seam and the peering session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NearbyError {
    /// No local network connectivity; the operation was not issued.
    TransportUnavailable,
    /// An advertising window is already open (informational).
    AlreadyAdvertising,
    /// A discovery window is already open (informational).
    AlreadyDiscovering,
    /// The remote peer rejected our connection request.
    ConnectionRequestRejected,
    /// Connection could not be established and no resolution is available.
    PeeringFailed(String),
    /// The endpoint id is not reachable on this transport.
    UnknownEndpoint(String),
    /// Transport-level failure.
    Transport(String),
}

impl fmt::Display for NearbyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NearbyError::TransportUnavailable => write!(f, "no local network connectivity"),
            NearbyError::AlreadyAdvertising => write!(f, "already advertising"),
            NearbyError::AlreadyDiscovering => write!(f, "already discovering"),
            NearbyError::ConnectionRequestRejected => {
                write!(f, "connection request rejected by peer")
            }
            NearbyError::PeeringFailed(msg) => write!(f, "peering failed: {}", msg),
            NearbyError::UnknownEndpoint(id) => write!(f, "unknown endpoint: {}", id),
            NearbyError::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for NearbyError {}

impl NearbyError {
    /// True for conditions the UI surfaces as info rather than failure.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            NearbyError::AlreadyAdvertising | NearbyError::AlreadyDiscovering
        )
    }
}
