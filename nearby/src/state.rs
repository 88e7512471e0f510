//! Peering session connection states.

/// Lifecycle of the connection to the single peer endpoint.
///
/// Transitions are driven by transport callbacks or explicit API calls,
/// never by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No session activity.
    #[default]
    Disconnected,
    /// Broadcasting the service id, waiting to be found.
    Advertising,
    /// Scanning for the service id.
    Discovering,
    /// A connection request is in flight (either direction).
    ConnectionRequested,
    /// A peer endpoint is established.
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Advertising => write!(f, "advertising"),
            Self::Discovering => write!(f, "discovering"),
            Self::ConnectionRequested => write!(f, "connection-requested"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::Advertising.to_string(), "advertising");
        assert_eq!(
            ConnectionState::ConnectionRequested.to_string(),
            "connection-requested"
        );
    }
}
