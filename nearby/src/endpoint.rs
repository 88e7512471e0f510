//! Remote endpoint identity.

/// A transport-level identifier for a remote peer.
///
/// Created from transport callbacks; the peering session keeps at most one
/// active endpoint at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Opaque transport identifier, unique within a discovery window.
    pub id: String,
    /// Human-readable device name shown in the accept prompt.
    pub name: String,
}

impl Endpoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
