//! Host UI collaborator surface.
//!
//! The core owns no screens. Everything a user sees or decides goes
//! through this trait, implemented by the embedding application.

use crate::notification::Notification;
use nearby::ConnectionDecision;

/// A runtime permission the source role needs before opening its camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Camera,
    Microphone,
}

/// Callbacks into the embedding application's UI.
///
/// Calls may arrive on transport or camera callback threads; the
/// implementation is responsible for marshalling to its own UI context.
pub trait HostUi: Send + Sync {
    /// The session connected to its peer.
    fn on_peered(&self);

    /// Asks the user whether to accept an inbound connection request
    /// from the named peer. No timeout is applied to the decision.
    fn present_peer_accept_prompt(&self, peer_name: &str) -> ConnectionDecision;

    /// Switches to the local camera surface (source role).
    fn show_camera(&self);

    /// Switches to the remote-control view (controller role).
    fn show_remote(&self);

    /// Shows a user-facing condition.
    fn notify(&self, notification: Notification);

    /// Requests runtime permissions; true when all were granted.
    fn request_permissions(&self, permissions: &[Permission]) -> bool;
}
