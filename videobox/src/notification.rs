//! Conditions surfaced to the host UI as user-facing notifications.

use camera::CameraError;
use nearby::NearbyError;
use std::fmt;
use std::path::PathBuf;

/// A condition the host UI should show to the user.
///
/// Peering and connectivity conditions are informational; the session
/// stays usable and the user may retry. Camera conditions arrive only
/// after the hardware resource has been fully torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// An inbound connection request was accepted.
    Connected,
    /// A recording finished and its file is complete.
    VideoSaved(PathBuf),
    /// The user declined the camera or microphone permission.
    PermissionsDenied,
    Peering(NearbyError),
    Camera(CameraError),
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Connected => write!(f, "successfully connected"),
            Notification::VideoSaved(path) => {
                write!(f, "video saved: {}", path.display())
            }
            Notification::PermissionsDenied => {
                write!(f, "camera and microphone permissions are required")
            }
            Notification::Peering(error) => write!(f, "{}", error),
            Notification::Camera(error) => write!(f, "{}", error),
        }
    }
}
