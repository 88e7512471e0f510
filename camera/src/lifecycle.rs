//! Camera session lifecycle states.

/// Single source of truth for the camera session state machine.
///
/// Transitions are strictly sequential; there is no concurrent
/// `Opening` + `Recording`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraLifecycleState {
    /// No device held.
    #[default]
    Idle,
    /// Open issued, waiting for the device callback. The permit is held.
    Opening,
    /// Device open, repeating preview capture running.
    PreviewReady,
    /// Dual-target capture running, encoder active.
    Recording,
    /// Teardown in progress.
    Closing,
}

impl std::fmt::Display for CameraLifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Opening => write!(f, "opening"),
            Self::PreviewReady => write!(f, "preview-ready"),
            Self::Recording => write!(f, "recording"),
            Self::Closing => write!(f, "closing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(CameraLifecycleState::default(), CameraLifecycleState::Idle);
    }

    #[test]
    fn test_display() {
        assert_eq!(CameraLifecycleState::PreviewReady.to_string(), "preview-ready");
        assert_eq!(CameraLifecycleState::Recording.to_string(), "recording");
    }
}
