//! Error types for camera session operations.

use crate::lifecycle::CameraLifecycleState;
use std::fmt;

pub type Result<T> = std::result::Result<T, CameraError>;

/// Errors raised while driving the camera hardware lifecycle.
///
/// Hardware variants always imply the camera resource was fully torn down
/// (permit released, handle closed) before the error was reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The exclusive device permit was not acquired within the bounded wait.
    HardwareBusy,
    /// The device is already in use by another client.
    DeviceInUse,
    /// The platform limit on concurrently open devices is reached.
    TooManyDevicesInUse,
    /// Camera access is disabled by device policy.
    DeviceDisabledByPolicy,
    /// The device reported a fatal error.
    DeviceFatalError,
    /// The platform camera service is unavailable.
    ServiceUnavailable,
    /// The device was revoked externally while held.
    DeviceLost,
    /// Configuring the capture session failed; preview state is kept.
    CaptureConfigurationFailed,
    /// The camera API is not supported on this device.
    UnsupportedHardware,
    /// Operation invoked outside its valid lifecycle state (caller bug).
    InvalidState {
        operation: &'static str,
        state: CameraLifecycleState,
    },
    /// Other platform-level failure.
    Platform(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::HardwareBusy => write!(f, "timed out waiting for the camera permit"),
            CameraError::DeviceInUse => write!(f, "camera already in use"),
            CameraError::TooManyDevicesInUse => write!(f, "too many cameras in use"),
            CameraError::DeviceDisabledByPolicy => write!(f, "camera disabled by policy"),
            CameraError::DeviceFatalError => write!(f, "fatal camera device error"),
            CameraError::ServiceUnavailable => write!(f, "camera service unavailable"),
            CameraError::DeviceLost => write!(f, "camera device revoked externally"),
            CameraError::CaptureConfigurationFailed => {
                write!(f, "capture session configuration failed")
            }
            CameraError::UnsupportedHardware => write!(f, "camera API unsupported on this device"),
            CameraError::InvalidState { operation, state } => {
                write!(f, "{} invoked in invalid state {}", operation, state)
            }
            CameraError::Platform(msg) => write!(f, "platform error: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_state() {
        let err = CameraError::InvalidState {
            operation: "stop_recording",
            state: CameraLifecycleState::PreviewReady,
        };
        assert_eq!(
            err.to_string(),
            "stop_recording invoked in invalid state preview-ready"
        );
    }

    #[test]
    fn test_display_hardware_busy() {
        assert_eq!(
            CameraError::HardwareBusy.to_string(),
            "timed out waiting for the camera permit"
        );
    }
}
