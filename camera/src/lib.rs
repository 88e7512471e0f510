//! Exclusive camera session management for the source role.
//!
//! The physical camera is a single shared resource. This crate owns the
//! open → configure → preview → record → close lifecycle behind a
//! capacity-1 [`Permit`], computes capture geometry once per open, and
//! reports progress and failures over an event channel. Platform hardware
//! sits behind the [`CameraPlatform`] trait; a scripted [`fake`] platform
//! backs the tests.

pub mod error;
pub mod fake;
pub mod geometry;
pub mod hardware;
pub mod lifecycle;
pub mod permit;
pub mod session;

pub use error::{CameraError, Result};
pub use geometry::{CaptureGeometry, Rotation, Size};
pub use hardware::{
    CameraCharacteristics, CameraDevice, CameraPlatform, DeviceErrorKind, DeviceEvent,
    RecorderSettings, RecorderSink,
};
pub use lifecycle::CameraLifecycleState;
pub use permit::Permit;
pub use session::{CameraSessionConfig, CameraSessionEvent, CameraSessionManager};
