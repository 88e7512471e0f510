//! Platform hardware seam.
//!
//! The session manager drives camera hardware and the encoder sink
//! through these traits; the platform host provides the real
//! implementations, tests use [`crate::fake`].

use crate::error::Result;
use crate::geometry::Size;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

/// Static camera properties read before opening the device.
#[derive(Debug, Clone)]
pub struct CameraCharacteristics {
    /// Sensor mounting orientation in degrees (commonly 90 or 270).
    pub sensor_orientation: u32,
    /// Output sizes supported by the encoder sink, platform-ordered.
    pub recorder_sizes: Vec<Size>,
    /// Output sizes supported by the preview surface, platform-ordered.
    pub preview_sizes: Vec<Size>,
}

/// Failure classification reported by the device error callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    /// The device is held by another client.
    InUse,
    /// The platform limit on open devices is reached.
    MaxInUse,
    /// Access disabled by device policy.
    Disabled,
    /// Unrecoverable device fault.
    Fatal,
    /// The camera service itself is down.
    Service,
}

/// Asynchronous device lifecycle callbacks, delivered over a channel.
pub enum DeviceEvent {
    /// The device opened; ownership of the handle passes to the receiver.
    Opened(Box<dyn CameraDevice>),
    /// Opening failed or the open device faulted.
    Error(DeviceErrorKind),
    /// The device was revoked externally (platform preemption).
    Disconnected,
}

/// Entry point to the platform camera stack.
pub trait CameraPlatform: Send + Sync {
    /// Enumerates camera identifiers; the first one is used.
    fn camera_ids(&self) -> Result<Vec<String>>;

    /// Reads static characteristics for `camera_id`.
    fn characteristics(&self, camera_id: &str) -> Result<CameraCharacteristics>;

    /// Issues an asynchronous open request; the outcome arrives on
    /// `events`, possibly from another thread.
    fn open(&self, camera_id: &str, events: Sender<DeviceEvent>) -> Result<()>;

    /// Creates an unconfigured encoder sink.
    fn new_recorder(&self) -> Result<Box<dyn RecorderSink>>;
}

/// An open, exclusively held camera device.
pub trait CameraDevice: Send {
    /// Starts a repeating preview-only capture at the given size.
    fn start_preview(&mut self, preview: Size) -> Result<()>;

    /// Configures a dual-target capture session (preview surface plus
    /// encoder sink) and starts it.
    fn start_record_session(&mut self, preview: Size, sink: &mut dyn RecorderSink) -> Result<()>;

    /// Tears down the active capture session, if any.
    fn stop_session(&mut self);

    /// Releases the device handle.
    fn close(&mut self);
}

/// Fixed encoder parameters resolved at recording start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderSettings {
    pub recording: Size,
    /// Video bitrate in bits per second.
    pub bitrate: u32,
    pub frame_rate: u32,
    /// Output rotation in degrees, when the sensor mounting has one.
    pub orientation_hint: Option<u32>,
    /// MPEG-4 output file, H.264 video and AAC audio.
    pub output: PathBuf,
}

/// Encoder sink lifecycle (prepare → start → stop → reset → release).
pub trait RecorderSink: Send {
    fn prepare(&mut self, settings: &RecorderSettings) -> Result<()>;
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn reset(&mut self);
    fn release(&mut self);
}
