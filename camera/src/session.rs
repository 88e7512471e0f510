//! Exclusive camera session manager.
//!
//! Owns the camera hardware handle on the source device and drives the
//! open → preview → record → close lifecycle. The capacity-1 [`Permit`]
//! guards the opening race: `open()` holds it from acquisition until the
//! device callback settles, and `close()` acquires it blocking, so a
//! teardown issued mid-open waits for the in-flight open to resolve.
//! Progress and failures are reported over the event channel given at
//! construction; device callbacks arriving after teardown are ignored.

use crate::error::{CameraError, Result};
use crate::geometry::{
    CaptureGeometry, Rotation, choose_optimal_size, choose_recording_size, orientation_hint,
};
use crate::hardware::{
    CameraDevice, CameraPlatform, DeviceErrorKind, DeviceEvent, RecorderSettings, RecorderSink,
};
use crate::lifecycle::CameraLifecycleState;
use crate::permit::Permit;
use chrono::Utc;
use logging::Logger;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// Fixed parameters of a camera session.
#[derive(Debug, Clone)]
pub struct CameraSessionConfig {
    /// Bounded wait for the device permit before `HardwareBusy`.
    pub open_timeout: Duration,
    /// Video bitrate in bits per second.
    pub bitrate: u32,
    pub frame_rate: u32,
    /// Directory receiving `<epoch millis>.mp4` recording artifacts.
    pub media_dir: PathBuf,
}

impl Default for CameraSessionConfig {
    fn default() -> Self {
        Self {
            open_timeout: Duration::from_millis(2500),
            bitrate: 10_000_000,
            frame_rate: 30,
            media_dir: std::env::temp_dir(),
        }
    }
}

/// Progress reported upward to the role layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSessionEvent {
    /// The device opened and the repeating preview capture runs.
    PreviewStarted,
    /// The encoder runs; the artifact is being written.
    RecordingStarted(PathBuf),
    /// The artifact is complete; preview capture restarted.
    RecordingStopped(PathBuf),
    /// A hardware failure after full teardown of the camera resource.
    Failed(CameraError),
}

struct Inner {
    state: CameraLifecycleState,
    geometry: Option<CaptureGeometry>,
    device: Option<Box<dyn CameraDevice>>,
    recorder: Option<Box<dyn RecorderSink>>,
    artifact: Option<PathBuf>,
}

/// Exclusive owner of the camera hardware handle.
pub struct CameraSessionManager {
    platform: Arc<dyn CameraPlatform>,
    config: CameraSessionConfig,
    permit: Arc<Permit>,
    inner: Arc<Mutex<Inner>>,
    events: Sender<CameraSessionEvent>,
    logger: Logger,
}

impl CameraSessionManager {
    /// Creates a manager over `platform`.
    ///
    /// `permit` is shared between every session that may touch the same
    /// physical device; at most one open handle exists per permit.
    pub fn new(
        platform: Arc<dyn CameraPlatform>,
        config: CameraSessionConfig,
        permit: Arc<Permit>,
        events: Sender<CameraSessionEvent>,
        logger: Logger,
    ) -> Self {
        Self {
            platform,
            config,
            permit,
            inner: Arc::new(Mutex::new(Inner {
                state: CameraLifecycleState::Idle,
                geometry: None,
                device: None,
                recorder: None,
                artifact: None,
            })),
            events,
            logger: logger.tagged("camera"),
        }
    }

    /// Acquires the device permit and issues an asynchronous open sized
    /// for a view of `view_width` x `view_height`.
    ///
    /// The outcome arrives on the event channel: `PreviewStarted` on
    /// success, `Failed` with a classified error otherwise.
    ///
    /// # Errors
    ///
    /// `HardwareBusy` when the permit is not acquired within the bounded
    /// wait; `InvalidState` when the session is not idle. Any failure
    /// before the open request releases the permit.
    pub fn open(&self, view_width: u32, view_height: u32) -> Result<()> {
        {
            let inner = self.lock_inner();
            if inner.state != CameraLifecycleState::Idle {
                return Err(CameraError::InvalidState {
                    operation: "open",
                    state: inner.state,
                });
            }
        }

        if !self.permit.try_acquire(self.config.open_timeout) {
            self.logger.warn("open: permit wait timed out");
            return Err(CameraError::HardwareBusy);
        }

        match self.begin_open(view_width, view_height) {
            Ok(()) => Ok(()),
            Err(error) => {
                // The permit must come back on every failed exit path.
                self.lock_inner().state = CameraLifecycleState::Idle;
                self.permit.release();
                self.logger.error(&format!("open failed: {}", error));
                Err(error)
            }
        }
    }

    fn begin_open(&self, view_width: u32, view_height: u32) -> Result<()> {
        let ids = self.platform.camera_ids()?;
        let camera_id = ids
            .first()
            .ok_or(CameraError::ServiceUnavailable)?
            .clone();
        let characteristics = self.platform.characteristics(&camera_id)?;

        let recording = choose_recording_size(&characteristics.recorder_sizes)
            .ok_or(CameraError::UnsupportedHardware)?;
        let preview = choose_optimal_size(
            &characteristics.preview_sizes,
            view_width,
            view_height,
            recording,
        )
        .ok_or(CameraError::UnsupportedHardware)?;
        let geometry = CaptureGeometry {
            preview,
            recording,
            sensor_orientation: characteristics.sensor_orientation,
        };

        {
            let mut inner = self.lock_inner();
            inner.geometry = Some(geometry);
            inner.state = CameraLifecycleState::Opening;
        }

        let (tx, rx) = channel();
        self.spawn_event_loop(rx)?;
        self.platform.open(&camera_id, tx)?;
        self.logger.info(&format!(
            "opening camera {}: preview {}, recording {}",
            camera_id, geometry.preview, geometry.recording
        ));
        Ok(())
    }

    fn spawn_event_loop(&self, rx: Receiver<DeviceEvent>) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        let permit = Arc::clone(&self.permit);
        let events = self.events.clone();
        let logger = self.logger.clone();
        thread::Builder::new()
            .name("camera-events".to_string())
            .spawn(move || {
                for event in rx {
                    handle_device_event(&inner, &permit, &events, &logger, event);
                }
            })
            .map_err(|e| CameraError::Platform(format!("failed to spawn event thread: {}", e)))?;
        Ok(())
    }

    /// Tears down the preview capture, configures the dual-target record
    /// session, and starts the encoder.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside `PreviewReady`;
    /// `CaptureConfigurationFailed` when the session or encoder cannot be
    /// configured, in which case the plain preview is restarted and the
    /// state stays `PreviewReady`.
    pub fn start_recording(&self, rotation: Rotation) -> Result<()> {
        let mut inner = self.lock_inner();
        if inner.state != CameraLifecycleState::PreviewReady {
            return Err(CameraError::InvalidState {
                operation: "start_recording",
                state: inner.state,
            });
        }
        let geometry = inner
            .geometry
            .ok_or(CameraError::Platform("no capture geometry".to_string()))?;

        let output = self
            .config
            .media_dir
            .join(format!("{}.mp4", Utc::now().timestamp_millis()));
        let settings = RecorderSettings {
            recording: geometry.recording,
            bitrate: self.config.bitrate,
            frame_rate: self.config.frame_rate,
            orientation_hint: orientation_hint(geometry.sensor_orientation, rotation),
            output: output.clone(),
        };

        let mut recorder = self.platform.new_recorder()?;
        let device = inner
            .device
            .as_mut()
            .ok_or(CameraError::Platform("no open device".to_string()))?;
        device.stop_session();

        let mut configured = recorder.prepare(&settings);
        if configured.is_ok() {
            configured = device.start_record_session(geometry.preview, recorder.as_mut());
        }
        if configured.is_ok() {
            configured = recorder.start();
        }
        if let Err(error) = configured {
            recorder.release();
            // Stay in preview after a failed configuration.
            let _ = device.start_preview(geometry.preview);
            self.logger
                .warn(&format!("record session configuration failed: {}", error));
            return Err(CameraError::CaptureConfigurationFailed);
        }

        inner.recorder = Some(recorder);
        inner.artifact = Some(output.clone());
        inner.state = CameraLifecycleState::Recording;
        drop(inner);
        self.logger
            .info(&format!("recording to {}", output.display()));
        let _ = self
            .events
            .send(CameraSessionEvent::RecordingStarted(output));
        Ok(())
    }

    /// Stops the encoder, reports the finished artifact path, and
    /// restarts the plain preview capture.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside `Recording`.
    pub fn stop_recording(&self) -> Result<PathBuf> {
        let mut inner = self.lock_inner();
        if inner.state != CameraLifecycleState::Recording {
            return Err(CameraError::InvalidState {
                operation: "stop_recording",
                state: inner.state,
            });
        }

        if let Some(mut recorder) = inner.recorder.take() {
            if let Err(error) = recorder.stop() {
                self.logger.warn(&format!("encoder stop failed: {}", error));
            }
            recorder.reset();
            recorder.release();
        }

        let artifact = inner
            .artifact
            .take()
            .ok_or(CameraError::Platform("no recording artifact".to_string()))?;

        let geometry = inner
            .geometry
            .ok_or(CameraError::Platform("no capture geometry".to_string()))?;
        if let Some(device) = inner.device.as_mut() {
            device.stop_session();
            if let Err(error) = device.start_preview(geometry.preview) {
                self.logger
                    .warn(&format!("preview restart failed: {}", error));
            }
        }

        inner.state = CameraLifecycleState::PreviewReady;
        drop(inner);
        self.logger
            .info(&format!("recording saved: {}", artifact.display()));
        let _ = self
            .events
            .send(CameraSessionEvent::RecordingStopped(artifact.clone()));
        Ok(artifact)
    }

    /// Tears everything down and returns to `Idle`.
    ///
    /// Safe from any state. When an open is in flight, this blocks on the
    /// permit until the device callback settles, then releases the
    /// resources that callback produced.
    pub fn close(&self) {
        self.permit.acquire();
        {
            let mut inner = self.lock_inner();
            inner.state = CameraLifecycleState::Closing;
            if let Some(mut recorder) = inner.recorder.take() {
                recorder.reset();
                recorder.release();
            }
            if let Some(mut device) = inner.device.take() {
                device.stop_session();
                device.close();
            }
            inner.geometry = None;
            inner.artifact = None;
            inner.state = CameraLifecycleState::Idle;
        }
        self.permit.release();
        self.logger.info("camera session closed");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CameraLifecycleState {
        self.lock_inner().state
    }

    /// Geometry resolved by the last open, if any.
    pub fn geometry(&self) -> Option<CaptureGeometry> {
        self.lock_inner().geometry
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Applies one device callback to the session state.
///
/// Runs on the event thread. The permit is released exactly when the
/// state leaves `Opening`, matching the acquisition in `open()`.
fn handle_device_event(
    inner: &Arc<Mutex<Inner>>,
    permit: &Arc<Permit>,
    events: &Sender<CameraSessionEvent>,
    logger: &Logger,
    event: DeviceEvent,
) {
    let mut guard = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match event {
        DeviceEvent::Opened(mut device) => {
            if guard.state != CameraLifecycleState::Opening {
                // Teardown already happened; the handle is not ours to keep.
                logger.debug("stale open callback ignored");
                device.close();
                return;
            }
            let Some(geometry) = guard.geometry else {
                device.close();
                guard.state = CameraLifecycleState::Idle;
                permit.release();
                return;
            };
            match device.start_preview(geometry.preview) {
                Ok(()) => {
                    guard.device = Some(device);
                    guard.state = CameraLifecycleState::PreviewReady;
                    drop(guard);
                    permit.release();
                    logger.info("preview started");
                    let _ = events.send(CameraSessionEvent::PreviewStarted);
                }
                Err(error) => {
                    device.close();
                    guard.state = CameraLifecycleState::Idle;
                    drop(guard);
                    permit.release();
                    logger.error(&format!("preview start failed: {}", error));
                    let _ = events.send(CameraSessionEvent::Failed(error));
                }
            }
        }
        DeviceEvent::Error(kind) => {
            if guard.state == CameraLifecycleState::Idle {
                logger.debug("stale error callback ignored");
                return;
            }
            teardown_on_failure(&mut guard, permit);
            drop(guard);
            let error = classify_device_error(kind);
            logger.error(&format!("device error: {}", error));
            let _ = events.send(CameraSessionEvent::Failed(error));
        }
        DeviceEvent::Disconnected => {
            if guard.state == CameraLifecycleState::Idle {
                logger.debug("stale disconnect callback ignored");
                return;
            }
            teardown_on_failure(&mut guard, permit);
            drop(guard);
            logger.warn("device revoked externally");
            let _ = events.send(CameraSessionEvent::Failed(CameraError::DeviceLost));
        }
    }
}

/// Full hardware teardown before a failure is reported upward.
fn teardown_on_failure(guard: &mut Inner, permit: &Arc<Permit>) {
    let was_opening = guard.state == CameraLifecycleState::Opening;
    if let Some(mut recorder) = guard.recorder.take() {
        recorder.reset();
        recorder.release();
    }
    if let Some(mut device) = guard.device.take() {
        device.stop_session();
        device.close();
    }
    guard.geometry = None;
    guard.artifact = None;
    guard.state = CameraLifecycleState::Idle;
    if was_opening {
        permit.release();
    }
}

fn classify_device_error(kind: DeviceErrorKind) -> CameraError {
    match kind {
        DeviceErrorKind::InUse => CameraError::DeviceInUse,
        DeviceErrorKind::MaxInUse => CameraError::TooManyDevicesInUse,
        DeviceErrorKind::Disabled => CameraError::DeviceDisabledByPolicy,
        DeviceErrorKind::Fatal => CameraError::DeviceFatalError,
        DeviceErrorKind::Service => CameraError::ServiceUnavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakePlatform, OpenMode};
    use crate::geometry::Size;
    use crate::hardware::CameraCharacteristics;
    use logging::LogLevel;
    use std::sync::mpsc::Receiver;
    use std::time::Instant;
    use tempfile::tempdir;

    fn test_logger() -> Logger {
        let dir = tempdir().unwrap();
        Logger::new(dir.path().join("camera.log"), LogLevel::Debug).unwrap()
    }

    fn manager(
        platform: &Arc<FakePlatform>,
        permit: &Arc<Permit>,
        open_timeout: Duration,
    ) -> (CameraSessionManager, Receiver<CameraSessionEvent>) {
        let (tx, rx) = channel();
        let config = CameraSessionConfig {
            open_timeout,
            ..CameraSessionConfig::default()
        };
        let manager = CameraSessionManager::new(
            Arc::clone(platform) as Arc<dyn CameraPlatform>,
            config,
            Arc::clone(permit),
            tx,
            test_logger(),
        );
        (manager, rx)
    }

    fn wait_for_state(manager: &CameraSessionManager, state: CameraLifecycleState) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while manager.state() != state {
            assert!(Instant::now() < deadline, "timed out waiting for {}", state);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_default_open_timeout_matches_contract() {
        let config = CameraSessionConfig::default();
        assert_eq!(config.open_timeout, Duration::from_millis(2500));
        assert_eq!(config.bitrate, 10_000_000);
        assert_eq!(config.frame_rate, 30);
    }

    #[test]
    fn test_open_reaches_preview_ready() {
        let platform = Arc::new(FakePlatform::new());
        let permit = Arc::new(Permit::new());
        let (manager, rx) = manager(&platform, &permit, Duration::from_millis(200));

        manager.open(600, 450).unwrap();
        wait_for_state(&manager, CameraLifecycleState::PreviewReady);

        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            CameraSessionEvent::PreviewStarted);
        let geometry = manager.geometry().unwrap();
        assert_eq!(geometry.recording, Size::new(640, 480));
        assert_eq!(geometry.preview, Size::new(640, 480));
        assert!(platform.journal_contains("device: preview 640x480"));

        // The permit returned once the open settled.
        assert!(permit.try_acquire(Duration::from_millis(10)));
        permit.release();
        manager.close();
    }

    #[test]
    fn test_open_outside_idle_is_invalid_state() {
        let platform = Arc::new(FakePlatform::new());
        let permit = Arc::new(Permit::new());
        let (manager, _rx) = manager(&platform, &permit, Duration::from_millis(200));

        manager.open(600, 450).unwrap();
        wait_for_state(&manager, CameraLifecycleState::PreviewReady);
        let second = manager.open(600, 450);
        assert!(matches!(
            second,
            Err(CameraError::InvalidState { operation: "open", .. })
        ));
        manager.close();
    }

    #[test]
    fn test_concurrent_open_times_out_with_hardware_busy() {
        let platform = Arc::new(FakePlatform::new());
        platform.set_open_mode(OpenMode::Stall);
        let permit = Arc::new(Permit::new());
        let (first, _rx1) = manager(&platform, &permit, Duration::from_millis(100));
        let (second, _rx2) = manager(&platform, &permit, Duration::from_millis(100));

        first.open(600, 450).unwrap();
        // The stalled open still holds the shared permit.
        let start = Instant::now();
        assert_eq!(second.open(600, 450), Err(CameraError::HardwareBusy));
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(platform.open_calls(), 1);
    }

    #[test]
    fn test_open_error_classified_and_torn_down() {
        let platform = Arc::new(FakePlatform::new());
        platform.set_open_mode(OpenMode::Fail(DeviceErrorKind::InUse));
        let permit = Arc::new(Permit::new());
        let (manager, rx) = manager(&platform, &permit, Duration::from_millis(200));

        manager.open(600, 450).unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            CameraSessionEvent::Failed(CameraError::DeviceInUse)
        );
        wait_for_state(&manager, CameraLifecycleState::Idle);

        // Permit came back with the teardown; a retry can proceed.
        platform.set_open_mode(OpenMode::Succeed);
        manager.open(600, 450).unwrap();
        wait_for_state(&manager, CameraLifecycleState::PreviewReady);
        manager.close();
    }

    #[test]
    fn test_external_disconnect_reports_device_lost() {
        let platform = Arc::new(FakePlatform::new());
        platform.set_open_mode(OpenMode::Disconnect);
        let permit = Arc::new(Permit::new());
        let (manager, rx) = manager(&platform, &permit, Duration::from_millis(200));

        manager.open(600, 450).unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            CameraSessionEvent::Failed(CameraError::DeviceLost)
        );
        assert_eq!(manager.state(), CameraLifecycleState::Idle);
    }

    #[test]
    fn test_recording_round_trip() {
        let platform = Arc::new(FakePlatform::new());
        let permit = Arc::new(Permit::new());
        let (manager, rx) = manager(&platform, &permit, Duration::from_millis(200));

        manager.open(600, 450).unwrap();
        wait_for_state(&manager, CameraLifecycleState::PreviewReady);
        let _ = rx.recv_timeout(Duration::from_secs(1)).unwrap();

        manager.start_recording(Rotation::Deg90).unwrap();
        assert_eq!(manager.state(), CameraLifecycleState::Recording);
        // Default sensor at 90 degrees, device rotated 90: hint is 0.
        assert!(platform.journal_contains("hint Some(0)"));
        assert!(platform.journal_contains("recorder: started"));
        let started = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        let CameraSessionEvent::RecordingStarted(path) = started else {
            panic!("expected RecordingStarted, got {:?}", started);
        };
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp4"));

        let artifact = manager.stop_recording().unwrap();
        assert_eq!(artifact, path);
        assert_eq!(manager.state(), CameraLifecycleState::PreviewReady);
        assert!(platform.journal_contains("recorder: stopped"));
        manager.close();
        assert!(platform.journal_contains("device: closed"));
    }

    #[test]
    fn test_stop_recording_in_preview_is_invalid_state() {
        let platform = Arc::new(FakePlatform::new());
        let permit = Arc::new(Permit::new());
        let (manager, _rx) = manager(&platform, &permit, Duration::from_millis(200));

        manager.open(600, 450).unwrap();
        wait_for_state(&manager, CameraLifecycleState::PreviewReady);

        let result = manager.stop_recording();
        assert!(matches!(
            result,
            Err(CameraError::InvalidState {
                operation: "stop_recording",
                state: CameraLifecycleState::PreviewReady,
            })
        ));
        assert_eq!(manager.state(), CameraLifecycleState::PreviewReady);
        manager.close();
    }

    #[test]
    fn test_record_configuration_failure_keeps_preview() {
        let platform = Arc::new(FakePlatform::new());
        platform.set_record_session_fails(true);
        let permit = Arc::new(Permit::new());
        let (manager, _rx) = manager(&platform, &permit, Duration::from_millis(200));

        manager.open(600, 450).unwrap();
        wait_for_state(&manager, CameraLifecycleState::PreviewReady);

        let result = manager.start_recording(Rotation::Deg0);
        assert_eq!(result, Err(CameraError::CaptureConfigurationFailed));
        assert_eq!(manager.state(), CameraLifecycleState::PreviewReady);
        assert!(platform.journal_contains("recorder: released"));
        manager.close();
    }

    #[test]
    fn test_close_waits_for_inflight_open() {
        let platform = Arc::new(FakePlatform::new());
        platform.set_open_delay(Duration::from_millis(50));
        let permit = Arc::new(Permit::new());
        let (manager, _rx) = manager(&platform, &permit, Duration::from_millis(200));

        manager.open(600, 450).unwrap();
        assert_eq!(manager.state(), CameraLifecycleState::Opening);
        // Blocks until the delayed open settles, then tears down.
        manager.close();
        assert_eq!(manager.state(), CameraLifecycleState::Idle);
        assert!(platform.journal_contains("device: closed"));
    }

    #[test]
    fn test_callback_after_teardown_is_ignored() {
        let platform = Arc::new(FakePlatform::new());
        let permit = Arc::new(Permit::new());
        let (manager, rx) = manager(&platform, &permit, Duration::from_millis(200));

        manager.open(600, 450).unwrap();
        wait_for_state(&manager, CameraLifecycleState::PreviewReady);
        let _ = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        manager.close();

        platform.emit(DeviceEvent::Disconnected);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(manager.state(), CameraLifecycleState::Idle);
        assert!(rx.try_recv().is_err(), "no event may follow teardown");
    }

    #[test]
    fn test_unsupported_hardware_releases_permit() {
        let platform = Arc::new(FakePlatform::new());
        platform.set_characteristics(CameraCharacteristics {
            sensor_orientation: 90,
            recorder_sizes: Vec::new(),
            preview_sizes: Vec::new(),
        });
        let permit = Arc::new(Permit::new());
        let (manager, _rx) = manager(&platform, &permit, Duration::from_millis(200));

        assert_eq!(manager.open(600, 450), Err(CameraError::UnsupportedHardware));
        assert_eq!(manager.state(), CameraLifecycleState::Idle);
        assert!(permit.try_acquire(Duration::from_millis(10)));
    }
}
