//! Role glue binding protocol events to the camera or the host UI.
//!
//! One `RoleController` runs per device. The source role owns a camera
//! session manager and reacts to recording commands; the controller role
//! drives the handshake and forwards user actions. Both register the
//! same object as the peering callback sink and the control-message
//! handler, replacing the inheritance layering of a listener base class
//! with plain composition.

use crate::control_message::ControlMessage;
use crate::error::Result;
use crate::notification::Notification;
use crate::protocol::{ControlProtocol, MessageHandler};
use crate::ui::{HostUi, Permission};
use camera::{CameraError, CameraSessionEvent, CameraSessionManager, Rotation};
use logging::Logger;
use nearby::{ConnectionDecision, Endpoint, NearbyError, PeeringCallbacks};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;

/// Which side of the session this device plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns the camera; recorded media lands on this device.
    Source,
    /// Drives the remote camera.
    Controller,
}

/// Binds the control channel to the camera (source) or UI (controller).
pub struct RoleController {
    role: Role,
    protocol: Arc<ControlProtocol>,
    ui: Arc<dyn HostUi>,
    camera: Option<Arc<CameraSessionManager>>,
    rotation: Mutex<Rotation>,
    permissions_granted: AtomicBool,
    camera_shown: AtomicBool,
    remote_shown: AtomicBool,
    logger: Logger,
}

impl RoleController {
    /// Builds the controller side, which owns no camera.
    pub fn new_controller(
        protocol: Arc<ControlProtocol>,
        ui: Arc<dyn HostUi>,
        logger: Logger,
    ) -> Arc<Self> {
        Arc::new(Self {
            role: Role::Controller,
            protocol,
            ui,
            camera: None,
            rotation: Mutex::new(Rotation::Deg0),
            permissions_granted: AtomicBool::new(false),
            camera_shown: AtomicBool::new(false),
            remote_shown: AtomicBool::new(false),
            logger: logger.tagged("role"),
        })
    }

    /// Builds the source side around an exclusive camera session.
    ///
    /// `camera_events` is the manager's progress channel; a watcher
    /// thread turns failures and finished recordings into UI
    /// notifications.
    pub fn new_source(
        protocol: Arc<ControlProtocol>,
        ui: Arc<dyn HostUi>,
        camera: Arc<CameraSessionManager>,
        camera_events: Receiver<CameraSessionEvent>,
        logger: Logger,
    ) -> Arc<Self> {
        let logger = logger.tagged("role");
        spawn_camera_watcher(camera_events, Arc::clone(&ui), logger.clone());
        Arc::new(Self {
            role: Role::Source,
            protocol,
            ui,
            camera: Some(camera),
            rotation: Mutex::new(Rotation::Deg0),
            permissions_granted: AtomicBool::new(false),
            camera_shown: AtomicBool::new(false),
            remote_shown: AtomicBool::new(false),
            logger,
        })
    }

    /// Registers this controller as the control-message handler.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let handler: Arc<dyn MessageHandler> = Arc::clone(self) as Arc<dyn MessageHandler>;
        self.protocol.subscribe(handler)?;
        Ok(())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Records the current device rotation for orientation hints.
    pub fn set_rotation(&self, rotation: Rotation) {
        *self.lock_rotation() = rotation;
    }

    /// Source role: the camera view surface is laid out and sized.
    ///
    /// Opens the camera for the given view dimensions. Skipped with a
    /// notification when the runtime permissions were denied.
    pub fn camera_surface_ready(&self, view_width: u32, view_height: u32) -> Result<()> {
        let Some(camera) = self.camera.as_ref() else {
            self.logger.warn("camera surface reported without a camera");
            return Ok(());
        };
        if !self.permissions_granted.load(Ordering::SeqCst) {
            self.ui.notify(Notification::PermissionsDenied);
            return Ok(());
        }
        camera.open(view_width, view_height)?;
        Ok(())
    }

    /// Controller role: user pressed record.
    pub fn request_start_recording(&self) -> Result<()> {
        self.protocol.publish(ControlMessage::StartRecording)?;
        Ok(())
    }

    /// Controller role: user pressed stop.
    pub fn request_stop_recording(&self) -> Result<()> {
        self.protocol.publish(ControlMessage::StopRecording)?;
        Ok(())
    }

    /// Tears down the control channel and, on the source, the camera.
    pub fn shutdown(&self) {
        self.protocol.shutdown();
        if let Some(camera) = self.camera.as_ref() {
            camera.close();
        }
    }

    fn publish_or_warn(&self, message: ControlMessage) {
        if let Err(error) = self.protocol.publish(message) {
            self.logger
                .warn(&format!("publish {:?} failed: {}", message, error));
        }
    }

    fn lock_rotation(&self) -> std::sync::MutexGuard<'_, Rotation> {
        self.rotation.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn handle_peered_on_source(&self) {
        // Duplicate delivery is expected from the transport; run the
        // camera-mode switch once.
        if self.camera_shown.swap(true, Ordering::SeqCst) {
            self.logger.debug("duplicate Peered ignored");
            return;
        }
        let granted = self
            .ui
            .request_permissions(&[Permission::Camera, Permission::Microphone]);
        self.permissions_granted.store(granted, Ordering::SeqCst);
        if !granted {
            self.logger.warn("runtime permissions denied");
            self.ui.notify(Notification::PermissionsDenied);
            return;
        }
        self.ui.show_camera();
        self.publish_or_warn(ControlMessage::RequestViewerMode);
    }

    fn handle_viewer_mode_on_controller(&self) {
        if self.remote_shown.swap(true, Ordering::SeqCst) {
            self.logger.debug("duplicate RequestViewerMode ignored");
            return;
        }
        self.ui.show_remote();
        self.publish_or_warn(ControlMessage::RequestCameraMode);
    }

    fn handle_start_recording(&self, camera: &CameraSessionManager) {
        let rotation = *self.lock_rotation();
        match camera.start_recording(rotation) {
            Ok(()) => {}
            Err(CameraError::InvalidState { .. }) => {
                self.logger.debug("StartRecording outside preview ignored");
            }
            Err(error) => {
                self.logger.error(&format!("start recording failed: {}", error));
                self.ui.notify(Notification::Camera(error));
            }
        }
    }

    fn handle_stop_recording(&self, camera: &CameraSessionManager) {
        match camera.stop_recording() {
            // The watcher thread reports the saved artifact.
            Ok(_) => {}
            Err(CameraError::InvalidState { .. }) => {
                self.logger.debug("StopRecording outside recording ignored");
            }
            Err(error) => {
                self.logger.error(&format!("stop recording failed: {}", error));
                self.ui.notify(Notification::Camera(error));
            }
        }
    }
}

impl PeeringCallbacks for RoleController {
    fn on_peered(&self, endpoint: &Endpoint) {
        self.logger.info(&format!("peered with {}", endpoint));
        self.ui.on_peered();
        if self.role == Role::Controller {
            self.publish_or_warn(ControlMessage::Peered);
        }
    }

    fn on_connection_request(&self, endpoint: &Endpoint) -> ConnectionDecision {
        let decision = self.ui.present_peer_accept_prompt(&endpoint.name);
        if decision == ConnectionDecision::Accept {
            self.ui.notify(Notification::Connected);
        }
        decision
    }

    fn on_peering_failed(&self, error: &NearbyError) {
        self.ui.notify(Notification::Peering(error.clone()));
    }
}

impl MessageHandler for RoleController {
    fn on_control_message(&self, message: ControlMessage) {
        match (self.role, message) {
            (Role::Source, ControlMessage::Peered) => self.handle_peered_on_source(),
            (Role::Controller, ControlMessage::RequestViewerMode) => {
                self.handle_viewer_mode_on_controller();
            }
            (Role::Source, ControlMessage::RequestCameraMode) => {
                self.logger.info("controller confirmed camera mode");
            }
            (Role::Source, ControlMessage::StartRecording) => {
                if let Some(camera) = self.camera.as_ref() {
                    self.handle_start_recording(camera);
                }
            }
            (Role::Source, ControlMessage::StopRecording) => {
                if let Some(camera) = self.camera.as_ref() {
                    self.handle_stop_recording(camera);
                }
            }
            (role, message) => {
                // Echoes of own publications and foreign kinds are normal.
                self.logger
                    .debug(&format!("{:?} ignores {:?}", role, message));
            }
        }
    }
}

fn spawn_camera_watcher(
    events: Receiver<CameraSessionEvent>,
    ui: Arc<dyn HostUi>,
    logger: Logger,
) {
    let thread_logger = logger.clone();
    let spawned = thread::Builder::new()
        .name("camera-watch".to_string())
        .spawn(move || {
            for event in events {
                match event {
                    CameraSessionEvent::PreviewStarted => thread_logger.info("preview up"),
                    CameraSessionEvent::RecordingStarted(path) => {
                        thread_logger.info(&format!("recording to {}", path.display()));
                    }
                    CameraSessionEvent::RecordingStopped(path) => {
                        ui.notify(Notification::VideoSaved(path));
                    }
                    CameraSessionEvent::Failed(error) => {
                        thread_logger.error(&format!("camera failure: {}", error));
                        ui.notify(Notification::Camera(error));
                    }
                }
            }
        });
    if let Err(error) = spawned {
        logger.error(&format!("failed to spawn camera watcher: {}", error));
    }
}
