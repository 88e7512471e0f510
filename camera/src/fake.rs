//! Scripted in-memory camera platform used by tests.
//!
//! The fake records every hardware call in a journal and lets tests
//! choose how an open request resolves: success, a classified error, an
//! external disconnect, or no response at all (to exercise the bounded
//! permit wait).

use crate::error::{CameraError, Result};
use crate::geometry::Size;
use crate::hardware::{
    CameraCharacteristics, CameraDevice, CameraPlatform, DeviceErrorKind, DeviceEvent,
    RecorderSettings, RecorderSink,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// How a scripted open request resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Deliver `DeviceEvent::Opened` with a fake device.
    Succeed,
    /// Deliver `DeviceEvent::Error` with the given classification.
    Fail(DeviceErrorKind),
    /// Deliver `DeviceEvent::Disconnected`.
    Disconnect,
    /// Never respond; the permit stays held.
    Stall,
}

struct Shared {
    characteristics: Mutex<CameraCharacteristics>,
    open_mode: Mutex<OpenMode>,
    open_delay: Mutex<Option<Duration>>,
    fail_record_session: AtomicBool,
    open_calls: AtomicUsize,
    senders: Mutex<Vec<Sender<DeviceEvent>>>,
    journal: Arc<Mutex<Vec<String>>>,
}

/// Scripted [`CameraPlatform`] implementation.
pub struct FakePlatform {
    shared: Arc<Shared>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                characteristics: Mutex::new(CameraCharacteristics {
                    sensor_orientation: 90,
                    recorder_sizes: vec![
                        Size::new(640, 480),
                        Size::new(1440, 1080),
                        Size::new(1920, 1080),
                    ],
                    preview_sizes: vec![
                        Size::new(320, 240),
                        Size::new(640, 480),
                        Size::new(1280, 960),
                    ],
                }),
                open_mode: Mutex::new(OpenMode::Succeed),
                open_delay: Mutex::new(None),
                fail_record_session: AtomicBool::new(false),
                open_calls: AtomicUsize::new(0),
                senders: Mutex::new(Vec::new()),
                journal: Arc::new(Mutex::new(Vec::new())),
            }),
        }
    }

    pub fn set_characteristics(&self, characteristics: CameraCharacteristics) {
        *self.shared.characteristics.lock().unwrap() = characteristics;
    }

    pub fn set_open_mode(&self, mode: OpenMode) {
        *self.shared.open_mode.lock().unwrap() = mode;
    }

    /// Delays the open outcome, simulating slow hardware.
    pub fn set_open_delay(&self, delay: Duration) {
        *self.shared.open_delay.lock().unwrap() = Some(delay);
    }

    /// Makes the next record-session configuration fail.
    pub fn set_record_session_fails(&self, fails: bool) {
        self.shared
            .fail_record_session
            .store(fails, Ordering::SeqCst);
    }

    /// Number of open requests issued so far.
    pub fn open_calls(&self) -> usize {
        self.shared.open_calls.load(Ordering::SeqCst)
    }

    /// Injects a device event on the most recent open channel, e.g. a
    /// disconnect arriving after teardown.
    pub fn emit(&self, event: DeviceEvent) {
        if let Some(sender) = self.shared.senders.lock().unwrap().last() {
            let _ = sender.send(event);
        }
    }

    pub fn journal(&self) -> Vec<String> {
        self.shared.journal.lock().unwrap().clone()
    }

    pub fn journal_contains(&self, needle: &str) -> bool {
        self.shared
            .journal
            .lock()
            .unwrap()
            .iter()
            .any(|entry| entry.contains(needle))
    }

    fn note(&self, entry: String) {
        self.shared.journal.lock().unwrap().push(entry);
    }
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraPlatform for FakePlatform {
    fn camera_ids(&self) -> Result<Vec<String>> {
        Ok(vec!["0".to_string()])
    }

    fn characteristics(&self, _camera_id: &str) -> Result<CameraCharacteristics> {
        Ok(self.shared.characteristics.lock().unwrap().clone())
    }

    fn open(&self, camera_id: &str, events: Sender<DeviceEvent>) -> Result<()> {
        self.shared.open_calls.fetch_add(1, Ordering::SeqCst);
        self.note(format!("platform: open {}", camera_id));
        self.shared.senders.lock().unwrap().push(events.clone());

        let mode = *self.shared.open_mode.lock().unwrap();
        if mode == OpenMode::Stall {
            return Ok(());
        }

        let delay = *self.shared.open_delay.lock().unwrap();
        let journal = Arc::clone(&self.shared.journal);
        let fail_record = self.shared.fail_record_session.load(Ordering::SeqCst);
        thread::spawn(move || {
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
            let event = match mode {
                OpenMode::Succeed => DeviceEvent::Opened(Box::new(FakeDevice {
                    journal,
                    fail_record_session: fail_record,
                })),
                OpenMode::Fail(kind) => DeviceEvent::Error(kind),
                OpenMode::Disconnect => DeviceEvent::Disconnected,
                OpenMode::Stall => return,
            };
            let _ = events.send(event);
        });
        Ok(())
    }

    fn new_recorder(&self) -> Result<Box<dyn RecorderSink>> {
        Ok(Box::new(FakeRecorder {
            journal: Arc::clone(&self.shared.journal),
        }))
    }
}

struct FakeDevice {
    journal: Arc<Mutex<Vec<String>>>,
    fail_record_session: bool,
}

impl FakeDevice {
    fn note(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

impl CameraDevice for FakeDevice {
    fn start_preview(&mut self, preview: Size) -> Result<()> {
        self.note(format!("device: preview {}", preview));
        Ok(())
    }

    fn start_record_session(
        &mut self,
        preview: Size,
        _sink: &mut dyn RecorderSink,
    ) -> Result<()> {
        if self.fail_record_session {
            return Err(CameraError::CaptureConfigurationFailed);
        }
        self.note(format!("device: record session {}", preview));
        Ok(())
    }

    fn stop_session(&mut self) {
        self.note("device: session stopped".to_string());
    }

    fn close(&mut self) {
        self.note("device: closed".to_string());
    }
}

struct FakeRecorder {
    journal: Arc<Mutex<Vec<String>>>,
}

impl FakeRecorder {
    fn note(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

impl RecorderSink for FakeRecorder {
    fn prepare(&mut self, settings: &RecorderSettings) -> Result<()> {
        self.note(format!(
            "recorder: prepared {} hint {:?} -> {}",
            settings.recording,
            settings.orientation_hint,
            settings.output.display()
        ));
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.note("recorder: started".to_string());
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.note("recorder: stopped".to_string());
        Ok(())
    }

    fn reset(&mut self) {
        self.note("recorder: reset".to_string());
    }

    fn release(&mut self) {
        self.note("recorder: released".to_string());
    }
}
