//! Session-wide tunables.

use camera::CameraSessionConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Parameters shared by both roles of a session.
///
/// Defaults match the production values: 30 second advertise/discover
/// windows, 3 minute message visibility, a 2.5 second bounded wait for
/// the camera permit, and an H.264 encoder at 10 Mbps / 30 fps.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Service identifier announced and scanned for during pairing.
    pub service_id: String,
    /// Advertising and discovery window length.
    pub window_ttl: Duration,
    /// Visibility window of a published control message.
    pub publish_ttl: Duration,
    /// Bounded wait for the camera permit before `HardwareBusy`.
    pub open_timeout: Duration,
    /// Video bitrate in bits per second.
    pub bitrate: u32,
    pub frame_rate: u32,
    /// Directory receiving recording artifacts.
    pub media_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_id: "videobox".to_string(),
            window_ttl: Duration::from_secs(30),
            publish_ttl: Duration::from_secs(180),
            open_timeout: Duration::from_millis(2500),
            bitrate: 10_000_000,
            frame_rate: 30,
            media_dir: std::env::temp_dir(),
        }
    }
}

impl SessionConfig {
    pub fn with_service_id(mut self, service_id: &str) -> Self {
        self.service_id = service_id.to_string();
        self
    }

    pub fn with_window_ttl(mut self, ttl: Duration) -> Self {
        self.window_ttl = ttl;
        self
    }

    pub fn with_publish_ttl(mut self, ttl: Duration) -> Self {
        self.publish_ttl = ttl;
        self
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    pub fn with_media_dir(mut self, media_dir: PathBuf) -> Self {
        self.media_dir = media_dir;
        self
    }

    /// The camera-crate slice of this configuration.
    pub fn camera_config(&self) -> CameraSessionConfig {
        CameraSessionConfig {
            open_timeout: self.open_timeout,
            bitrate: self.bitrate,
            frame_rate: self.frame_rate,
            media_dir: self.media_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_production_values() {
        let config = SessionConfig::default();
        assert_eq!(config.window_ttl, Duration::from_secs(30));
        assert_eq!(config.publish_ttl, Duration::from_secs(180));
        assert_eq!(config.open_timeout, Duration::from_millis(2500));
        assert_eq!(config.bitrate, 10_000_000);
        assert_eq!(config.frame_rate, 30);
    }

    #[test]
    fn test_builders_override_fields() {
        let config = SessionConfig::default()
            .with_service_id("lab")
            .with_window_ttl(Duration::from_secs(5))
            .with_open_timeout(Duration::from_millis(100));
        assert_eq!(config.service_id, "lab");
        assert_eq!(config.window_ttl, Duration::from_secs(5));
        assert_eq!(config.camera_config().open_timeout, Duration::from_millis(100));
    }
}
