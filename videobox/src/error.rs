use camera::CameraError;
use nearby::NearbyError;
use std::fmt;

pub type Result<T> = std::result::Result<T, VideoBoxError>;

/// Errors surfaced by the role layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoBoxError {
    Peering(NearbyError),
    Camera(CameraError),
}

impl fmt::Display for VideoBoxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoBoxError::Peering(error) => write!(f, "peering error: {}", error),
            VideoBoxError::Camera(error) => write!(f, "camera error: {}", error),
        }
    }
}

impl std::error::Error for VideoBoxError {}

impl From<NearbyError> for VideoBoxError {
    fn from(error: NearbyError) -> Self {
        VideoBoxError::Peering(error)
    }
}

impl From<CameraError> for VideoBoxError {
    fn from(error: CameraError) -> Self {
        VideoBoxError::Camera(error)
    }
}
