//! Capture geometry: size selection and orientation hints.
//!
//! The selection rules mirror the platform constraints of the recorder:
//! recordings use a 4:3 size no wider than 1080, the preview is the
//! smallest size that matches the recording aspect ratio and still covers
//! the requested view dimensions.

/// A pixel size candidate reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Device rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// Geometry resolved once per camera open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureGeometry {
    pub preview: Size,
    pub recording: Size,
    pub sensor_orientation: u32,
}

/// Sensor mounted in the common orientation.
pub const SENSOR_ORIENTATION_DEFAULT: u32 = 90;
/// Sensor mounted upside down relative to the common orientation.
pub const SENSOR_ORIENTATION_INVERSE: u32 = 270;

/// Picks the recording size from the platform-ordered candidate list.
///
/// Returns the first candidate with a 4:3 aspect ratio and width of at
/// most 1080 (the recorder cannot handle larger). Falls back to the last
/// candidate when none match; `None` only for an empty list.
pub fn choose_recording_size(candidates: &[Size]) -> Option<Size> {
    for size in candidates {
        if size.width == size.height * 4 / 3 && size.width <= 1080 {
            return Some(*size);
        }
    }
    candidates.last().copied()
}

/// Picks the smallest candidate matching `aspect` that covers the
/// requested minimum in both axes.
///
/// Falls back to the first candidate when none are big enough; `None`
/// only for an empty list.
pub fn choose_optimal_size(
    candidates: &[Size],
    min_width: u32,
    min_height: u32,
    aspect: Size,
) -> Option<Size> {
    let big_enough: Vec<Size> = candidates
        .iter()
        .copied()
        .filter(|size| {
            size.height == size.width * aspect.height / aspect.width
                && size.width >= min_width
                && size.height >= min_height
        })
        .collect();

    if big_enough.is_empty() {
        candidates.first().copied()
    } else {
        big_enough.into_iter().min_by_key(|size| size.area())
    }
}

/// Output rotation in degrees for the recorded video, or `None` when no
/// hint applies.
///
/// Only the two common sensor mountings (90 and 270 degrees) carry a
/// lookup table. Sensors mounted at 0 or 180 degrees exist on some
/// hardware; for those no orientation hint is applied.
pub fn orientation_hint(sensor_orientation: u32, rotation: Rotation) -> Option<u32> {
    match sensor_orientation {
        SENSOR_ORIENTATION_DEFAULT => Some(match rotation {
            Rotation::Deg0 => 90,
            Rotation::Deg90 => 0,
            Rotation::Deg180 => 270,
            Rotation::Deg270 => 180,
        }),
        SENSOR_ORIENTATION_INVERSE => Some(match rotation {
            Rotation::Deg0 => 270,
            Rotation::Deg90 => 180,
            Rotation::Deg180 => 90,
            Rotation::Deg270 => 0,
        }),
        _ => None,
    }
}
