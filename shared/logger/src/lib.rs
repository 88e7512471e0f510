//! Non-blocking file logging shared by the videobox crates.

pub mod error;
mod level;
mod logger;
mod record;
mod sink;

pub use error::{LoggingError, Result};
pub use level::LogLevel;
pub use logger::Logger;
