//! Cloneable logger handle.
//!
//! Every clone shares one channel into a dedicated writer thread, so
//! logging never blocks the caller on file I/O.

use crate::error::Result;
use crate::level::LogLevel;
use crate::record::LogRecord;
use crate::sink::spawn_sink;
use std::path::PathBuf;
use std::sync::mpsc::{Sender, channel};

/// Thread-safe, non-blocking file logger.
///
/// # Examples
///
/// ```
/// use logging::{LogLevel, Logger};
///
/// let logger = Logger::new("videobox.log".into(), LogLevel::Info).unwrap();
/// logger.info("session started");
/// ```
#[derive(Clone)]
pub struct Logger {
    sender: Sender<LogRecord>,
    level: LogLevel,
    tag: Option<String>,
    console_output: bool,
}

impl Logger {
    /// Creates a logger writing to `log_path`, recording `level` and above.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created or opened.
    pub fn new(log_path: PathBuf, level: LogLevel) -> Result<Self> {
        let (sender, receiver) = channel();
        spawn_sink(&log_path, receiver)?;
        Ok(Logger {
            sender,
            level,
            tag: None,
            console_output: false,
        })
    }

    /// Returns a clone that also mirrors every record to stdout.
    pub fn with_console_output(mut self, enabled: bool) -> Self {
        self.console_output = enabled;
        self
    }

    /// Returns a clone that prefixes every record with `tag`.
    ///
    /// The clone shares the writer thread of this logger.
    pub fn tagged(&self, tag: &str) -> Self {
        let mut logger = self.clone();
        logger.tag = Some(tag.to_string());
        logger
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn log(&self, level: LogLevel, message: &str) {
        if level >= self.level {
            let record = LogRecord::new(level, self.tag.clone(), message.to_string());
            if self.console_output {
                print!("{}", record.render());
            }
            let _ = self.sender.send(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    fn wait_for_sink() {
        thread::sleep(Duration::from_millis(80));
    }

    #[test]
    fn test_writes_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let logger = Logger::new(path.clone(), LogLevel::Debug).unwrap();
        logger.info("first message");
        wait_for_sink();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("first message"));
    }

    #[test]
    fn test_level_filtering() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let logger = Logger::new(path.clone(), LogLevel::Warn).unwrap();
        logger.debug("too quiet");
        logger.info("still too quiet");
        logger.error("loud");
        wait_for_sink();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("too quiet"));
        assert!(content.contains("loud"));
    }

    #[test]
    fn test_tagged_clone_shares_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let logger = Logger::new(path.clone(), LogLevel::Debug).unwrap();
        let camera = logger.tagged("camera");
        camera.info("preview ready");
        logger.info("untagged");
        wait_for_sink();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[camera] preview ready"));
        assert!(content.contains("untagged"));
    }

    #[test]
    fn test_console_mirror_keeps_file_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let logger = Logger::new(path.clone(), LogLevel::Debug)
            .unwrap()
            .with_console_output(true);
        logger.info("mirrored line");
        wait_for_sink();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("mirrored line"));
    }

    #[test]
    fn test_clone_across_threads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let logger = Logger::new(path.clone(), LogLevel::Info).unwrap();
        let worker = logger.clone();
        thread::spawn(move || worker.info("from worker"))
            .join()
            .unwrap();
        logger.info("from main");
        wait_for_sink();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("from worker"));
        assert!(content.contains("from main"));
    }
}
