//! Internal log record representation.

use crate::level::LogLevel;
use chrono::Local;

/// One formatted line bound for the writer thread.
#[derive(Debug, Clone)]
pub(crate) struct LogRecord {
    pub timestamp: String,
    pub level: LogLevel,
    pub tag: Option<String>,
    pub text: String,
}

impl LogRecord {
    pub fn new(level: LogLevel, tag: Option<String>, text: String) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            level,
            tag,
            text,
        }
    }

    /// Renders the record as a single line: `[timestamp] LEVEL [tag] text`.
    pub fn render(&self) -> String {
        match &self.tag {
            Some(tag) => format!(
                "[{}] {} [{}] {}\n",
                self.timestamp,
                self.level.label(),
                tag,
                self.text
            ),
            None => format!("[{}] {} {}\n", self.timestamp, self.level.label(), self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain() {
        let record = LogRecord::new(LogLevel::Info, None, "camera opened".to_string());
        let line = record.render();
        assert!(line.contains("INFO"));
        assert!(line.contains("camera opened"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_render_with_tag() {
        let record = LogRecord::new(
            LogLevel::Warn,
            Some("peering".to_string()),
            "request rejected".to_string(),
        );
        let line = record.render();
        assert!(line.contains("[peering]"));
        assert!(line.contains("WARN"));
    }
}
