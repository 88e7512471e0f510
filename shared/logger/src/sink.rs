//! Dedicated writer thread draining log records to disk.

use crate::error::Result;
use crate::record::LogRecord;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::thread;

/// Opens the log file in append mode and spawns the drain loop.
///
/// The thread exits when every `Logger` clone feeding the channel is gone.
pub(crate) fn spawn_sink(log_path: &Path, receiver: Receiver<LogRecord>) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(log_path)?;
    thread::spawn(move || {
        for record in receiver {
            if file.write_all(record.render().as_bytes()).is_err() {
                break;
            }
            let _ = file.flush();
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LogLevel;
    use std::fs;
    use std::sync::mpsc::channel;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_sink_creates_file_and_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sink.log");
        let (tx, rx) = channel();

        spawn_sink(&path, rx).unwrap();
        tx.send(LogRecord::new(LogLevel::Debug, None, "hello".to_string()))
            .unwrap();
        drop(tx);
        thread::sleep(Duration::from_millis(100));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("hello"));
    }
}
