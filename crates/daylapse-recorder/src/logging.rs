//! Session log.
//!
//! Lifecycle events of a recording run are rendered through one
//! configurable line format and appended to the session log file. Each
//! line is mirrored to `tracing` so console output and structured logs see
//! the same events.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, FixedOffset, Local};
use tracing::info;

/// Default line format when none is configured.
pub const DEFAULT_LOG_FORMAT: &str = "{time} {message}";

/// Line template with `{time}` and `{message}` substitution variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFormat {
    template: String,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FORMAT)
    }
}

impl LogFormat {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Render one log line.
    pub fn render(&self, time: &DateTime<FixedOffset>, message: &str) -> String {
        self.template
            .replace("{time}", &time.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
            .replace("{message}", message)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

/// Sink for formatted session events.
pub struct SessionLog {
    format: LogFormat,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl SessionLog {
    /// Log writing into an arbitrary writer.
    pub fn new(format: LogFormat, writer: Box<dyn Write + Send>) -> Self {
        Self {
            format,
            writer: Mutex::new(writer),
        }
    }

    /// Log truncating and writing `path`.
    pub fn create(path: impl AsRef<Path>, format: LogFormat) -> io::Result<Self> {
        let file: File = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path.as_ref())?;
        Ok(Self::new(format, Box::new(file)))
    }

    /// Log that only mirrors to tracing.
    pub fn discard(format: LogFormat) -> Self {
        Self::new(format, Box::new(io::sink()))
    }

    pub fn format(&self) -> &LogFormat {
        &self.format
    }

    /// Record an event at the given time.
    pub fn event_at(&self, time: &DateTime<FixedOffset>, message: &str) {
        let line = self.format.render(time, message);
        info!(target: "daylapse::session", "{}", message);

        // Write failures are reported and the line dropped
        match self.writer.lock() {
            Ok(mut writer) => {
                if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                    tracing::warn!("Failed to write session log: {}", e);
                }
            }
            Err(_) => tracing::warn!("Session log writer poisoned; dropping line"),
        }
    }

    /// Record an event at the current local time.
    pub fn event(&self, message: &str) {
        self.event_at(&Local::now().fixed_offset(), message);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Writer sharing its buffer with the test.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
