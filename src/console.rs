//! In-app console log
//!
//! A `log` backend that keeps the most recent lines in memory so the
//! Console tab can show them. Warnings and errors are mirrored to stderr.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Lines kept before the oldest are dropped
pub const MAX_LINES: usize = 500;

/// Shared, bounded line buffer
#[derive(Debug, Clone, Default)]
pub struct ConsoleBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl ConsoleBuffer {
    pub fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push_back(line);
            while lines.len() > MAX_LINES {
                lines.pop_front();
            }
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Get current local time as HH:MM:SS
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// `[HH:MM:SS] [LEVEL] message`
pub fn format_line(level: Level, message: &str) -> String {
    format!("[{}] [{}] {}", timestamp_now(), level, message)
}

pub struct ConsoleLogger {
    buffer: ConsoleBuffer,
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(buffer: ConsoleBuffer, level: LevelFilter) -> Self {
        Self { buffer, level }
    }

    /// Install as the global logger. Returns the buffer even if another
    /// logger was already installed.
    pub fn install(level: LevelFilter) -> ConsoleBuffer {
        let buffer = ConsoleBuffer::default();
        let logger = Self::new(buffer.clone(), level);
        if log::set_boxed_logger(Box::new(logger)).is_ok() {
            log::set_max_level(level);
        }
        buffer
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), &record.args().to_string());
        if record.level() <= Level::Warn {
            eprintln!("{}", line);
        }
        self.buffer.push(line);
    }

    fn flush(&self) {}
}
