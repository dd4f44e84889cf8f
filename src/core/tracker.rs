use std::io;
use std::path::Path;

use super::log_io::{LineTailer, StartAt};
use super::model::PositionFix;
use super::parser;

/// Anything that can be polled for new position fixes.
pub trait PositionSource: Send {
    fn poll_fixes(&mut self) -> io::Result<Vec<PositionFix>>;
}

/// A position log being followed as it grows.
pub struct TrackedPositionLog {
    tailer: LineTailer,
    rejected: u64,
}

impl TrackedPositionLog {
    pub fn open(path: impl AsRef<Path>, start: StartAt) -> io::Result<Self> {
        Ok(Self {
            tailer: LineTailer::open(path, start)?,
            rejected: 0,
        })
    }

    /// Lines that were neither fixes, blanks nor comments.
    pub fn rejected_lines(&self) -> u64 {
        self.rejected
    }

    pub fn path(&self) -> &Path {
        self.tailer.path()
    }
}

impl PositionSource for TrackedPositionLog {
    fn poll_fixes(&mut self) -> io::Result<Vec<PositionFix>> {
        let mut fixes = Vec::new();
        for line in self.tailer.read_new_lines()? {
            match parser::parse_line(&line) {
                Some(fix) => fixes.push(fix),
                None => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with('#') {
                        self.rejected += 1;
                        log::debug!("Skipped position line: {:?}", line);
                    }
                }
            }
        }
        Ok(fixes)
    }
}
