//! A size-bounded rotating log file.
//!
//! Records are appended to `path` until the next record would push the file
//! past the size threshold. The file is then shifted to `path.1`, older
//! generations move up by one (`path.1` -> `path.2`, ...) and the oldest beyond
//! the retention count is dropped.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Rotation threshold in bytes, kept compatible with existing log archives.
pub const MAX_BYTES: u64 = 2000;
/// Number of rotated generations retained next to the live file.
pub const BACKUP_COUNT: usize = 100;

pub struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: File,
    size: u64,
}

impl RotatingFileWriter {
    /// Opens `path` in append mode with the standard rotation limits.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        Self::with_limits(path, MAX_BYTES, BACKUP_COUNT)
    }

    pub fn with_limits(
        path: impl Into<PathBuf>,
        max_bytes: u64,
        backup_count: usize,
    ) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backup_count,
            file,
            size,
        })
    }

    /// Appends one newline-terminated record, rotating first if needed.
    pub fn write_record(&mut self, record: &str) -> io::Result<()> {
        let incoming = record.len() as u64 + 1;
        if self.should_rollover(incoming) {
            self.rollover()?;
        }
        self.file.write_all(record.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        self.size += incoming;
        Ok(())
    }

    // An empty file is never rotated, so an oversized record cannot produce
    // empty generations.
    fn should_rollover(&self, incoming: u64) -> bool {
        self.max_bytes > 0 && self.size > 0 && self.size + incoming >= self.max_bytes
    }

    fn rollover(&mut self) -> io::Result<()> {
        if self.backup_count == 0 {
            self.file = File::create(&self.path)?;
            self.size = 0;
            return Ok(());
        }

        for generation in (1..self.backup_count).rev() {
            let src = self.backup_path(generation);
            if src.exists() {
                let dst = self.backup_path(generation + 1);
                if dst.exists() {
                    fs::remove_file(&dst)?;
                }
                fs::rename(&src, &dst)?;
            }
        }

        let first = self.backup_path(1);
        if first.exists() {
            fs::remove_file(&first)?;
        }
        self.file.flush()?;
        fs::rename(&self.path, &first)?;

        self.file = open_append(&self.path)?;
        self.size = 0;
        Ok(())
    }

    fn backup_path(&self, generation: usize) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{}", generation));
        PathBuf::from(name)
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
