// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("unusable file name {0:?}")]
    InvalidName(String),
    #[error("no file is open")]
    NoOpenFile,
}

// ============================================================================
// FileSink Trait
// ============================================================================

/// Receives everything a session extracts from the byte stream.
///
/// Callbacks run synchronously inside [`Session::receive_byte`], so they
/// should return quickly.
///
/// [`Session::receive_byte`]: crate::session::Session::receive_byte
pub trait FileSink {
    /// Announced file name (raw bytes, no terminator) and size. An error
    /// rejects the file and ends the session with a size error.
    fn on_name(&mut self, name: &[u8], size: u64) -> Result<(), SinkError>;

    /// One packet payload. An error ends the session with a write error.
    fn on_data(&mut self, data: &[u8]) -> Result<(), SinkError>;

    /// Sender closed the file.
    fn on_end(&mut self);

    /// Transfer cancelled. Repeated calls must be harmless.
    fn on_aborted(&mut self);
}

impl<S: FileSink + ?Sized> FileSink for &mut S {
    fn on_name(&mut self, name: &[u8], size: u64) -> Result<(), SinkError> {
        (**self).on_name(name, size)
    }

    fn on_data(&mut self, data: &[u8]) -> Result<(), SinkError> {
        (**self).on_data(data)
    }

    fn on_end(&mut self) {
        (**self).on_end()
    }

    fn on_aborted(&mut self) {
        (**self).on_aborted()
    }
}

// ============================================================================
// Directory Sink
// ============================================================================

struct OpenFile {
    path: PathBuf,
    file: File,
    size: u64,
    written: u64,
}

/// Stores received files inside a directory.
pub struct DirectorySink {
    output_dir: PathBuf,
    max_size: Option<u64>,
    current: Option<OpenFile>,
    completed: Arc<Mutex<Vec<PathBuf>>>,
}

impl DirectorySink {
    pub fn new(output_dir: PathBuf, max_size: Option<u64>) -> Self {
        DirectorySink {
            output_dir,
            max_size,
            current: None,
            completed: Arc::default(),
        }
    }

    /// Files closed successfully so far.
    pub fn completed(&self) -> Vec<PathBuf> {
        self.completed.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Shared view of the closed files, usable after the sink is moved
    /// into a receiver.
    pub fn completed_handle(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.completed)
    }

    fn finish(&mut self) -> Result<Option<PathBuf>, SinkError> {
        let Some(mut open) = self.current.take() else {
            return Ok(None);
        };

        // The last block is padded up to the packet size.
        if open.size > 0 && open.written > open.size {
            open.file.set_len(open.size)?;
        }
        open.file.flush()?;
        open.file.sync_all()?;

        Ok(Some(open.path))
    }
}

impl FileSink for DirectorySink {
    fn on_name(&mut self, name: &[u8], size: u64) -> Result<(), SinkError> {
        if let Some(limit) = self.max_size {
            if size > limit {
                return Err(SinkError::TooLarge { size, limit });
            }
        }

        let file_name = sanitize_file_name(name)?;
        let path = self.output_dir.join(&file_name);
        let file = File::create(&path)?;
        info!("Receiving {} ({} bytes)", path.display(), size);

        self.current = Some(OpenFile {
            path,
            file,
            size,
            written: 0,
        });
        Ok(())
    }

    fn on_data(&mut self, data: &[u8]) -> Result<(), SinkError> {
        let open = self.current.as_mut().ok_or(SinkError::NoOpenFile)?;
        open.file.write_all(data)?;
        open.written += data.len() as u64;
        debug!("Wrote {} bytes to {}", open.written, open.path.display());
        Ok(())
    }

    fn on_end(&mut self) {
        match self.finish() {
            Ok(Some(path)) => {
                info!("Closed {}", path.display());
                self.completed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(path);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to close received file: {}", e),
        }
    }

    fn on_aborted(&mut self) {
        if let Some(open) = self.current.take() {
            drop(open.file);
            match fs::remove_file(&open.path) {
                Ok(()) => info!("Removed partial file {}", open.path.display()),
                Err(e) => warn!("Failed to remove {}: {}", open.path.display(), e),
            }
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Keeps only the final path component of an announced name.
fn sanitize_file_name(name: &[u8]) -> Result<String, SinkError> {
    let lossy = String::from_utf8_lossy(name);
    let base = lossy.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.is_empty() || base == "." || base == ".." {
        return Err(SinkError::InvalidName(lossy.into_owned()));
    }

    Ok(base.to_string())
}

// ============================================================================
// Recording Sink for Testing
// ============================================================================

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Name(Vec<u8>, u64),
    Data(Vec<u8>),
    End,
    Aborted,
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    pub reject_name: bool,
    pub fail_data: bool,
}

#[cfg(test)]
impl FileSink for RecordingSink {
    fn on_name(&mut self, name: &[u8], size: u64) -> Result<(), SinkError> {
        self.events.push(SinkEvent::Name(name.to_vec(), size));
        if self.reject_name {
            return Err(SinkError::TooLarge { size, limit: 0 });
        }
        Ok(())
    }

    fn on_data(&mut self, data: &[u8]) -> Result<(), SinkError> {
        self.events.push(SinkEvent::Data(data.to_vec()));
        if self.fail_data {
            return Err(SinkError::Io(std::io::Error::other("mock write failure")));
        }
        Ok(())
    }

    fn on_end(&mut self) {
        self.events.push(SinkEvent::End);
    }

    fn on_aborted(&mut self) {
        self.events.push(SinkEvent::Aborted);
    }
}

// ============================================================================
// Tests
// ============================================================================
