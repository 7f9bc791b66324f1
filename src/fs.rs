// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Byte sources over mounted filesystems.
//!
//! A [`Filesystem`] backend is chosen once at startup (see [`Mounts`]). Every
//! ingest call opens its own [`Session`], which owns the file handle for the
//! duration of that call.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::IngestConfig;
use crate::error::IngestError;

pub mod local;
pub mod memory;

pub use local::LocalFs;
pub use memory::MemoryFs;

/// The name of the mount used when no configuration names one.
pub const DEFAULT_MOUNT: &str = "local";

/// A seekable, sequential byte stream.
pub trait ByteSource: Read + Seek {}

impl<T: Read + Seek + ?Sized> ByteSource for T {}

/// A single directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirItem {
    /// Path relative to the filesystem root, usable with [`Filesystem::open_source`].
    pub path: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// A mounted filesystem that sample files can be opened from.
pub trait Filesystem: fmt::Display + Send + Sync {
    /// Opens the file at the given path for reading.
    fn open_source(&self, path: &Path) -> io::Result<Box<dyn ByteSource + Send>>;

    /// Lists the entries of a directory in the filesystem's enumeration order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirItem>>;
}

/// An open file, owned by exactly one ingest call.
pub struct Session {
    path: PathBuf,
    source: Box<dyn ByteSource + Send>,
    len: u64,
}

impl Session {
    /// Opens the given path on the filesystem.
    pub fn open(fs: &dyn Filesystem, path: &Path) -> Result<Session, IngestError> {
        let mut source = fs.open_source(path).map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;
        debug!(fs = %fs, path = ?path, len, "Opened file");

        Ok(Session {
            path: path.to_path_buf(),
            source,
            len,
        })
    }

    /// The path this session was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total length of the underlying stream in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if the stream has no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Read for Session {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.source.read(buf)
    }
}

impl Seek for Session {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.source.seek(pos)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("len", &self.len)
            .finish()
    }
}

/// Reads until the buffer is full or the stream ends. Returns the number of bytes read.
pub fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Fills the buffer completely or fails with [`IngestError::ShortRead`].
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<(), IngestError> {
    let actual = read_up_to(reader, buf)?;
    if actual != buf.len() {
        return Err(IngestError::ShortRead {
            expected: buf.len(),
            actual,
        });
    }
    Ok(())
}

/// Returns the total length of a seekable stream, leaving the position unchanged.
pub fn stream_len<S: Seek + ?Sized>(stream: &mut S) -> io::Result<u64> {
    let position = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    if position != len {
        stream.seek(SeekFrom::Start(position))?;
    }
    Ok(len)
}

/// The filesystems available to ingest, keyed by mount id.
pub struct Mounts {
    mounts: HashMap<String, Arc<dyn Filesystem>>,
}

impl Mounts {
    /// Builds the mount table from configuration. Without configured
    /// filesystems, a single local mount rooted at the working directory is used.
    pub fn from_config(config: &IngestConfig) -> Mounts {
        let mut mounts: HashMap<String, Arc<dyn Filesystem>> = HashMap::new();
        for (id, root) in config.filesystems() {
            mounts.insert(id.clone(), Arc::new(LocalFs::new(id, root)));
        }
        if mounts.is_empty() {
            mounts.insert(
                DEFAULT_MOUNT.to_string(),
                Arc::new(LocalFs::new(DEFAULT_MOUNT, ".")),
            );
        }
        Mounts { mounts }
    }

    /// Gets the filesystem with the given mount id.
    pub fn get(&self, id: &str) -> Result<Arc<dyn Filesystem>, Box<dyn std::error::Error>> {
        match self.mounts.get(id) {
            Some(fs) => Ok(Arc::clone(fs)),
            None => {
                let mut known: Vec<&str> = self.mounts.keys().map(String::as_str).collect();
                known.sort();
                Err(format!("unknown filesystem '{}' (known: {})", id, known.join(", ")).into())
            }
        }
    }

    /// Returns the only mount if exactly one is configured.
    pub fn single(&self) -> Option<Arc<dyn Filesystem>> {
        if self.mounts.len() == 1 {
            self.mounts.values().next().cloned()
        } else {
            None
        }
    }
}
