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

//! Depth-first directory walking with per-file note assignment.

use std::path::{Path, PathBuf};
use std::vec;

use tracing::{debug, warn};

use crate::descriptor::MIDI_MAX;
use crate::error::IngestError;
use crate::fs::{DirItem, Filesystem};

/// Default limit on how many directory levels below the root are descended.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// A file found by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Directory levels below the walk root; files in the root are at depth 0.
    pub depth: usize,
    /// The note assigned to this file, or None once the notes ran past 127.
    pub note: Option<u8>,
}

impl WalkEntry {
    /// Whether the file name ends in `.wav`, ignoring case.
    pub fn is_wav(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
    }
}

/// Walks a directory tree depth-first in the filesystem's enumeration order.
///
/// Every file, whatever its type, consumes one note so that a folder's note
/// layout does not shift when unrelated files are present.
pub struct DirWalker<'a> {
    fs: &'a dyn Filesystem,
    root: Option<PathBuf>,
    max_depth: usize,
    stack: Vec<(vec::IntoIter<DirItem>, usize)>,
    next_note: Option<u8>,
}

impl<'a> DirWalker<'a> {
    pub fn new(fs: &'a dyn Filesystem, root: &Path, max_depth: usize, base_note: u8) -> DirWalker<'a> {
        DirWalker {
            fs,
            root: Some(root.to_path_buf()),
            max_depth,
            stack: Vec::new(),
            next_note: (base_note <= MIDI_MAX).then_some(base_note),
        }
    }

    fn list(&self, path: &Path) -> Result<vec::IntoIter<DirItem>, IngestError> {
        self.fs
            .read_dir(path)
            .map(Vec::into_iter)
            .map_err(|source| IngestError::Directory {
                path: path.to_path_buf(),
                source,
            })
    }

    fn take_note(&mut self) -> Option<u8> {
        let note = self.next_note;
        self.next_note = note
            .and_then(|note| note.checked_add(1))
            .filter(|note| *note <= MIDI_MAX);
        note
    }
}

impl Iterator for DirWalker<'_> {
    type Item = Result<WalkEntry, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            match self.list(&root) {
                Ok(items) => self.stack.push((items, 0)),
                Err(e) => return Some(Err(e)),
            }
        }

        loop {
            let (items, depth) = self.stack.last_mut()?;
            let depth = *depth;
            let Some(item) = items.next() else {
                self.stack.pop();
                continue;
            };

            if !item.is_dir {
                let note = self.take_note();
                return Some(Ok(WalkEntry {
                    path: item.path,
                    depth,
                    note,
                }));
            }

            if depth >= self.max_depth {
                debug!(path = ?item.path, depth, "Not descending past the depth limit");
                continue;
            }
            match self.list(&item.path) {
                Ok(items) => self.stack.push((items, depth + 1)),
                Err(e) => {
                    warn!(path = ?item.path, err = %e, "Unable to list directory");
                    return Some(Err(e));
                }
            }
        }
    }
}
