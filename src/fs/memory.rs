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
use std::fmt;
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::{ByteSource, DirItem, Filesystem};

enum Node {
    File(Arc<[u8]>),
    Dir,
}

/// An in-memory filesystem for tests and for hosts that embed the library
/// with assets already in memory. It is never built from configuration;
/// [`Mounts`](super::Mounts) only mounts on-disk roots. Directory listings
/// come back in insertion order.
#[derive(Default)]
pub struct MemoryFs {
    nodes: Vec<(PathBuf, Node)>,
}

impl MemoryFs {
    /// Creates an empty filesystem.
    pub fn new() -> MemoryFs {
        MemoryFs::default()
    }

    /// Adds a file, creating any missing parent directories.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, contents: Vec<u8>) -> &mut MemoryFs {
        let path = normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.nodes.retain(|(existing, _)| *existing != path);
        self.nodes.push((path, Node::File(Arc::from(contents))));
        self
    }

    /// Adds a directory, creating any missing parents.
    pub fn add_dir<P: AsRef<Path>>(&mut self, path: P) -> &mut MemoryFs {
        let path = normalize(path.as_ref());
        if path.as_os_str().is_empty() || self.find(&path).is_some() {
            return self;
        }
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.nodes.push((path, Node::Dir));
        self
    }

    fn find(&self, path: &Path) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|(existing, _)| existing == path)
            .map(|(_, node)| node)
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

impl Filesystem for MemoryFs {
    fn open_source(&self, path: &Path) -> io::Result<Box<dyn ByteSource + Send>> {
        match self.find(&normalize(path)) {
            Some(Node::File(contents)) => Ok(Box::new(Cursor::new(Arc::clone(contents)))),
            Some(Node::Dir) => Err(io::Error::other(format!(
                "{} is a directory",
                path.display()
            ))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirItem>> {
        let dir = normalize(path);
        if !dir.as_os_str().is_empty() {
            match self.find(&dir) {
                Some(Node::Dir) => {}
                Some(Node::File(_)) => {
                    return Err(io::Error::other(format!(
                        "{} is not a directory",
                        path.display()
                    )))
                }
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("{} not found", path.display()),
                    ))
                }
            }
        }

        Ok(self
            .nodes
            .iter()
            .filter(|(existing, _)| existing.parent() == Some(dir.as_path()))
            .map(|(existing, node)| DirItem {
                path: existing.clone(),
                is_dir: matches!(node, Node::Dir),
            })
            .collect())
    }
}

impl fmt::Display for MemoryFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory ({} entries)", self.nodes.len())
    }
}
