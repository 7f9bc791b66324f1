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
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use super::{ByteSource, DirItem, Filesystem};

/// A filesystem backed by a directory on the host, such as a mounted SD card.
pub struct LocalFs {
    id: String,
    root: PathBuf,
}

impl LocalFs {
    /// Creates a new local filesystem rooted at the given directory.
    pub fn new<P: Into<PathBuf>>(id: &str, root: P) -> LocalFs {
        LocalFs {
            id: id.to_string(),
            root: root.into(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        // Paths are always relative to the mount, even when written with a leading slash.
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.root.join(relative)
    }
}

impl Filesystem for LocalFs {
    fn open_source(&self, path: &Path) -> io::Result<Box<dyn ByteSource + Send>> {
        let file = File::open(self.resolve(path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirItem>> {
        let mut items = Vec::new();
        for entry in std::fs::read_dir(self.resolve(path))? {
            let entry = entry?;
            items.push(DirItem {
                path: path.join(entry.file_name()),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        Ok(items)
    }
}

impl fmt::Display for LocalFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.root.display())
    }
}
