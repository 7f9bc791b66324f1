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
use std::path::PathBuf;

use crate::sampler::SamplerError;

/// Error types for ingest operations. Every variant is scoped to a single file
/// or a single sample; none of them is fatal to a batch.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unable to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to read directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("Unsupported encoding: {bits_per_sample} bits, {channels} channels")]
    UnsupportedEncoding { bits_per_sample: u16, channels: u16 },

    #[error("Unsupported WAV format tag {0:#06x}")]
    UnsupportedFormatTag(u16),

    #[error("Malformed container: {0}")]
    Malformed(String),

    #[error("Sampler rejected the sample: {0}")]
    Sampler(#[from] SamplerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Malformed containers are treated as "no data found" rather than failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IngestError::Malformed(_))
    }
}
