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

//! Ingestion of WAV files and SoundFont banks into a sampler arena.
//!
//! This crate provides:
//! - Byte sources over mounted filesystems, one owned session per file
//! - RIFF/WAV and SoundFont 2 structure readers
//! - Timecent to fixed-point envelope rate conversion
//! - Streaming transfer of PCM payloads through a small staging buffer
//! - Directory walking and batch ingest policies

pub mod config;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod fs;
pub mod ingest;
pub mod riff;
pub mod sampler;
pub mod soundfont;
pub mod transfer;
pub mod walker;
pub mod wav;

#[cfg(test)]
mod testutil;

pub use descriptor::{LoopMode, NoteRange, SampleDescriptor};
pub use error::IngestError;
pub use ingest::{IngestFailure, IngestReport, Ingestor, NoteAssignment, SoundFontMode};
pub use sampler::{MemoryArena, Sampler, SamplerError};
