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

//! Ingest orchestration: batch policies over WAV files, folders and
//! SoundFont banks, each reporting what it committed.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, warn};

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::fs::Filesystem;
use crate::sampler::Sampler;
use crate::walker::DEFAULT_MAX_DEPTH;

mod soundfont;
mod wav;

/// Engine output rate assumed when none is configured.
pub const DEFAULT_ENGINE_SAMPLE_RATE: u32 = 48000;

/// Which notes a WAV sample answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteAssignment {
    /// Only this note, with the sample's root key set to it.
    Note(u8),
    /// The full keyboard, pitched from middle C.
    AllNotes,
}

/// How much of a SoundFont bank to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SoundFontMode {
    /// Every sample header on its own, one instrument each.
    Samples,
    /// The first sample-bearing zone of each instrument.
    Instruments,
    /// Every zone of each instrument.
    InstrumentsMulti,
    /// Every preset, with preset zones layered over their instruments.
    Presets,
}

/// A file or sample that could not be ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// What one ingest call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Files opened for ingest.
    pub files: usize,
    /// Samples made visible with `finish_sample`.
    pub committed: usize,
    /// Samples or files passed over without an error.
    pub skipped: usize,
    /// Instrument groups closed with `instrument_done`.
    pub instruments: usize,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// True if nothing failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: &Path, err: &IngestError) {
        self.failures.push(IngestFailure {
            path: path.to_path_buf(),
            reason: err.to_string(),
        });
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} samples committed, {} skipped, {} instruments, {} failures",
            self.files,
            self.committed,
            self.skipped,
            self.instruments,
            self.failures.len()
        )
    }
}

/// Streams files from one filesystem into one sampler.
pub struct Ingestor<'a, S: ?Sized> {
    fs: &'a dyn Filesystem,
    sampler: &'a mut S,
    engine_sample_rate: u32,
    max_depth: usize,
}

impl<'a, S: Sampler + ?Sized> Ingestor<'a, S> {
    pub fn new(fs: &'a dyn Filesystem, sampler: &'a mut S) -> Ingestor<'a, S> {
        Ingestor {
            fs,
            sampler,
            engine_sample_rate: DEFAULT_ENGINE_SAMPLE_RATE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Creates an ingestor using the configured engine rate and walk depth.
    pub fn with_config(
        fs: &'a dyn Filesystem,
        sampler: &'a mut S,
        config: &IngestConfig,
    ) -> Ingestor<'a, S> {
        Ingestor::new(fs, sampler)
            .engine_sample_rate(config.sample_rate())
            .max_depth(config.max_depth())
    }

    /// Sets the engine output rate used for envelope conversion.
    pub fn engine_sample_rate(mut self, rate: u32) -> Ingestor<'a, S> {
        self.engine_sample_rate = rate;
        self
    }

    /// Sets how many directory levels folder ingest descends.
    pub fn max_depth(mut self, depth: usize) -> Ingestor<'a, S> {
        self.max_depth = depth;
        self
    }

    pub fn sampler(&mut self) -> &mut S {
        &mut *self.sampler
    }

    /// Records the outcome of one file. A malformed container is "no data",
    /// not a failure.
    fn finish_file(&self, report: &mut IngestReport, path: &Path, result: Result<(), IngestError>) {
        match result {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => {
                warn!(path = ?path, err = %e, "No sample data found");
                report.skipped += 1;
            }
            Err(e) => {
                error!(path = ?path, err = %e, "Loading failed");
                report.fail(path, &e);
            }
        }
    }

    fn close_instrument(&mut self, report: &mut IngestReport) {
        self.sampler.instrument_done();
        report.instruments += 1;
    }
}
