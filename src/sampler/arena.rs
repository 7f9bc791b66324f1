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
use std::ops::Range;

use serde::Serialize;
use tracing::{debug, warn};

use super::error::SamplerError;
use super::Sampler;
use crate::descriptor::{LoopMode, NoteRange};

/// Default number of sample slots in the arena's sample table.
pub const DEFAULT_MAX_SAMPLES: usize = 256;

/// A sample slot as committed to the arena. Frame offsets are absolute arena positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArenaSample {
    pub start: usize,
    pub end: usize,
    pub loop_range: Option<(u32, u32)>,
    pub loop_mode: LoopMode,
    pub exclusive_class: u16,
    pub root_key: u8,
    pub sample_rate: u32,
    pub tune_cents: i16,
    pub key_range: NoteRange,
    pub vel_range: NoteRange,
    pub hold_rate: Option<u32>,
    pub release_rate: Option<u32>,
}

impl Default for ArenaSample {
    fn default() -> ArenaSample {
        ArenaSample {
            start: 0,
            end: 0,
            loop_range: None,
            loop_mode: LoopMode::None,
            exclusive_class: 0,
            root_key: 60,
            sample_rate: 0,
            tune_cents: 0,
            key_range: NoteRange::FULL,
            vel_range: NoteRange::FULL,
            hold_rate: None,
            release_rate: None,
        }
    }
}

/// A bounded in-memory sampler arena. Stores all transferred audio as signed
/// 16-bit samples and keeps the committed sample table and instrument groups.
pub struct MemoryArena {
    capacity: usize,
    max_samples: usize,
    data: Vec<i16>,
    transfer_base: usize,
    transferring: bool,
    transfers: usize,
    pending: Option<ArenaSample>,
    samples: Vec<ArenaSample>,
    instruments: Vec<Range<usize>>,
    instrument_start: usize,
}

impl MemoryArena {
    /// Creates an arena holding up to `capacity` samples of audio.
    pub fn new(capacity: usize) -> MemoryArena {
        MemoryArena::with_max_samples(capacity, DEFAULT_MAX_SAMPLES)
    }

    /// Creates an arena with an explicit sample table size.
    pub fn with_max_samples(capacity: usize, max_samples: usize) -> MemoryArena {
        MemoryArena {
            capacity,
            max_samples,
            data: Vec::new(),
            transfer_base: 0,
            transferring: false,
            transfers: 0,
            pending: None,
            samples: Vec::new(),
            instruments: Vec::new(),
            instrument_start: 0,
        }
    }

    /// Samples that have been finished and are visible to playback.
    pub fn samples(&self) -> &[ArenaSample] {
        &self.samples
    }

    /// Instruments as ranges of indices into [`MemoryArena::samples`].
    pub fn instruments(&self) -> &[Range<usize>] {
        &self.instruments
    }

    /// The audio data of a committed sample, end inclusive.
    pub fn sample_data(&self, sample: &ArenaSample) -> &[i16] {
        let end = (sample.end + 1).min(self.data.len());
        let start = sample.start.min(end);
        &self.data[start..end]
    }

    /// All transferred audio.
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    /// Number of samples of audio stored.
    pub fn used(&self) -> usize {
        self.data.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a transfer has begun and not yet ended.
    pub fn is_transferring(&self) -> bool {
        self.transferring
    }

    /// Number of completed transfers.
    pub fn transfers(&self) -> usize {
        self.transfers
    }

    /// The sample being configured, if any.
    pub fn pending(&self) -> Option<&ArenaSample> {
        self.pending.as_ref()
    }

    fn reserve(&self, requested: usize) -> Result<(), SamplerError> {
        if !self.transferring {
            return Err(SamplerError::NoTransfer);
        }
        let available = self.capacity - self.data.len();
        if requested > available {
            return Err(SamplerError::ArenaFull {
                requested,
                available,
            });
        }
        Ok(())
    }

    fn pending_mut(&mut self, setter: &'static str) -> Option<&mut ArenaSample> {
        if self.pending.is_none() {
            warn!(setter, "Sample setter called without a pending sample");
        }
        self.pending.as_mut()
    }
}

impl Sampler for MemoryArena {
    fn begin_transfer(&mut self) {
        if self.transferring {
            warn!("Transfer started while another was in progress");
        }
        self.transferring = true;
        self.transfer_base = self.data.len();
    }

    fn add_samples(&mut self, samples: &[i16]) -> Result<(), SamplerError> {
        self.reserve(samples.len())?;
        self.data.extend_from_slice(samples);
        Ok(())
    }

    fn add_samples_u8(&mut self, samples: &[u8]) -> Result<(), SamplerError> {
        self.reserve(samples.len())?;
        self.data
            .extend(samples.iter().map(|s| (i16::from(*s) - 128) << 8));
        Ok(())
    }

    fn end_transfer(&mut self) {
        if self.transferring {
            self.transfers += 1;
            debug!(
                base = self.transfer_base,
                samples = self.data.len() - self.transfer_base,
                "Transfer complete"
            );
        }
        self.transferring = false;
    }

    fn new_sample(&mut self) -> Result<(), SamplerError> {
        if self.samples.len() >= self.max_samples {
            return Err(SamplerError::SampleTableFull(self.max_samples));
        }
        if self.pending.is_some() {
            debug!("Discarding unfinished sample");
        }
        self.pending = Some(ArenaSample::default());
        Ok(())
    }

    fn set_sample_range(&mut self, start: u32, end: u32) {
        let base = self.transfer_base;
        if let Some(sample) = self.pending_mut("set_sample_range") {
            sample.start = base + start as usize;
            sample.end = base + end as usize;
        }
    }

    fn set_loop_range(&mut self, start: u32, end: u32) {
        if let Some(sample) = self.pending_mut("set_loop_range") {
            sample.loop_range = Some((start, end));
        }
    }

    fn set_loop_mode(&mut self, mode: LoopMode) {
        if let Some(sample) = self.pending_mut("set_loop_mode") {
            sample.loop_mode = mode;
        }
    }

    fn set_exclusive_class(&mut self, class: u16) {
        if let Some(sample) = self.pending_mut("set_exclusive_class") {
            sample.exclusive_class = class;
        }
    }

    fn set_pitch(&mut self, root_key: u8, sample_rate: u32, tune_cents: i16) {
        if let Some(sample) = self.pending_mut("set_pitch") {
            sample.root_key = root_key;
            sample.sample_rate = sample_rate;
            sample.tune_cents = tune_cents;
        }
    }

    fn set_key_range(&mut self, range: NoteRange) {
        if let Some(sample) = self.pending_mut("set_key_range") {
            sample.key_range = range;
        }
    }

    fn set_vel_range(&mut self, range: NoteRange) {
        if let Some(sample) = self.pending_mut("set_vel_range") {
            sample.vel_range = range;
        }
    }

    fn set_hold_rate(&mut self, rate: u32) {
        if let Some(sample) = self.pending_mut("set_hold_rate") {
            sample.hold_rate = Some(rate);
        }
    }

    fn set_release_rate(&mut self, rate: u32) {
        if let Some(sample) = self.pending_mut("set_release_rate") {
            sample.release_rate = Some(rate);
        }
    }

    fn finish_sample(&mut self) {
        match self.pending.take() {
            Some(sample) => self.samples.push(sample),
            None => warn!("finish_sample called without a pending sample"),
        }
    }

    fn instrument_done(&mut self) {
        if self.samples.len() > self.instrument_start {
            self.instruments.push(self.instrument_start..self.samples.len());
        }
        self.instrument_start = self.samples.len();
    }
}

impl fmt::Debug for MemoryArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryArena")
            .field("used", &self.data.len())
            .field("capacity", &self.capacity)
            .field("samples", &self.samples.len())
            .field("instruments", &self.instruments.len())
            .finish()
    }
}
