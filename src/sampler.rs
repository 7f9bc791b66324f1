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

//! The interface to the sample-playback engine.
//!
//! The engine owns a memory arena. Ingest fills it in two steps: PCM data is
//! streamed in between `begin_transfer` and `end_transfer`, and sample slots
//! are configured between `new_sample` and `finish_sample`. A sample is not
//! visible to playback until `finish_sample` is called.

mod arena;
mod error;

pub use arena::{ArenaSample, MemoryArena, DEFAULT_MAX_SAMPLES};
pub use error::SamplerError;

use crate::descriptor::{LoopMode, NoteRange};

/// A sample-playback engine that ingest can write into.
pub trait Sampler {
    /// Starts a new data transfer. Sample ranges set afterwards are relative
    /// to the first frame of this transfer.
    fn begin_transfer(&mut self);

    /// Appends signed 16-bit frames to the current transfer.
    fn add_samples(&mut self, samples: &[i16]) -> Result<(), SamplerError>;

    /// Appends unsigned 8-bit frames to the current transfer.
    fn add_samples_u8(&mut self, samples: &[u8]) -> Result<(), SamplerError>;

    /// Finalizes the current transfer.
    fn end_transfer(&mut self);

    /// Allocates a new, not yet visible, sample slot.
    fn new_sample(&mut self) -> Result<(), SamplerError>;

    /// Sets the playable frame range of the pending sample.
    fn set_sample_range(&mut self, start: u32, end: u32);

    /// Sets the loop range of the pending sample, relative to its start.
    fn set_loop_range(&mut self, start: u32, end: u32);

    fn set_loop_mode(&mut self, mode: LoopMode);

    fn set_exclusive_class(&mut self, class: u16);

    fn set_pitch(&mut self, root_key: u8, sample_rate: u32, tune_cents: i16);

    fn set_key_range(&mut self, range: NoteRange);

    fn set_vel_range(&mut self, range: NoteRange);

    /// Sets the fixed-point hold stage decay rate.
    fn set_hold_rate(&mut self, rate: u32);

    /// Sets the fixed-point release stage decay rate.
    fn set_release_rate(&mut self, rate: u32);

    /// Makes the pending sample visible to playback.
    fn finish_sample(&mut self);

    /// Groups all samples finished since the last call into one instrument.
    fn instrument_done(&mut self);
}
