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

//! Generator operators and the resolution of a zone into load parameters.

use serde::Serialize;

use super::tables::{Generator, SampleHeader};
use crate::descriptor::{NoteRange, MIDI_MAX};
use crate::envelope::DEFAULT_ENVELOPE_TIMECENTS;

pub const START_ADDRS_OFFSET: u16 = 0;
pub const END_ADDRS_OFFSET: u16 = 1;
pub const STARTLOOP_ADDRS_OFFSET: u16 = 2;
pub const ENDLOOP_ADDRS_OFFSET: u16 = 3;
pub const START_ADDRS_COARSE_OFFSET: u16 = 4;
pub const END_ADDRS_COARSE_OFFSET: u16 = 12;
pub const DECAY_VOL_ENV: u16 = 36;
pub const RELEASE_VOL_ENV: u16 = 38;
pub const INSTRUMENT: u16 = 41;
pub const KEY_RANGE: u16 = 43;
pub const VEL_RANGE: u16 = 44;
pub const STARTLOOP_ADDRS_COARSE_OFFSET: u16 = 45;
pub const ENDLOOP_ADDRS_COARSE_OFFSET: u16 = 50;
pub const COARSE_TUNE: u16 = 51;
pub const FINE_TUNE: u16 = 52;
pub const SAMPLE_ID: u16 = 53;
pub const SAMPLE_MODES: u16 = 54;
pub const EXCLUSIVE_CLASS: u16 = 57;
pub const OVERRIDING_ROOT_KEY: u16 = 58;

/// Number of defined generator operators.
pub const GENERATOR_COUNT: usize = 61;

/// Frames per unit of a coarse address offset.
const COARSE_OFFSET_FRAMES: i64 = 32768;

/// Generators that only have meaning at instrument level and are ignored in presets.
const INSTRUMENT_ONLY: [u16; 11] = [
    START_ADDRS_OFFSET,
    END_ADDRS_OFFSET,
    STARTLOOP_ADDRS_OFFSET,
    ENDLOOP_ADDRS_OFFSET,
    START_ADDRS_COARSE_OFFSET,
    END_ADDRS_COARSE_OFFSET,
    STARTLOOP_ADDRS_COARSE_OFFSET,
    ENDLOOP_ADDRS_COARSE_OFFSET,
    SAMPLE_MODES,
    EXCLUSIVE_CLASS,
    OVERRIDING_ROOT_KEY,
];

/// The generator values of one zone, at most one per operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSet {
    values: [Option<u16>; GENERATOR_COUNT],
}

impl Default for GeneratorSet {
    fn default() -> GeneratorSet {
        GeneratorSet {
            values: [None; GENERATOR_COUNT],
        }
    }
}

impl GeneratorSet {
    pub fn new() -> GeneratorSet {
        GeneratorSet::default()
    }

    /// Records a generator. A later value for the same operator replaces an
    /// earlier one; unknown operators are ignored.
    pub fn set(&mut self, generator: &Generator) {
        if let Some(slot) = self.values.get_mut(usize::from(generator.operator)) {
            *slot = Some(generator.amount);
        }
    }

    pub fn get(&self, operator: u16) -> Option<u16> {
        self.values.get(usize::from(operator)).copied().flatten()
    }

    /// The amount reinterpreted as a signed value.
    pub fn signed(&self, operator: u16) -> Option<i16> {
        self.get(operator).map(|amount| amount as i16)
    }

    pub fn range(&self, operator: u16) -> Option<NoteRange> {
        self.get(operator).map(NoteRange::from_generator)
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Fills every operator this set lacks from `defaults`.
    pub fn layered_over(&self, defaults: &GeneratorSet) -> GeneratorSet {
        let mut values = self.values;
        for (value, default) in values.iter_mut().zip(defaults.values.iter()) {
            if value.is_none() {
                *value = *default;
            }
        }
        GeneratorSet { values }
    }

    /// Applies a preset zone on top of an instrument zone. Preset values
    /// replace instrument values, except that key and velocity ranges are
    /// intersected. Returns None when the ranges do not overlap.
    pub fn with_preset(&self, preset: &GeneratorSet) -> Option<GeneratorSet> {
        let mut merged = self.clone();
        for (operator, value) in preset.values.iter().enumerate() {
            let operator = operator as u16;
            if matches!(operator, KEY_RANGE | VEL_RANGE | INSTRUMENT | SAMPLE_ID)
                || INSTRUMENT_ONLY.contains(&operator)
            {
                continue;
            }
            if let Some(value) = value {
                merged.values[usize::from(operator)] = Some(*value);
            }
        }
        for operator in [KEY_RANGE, VEL_RANGE] {
            if let Some(outer) = preset.range(operator) {
                let inner = self.range(operator).unwrap_or(NoteRange::FULL);
                let range = inner.intersect(&outer)?;
                merged.values[usize::from(operator)] =
                    Some(u16::from_le_bytes([range.low, range.high]));
            }
        }
        Some(merged)
    }

    /// Net offset in frames of a fine/coarse address generator pair.
    fn address_offset(&self, fine: u16, coarse: u16) -> i64 {
        let fine = i64::from(self.signed(fine).unwrap_or(0));
        let coarse = i64::from(self.signed(coarse).unwrap_or(0));
        fine + coarse * COARSE_OFFSET_FRAMES
    }
}

fn offset_position(position: u32, offset: i64) -> u32 {
    (i64::from(position) + offset).clamp(0, i64::from(u32::MAX)) as u32
}

/// Everything needed to commit one SoundFont sample, with positions in frames
/// from the start of the `smpl` chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentLoadInfo {
    /// Name of the instrument (or sample, in single-sample mode).
    pub name: String,
    pub sample_name: String,
    pub sample_modes: u16,
    pub start: u32,
    pub end: u32,
    pub start_loop: u32,
    pub end_loop: u32,
    pub sample_rate: u32,
    pub root_key: u8,
    /// Total tuning in cents.
    pub tune: i16,
    pub exclusive_class: u16,
    pub key_range: NoteRange,
    pub vel_range: NoteRange,
    /// Volume envelope decay time in timecents.
    pub decay_vol_env: i16,
    /// Volume envelope release time in timecents.
    pub release_vol_env: i16,
}

fn header_root_key(header: &SampleHeader) -> u8 {
    if header.original_pitch <= MIDI_MAX {
        header.original_pitch
    } else {
        60
    }
}

impl InstrumentLoadInfo {
    /// Load parameters for a bare sample header, with no zone to refine it.
    /// The sample loops continuously when its header declares a loop.
    pub fn from_sample(header: &SampleHeader) -> InstrumentLoadInfo {
        InstrumentLoadInfo {
            name: header.name.clone(),
            sample_name: header.name.clone(),
            sample_modes: u16::from(header.end_loop > header.start_loop),
            start: header.start,
            end: header.end,
            start_loop: header.start_loop,
            end_loop: header.end_loop,
            sample_rate: header.sample_rate,
            root_key: header_root_key(header),
            tune: i16::from(header.pitch_correction),
            exclusive_class: 0,
            key_range: NoteRange::FULL,
            vel_range: NoteRange::FULL,
            decay_vol_env: DEFAULT_ENVELOPE_TIMECENTS,
            release_vol_env: DEFAULT_ENVELOPE_TIMECENTS,
        }
    }

    /// Resolves a zone's generators against the sample header it references.
    pub fn resolve(name: &str, header: &SampleHeader, generators: &GeneratorSet) -> InstrumentLoadInfo {
        let start = offset_position(
            header.start,
            generators.address_offset(START_ADDRS_OFFSET, START_ADDRS_COARSE_OFFSET),
        );
        let end = offset_position(
            header.end,
            generators.address_offset(END_ADDRS_OFFSET, END_ADDRS_COARSE_OFFSET),
        );
        let start_loop = offset_position(
            header.start_loop,
            generators.address_offset(STARTLOOP_ADDRS_OFFSET, STARTLOOP_ADDRS_COARSE_OFFSET),
        );
        let end_loop = offset_position(
            header.end_loop,
            generators.address_offset(ENDLOOP_ADDRS_OFFSET, ENDLOOP_ADDRS_COARSE_OFFSET),
        );

        let root_key = match generators.get(OVERRIDING_ROOT_KEY) {
            Some(key) if key <= u16::from(MIDI_MAX) => key as u8,
            _ => header_root_key(header),
        };
        let tune = i32::from(generators.signed(COARSE_TUNE).unwrap_or(0)) * 100
            + i32::from(generators.signed(FINE_TUNE).unwrap_or(0))
            + i32::from(header.pitch_correction);

        InstrumentLoadInfo {
            name: name.to_string(),
            sample_name: header.name.clone(),
            sample_modes: generators.get(SAMPLE_MODES).unwrap_or(0),
            start,
            end,
            start_loop,
            end_loop,
            sample_rate: header.sample_rate,
            root_key,
            tune: tune.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16,
            exclusive_class: generators.get(EXCLUSIVE_CLASS).unwrap_or(0),
            key_range: generators.range(KEY_RANGE).unwrap_or(NoteRange::FULL),
            vel_range: generators.range(VEL_RANGE).unwrap_or(NoteRange::FULL),
            decay_vol_env: generators
                .signed(DECAY_VOL_ENV)
                .unwrap_or(DEFAULT_ENVELOPE_TIMECENTS),
            release_vol_env: generators
                .signed(RELEASE_VOL_ENV)
                .unwrap_or(DEFAULT_ENVELOPE_TIMECENTS),
        }
    }
}
