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
use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;
use tracing::debug;

use crate::descriptor::{LoopMode, SampleDescriptor, MIDI_MAX};
use crate::error::IngestError;
use crate::fs::read_full;

/// Fixed part of a `smpl` chunk, before the loop records.
const SMPL_HEADER_LEN: u32 = 36;

/// Size of one loop record.
const SAMPLE_LOOP_LEN: u32 = 24;

/// One loop record of a `smpl` chunk. Positions are frame offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleLoop {
    pub cue_id: u32,
    pub loop_type: u32,
    pub start: u32,
    pub end: u32,
    pub fraction: u32,
    pub play_count: u32,
}

/// The sampler chunk of a WAV file: MIDI pitch information and loop points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmplChunk {
    pub manufacturer: u32,
    pub product: u32,
    pub sample_period: u32,
    pub midi_unity_note: u32,
    pub midi_pitch_fraction: u32,
    pub smpte_format: u32,
    pub smpte_offset: u32,
    pub sampler_data: u32,
    pub loops: Vec<SampleLoop>,
}

impl SmplChunk {
    /// Reads a `smpl` payload of the given declared size. Loop records beyond
    /// what the declared size can hold are ignored.
    pub fn read<R: Read>(reader: &mut R, size: u32) -> Result<SmplChunk, IngestError> {
        let mut raw = [0u8; SMPL_HEADER_LEN as usize];
        read_full(reader, &mut raw)?;
        let mut fields = &raw[..];

        let manufacturer = fields.read_u32::<LittleEndian>()?;
        let product = fields.read_u32::<LittleEndian>()?;
        let sample_period = fields.read_u32::<LittleEndian>()?;
        let midi_unity_note = fields.read_u32::<LittleEndian>()?;
        let midi_pitch_fraction = fields.read_u32::<LittleEndian>()?;
        let smpte_format = fields.read_u32::<LittleEndian>()?;
        let smpte_offset = fields.read_u32::<LittleEndian>()?;
        let declared_loops = fields.read_u32::<LittleEndian>()?;
        let sampler_data = fields.read_u32::<LittleEndian>()?;

        let room = size.saturating_sub(SMPL_HEADER_LEN) / SAMPLE_LOOP_LEN;
        let count = declared_loops.min(room);
        let mut loops = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut raw = [0u8; SAMPLE_LOOP_LEN as usize];
            read_full(reader, &mut raw)?;
            let mut fields = &raw[..];
            loops.push(SampleLoop {
                cue_id: fields.read_u32::<LittleEndian>()?,
                loop_type: fields.read_u32::<LittleEndian>()?,
                start: fields.read_u32::<LittleEndian>()?,
                end: fields.read_u32::<LittleEndian>()?,
                fraction: fields.read_u32::<LittleEndian>()?,
                play_count: fields.read_u32::<LittleEndian>()?,
            });
        }

        let smpl = SmplChunk {
            manufacturer,
            product,
            sample_period,
            midi_unity_note,
            midi_pitch_fraction,
            smpte_format,
            smpte_offset,
            sampler_data,
            loops,
        };
        debug!(smpl = ?smpl, declared_loops, "smpl chunk");
        Ok(smpl)
    }

    /// The first loop, which is the only one the engine can play.
    pub fn first_loop(&self) -> Option<&SampleLoop> {
        self.loops.first()
    }

    /// Overlays the pitch and loop information onto a descriptor. The unity
    /// note replaces any tuning, and a loop forces continuous looping.
    pub fn apply_to(&self, descriptor: &mut SampleDescriptor) {
        descriptor.root_key = self.midi_unity_note.min(u32::from(MIDI_MAX)) as u8;
        descriptor.tune_cents = 0;
        if let Some(sample_loop) = self.first_loop() {
            descriptor.loop_range = Some((sample_loop.start, sample_loop.end));
            descriptor.loop_mode = LoopMode::Continuous;
        }
    }
}
