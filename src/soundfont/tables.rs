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

//! Fixed-size records of the SoundFont `pdta` tables.

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

use crate::error::IngestError;

/// Sample type flag marking samples stored in ROM rather than in the file.
pub const SAMPLE_TYPE_ROM: u16 = 0x8000;

/// Longest record in any table (`shdr`).
pub const MAX_RECORD_LEN: usize = 46;

/// A record that can be decoded from its on-disk bytes.
pub trait Record: Sized {
    /// Size of one record on disk.
    const LEN: usize;

    fn parse(raw: &[u8]) -> Result<Self, IngestError>;
}

/// Decodes a fixed 20 byte, NUL padded name.
fn parse_name(raw: &[u8]) -> String {
    let name = &raw[..20];
    let len = name.iter().position(|b| *b == 0).unwrap_or(name.len());
    String::from_utf8_lossy(&name[..len]).trim_end().to_string()
}

/// A `phdr` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetHeader {
    pub name: String,
    pub preset: u16,
    pub bank: u16,
    pub bag_index: u16,
    pub library: u32,
    pub genre: u32,
    pub morphology: u32,
}

impl Record for PresetHeader {
    const LEN: usize = 38;

    fn parse(raw: &[u8]) -> Result<PresetHeader, IngestError> {
        let name = parse_name(raw);
        let mut fields = &raw[20..];
        Ok(PresetHeader {
            name,
            preset: fields.read_u16::<LittleEndian>()?,
            bank: fields.read_u16::<LittleEndian>()?,
            bag_index: fields.read_u16::<LittleEndian>()?,
            library: fields.read_u32::<LittleEndian>()?,
            genre: fields.read_u32::<LittleEndian>()?,
            morphology: fields.read_u32::<LittleEndian>()?,
        })
    }
}

/// An `inst` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentHeader {
    pub name: String,
    pub bag_index: u16,
}

impl Record for InstrumentHeader {
    const LEN: usize = 22;

    fn parse(raw: &[u8]) -> Result<InstrumentHeader, IngestError> {
        Ok(InstrumentHeader {
            name: parse_name(raw),
            bag_index: (&raw[20..]).read_u16::<LittleEndian>()?,
        })
    }
}

/// A `pbag` or `ibag` record: the first generator and modulator of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bag {
    pub generator_index: u16,
    pub modulator_index: u16,
}

impl Record for Bag {
    const LEN: usize = 4;

    fn parse(raw: &[u8]) -> Result<Bag, IngestError> {
        let mut fields = raw;
        Ok(Bag {
            generator_index: fields.read_u16::<LittleEndian>()?,
            modulator_index: fields.read_u16::<LittleEndian>()?,
        })
    }
}

/// A `pgen` or `igen` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Generator {
    pub operator: u16,
    /// Raw amount; signed, unsigned or a low/high byte range depending on the operator.
    pub amount: u16,
}

impl Record for Generator {
    const LEN: usize = 4;

    fn parse(raw: &[u8]) -> Result<Generator, IngestError> {
        let mut fields = raw;
        Ok(Generator {
            operator: fields.read_u16::<LittleEndian>()?,
            amount: fields.read_u16::<LittleEndian>()?,
        })
    }
}

/// A `shdr` record. Positions are sample frames from the start of `smpl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleHeader {
    pub name: String,
    pub start: u32,
    pub end: u32,
    pub start_loop: u32,
    pub end_loop: u32,
    pub sample_rate: u32,
    pub original_pitch: u8,
    pub pitch_correction: i8,
    pub sample_link: u16,
    pub sample_type: u16,
}

impl SampleHeader {
    pub fn is_rom(&self) -> bool {
        self.sample_type & SAMPLE_TYPE_ROM != 0
    }
}

impl Record for SampleHeader {
    const LEN: usize = 46;

    fn parse(raw: &[u8]) -> Result<SampleHeader, IngestError> {
        let name = parse_name(raw);
        let mut fields = &raw[20..];
        Ok(SampleHeader {
            name,
            start: fields.read_u32::<LittleEndian>()?,
            end: fields.read_u32::<LittleEndian>()?,
            start_loop: fields.read_u32::<LittleEndian>()?,
            end_loop: fields.read_u32::<LittleEndian>()?,
            sample_rate: fields.read_u32::<LittleEndian>()?,
            original_pitch: fields.read_u8()?,
            pitch_correction: fields.read_i8()?,
            sample_link: fields.read_u16::<LittleEndian>()?,
            sample_type: fields.read_u16::<LittleEndian>()?,
        })
    }
}
