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

//! SoundFont 2 reading: the chunk index, the `pdta` tables and the
//! resolution of presets, instruments and samples into load parameters.
//!
//! Table entries are read on demand by seeking to their offset, so a bank of
//! any size is walked with a constant amount of memory.

use std::io::{Read, Seek, SeekFrom};

use serde::Serialize;
use tracing::debug;

use crate::error::IngestError;
use crate::fs::read_full;

pub mod generators;
pub mod index;
pub mod tables;
pub mod zones;

pub use generators::{GeneratorSet, InstrumentLoadInfo};
pub use index::{SoundFontIndex, Table};
pub use tables::{Bag, Generator, InstrumentHeader, PresetHeader, Record, SampleHeader};
pub use zones::{InstrumentZones, PresetZones};

use tables::MAX_RECORD_LEN;

/// Every header record of a bank, without the terminal records.
#[derive(Debug, Clone, Serialize)]
pub struct SoundFontSummary {
    pub index: SoundFontIndex,
    pub presets: Vec<PresetHeader>,
    pub instruments: Vec<InstrumentHeader>,
    pub samples: Vec<SampleHeader>,
}

/// A SoundFont file opened for reading.
pub struct SoundFontReader<R> {
    reader: R,
    index: SoundFontIndex,
}

impl<R: Read + Seek> SoundFontReader<R> {
    /// Scans the file's chunk directory.
    pub fn new(mut reader: R) -> Result<SoundFontReader<R>, IngestError> {
        let index = SoundFontIndex::scan(&mut reader)?;
        Ok(SoundFontReader { reader, index })
    }

    pub fn index(&self) -> &SoundFontIndex {
        &self.index
    }

    /// Number of samples, excluding the terminal record.
    pub fn sample_count(&self) -> u32 {
        self.index.shdr.count.saturating_sub(1)
    }

    /// Number of instruments, excluding the terminal record.
    pub fn instrument_count(&self) -> u32 {
        self.index.inst.count.saturating_sub(1)
    }

    /// Number of presets, excluding the terminal record.
    pub fn preset_count(&self) -> u32 {
        self.index.phdr.count.saturating_sub(1)
    }

    /// Positions the reader at the first byte of sample data and returns the
    /// data's length in bytes.
    pub fn seek_sample_data(&mut self) -> Result<u32, IngestError> {
        self.reader.seek(SeekFrom::Start(self.index.smpl_offset))?;
        Ok(self.index.smpl_len)
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn record<T: Record>(&mut self, table: Table, index: u32) -> Result<T, IngestError> {
        let offset = table.record_offset(index, T::LEN).ok_or_else(|| {
            IngestError::Malformed(format!(
                "record {} out of range ({} records)",
                index, table.count
            ))
        })?;
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut raw = [0u8; MAX_RECORD_LEN];
        read_full(&mut self.reader, &mut raw[..T::LEN])?;
        T::parse(&raw[..T::LEN])
    }

    pub fn sample_header(&mut self, index: u32) -> Result<SampleHeader, IngestError> {
        self.record(self.index.shdr, index)
    }

    pub fn instrument_header(&mut self, index: u32) -> Result<InstrumentHeader, IngestError> {
        self.record(self.index.inst, index)
    }

    pub fn preset_header(&mut self, index: u32) -> Result<PresetHeader, IngestError> {
        self.record(self.index.phdr, index)
    }

    /// Reads the generators of one zone, stopping at the `terminal` operator
    /// (sample or instrument reference). Returns the generators before it and
    /// the terminal's amount, if the zone has one.
    pub(crate) fn zone_generators(
        &mut self,
        bags: Table,
        generators: Table,
        bag: u32,
        terminal: u16,
    ) -> Result<(GeneratorSet, Option<u16>), IngestError> {
        let first = self.record::<Bag>(bags, bag)?.generator_index;
        let next = self.record::<Bag>(bags, bag + 1)?.generator_index;

        let mut set = GeneratorSet::new();
        for position in u32::from(first)..u32::from(next) {
            let generator = self.record::<Generator>(generators, position)?;
            if generator.operator == terminal {
                return Ok((set, Some(generator.amount)));
            }
            set.set(&generator);
        }
        Ok((set, None))
    }

    /// Load parameters for a bare sample header. ROM samples have no data in
    /// the file and yield None.
    pub fn sample_info(&mut self, index: u32) -> Result<Option<InstrumentLoadInfo>, IngestError> {
        let header = self.sample_header(index)?;
        if header.is_rom() {
            debug!(sample = %header.name, "Skipping ROM sample");
            return Ok(None);
        }
        Ok(Some(InstrumentLoadInfo::from_sample(&header)))
    }

    pub fn instrument_zones(&mut self, index: u32) -> Result<InstrumentZones<'_, R>, IngestError> {
        InstrumentZones::new(self, index)
    }

    /// The first sample-bearing zone of an instrument.
    pub fn instrument_info(
        &mut self,
        index: u32,
    ) -> Result<Option<InstrumentLoadInfo>, IngestError> {
        self.instrument_zones(index)?.next().transpose()
    }

    pub fn preset_zones(&mut self, index: u32) -> Result<PresetZones<'_, R>, IngestError> {
        PresetZones::new(self, index)
    }

    /// Reads every preset, instrument and sample header.
    pub fn summary(&mut self) -> Result<SoundFontSummary, IngestError> {
        let presets = (0..self.preset_count())
            .map(|index| self.preset_header(index))
            .collect::<Result<Vec<_>, _>>()?;
        let instruments = (0..self.instrument_count())
            .map(|index| self.instrument_header(index))
            .collect::<Result<Vec<_>, _>>()?;
        let samples = (0..self.sample_count())
            .map(|index| self.sample_header(index))
            .collect::<Result<Vec<_>, _>>()?;

        for sample in &samples {
            debug!(
                name = %sample.name,
                start = sample.start,
                end = sample.end,
                start_loop = sample.start_loop,
                end_loop = sample.end_loop,
                sample_rate = sample.sample_rate,
                original_pitch = sample.original_pitch,
                "Sample header"
            );
        }

        Ok(SoundFontSummary {
            index: self.index,
            presets,
            instruments,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::generators::{SAMPLE_ID, SAMPLE_MODES};
    use super::*;
    use crate::testutil::Sf2Builder;

    #[test]
    fn test_counts_exclude_terminals() {
        let mut builder = Sf2Builder::new();
        builder.sample_data(vec![0; 10]);
        let s = builder.sample("s", 0, 10, 0, 0, 44100, 60);
        builder.instrument("i", vec![vec![(SAMPLE_ID, s)]]);
        let sf = SoundFontReader::new(Cursor::new(builder.build())).unwrap();
        assert_eq!(sf.sample_count(), 1);
        assert_eq!(sf.instrument_count(), 1);
        assert_eq!(sf.preset_count(), 0);
    }

    #[test]
    fn test_single_zone_matches_first_of_multi_zone() {
        let mut builder = Sf2Builder::new();
        builder.sample_data(vec![0; 3000]);
        let a = builder.sample("a", 0, 1000, 100, 900, 44100, 60);
        let b = builder.sample("b", 1000, 2000, 0, 0, 44100, 64);
        builder.instrument(
            "multi",
            vec![vec![(SAMPLE_MODES, 1), (SAMPLE_ID, a)], vec![(SAMPLE_ID, b)]],
        );
        let mut sf = SoundFontReader::new(Cursor::new(builder.build())).unwrap();

        let single = sf.instrument_info(0).unwrap().unwrap();
        let first = sf.instrument_zones(0).unwrap().next().unwrap().unwrap();
        assert_eq!(single, first);
        assert_eq!(single.sample_name, "a");
    }

    #[test]
    fn test_rom_sample_is_skipped() {
        let mut builder = Sf2Builder::new();
        builder.sample_data(vec![0; 10]);
        let s = builder.sample("rom", 0, 10, 0, 0, 44100, 60);
        builder.sample_type(s, 0x8001);
        let mut sf = SoundFontReader::new(Cursor::new(builder.build())).unwrap();
        assert_eq!(sf.sample_info(0).unwrap(), None);
    }

    #[test]
    fn test_summary() {
        let mut builder = Sf2Builder::new();
        builder.sample_data(vec![0; 10]);
        let a = builder.sample("a", 0, 5, 0, 0, 44100, 60);
        builder.sample("b", 5, 10, 0, 0, 44100, 61);
        let i = builder.instrument("inst", vec![vec![(SAMPLE_ID, a)]]);
        builder.preset("Bright", 3, 1, vec![vec![(super::generators::INSTRUMENT, i)]]);
        let mut sf = SoundFontReader::new(Cursor::new(builder.build())).unwrap();

        let summary = sf.summary().unwrap();
        assert_eq!(summary.presets.len(), 1);
        assert_eq!(summary.presets[0].name, "Bright");
        assert_eq!((summary.presets[0].preset, summary.presets[0].bank), (3, 1));
        assert_eq!(summary.instruments[0].name, "inst");
        let names: Vec<&str> = summary.samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_seek_sample_data() {
        let mut builder = Sf2Builder::new();
        builder.sample_data(vec![7, -7]);
        builder.sample("s", 0, 2, 0, 0, 44100, 60);
        let mut sf = SoundFontReader::new(Cursor::new(builder.build())).unwrap();
        assert_eq!(sf.seek_sample_data().unwrap(), 4);
        let mut raw = [0u8; 4];
        sf.reader_mut().read_exact(&mut raw).unwrap();
        assert_eq!(raw, [7, 0, 0xf9, 0xff]);
    }
}
