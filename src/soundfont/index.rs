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

//! The chunk directory of a SoundFont file.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;
use tracing::{debug, warn};

use super::tables::{Bag, Generator, InstrumentHeader, PresetHeader, Record, SampleHeader};
use crate::error::IngestError;
use crate::fs::{read_full, stream_len};
use crate::riff::{read_fourcc, ChunkHeader, Chunks, FourCc};

/// Size of a modulator record. Modulators are located but not interpreted.
const MODULATOR_LEN: usize = 10;

/// Location and record count of one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub offset: u64,
    pub count: u32,
}

impl Table {
    fn from_chunk(header: &ChunkHeader, record_len: usize) -> Table {
        if header.size as usize % record_len != 0 {
            warn!(
                tag = %header.tag,
                size = header.size,
                record_len,
                "Table size is not a multiple of its record size"
            );
        }
        Table {
            offset: header.data_offset,
            count: header.size / record_len as u32,
        }
    }

    /// Offset of record `index`, if it exists.
    pub fn record_offset(&self, index: u32, record_len: usize) -> Option<u64> {
        (index < self.count).then(|| self.offset + u64::from(index) * record_len as u64)
    }
}

/// Offsets and counts of everything ingest needs from a SoundFont file.
/// Counts include the terminal record each table ends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoundFontIndex {
    /// Absolute offset of the 16-bit sample data.
    pub smpl_offset: u64,
    /// Length of the sample data in bytes.
    pub smpl_len: u32,
    pub phdr: Table,
    pub pbag: Table,
    pub pmod: Option<Table>,
    pub pgen: Table,
    pub inst: Table,
    pub ibag: Table,
    pub imod: Option<Table>,
    pub igen: Table,
    pub shdr: Table,
}

#[derive(Default)]
struct Found {
    smpl: Option<ChunkHeader>,
    phdr: Option<Table>,
    pbag: Option<Table>,
    pmod: Option<Table>,
    pgen: Option<Table>,
    inst: Option<Table>,
    ibag: Option<Table>,
    imod: Option<Table>,
    igen: Option<Table>,
    shdr: Option<Table>,
}

fn require(table: Option<Table>, tag: &str) -> Result<Table, IngestError> {
    table.ok_or_else(|| IngestError::Malformed(format!("missing {} chunk", tag)))
}

impl SoundFontIndex {
    /// Scans the chunk directory of a SoundFont file.
    pub fn scan<R: Read + Seek>(reader: &mut R) -> Result<SoundFontIndex, IngestError> {
        let end = stream_len(reader)?;
        reader.seek(SeekFrom::Start(0))?;

        let mut preamble = [0u8; 12];
        read_full(reader, &mut preamble)?;
        let mut fields = &preamble[..];
        let mut riff = [0u8; 4];
        fields.read_exact(&mut riff)?;
        let _riff_size = fields.read_u32::<LittleEndian>()?;
        let mut form = [0u8; 4];
        fields.read_exact(&mut form)?;
        if FourCc(riff) != FourCc::RIFF || FourCc(form) != FourCc(*b"sfbk") {
            return Err(IngestError::Malformed(format!(
                "not a SoundFont file ({} {})",
                FourCc(riff),
                FourCc(form)
            )));
        }

        // Collect the top-level lists first; their contents are walked afterwards.
        let mut lists = Vec::new();
        let mut chunks = Chunks::new(reader, 12, end);
        while let Some(header) = chunks.next() {
            let header = header?;
            if header.tag == FourCc::LIST && header.size >= 4 {
                let kind = read_fourcc(chunks.reader())?;
                lists.push((kind, header));
            } else {
                debug!(tag = %header.tag, "Skipping top-level chunk");
            }
        }

        let mut found = Found::default();
        for (kind, list) in lists {
            let mut chunks = Chunks::new(reader, list.data_offset + 4, list.end_offset());
            for header in &mut chunks {
                let header = header?;
                match (&kind.0, &header.tag.0) {
                    (b"sdta", b"smpl") => {
                        debug!(
                            offset = header.data_offset,
                            len = header.size,
                            "Sample data found"
                        );
                        found.smpl = Some(header);
                    }
                    (b"pdta", b"phdr") => {
                        found.phdr = Some(Table::from_chunk(&header, PresetHeader::LEN))
                    }
                    (b"pdta", b"pbag") => found.pbag = Some(Table::from_chunk(&header, Bag::LEN)),
                    (b"pdta", b"pmod") => {
                        found.pmod = Some(Table::from_chunk(&header, MODULATOR_LEN))
                    }
                    (b"pdta", b"pgen") => {
                        found.pgen = Some(Table::from_chunk(&header, Generator::LEN))
                    }
                    (b"pdta", b"inst") => {
                        found.inst = Some(Table::from_chunk(&header, InstrumentHeader::LEN))
                    }
                    (b"pdta", b"ibag") => found.ibag = Some(Table::from_chunk(&header, Bag::LEN)),
                    (b"pdta", b"imod") => {
                        found.imod = Some(Table::from_chunk(&header, MODULATOR_LEN))
                    }
                    (b"pdta", b"igen") => {
                        found.igen = Some(Table::from_chunk(&header, Generator::LEN))
                    }
                    (b"pdta", b"shdr") => {
                        found.shdr = Some(Table::from_chunk(&header, SampleHeader::LEN))
                    }
                    _ => debug!(list = %kind, tag = %header.tag, "Skipping chunk"),
                }
            }
        }

        let smpl = found
            .smpl
            .ok_or_else(|| IngestError::Malformed("missing smpl chunk".to_string()))?;
        let index = SoundFontIndex {
            smpl_offset: smpl.data_offset,
            smpl_len: smpl.size,
            phdr: require(found.phdr, "phdr")?,
            pbag: require(found.pbag, "pbag")?,
            pmod: found.pmod,
            pgen: require(found.pgen, "pgen")?,
            inst: require(found.inst, "inst")?,
            ibag: require(found.ibag, "ibag")?,
            imod: found.imod,
            igen: require(found.igen, "igen")?,
            shdr: require(found.shdr, "shdr")?,
        };
        debug!(
            presets = index.phdr.count,
            instruments = index.inst.count,
            samples = index.shdr.count,
            "SoundFont index"
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::testutil::{RiffWriter, Sf2Builder};

    #[test]
    fn test_scan_counts_include_terminals() {
        let mut builder = Sf2Builder::new();
        builder.sample_data(vec![0; 64]);
        let s = builder.sample("a", 0, 32, 0, 0, 44100, 60);
        builder.sample("b", 32, 64, 0, 0, 44100, 62);
        let i = builder.instrument("inst", vec![vec![(53, s)]]);
        builder.preset("preset", 0, 0, vec![vec![(41, i)]]);
        let bytes = builder.build();

        let index = SoundFontIndex::scan(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(index.smpl_len, 128);
        assert_eq!(index.shdr.count, 3);
        assert_eq!(index.inst.count, 2);
        assert_eq!(index.phdr.count, 2);
        assert_eq!(index.ibag.count, 2);
        assert_eq!(index.igen.count, 2);
        assert!(index.pmod.is_some());
    }

    #[test]
    fn test_smpl_offset_points_at_sample_data() {
        let mut builder = Sf2Builder::new();
        builder.sample_data(vec![0x1234, 0x5678]);
        builder.sample("a", 0, 2, 0, 0, 44100, 60);
        let bytes = builder.build();

        let index = SoundFontIndex::scan(&mut Cursor::new(bytes.clone())).unwrap();
        let offset = index.smpl_offset as usize;
        assert_eq!(&bytes[offset..offset + 4], &[0x34, 0x12, 0x78, 0x56]);
    }

    #[test]
    fn test_missing_table_is_malformed() {
        let mut riff = RiffWriter::new();
        riff.list(b"sdta", |list| {
            list.chunk(b"smpl", &[0; 8]);
        });
        let bytes = riff.into_form(b"sfbk");

        let err = SoundFontIndex::scan(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("phdr"));
    }

    #[test]
    fn test_not_a_soundfont() {
        let riff = RiffWriter::new();
        let bytes = riff.into_form(b"WAVE");
        let err = SoundFontIndex::scan(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_record_offset() {
        let table = Table {
            offset: 100,
            count: 3,
        };
        assert_eq!(table.record_offset(2, 46), Some(192));
        assert_eq!(table.record_offset(3, 46), None);
    }
}
