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

//! RIFF/WAV container reading.
//!
//! Only the structure needed to stream a file into the sampler is parsed: the
//! `fmt ` chunk, the location of the `data` payload and an optional `smpl`
//! chunk directly following it.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::fs::{read_full, stream_len};
use crate::riff::{read_chunk_header, ChunkHeader, Chunks, FourCc};
use crate::transfer::PcmFormat;

mod smpl;

pub use smpl::{SampleLoop, SmplChunk};

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Length of the core `fmt ` payload.
const FMT_CORE_LEN: u32 = 16;

const WAVE: FourCc = FourCc(*b"WAVE");
const FMT: FourCc = FourCc(*b"fmt ");
const DATA: FourCc = FourCc(*b"data");
const SMPL: FourCc = FourCc(*b"smpl");

/// The contents of a `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    /// Bytes per interleaved frame.
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WavFormat {
    fn read<R: Read>(reader: &mut R) -> Result<WavFormat, IngestError> {
        let mut raw = [0u8; FMT_CORE_LEN as usize];
        read_full(reader, &mut raw)?;
        let mut raw = &raw[..];
        Ok(WavFormat {
            format_tag: raw.read_u16::<LittleEndian>()?,
            channels: raw.read_u16::<LittleEndian>()?,
            sample_rate: raw.read_u32::<LittleEndian>()?,
            byte_rate: raw.read_u32::<LittleEndian>()?,
            block_align: raw.read_u16::<LittleEndian>()?,
            bits_per_sample: raw.read_u16::<LittleEndian>()?,
        })
    }

    /// The transfer layout for this format, if the engine supports it.
    pub fn pcm_format(&self) -> Result<PcmFormat, IngestError> {
        if self.format_tag != WAVE_FORMAT_PCM && self.format_tag != WAVE_FORMAT_EXTENSIBLE {
            return Err(IngestError::UnsupportedFormatTag(self.format_tag));
        }
        PcmFormat::new(self.channels, self.bits_per_sample)
    }

    /// Bytes per frame, falling back to the channel layout when the header
    /// carries no block alignment.
    pub fn frame_bytes(&self) -> u32 {
        if self.block_align > 0 {
            u32::from(self.block_align)
        } else {
            u32::from(self.channels) * u32::from(self.bits_per_sample).div_ceil(8)
        }
    }
}

/// Where the PCM payload of a WAV file lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataChunk {
    /// Absolute offset of the first payload byte.
    pub offset: u64,
    /// Declared payload length; the authoritative number of bytes to transfer.
    pub size: u32,
}

impl DataChunk {
    /// Offset just past the payload.
    pub fn end_offset(&self) -> u64 {
        self.offset + u64::from(self.size)
    }
}

/// The structure of a WAV file up to its `data` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavLayout {
    /// The RIFF size field (file length minus eight).
    pub file_size: u32,
    pub format: WavFormat,
    pub data: DataChunk,
}

impl WavLayout {
    /// Number of whole frames in the payload.
    pub fn frames(&self) -> u32 {
        match self.format.frame_bytes() {
            0 => 0,
            frame_bytes => self.data.size / frame_bytes,
        }
    }
}

/// Reads a WAV file from its first byte up to the start of the `data`
/// payload, leaving the stream positioned there.
///
/// A short read of the RIFF preamble or the format chunk is an error. A file
/// that is not a WAVE form or ends before a `data` chunk is reported as
/// [`IngestError::Malformed`], which callers treat as "no data".
pub fn read_layout<R: Read + Seek>(reader: &mut R) -> Result<WavLayout, IngestError> {
    let end = stream_len(reader)?;
    reader.seek(SeekFrom::Start(0))?;

    let mut preamble = [0u8; 12];
    read_full(reader, &mut preamble)?;
    let mut fields = &preamble[..];
    let mut riff = [0u8; 4];
    fields.read_exact(&mut riff)?;
    let file_size = fields.read_u32::<LittleEndian>()?;
    let mut form = [0u8; 4];
    fields.read_exact(&mut form)?;
    if FourCc(riff) != FourCc::RIFF || FourCc(form) != WAVE {
        return Err(IngestError::Malformed(format!(
            "not a RIFF/WAVE file ({} {})",
            FourCc(riff),
            FourCc(form)
        )));
    }

    let mut format: Option<WavFormat> = None;
    let mut chunks = Chunks::new(reader, 12, end);
    while let Some(header) = chunks.next() {
        let header = header?;
        match header.tag {
            FMT => {
                if header.size < FMT_CORE_LEN {
                    return Err(IngestError::Malformed(format!(
                        "fmt chunk too small ({} bytes)",
                        header.size
                    )));
                }
                let parsed = WavFormat::read(chunks.reader())?;
                debug!(
                    file_size,
                    byte_rate = parsed.byte_rate,
                    block_align = parsed.block_align,
                    bits_per_sample = parsed.bits_per_sample,
                    sample_rate = parsed.sample_rate,
                    channels = parsed.channels,
                    "WAV format"
                );
                format = Some(parsed);
            }
            DATA => {
                let format = format.ok_or_else(|| {
                    IngestError::Malformed("data chunk before fmt chunk".to_string())
                })?;
                let reader = chunks.reader();
                reader.seek(SeekFrom::Start(header.data_offset))?;
                return Ok(WavLayout {
                    file_size,
                    format,
                    data: DataChunk {
                        offset: header.data_offset,
                        size: header.size,
                    },
                });
            }
            tag => debug!(tag = %tag, size = header.size, "Skipping chunk"),
        }
    }

    Err(IngestError::Malformed("no data chunk found".to_string()))
}

/// Best-effort read of a `smpl` chunk immediately following the payload.
/// Anything else in that position, or a truncated chunk, yields `None`.
pub fn read_trailing_smpl<R: Read + Seek>(
    reader: &mut R,
    data: &DataChunk,
) -> Result<Option<SmplChunk>, IngestError> {
    reader.seek(SeekFrom::Start(data.end_offset()))?;
    let header: ChunkHeader = match read_chunk_header(reader)? {
        Some(header) => header,
        None => return Ok(None),
    };
    if header.tag != SMPL {
        debug!(tag = %header.tag, "No smpl chunk after data");
        return Ok(None);
    }

    match SmplChunk::read(reader, header.size) {
        Ok(smpl) => Ok(Some(smpl)),
        Err(IngestError::ShortRead { expected, actual }) => {
            warn!(expected, actual, "Truncated smpl chunk ignored");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
