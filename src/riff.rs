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

//! RIFF chunk framing shared by the WAV and SoundFont readers.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::IngestError;
use crate::fs::read_up_to;

/// Size of a chunk header on disk: a four byte tag and a little-endian length.
pub const CHUNK_HEADER_LEN: u64 = 8;

/// A four character chunk tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const RIFF: FourCc = FourCc(*b"RIFF");
    pub const LIST: FourCc = FourCc(*b"LIST");
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self)
    }
}

impl PartialEq<&[u8; 4]> for FourCc {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        self.0 == **other
    }
}

/// A chunk header together with the stream offset of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: FourCc,
    pub size: u32,
    /// Absolute offset of the first payload byte.
    pub data_offset: u64,
}

impl ChunkHeader {
    /// Offset of the first byte after the payload. No pad byte is added for
    /// odd-sized chunks.
    pub fn end_offset(&self) -> u64 {
        self.data_offset + u64::from(self.size)
    }
}

/// Reads a chunk header at the current position. Returns `Ok(None)` when the
/// stream ends before a complete header.
pub fn read_chunk_header<R: Read + Seek>(reader: &mut R) -> Result<Option<ChunkHeader>, IngestError> {
    let mut raw = [0u8; CHUNK_HEADER_LEN as usize];
    if read_up_to(reader, &mut raw)? != raw.len() {
        return Ok(None);
    }
    let mut tag = [0u8; 4];
    tag.copy_from_slice(&raw[..4]);
    let size = (&raw[4..]).read_u32::<LittleEndian>()?;
    Ok(Some(ChunkHeader {
        tag: FourCc(tag),
        size,
        data_offset: reader.stream_position()?,
    }))
}

/// Reads a four character form or list type.
pub fn read_fourcc<R: Read>(reader: &mut R) -> Result<FourCc, IngestError> {
    let mut tag = [0u8; 4];
    crate::fs::read_full(reader, &mut tag)?;
    Ok(FourCc(tag))
}

/// Positions the stream just past the chunk's payload.
pub fn skip_chunk<S: Seek>(stream: &mut S, header: &ChunkHeader) -> Result<(), IngestError> {
    stream.seek(SeekFrom::Start(header.end_offset()))?;
    Ok(())
}

/// Iterates the chunks within `[start, end)` in file order, leaving the stream
/// positioned at each payload as it is yielded. Iteration stops at the first
/// header that is truncated or whose declared size runs past `end`.
pub struct Chunks<'r, R> {
    reader: &'r mut R,
    next: u64,
    end: u64,
}

impl<'r, R: Read + Seek> Chunks<'r, R> {
    pub fn new(reader: &'r mut R, start: u64, end: u64) -> Chunks<'r, R> {
        Chunks {
            reader,
            next: start,
            end,
        }
    }

    /// Access to the underlying reader while iterating, e.g. to read a payload.
    pub fn reader(&mut self) -> &mut R {
        self.reader
    }

    fn advance(&mut self) -> Result<Option<ChunkHeader>, IngestError> {
        if self.next + CHUNK_HEADER_LEN > self.end {
            return Ok(None);
        }
        self.reader.seek(SeekFrom::Start(self.next))?;
        let header = match read_chunk_header(self.reader)? {
            Some(header) => header,
            None => return Ok(None),
        };
        if header.end_offset() > self.end {
            tracing::warn!(
                tag = %header.tag,
                size = header.size,
                "Chunk runs past the end of its container"
            );
            return Ok(None);
        }
        self.next = header.end_offset();
        Ok(Some(header))
    }
}

impl<R: Read + Seek> Iterator for Chunks<'_, R> {
    type Item = Result<ChunkHeader, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(header)) => Some(Ok(header)),
            Ok(None) => None,
            Err(e) => {
                self.next = self.end;
                Some(Err(e))
            }
        }
    }
}
