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

//! Streaming transfer of PCM payloads into the sampler arena.
//!
//! Payloads are copied through a fixed staging buffer so that a file of any
//! size can be ingested with a few hundred bytes of working memory.

use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use tracing::{debug, warn};

use crate::descriptor::SampleDescriptor;
use crate::error::IngestError;
use crate::fs::read_full;
use crate::sampler::Sampler;

/// Size of the staging buffer: 128 frames of 16-bit mono audio.
pub const STAGING_BUFFER_BYTES: usize = 256;

/// The PCM layouts the engine can ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmFormat {
    Mono8,
    Stereo8,
    Mono16,
    Stereo16,
}

impl PcmFormat {
    /// Selects the layout for a channel count and bit depth.
    pub fn new(channels: u16, bits_per_sample: u16) -> Result<PcmFormat, IngestError> {
        match (channels, bits_per_sample) {
            (1, 8) => Ok(PcmFormat::Mono8),
            (2, 8) => Ok(PcmFormat::Stereo8),
            (1, 16) => Ok(PcmFormat::Mono16),
            (2, 16) => Ok(PcmFormat::Stereo16),
            _ => Err(IngestError::UnsupportedEncoding {
                bits_per_sample,
                channels,
            }),
        }
    }

    /// Bytes per interleaved frame in the source.
    pub fn frame_bytes(self) -> usize {
        match self {
            PcmFormat::Mono8 => 1,
            PcmFormat::Stereo8 | PcmFormat::Mono16 => 2,
            PcmFormat::Stereo16 => 4,
        }
    }
}

/// What a transfer moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferStats {
    /// Mono frames handed to the sampler.
    pub frames: u32,
    /// Source bytes consumed.
    pub bytes: u32,
}

/// Streams `data_to_read` bytes from the reader's current position into the
/// sampler. `end_transfer` is always called, even when the transfer fails.
pub fn stream_pcm<R, S>(
    reader: &mut R,
    sampler: &mut S,
    data_to_read: u32,
    format: PcmFormat,
) -> Result<TransferStats, IngestError>
where
    R: Read + ?Sized,
    S: Sampler + ?Sized,
{
    sampler.begin_transfer();
    let result = copy_blocks(reader, sampler, data_to_read, format);
    sampler.end_transfer();

    match &result {
        Ok(stats) => debug!(
            frames = stats.frames,
            bytes = stats.bytes,
            format = ?format,
            "Transferred sample data"
        ),
        Err(e) => warn!(err = %e, data_to_read, "Transfer aborted"),
    }
    result
}

fn copy_blocks<R, S>(
    reader: &mut R,
    sampler: &mut S,
    data_to_read: u32,
    format: PcmFormat,
) -> Result<TransferStats, IngestError>
where
    R: Read + ?Sized,
    S: Sampler + ?Sized,
{
    let frame_bytes = format.frame_bytes();
    let mut staging = [0u8; STAGING_BUFFER_BYTES];
    let mut wide = [0i16; STAGING_BUFFER_BYTES / 2];
    let mut narrow = [0u8; STAGING_BUFFER_BYTES / 2];

    let mut remaining = data_to_read as usize;
    let mut stats = TransferStats::default();

    while remaining >= frame_bytes {
        // Whole frames only; a trailing partial frame is left unread.
        let block = remaining.min(STAGING_BUFFER_BYTES) / frame_bytes * frame_bytes;
        let bytes = &mut staging[..block];
        read_full(reader, bytes)?;
        let frames = block / frame_bytes;

        match format {
            PcmFormat::Mono16 => {
                LittleEndian::read_i16_into(bytes, &mut wide[..frames]);
                sampler.add_samples(&wide[..frames])?;
            }
            PcmFormat::Stereo16 => {
                // Keep the left channel, drop the right.
                for (out, frame) in wide.iter_mut().zip(bytes.chunks_exact(4)) {
                    *out = LittleEndian::read_i16(&frame[..2]);
                }
                sampler.add_samples(&wide[..frames])?;
            }
            PcmFormat::Mono8 => {
                sampler.add_samples_u8(bytes)?;
            }
            PcmFormat::Stereo8 => {
                for (out, frame) in narrow.iter_mut().zip(bytes.chunks_exact(2)) {
                    *out = frame[0];
                }
                sampler.add_samples_u8(&narrow[..frames])?;
            }
        }

        remaining -= block;
        stats.frames += frames as u32;
        stats.bytes += block as u32;
    }

    Ok(stats)
}

/// Commits a descriptor to the pending sample and makes it visible. The
/// caller must already have allocated the slot with `new_sample`.
pub fn commit_sample<S: Sampler + ?Sized>(sampler: &mut S, descriptor: &SampleDescriptor) {
    sampler.set_sample_range(descriptor.start, descriptor.end);
    if let Some((loop_start, loop_end)) = descriptor.loop_range {
        sampler.set_loop_range(loop_start, loop_end);
    }
    if descriptor.loop_mode.is_looping() {
        sampler.set_loop_mode(descriptor.loop_mode);
    }
    sampler.set_exclusive_class(descriptor.exclusive_class);
    sampler.set_pitch(
        descriptor.root_key,
        descriptor.sample_rate,
        descriptor.tune_cents,
    );
    sampler.set_key_range(descriptor.key_range);
    sampler.set_vel_range(descriptor.vel_range);
    if let Some(rate) = descriptor.hold_rate {
        sampler.set_hold_rate(rate);
    }
    if let Some(rate) = descriptor.release_rate {
        sampler.set_release_rate(rate);
    }
    sampler.finish_sample();
}
