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

//! The canonical, format-agnostic description of one playable sample.

use std::fmt;

use serde::Serialize;
use tracing::warn;

/// Highest valid MIDI key or velocity.
pub const MIDI_MAX: u8 = 127;

/// How the engine loops a sample. The discriminants are the engine's codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    #[default]
    None = 0,
    /// Loop continuously, including after release.
    Continuous = 1,
    /// Loop while the key is held, stop on release.
    UntilRelease = 2,
    /// Loop while the key is held, then play the remainder of the sample.
    PlayRemainder = 3,
}

impl LoopMode {
    /// Maps a SoundFont `sampleModes` generator value. Value 2 is reserved
    /// and means no loop.
    pub fn from_sample_modes(modes: u16) -> LoopMode {
        match modes & 0x3 {
            1 => LoopMode::Continuous,
            3 => LoopMode::PlayRemainder,
            _ => LoopMode::None,
        }
    }

    /// The engine's numeric code for this mode.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether this mode loops at all.
    pub fn is_looping(self) -> bool {
        self != LoopMode::None
    }
}

/// An inclusive range of MIDI keys or velocities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteRange {
    pub low: u8,
    pub high: u8,
}

impl NoteRange {
    /// The full MIDI range.
    pub const FULL: NoteRange = NoteRange {
        low: 0,
        high: MIDI_MAX,
    };

    pub fn new(low: u8, high: u8) -> NoteRange {
        NoteRange { low, high }
    }

    /// A range covering exactly one note.
    pub fn single(note: u8) -> NoteRange {
        NoteRange {
            low: note,
            high: note,
        }
    }

    /// Decodes a SoundFont range generator amount (low byte first).
    pub fn from_generator(amount: u16) -> NoteRange {
        let [low, high] = amount.to_le_bytes();
        NoteRange { low, high }
    }

    /// The overlap of two ranges, if any.
    pub fn intersect(&self, other: &NoteRange) -> Option<NoteRange> {
        let low = self.low.max(other.low);
        let high = self.high.min(other.high);
        (low <= high).then_some(NoteRange { low, high })
    }

    pub fn contains(&self, note: u8) -> bool {
        self.low <= note && note <= self.high
    }
}

impl Default for NoteRange {
    fn default() -> NoteRange {
        NoteRange::FULL
    }
}

impl fmt::Display for NoteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// One playable sample, ready to be committed to the sampler.
///
/// `start` and `end` are frame offsets into the payload of the most recent
/// transfer. The loop range, when present, is relative to `start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleDescriptor {
    pub start: u32,
    pub end: u32,
    pub loop_range: Option<(u32, u32)>,
    pub loop_mode: LoopMode,
    pub sample_rate: u32,
    pub root_key: u8,
    pub tune_cents: i16,
    pub exclusive_class: u16,
    pub key_range: NoteRange,
    pub vel_range: NoteRange,
    pub hold_rate: Option<u32>,
    pub release_rate: Option<u32>,
}

impl SampleDescriptor {
    /// A non-looping descriptor over `[start, end]` with default metadata.
    pub fn new(start: u32, end: u32, sample_rate: u32) -> SampleDescriptor {
        SampleDescriptor {
            start,
            end,
            loop_range: None,
            loop_mode: LoopMode::None,
            sample_rate,
            root_key: 60,
            tune_cents: 0,
            exclusive_class: 0,
            key_range: NoteRange::FULL,
            vel_range: NoteRange::FULL,
            hold_rate: None,
            release_rate: None,
        }
    }

    /// Number of frames covered by the sample range.
    pub fn span(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Drops a loop that does not fit within the sample. Returns false if the
    /// loop had to be dropped.
    pub fn validate_loop(&mut self) -> bool {
        if let Some((loop_start, loop_end)) = self.loop_range {
            if loop_start > loop_end || loop_end > self.span() {
                warn!(
                    loop_start,
                    loop_end,
                    span = self.span(),
                    "Loop does not fit the sample, disabling it"
                );
                self.loop_range = None;
                self.loop_mode = LoopMode::None;
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_mode_from_sample_modes() {
        assert_eq!(LoopMode::from_sample_modes(0), LoopMode::None);
        assert_eq!(LoopMode::from_sample_modes(1), LoopMode::Continuous);
        assert_eq!(LoopMode::from_sample_modes(2), LoopMode::None);
        assert_eq!(LoopMode::from_sample_modes(3), LoopMode::PlayRemainder);
        assert_eq!(LoopMode::PlayRemainder.code(), 3);
    }

    #[test]
    fn test_note_range_from_generator() {
        // Low byte is the lowest key.
        let range = NoteRange::from_generator(u16::from_le_bytes([36, 48]));
        assert_eq!(range, NoteRange::new(36, 48));
        assert!(range.contains(40));
        assert!(!range.contains(49));
    }

    #[test]
    fn test_note_range_intersect() {
        let a = NoteRange::new(0, 60);
        let b = NoteRange::new(50, 127);
        assert_eq!(a.intersect(&b), Some(NoteRange::new(50, 60)));
        assert_eq!(
            NoteRange::new(0, 10).intersect(&NoteRange::new(20, 30)),
            None
        );
    }

    #[test]
    fn test_validate_loop() {
        let mut ok = SampleDescriptor::new(1000, 2000, 44100);
        ok.loop_range = Some((199, 799));
        ok.loop_mode = LoopMode::Continuous;
        assert!(ok.validate_loop());
        assert_eq!(ok.loop_range, Some((199, 799)));

        let mut bad = SampleDescriptor::new(0, 99, 44100);
        bad.loop_range = Some((10, 500));
        bad.loop_mode = LoopMode::Continuous;
        assert!(!bad.validate_loop());
        assert_eq!(bad.loop_range, None);
        assert_eq!(bad.loop_mode, LoopMode::None);
    }
}
