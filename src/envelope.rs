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

//! Conversion of SoundFont envelope times into the engine's decay rates.
//!
//! The engine applies a multiplicative decay once per output sample. A stage
//! lasting `d` samples must bring the level from full scale down to the
//! engine's floor, so the per-sample factor is `(1 / 32736)^(1 / d)`, stored
//! as a Q1.31 fixed-point value.

/// The level the engine treats as silence, relative to full scale.
pub const ENGINE_FLOOR_DIVISOR: f64 = 32736.0;

/// Fixed-point scale of the engine's rate registers (Q1.31).
pub const FIXED_POINT_ONE: f64 = 2147483648.0;

/// Timecents per doubling of duration.
pub const TIMECENTS_PER_OCTAVE: f64 = 1200.0;

/// Default envelope stage time in timecents (about 1ms).
pub const DEFAULT_ENVELOPE_TIMECENTS: i16 = -12000;

/// Converts timecents to seconds.
pub fn timecents_to_seconds(timecents: i16) -> f64 {
    2f64.powf(f64::from(timecents) / TIMECENTS_PER_OCTAVE)
}

/// Converts an envelope stage duration in timecents into the engine's
/// fixed-point per-sample decay rate at the given engine sample rate.
///
/// A duration of zero samples is not clamped: the exponent becomes infinite
/// and the rate evaluates to zero, i.e. an immediate drop to silence.
pub fn timecents_to_rate(timecents: i16, engine_sample_rate: u32) -> u32 {
    let duration_in_samples = timecents_to_seconds(timecents) * f64::from(engine_sample_rate);
    let rate = (1.0 / ENGINE_FLOOR_DIVISOR).powf(1.0 / duration_in_samples);
    // Rates are in [0, 1], so the scaled value always fits.
    (rate * FIXED_POINT_ONE).round() as u32
}
