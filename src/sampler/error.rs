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

/// Error types returned by the sampler engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SamplerError {
    #[error("Arena full: {requested} samples requested, {available} available")]
    ArenaFull { requested: usize, available: usize },

    #[error("Sample table full ({0} slots)")]
    SampleTableFull(usize),

    #[error("No transfer in progress")]
    NoTransfer,

    #[error("No pending sample")]
    NoPendingSample,
}
