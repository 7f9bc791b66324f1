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
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use super::error::ConfigError;
use crate::ingest::DEFAULT_ENGINE_SAMPLE_RATE;
use crate::sampler::DEFAULT_MAX_SAMPLES;
use crate::walker::DEFAULT_MAX_DEPTH;

/// Default arena capacity in samples (8 MiB of 16-bit audio).
const DEFAULT_ARENA_CAPACITY: usize = 4 * 1024 * 1024;

/// A YAML representation of the ingest configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct IngestConfig {
    /// The engine's output sample rate in Hz (default: 48000). Envelope
    /// rates are computed against it.
    sample_rate: Option<u32>,

    /// Capacity of the sample arena in 16-bit samples.
    arena_capacity: Option<usize>,

    /// Number of slots in the arena's sample table (default: 256).
    max_samples: Option<usize>,

    /// How many directory levels folder ingest descends (default: 10).
    max_depth: Option<usize>,

    /// Mounted filesystems by id, each rooted at a local directory.
    filesystems: Option<HashMap<String, PathBuf>>,

    /// The filesystem used when none is named.
    default_filesystem: Option<String>,
}

impl IngestConfig {
    /// Parse the configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<IngestConfig, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<IngestConfig>()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == Some(0) {
            return Err(ConfigError::Invalid {
                key: "sample_rate",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some(default) = &self.default_filesystem {
            let known = self
                .filesystems
                .as_ref()
                .is_some_and(|filesystems| filesystems.contains_key(default));
            if !known {
                return Err(ConfigError::Invalid {
                    key: "default_filesystem",
                    reason: format!("'{}' is not a configured filesystem", default),
                });
            }
        }
        Ok(())
    }

    /// Returns the engine sample rate (default: 48000).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_ENGINE_SAMPLE_RATE)
    }

    /// Returns the arena capacity in samples.
    pub fn arena_capacity(&self) -> usize {
        self.arena_capacity.unwrap_or(DEFAULT_ARENA_CAPACITY)
    }

    /// Returns the number of sample slots (default: 256).
    pub fn max_samples(&self) -> usize {
        self.max_samples.unwrap_or(DEFAULT_MAX_SAMPLES)
    }

    /// Returns the maximum directory depth (default: 10).
    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    /// Returns the configured filesystems.
    pub fn filesystems(&self) -> impl Iterator<Item = (&String, &PathBuf)> {
        self.filesystems.iter().flatten()
    }

    pub fn default_filesystem(&self) -> Option<&str> {
        self.default_filesystem.as_deref()
    }
}
