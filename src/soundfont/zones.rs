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

//! Lazy iteration over the sample-bearing zones of instruments and presets.

use std::collections::VecDeque;
use std::io::{Read, Seek};

use tracing::debug;

use super::generators::{GeneratorSet, InstrumentLoadInfo, INSTRUMENT, SAMPLE_ID};
use super::SoundFontReader;
use crate::error::IngestError;

/// Position within one instrument's zone list.
struct ZoneCursor {
    name: String,
    first_bag: u32,
    next_bag: u32,
    end_bag: u32,
    global: GeneratorSet,
    preset: Option<GeneratorSet>,
}

impl ZoneCursor {
    fn new<R: Read + Seek>(
        sf: &mut SoundFontReader<R>,
        instrument: u32,
        preset: Option<GeneratorSet>,
    ) -> Result<ZoneCursor, IngestError> {
        let header = sf.instrument_header(instrument)?;
        let next = sf.instrument_header(instrument + 1)?;
        let first_bag = u32::from(header.bag_index);
        Ok(ZoneCursor {
            name: header.name,
            first_bag,
            next_bag: first_bag,
            end_bag: u32::from(next.bag_index),
            global: GeneratorSet::new(),
            preset,
        })
    }

    fn next_zone<R: Read + Seek>(
        &mut self,
        sf: &mut SoundFontReader<R>,
    ) -> Result<Option<InstrumentLoadInfo>, IngestError> {
        while self.next_bag < self.end_bag {
            let bag = self.next_bag;
            self.next_bag += 1;

            let index = *sf.index();
            let (zone, sample) = sf.zone_generators(index.ibag, index.igen, bag, SAMPLE_ID)?;
            let Some(sample) = sample else {
                if bag == self.first_bag {
                    self.global = zone;
                } else {
                    debug!(instrument = %self.name, bag, "Skipping zone without a sample");
                }
                continue;
            };

            let mut generators = zone.layered_over(&self.global);
            if let Some(preset) = &self.preset {
                match generators.with_preset(preset) {
                    Some(layered) => generators = layered,
                    None => {
                        debug!(instrument = %self.name, bag, "Zone lies outside the preset's ranges");
                        continue;
                    }
                }
            }

            let header = sf.sample_header(u32::from(sample))?;
            if header.is_rom() {
                debug!(sample = %header.name, "Skipping ROM sample");
                continue;
            }
            return Ok(Some(InstrumentLoadInfo::resolve(
                &self.name,
                &header,
                &generators,
            )));
        }
        Ok(None)
    }
}

/// The sample-bearing zones of one instrument, in file order.
pub struct InstrumentZones<'s, R> {
    sf: &'s mut SoundFontReader<R>,
    cursor: ZoneCursor,
}

impl<'s, R: Read + Seek> InstrumentZones<'s, R> {
    pub(super) fn new(
        sf: &'s mut SoundFontReader<R>,
        instrument: u32,
    ) -> Result<InstrumentZones<'s, R>, IngestError> {
        let cursor = ZoneCursor::new(sf, instrument, None)?;
        Ok(InstrumentZones { sf, cursor })
    }

    /// Name of the instrument.
    pub fn name(&self) -> &str {
        &self.cursor.name
    }
}

impl<R: Read + Seek> Iterator for InstrumentZones<'_, R> {
    type Item = Result<InstrumentLoadInfo, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.next_zone(self.sf) {
            Ok(info) => info.map(Ok),
            Err(e) => {
                self.cursor.next_bag = self.cursor.end_bag;
                Some(Err(e))
            }
        }
    }
}

/// The sample-bearing zones of every instrument a preset references, with
/// the preset's generators layered on top.
pub struct PresetZones<'s, R> {
    sf: &'s mut SoundFontReader<R>,
    name: String,
    layers: VecDeque<(u32, GeneratorSet)>,
    current: Option<ZoneCursor>,
}

impl<'s, R: Read + Seek> PresetZones<'s, R> {
    pub(super) fn new(
        sf: &'s mut SoundFontReader<R>,
        preset: u32,
    ) -> Result<PresetZones<'s, R>, IngestError> {
        let header = sf.preset_header(preset)?;
        let next = sf.preset_header(preset + 1)?;
        let first_bag = u32::from(header.bag_index);

        let index = *sf.index();
        let mut global = GeneratorSet::new();
        let mut layers = VecDeque::new();
        for bag in first_bag..u32::from(next.bag_index) {
            let (zone, instrument) = sf.zone_generators(index.pbag, index.pgen, bag, INSTRUMENT)?;
            match instrument {
                Some(instrument) => {
                    layers.push_back((u32::from(instrument), zone.layered_over(&global)))
                }
                None if bag == first_bag => global = zone,
                None => debug!(preset = %header.name, bag, "Skipping zone without an instrument"),
            }
        }
        debug!(preset = %header.name, layers = layers.len(), "Preset zones");

        Ok(PresetZones {
            sf,
            name: header.name,
            layers,
            current: None,
        })
    }

    /// Name of the preset.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn fail(&mut self, e: IngestError) -> Option<Result<InstrumentLoadInfo, IngestError>> {
        self.current = None;
        self.layers.clear();
        Some(Err(e))
    }
}

impl<R: Read + Seek> Iterator for PresetZones<'_, R> {
    type Item = Result<InstrumentLoadInfo, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cursor) = &mut self.current {
                match cursor.next_zone(self.sf) {
                    Ok(Some(info)) => return Some(Ok(info)),
                    Ok(None) => self.current = None,
                    Err(e) => return self.fail(e),
                }
            }
            let (instrument, layer) = self.layers.pop_front()?;
            match ZoneCursor::new(self.sf, instrument, Some(layer)) {
                Ok(cursor) => self.current = Some(cursor),
                Err(e) => return self.fail(e),
            }
        }
    }
}
