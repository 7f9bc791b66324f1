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

//! SoundFont bank ingest.

use std::path::Path;

use tracing::{debug, info};

use super::{IngestReport, Ingestor, SoundFontMode};
use crate::descriptor::{LoopMode, SampleDescriptor};
use crate::envelope::timecents_to_rate;
use crate::error::IngestError;
use crate::fs::Session;
use crate::sampler::Sampler;
use crate::soundfont::{InstrumentLoadInfo, SoundFontReader};
use crate::transfer::{commit_sample, stream_pcm, PcmFormat};

impl<S: Sampler + ?Sized> Ingestor<'_, S> {
    /// Ingests a SoundFont bank. The whole sample pool is transferred once,
    /// then every selected zone is committed against it and each sample,
    /// instrument or preset is closed as an instrument. A zone the engine
    /// rejects, or one that cannot be read, is reported and the bank carries on.
    pub fn soundfont(&mut self, path: &Path, mode: SoundFontMode) -> IngestReport {
        let mut report = IngestReport::default();
        let result = self.load_soundfont(path, mode, &mut report);
        self.finish_file(&mut report, path, result);
        info!(path = ?path, mode = ?mode, report = %report, "Loaded SoundFont");
        report
    }

    fn load_soundfont(
        &mut self,
        path: &Path,
        mode: SoundFontMode,
        report: &mut IngestReport,
    ) -> Result<(), IngestError> {
        report.files += 1;
        let session = Session::open(self.fs, path)?;
        let mut sf = SoundFontReader::new(session)?;

        let len = sf.seek_sample_data()?;
        stream_pcm(sf.reader_mut(), &mut *self.sampler, len, PcmFormat::Mono16)?;

        match mode {
            SoundFontMode::Samples => {
                for index in 0..sf.sample_count() {
                    match sf.sample_info(index) {
                        Ok(Some(info)) => {
                            let result = self.load_sample_from_info(&info, report);
                            self.finish_file(report, path, result);
                            self.close_instrument(report);
                        }
                        Ok(None) => report.skipped += 1,
                        Err(e) => self.finish_file(report, path, Err(e)),
                    }
                }
            }
            SoundFontMode::Instruments => {
                for index in 0..sf.instrument_count() {
                    match sf.instrument_info(index) {
                        Ok(Some(info)) => {
                            let result = self.load_sample_from_info(&info, report);
                            self.finish_file(report, path, result);
                            self.close_instrument(report);
                        }
                        Ok(None) => debug!(instrument = index, "Instrument has no sample zone"),
                        Err(e) => self.finish_file(report, path, Err(e)),
                    }
                }
            }
            SoundFontMode::InstrumentsMulti => {
                for index in 0..sf.instrument_count() {
                    match sf.instrument_zones(index) {
                        Ok(zones) => {
                            for info in zones {
                                let result =
                                    info.and_then(|info| self.load_sample_from_info(&info, report));
                                self.finish_file(report, path, result);
                            }
                        }
                        Err(e) => self.finish_file(report, path, Err(e)),
                    }
                    self.close_instrument(report);
                }
            }
            SoundFontMode::Presets => {
                for index in 0..sf.preset_count() {
                    match sf.preset_zones(index) {
                        Ok(zones) => {
                            for info in zones {
                                let result =
                                    info.and_then(|info| self.load_sample_from_info(&info, report));
                                self.finish_file(report, path, result);
                            }
                        }
                        Err(e) => self.finish_file(report, path, Err(e)),
                    }
                    self.close_instrument(report);
                }
            }
        }
        Ok(())
    }

    /// Commits one resolved zone against the transferred sample pool. A
    /// placeholder zone with no sample range is dropped.
    fn load_sample_from_info(
        &mut self,
        info: &InstrumentLoadInfo,
        report: &mut IngestReport,
    ) -> Result<(), IngestError> {
        if info.start == 0 && info.end == 0 {
            debug!(name = %info.name, sample = %info.sample_name, "Skipping empty zone");
            report.skipped += 1;
            return Ok(());
        }

        let descriptor = self.descriptor_from_info(info);
        if let Err(e) = self.sampler.new_sample() {
            debug!(name = %info.name, sample = %info.sample_name, "Could not add sample");
            return Err(e.into());
        }
        commit_sample(&mut *self.sampler, &descriptor);
        report.committed += 1;
        debug!(
            name = %info.name,
            sample = %info.sample_name,
            start = descriptor.start,
            end = descriptor.end,
            loop_range = ?descriptor.loop_range,
            loop_mode = ?descriptor.loop_mode,
            key_range = %descriptor.key_range,
            vel_range = %descriptor.vel_range,
            "Sample committed"
        );
        Ok(())
    }

    fn descriptor_from_info(&self, info: &InstrumentLoadInfo) -> SampleDescriptor {
        let mut descriptor = SampleDescriptor::new(info.start, info.end, info.sample_rate);
        descriptor.loop_mode = LoopMode::from_sample_modes(info.sample_modes);
        if descriptor.loop_mode.is_looping()
            && (info.start_loop != info.start || info.end_loop != info.end)
        {
            // Loop points are taken relative to the frame after the start.
            let base = info.start.saturating_add(1);
            descriptor.loop_range = info
                .start_loop
                .checked_sub(base)
                .zip(info.end_loop.checked_sub(base));
            if descriptor.loop_range.is_none() {
                debug!(
                    sample = %info.sample_name,
                    start_loop = info.start_loop,
                    end_loop = info.end_loop,
                    "Loop starts before the sample"
                );
            }
        }
        descriptor.root_key = info.root_key;
        descriptor.tune_cents = info.tune;
        descriptor.exclusive_class = info.exclusive_class;
        descriptor.key_range = info.key_range;
        descriptor.vel_range = info.vel_range;
        descriptor.hold_rate = Some(timecents_to_rate(
            info.decay_vol_env,
            self.engine_sample_rate,
        ));
        descriptor.release_rate = Some(timecents_to_rate(
            info.release_vol_env,
            self.engine_sample_rate,
        ));
        descriptor.validate_loop();
        descriptor
    }
}
