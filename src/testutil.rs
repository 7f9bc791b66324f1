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
use std::{error::Error, fs::File, path::PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::descriptor::{LoopMode, NoteRange};
use crate::sampler::{Sampler, SamplerError};

/// Writes an integer PCM WAV file through hound. Each inner vector is one
/// channel; frames are interleaved on write.
pub fn write_wav_with_bits(
    path: PathBuf,
    samples: Vec<Vec<i16>>,
    sample_rate: u32,
    bits_per_sample: u16,
) -> Result<(), Box<dyn Error>> {
    let tempwav = File::create(path)?;

    let num_channels = samples.len();
    assert!(num_channels <= u16::MAX.into(), "Too many channels!");
    let mut writer = WavWriter::new(
        tempwav,
        WavSpec {
            channels: num_channels as u16,
            sample_rate,
            bits_per_sample,
            sample_format: SampleFormat::Int,
        },
    )?;

    let frames = samples.iter().map(Vec::len).max().unwrap_or(0);
    for frame in 0..frames {
        for channel in &samples {
            writer.write_sample(channel.get(frame).copied().unwrap_or(0))?;
        }
    }
    writer.finalize()?;

    Ok(())
}

/// One call made on a [`RecordingSampler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    BeginTransfer,
    AddSamples(Vec<i16>),
    AddSamplesU8(Vec<u8>),
    EndTransfer,
    NewSample,
    SetSampleRange(u32, u32),
    SetLoopRange(u32, u32),
    SetLoopMode(LoopMode),
    SetExclusiveClass(u16),
    SetPitch(u8, u32, i16),
    SetKeyRange(NoteRange),
    SetVelRange(NoteRange),
    SetHoldRate(u32),
    SetReleaseRate(u32),
    FinishSample,
    InstrumentDone,
}

/// A sampler that records the call sequence. It accepts everything except
/// the first `reject_new_samples` calls to `new_sample`.
#[derive(Debug, Default)]
pub struct RecordingSampler {
    pub calls: Vec<Call>,
    pub reject_new_samples: usize,
}

impl RecordingSampler {
    pub fn rejecting(reject_new_samples: usize) -> RecordingSampler {
        RecordingSampler {
            calls: Vec::new(),
            reject_new_samples,
        }
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl Sampler for RecordingSampler {
    fn begin_transfer(&mut self) {
        self.calls.push(Call::BeginTransfer);
    }

    fn add_samples(&mut self, samples: &[i16]) -> Result<(), SamplerError> {
        self.calls.push(Call::AddSamples(samples.to_vec()));
        Ok(())
    }

    fn add_samples_u8(&mut self, samples: &[u8]) -> Result<(), SamplerError> {
        self.calls.push(Call::AddSamplesU8(samples.to_vec()));
        Ok(())
    }

    fn end_transfer(&mut self) {
        self.calls.push(Call::EndTransfer);
    }

    fn new_sample(&mut self) -> Result<(), SamplerError> {
        self.calls.push(Call::NewSample);
        if self.reject_new_samples > 0 {
            self.reject_new_samples -= 1;
            return Err(SamplerError::SampleTableFull(0));
        }
        Ok(())
    }

    fn set_sample_range(&mut self, start: u32, end: u32) {
        self.calls.push(Call::SetSampleRange(start, end));
    }

    fn set_loop_range(&mut self, start: u32, end: u32) {
        self.calls.push(Call::SetLoopRange(start, end));
    }

    fn set_loop_mode(&mut self, mode: LoopMode) {
        self.calls.push(Call::SetLoopMode(mode));
    }

    fn set_exclusive_class(&mut self, class: u16) {
        self.calls.push(Call::SetExclusiveClass(class));
    }

    fn set_pitch(&mut self, root_key: u8, sample_rate: u32, tune_cents: i16) {
        self.calls.push(Call::SetPitch(root_key, sample_rate, tune_cents));
    }

    fn set_key_range(&mut self, range: NoteRange) {
        self.calls.push(Call::SetKeyRange(range));
    }

    fn set_vel_range(&mut self, range: NoteRange) {
        self.calls.push(Call::SetVelRange(range));
    }

    fn set_hold_rate(&mut self, rate: u32) {
        self.calls.push(Call::SetHoldRate(rate));
    }

    fn set_release_rate(&mut self, rate: u32) {
        self.calls.push(Call::SetReleaseRate(rate));
    }

    fn finish_sample(&mut self) {
        self.calls.push(Call::FinishSample);
    }

    fn instrument_done(&mut self) {
        self.calls.push(Call::InstrumentDone);
    }
}

/// Builds raw RIFF chunk sequences.
#[derive(Default)]
pub struct RiffWriter {
    bytes: Vec<u8>,
}

impl RiffWriter {
    pub fn new() -> RiffWriter {
        RiffWriter::default()
    }

    /// Appends a chunk with no pad byte.
    pub fn chunk(&mut self, tag: &[u8; 4], payload: &[u8]) -> &mut RiffWriter {
        self.bytes.extend_from_slice(tag);
        self.bytes
            .extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Appends a `LIST` chunk whose contents are written by `build`.
    pub fn list(&mut self, kind: &[u8; 4], build: impl FnOnce(&mut RiffWriter)) -> &mut RiffWriter {
        let mut inner = RiffWriter::new();
        build(&mut inner);
        let mut payload = kind.to_vec();
        payload.extend_from_slice(&inner.bytes);
        self.chunk(b"LIST", &payload)
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut RiffWriter {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }

    /// Wraps the chunks in a `RIFF` form of the given type.
    pub fn into_form(self, form: &[u8; 4]) -> Vec<u8> {
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&(self.bytes.len() as u32 + 4).to_le_bytes());
        out.extend_from_slice(form);
        out.extend_from_slice(&self.bytes);
        out
    }
}

/// Builds WAV files byte by byte, including layouts hound will not write.
pub struct WavBuilder {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    fmt_extra: Vec<u8>,
    before_data: Vec<([u8; 4], Vec<u8>)>,
    data: Option<Vec<u8>>,
    after_data: Vec<([u8; 4], Vec<u8>)>,
}

impl WavBuilder {
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16) -> WavBuilder {
        WavBuilder {
            channels,
            sample_rate,
            bits_per_sample,
            fmt_extra: Vec::new(),
            before_data: Vec::new(),
            data: Some(Vec::new()),
            after_data: Vec::new(),
        }
    }

    pub fn data(mut self, data: Vec<u8>) -> WavBuilder {
        self.data = Some(data);
        self
    }

    pub fn without_data(mut self) -> WavBuilder {
        self.data = None;
        self
    }

    /// Extra bytes after the 16-byte core of the `fmt ` chunk.
    pub fn fmt_extra(mut self, extra: Vec<u8>) -> WavBuilder {
        self.fmt_extra = extra;
        self
    }

    /// A chunk between `fmt ` and `data`.
    pub fn chunk_before_data(mut self, tag: &[u8; 4], payload: Vec<u8>) -> WavBuilder {
        self.before_data.push((*tag, payload));
        self
    }

    pub fn chunk_after_data(mut self, tag: &[u8; 4], payload: Vec<u8>) -> WavBuilder {
        self.after_data.push((*tag, payload));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let block_align = self.channels * self.bits_per_sample / 8;
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&1u16.to_le_bytes());
        fmt.extend_from_slice(&self.channels.to_le_bytes());
        fmt.extend_from_slice(&self.sample_rate.to_le_bytes());
        fmt.extend_from_slice(&(self.sample_rate * u32::from(block_align)).to_le_bytes());
        fmt.extend_from_slice(&block_align.to_le_bytes());
        fmt.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        fmt.extend_from_slice(&self.fmt_extra);

        let mut riff = RiffWriter::new();
        riff.chunk(b"fmt ", &fmt);
        for (tag, payload) in &self.before_data {
            riff.chunk(tag, payload);
        }
        if let Some(data) = &self.data {
            riff.chunk(b"data", data);
        }
        for (tag, payload) in &self.after_data {
            riff.chunk(tag, payload);
        }
        riff.into_form(b"WAVE")
    }
}

/// A `smpl` chunk payload with the given unity note and loops.
pub fn smpl_payload(unity_note: u32, loops: &[(u32, u32)]) -> Vec<u8> {
    let mut payload = Vec::new();
    // manufacturer, product, sample period
    for value in [0u32, 0, 22675] {
        payload.extend_from_slice(&value.to_le_bytes());
    }
    payload.extend_from_slice(&unity_note.to_le_bytes());
    // pitch fraction, SMPTE format, SMPTE offset
    payload.extend_from_slice(&[0; 12]);
    payload.extend_from_slice(&(loops.len() as u32).to_le_bytes());
    payload.extend_from_slice(&0u32.to_le_bytes());
    for (index, (start, end)) in loops.iter().enumerate() {
        for value in [index as u32, 0, *start, *end, 0, 0] {
            payload.extend_from_slice(&value.to_le_bytes());
        }
    }
    payload
}

type Zone = Vec<(u16, u16)>;

struct Sf2Sample {
    name: String,
    start: u32,
    end: u32,
    start_loop: u32,
    end_loop: u32,
    sample_rate: u32,
    original_pitch: u8,
    sample_type: u16,
}

/// Builds minimal SoundFont 2 banks. Each zone is a list of
/// `(operator, amount)` generators written in order.
#[derive(Default)]
pub struct Sf2Builder {
    data: Vec<i16>,
    samples: Vec<Sf2Sample>,
    instruments: Vec<(String, Vec<Zone>)>,
    presets: Vec<(String, u16, u16, Vec<Zone>)>,
}

fn name20(name: &str) -> [u8; 20] {
    let mut raw = [0u8; 20];
    let len = name.len().min(19);
    raw[..len].copy_from_slice(&name.as_bytes()[..len]);
    raw
}

/// Writes bag and generator tables for a list of zone lists, returning the
/// first bag index of each entry plus the terminal bag index.
fn write_zones<'z>(
    entries: impl Iterator<Item = &'z Vec<Zone>>,
    bags: &mut Vec<u8>,
    gens: &mut Vec<u8>,
) -> Vec<u16> {
    let mut bag_count = 0u16;
    let mut gen_count = 0u16;
    let mut first_bags = Vec::new();
    for zones in entries {
        first_bags.push(bag_count);
        for zone in zones {
            bags.extend_from_slice(&gen_count.to_le_bytes());
            bags.extend_from_slice(&0u16.to_le_bytes());
            bag_count += 1;
            for (operator, amount) in zone {
                gens.extend_from_slice(&operator.to_le_bytes());
                gens.extend_from_slice(&amount.to_le_bytes());
                gen_count += 1;
            }
        }
    }
    // Terminal bag and generator.
    bags.extend_from_slice(&gen_count.to_le_bytes());
    bags.extend_from_slice(&0u16.to_le_bytes());
    gens.extend_from_slice(&[0; 4]);
    first_bags.push(bag_count);
    first_bags
}

impl Sf2Builder {
    pub fn new() -> Sf2Builder {
        Sf2Builder::default()
    }

    pub fn sample_data(&mut self, data: Vec<i16>) -> &mut Sf2Builder {
        self.data = data;
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sample(
        &mut self,
        name: &str,
        start: u32,
        end: u32,
        start_loop: u32,
        end_loop: u32,
        sample_rate: u32,
        original_pitch: u8,
    ) -> u16 {
        self.samples.push(Sf2Sample {
            name: name.to_string(),
            start,
            end,
            start_loop,
            end_loop,
            sample_rate,
            original_pitch,
            sample_type: 1,
        });
        (self.samples.len() - 1) as u16
    }

    pub fn sample_type(&mut self, sample: u16, sample_type: u16) -> &mut Sf2Builder {
        self.samples[usize::from(sample)].sample_type = sample_type;
        self
    }

    pub fn instrument(&mut self, name: &str, zones: Vec<Zone>) -> u16 {
        self.instruments.push((name.to_string(), zones));
        (self.instruments.len() - 1) as u16
    }

    pub fn preset(&mut self, name: &str, preset: u16, bank: u16, zones: Vec<Zone>) -> u16 {
        self.presets.push((name.to_string(), preset, bank, zones));
        (self.presets.len() - 1) as u16
    }

    pub fn build(&self) -> Vec<u8> {
        let smpl: Vec<u8> = self.data.iter().flat_map(|s| s.to_le_bytes()).collect();

        let (mut pbag, mut pgen) = (Vec::new(), Vec::new());
        let preset_bags = write_zones(self.presets.iter().map(|p| &p.3), &mut pbag, &mut pgen);
        let mut phdr = Vec::new();
        for (index, (name, preset, bank, _)) in self.presets.iter().enumerate() {
            phdr.extend_from_slice(&name20(name));
            phdr.extend_from_slice(&preset.to_le_bytes());
            phdr.extend_from_slice(&bank.to_le_bytes());
            phdr.extend_from_slice(&preset_bags[index].to_le_bytes());
            phdr.extend_from_slice(&[0; 12]);
        }
        phdr.extend_from_slice(&name20("EOP"));
        phdr.extend_from_slice(&[0; 4]);
        phdr.extend_from_slice(&preset_bags[self.presets.len()].to_le_bytes());
        phdr.extend_from_slice(&[0; 12]);

        let (mut ibag, mut igen) = (Vec::new(), Vec::new());
        let instrument_bags =
            write_zones(self.instruments.iter().map(|i| &i.1), &mut ibag, &mut igen);
        let mut inst = Vec::new();
        for (index, (name, _)) in self.instruments.iter().enumerate() {
            inst.extend_from_slice(&name20(name));
            inst.extend_from_slice(&instrument_bags[index].to_le_bytes());
        }
        inst.extend_from_slice(&name20("EOI"));
        inst.extend_from_slice(&instrument_bags[self.instruments.len()].to_le_bytes());

        let mut shdr = Vec::new();
        for sample in &self.samples {
            shdr.extend_from_slice(&name20(&sample.name));
            for value in [
                sample.start,
                sample.end,
                sample.start_loop,
                sample.end_loop,
                sample.sample_rate,
            ] {
                shdr.extend_from_slice(&value.to_le_bytes());
            }
            shdr.push(sample.original_pitch);
            shdr.push(0);
            shdr.extend_from_slice(&0u16.to_le_bytes());
            shdr.extend_from_slice(&sample.sample_type.to_le_bytes());
        }
        shdr.extend_from_slice(&name20("EOS"));
        shdr.extend_from_slice(&[0; 26]);

        let mut riff = RiffWriter::new();
        riff.list(b"INFO", |info| {
            info.chunk(b"ifil", &[2, 0, 1, 0]);
            info.chunk(b"INAM", b"Test Bank\0");
        });
        riff.list(b"sdta", |sdta| {
            sdta.chunk(b"smpl", &smpl);
        });
        riff.list(b"pdta", |pdta| {
            pdta.chunk(b"phdr", &phdr)
                .chunk(b"pbag", &pbag)
                .chunk(b"pmod", &[0; 10])
                .chunk(b"pgen", &pgen)
                .chunk(b"inst", &inst)
                .chunk(b"ibag", &ibag)
                .chunk(b"imod", &[0; 10])
                .chunk(b"igen", &igen)
                .chunk(b"shdr", &shdr);
        });
        riff.into_form(b"sfbk")
    }
}
