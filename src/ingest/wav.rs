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

//! WAV file and folder ingest.

use std::path::Path;

use tracing::{debug, info, warn};

use super::{IngestReport, Ingestor, NoteAssignment};
use crate::descriptor::{NoteRange, SampleDescriptor};
use crate::error::IngestError;
use crate::fs::Session;
use crate::sampler::Sampler;
use crate::transfer::{commit_sample, stream_pcm};
use crate::walker::DirWalker;
use crate::wav;

/// Root key of a sample spread over all notes.
pub const ALL_NOTES_ROOT_KEY: u8 = 60;

/// Tuning of a sample spread over all notes.
pub const ALL_NOTES_TUNE_CENTS: i16 = -82;

impl<S: Sampler + ?Sized> Ingestor<'_, S> {
    /// Ingests one WAV file. With [`NoteAssignment::AllNotes`] the sample is
    /// closed as an instrument of its own; with a single note the caller is
    /// expected to group it with others.
    pub fn wav_file(&mut self, path: &Path, assignment: NoteAssignment) -> IngestReport {
        let mut report = IngestReport::default();
        let result = self.load_wav(path, assignment, &mut report);
        self.finish_file(&mut report, path, result);
        if assignment == NoteAssignment::AllNotes && report.committed > 0 {
            self.close_instrument(&mut report);
        }
        report
    }

    /// Ingests every `.wav` file below `dir`, each mapped to its own note
    /// counting up from `base_note`, as one instrument.
    pub fn wav_folder_to_notes(&mut self, dir: &Path, base_note: u8) -> IngestReport {
        let mut report = IngestReport::default();
        let walker = DirWalker::new(self.fs, dir, self.max_depth, base_note);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.finish_file(&mut report, dir, Err(e));
                    continue;
                }
            };
            if !entry.is_wav() {
                debug!(path = ?entry.path, "Skipping non-WAV file");
                continue;
            }
            let Some(note) = entry.note else {
                warn!(path = ?entry.path, "No notes left for file");
                report.skipped += 1;
                continue;
            };

            info!(path = ?entry.path, note, "WAV file detected");
            let result = self.load_wav(&entry.path, NoteAssignment::Note(note), &mut report);
            self.finish_file(&mut report, &entry.path, result);
        }
        self.close_instrument(&mut report);
        info!(dir = ?dir, report = %report, "Loaded WAV files to notes");
        report
    }

    /// Ingests every `.wav` file below `dir` across the whole keyboard, as
    /// zones of a single instrument.
    pub fn wav_folder_to_samples(&mut self, dir: &Path) -> IngestReport {
        let mut report = IngestReport::default();
        let walker = DirWalker::new(self.fs, dir, self.max_depth, 0);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.finish_file(&mut report, dir, Err(e));
                    continue;
                }
            };
            if !entry.is_wav() {
                debug!(path = ?entry.path, "Skipping non-WAV file");
                continue;
            }

            info!(path = ?entry.path, "WAV file detected");
            let result = self.load_wav(&entry.path, NoteAssignment::AllNotes, &mut report);
            self.finish_file(&mut report, &entry.path, result);
        }
        self.close_instrument(&mut report);
        info!(dir = ?dir, report = %report, "Loaded WAV files to samples");
        report
    }

    fn load_wav(
        &mut self,
        path: &Path,
        assignment: NoteAssignment,
        report: &mut IngestReport,
    ) -> Result<(), IngestError> {
        report.files += 1;
        let mut session = Session::open(self.fs, path)?;
        let layout = wav::read_layout(&mut session)?;
        let format = layout.format.pcm_format()?;
        if layout.frames() == 0 {
            debug!(path = ?path, "Data chunk holds no whole frames");
            report.skipped += 1;
            return Ok(());
        }

        self.sampler.new_sample()?;
        let stats = stream_pcm(&mut session, &mut *self.sampler, layout.data.size, format)?;

        let mut descriptor = SampleDescriptor::new(
            0,
            stats.frames.saturating_sub(1),
            layout.format.sample_rate,
        );
        match assignment {
            NoteAssignment::Note(note) => {
                descriptor.key_range = NoteRange::single(note);
                descriptor.root_key = note;
            }
            NoteAssignment::AllNotes => {
                descriptor.root_key = ALL_NOTES_ROOT_KEY;
                descriptor.tune_cents = ALL_NOTES_TUNE_CENTS;
            }
        }

        match wav::read_trailing_smpl(&mut session, &layout.data) {
            Ok(Some(smpl)) => smpl.apply_to(&mut descriptor),
            Ok(None) => {}
            Err(e) => warn!(path = ?path, err = %e, "Unable to read trailing chunk"),
        }
        descriptor.validate_loop();

        commit_sample(&mut *self.sampler, &descriptor);
        report.committed += 1;
        info!(
            path = ?path,
            frames = stats.frames,
            sample_rate = descriptor.sample_rate,
            root_key = descriptor.root_key,
            key_range = %descriptor.key_range,
            loop_mode = ?descriptor.loop_mode,
            "Sample loaded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::descriptor::LoopMode;
    use crate::fs::{LocalFs, MemoryFs};
    use crate::sampler::MemoryArena;
    use crate::testutil::{
        smpl_payload, write_wav_with_bits, Call, RecordingSampler, WavBuilder,
    };

    fn mono16(frames: usize) -> Vec<u8> {
        (0..frames as i16).flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_single_note_call_sequence() {
        let mut fs = MemoryFs::new();
        fs.add_file(
            "kick.wav",
            WavBuilder::new(1, 44100, 16).data(mono16(100)).build(),
        );
        let mut sampler = RecordingSampler::default();

        let report = Ingestor::new(&fs, &mut sampler)
            .wav_file(Path::new("kick.wav"), NoteAssignment::Note(64));
        assert_eq!(report.committed, 1);
        assert!(report.is_success());

        let calls = &sampler.calls;
        assert_eq!(calls[0], Call::NewSample);
        assert_eq!(calls[1], Call::BeginTransfer);
        assert!(matches!(calls[2], Call::AddSamples(ref s) if s.len() == 100));
        assert_eq!(calls[3], Call::EndTransfer);
        assert_eq!(
            calls[4..].to_vec(),
            vec![
                Call::SetSampleRange(0, 99),
                Call::SetExclusiveClass(0),
                Call::SetPitch(64, 44100, 0),
                Call::SetKeyRange(NoteRange::single(64)),
                Call::SetVelRange(NoteRange::FULL),
                Call::FinishSample,
            ]
        );
    }

    #[test]
    fn test_all_notes_closes_instrument() {
        let mut fs = MemoryFs::new();
        fs.add_file("pad.wav", WavBuilder::new(1, 22050, 8).data(vec![128; 300]).build());
        let mut arena = MemoryArena::new(1024);

        let report = Ingestor::new(&fs, &mut arena)
            .wav_file(Path::new("pad.wav"), NoteAssignment::AllNotes);
        assert_eq!(report.committed, 1);
        assert_eq!(report.instruments, 1);

        let sample = &arena.samples()[0];
        assert_eq!(sample.root_key, 60);
        assert_eq!(sample.tune_cents, -82);
        assert_eq!(sample.key_range, NoteRange::FULL);
        assert_eq!(arena.sample_data(sample).len(), 300);
        assert_eq!(arena.instruments(), &[0..1]);
    }

    #[test]
    fn test_stereo_keeps_left_channel() {
        let mut fs = MemoryFs::new();
        let frames: Vec<u8> = [(100i16, -1i16), (200, -2), (300, -3)]
            .iter()
            .flat_map(|(l, r)| [l.to_le_bytes(), r.to_le_bytes()].concat())
            .collect();
        fs.add_file("s.wav", WavBuilder::new(2, 48000, 16).data(frames).build());
        let mut arena = MemoryArena::new(64);

        Ingestor::new(&fs, &mut arena).wav_file(Path::new("s.wav"), NoteAssignment::Note(60));
        let sample = &arena.samples()[0];
        assert_eq!(arena.sample_data(sample), &[100, 200, 300]);
    }

    #[test]
    fn test_smpl_chunk_sets_loop() {
        let mut fs = MemoryFs::new();
        fs.add_file(
            "loop.wav",
            WavBuilder::new(1, 44100, 16)
                .data(mono16(1000))
                .chunk_after_data(b"smpl", smpl_payload(57, &[(100, 900)]))
                .build(),
        );
        let mut arena = MemoryArena::new(4096);

        let report =
            Ingestor::new(&fs, &mut arena).wav_file(Path::new("loop.wav"), NoteAssignment::AllNotes);
        assert_eq!(report.committed, 1);

        let sample = &arena.samples()[0];
        assert_eq!(sample.root_key, 57);
        assert_eq!(sample.tune_cents, 0);
        assert_eq!(sample.loop_mode, LoopMode::Continuous);
        assert_eq!(sample.loop_range, Some((100, 900)));
    }

    #[test]
    fn test_no_data_chunk_is_empty_result() {
        let mut fs = MemoryFs::new();
        fs.add_file("empty.wav", WavBuilder::new(1, 44100, 16).without_data().build());
        let mut sampler = RecordingSampler::default();

        let report = Ingestor::new(&fs, &mut sampler)
            .wav_file(Path::new("empty.wav"), NoteAssignment::Note(60));
        assert!(report.is_success());
        assert_eq!(report.committed, 0);
        assert_eq!(report.skipped, 1);
        assert!(sampler.calls.is_empty());
    }

    #[test]
    fn test_unsupported_encoding_fails_file() {
        let mut fs = MemoryFs::new();
        fs.add_file("hi.wav", WavBuilder::new(1, 96000, 24).data(vec![0; 30]).build());
        let mut sampler = RecordingSampler::default();

        let report = Ingestor::new(&fs, &mut sampler)
            .wav_file(Path::new("hi.wav"), NoteAssignment::Note(60));
        assert_eq!(report.failures.len(), 1);
        assert!(sampler.calls.is_empty());
    }

    #[test]
    fn test_truncated_payload_is_no_data() {
        // A data chunk running past the end of the file counts as no data chunk.
        let mut bytes = WavBuilder::new(1, 44100, 16).data(mono16(500)).build();
        bytes.truncate(44 + 600);
        let mut fs = MemoryFs::new();
        fs.add_file("cut.wav", bytes);
        let mut sampler = RecordingSampler::default();

        let report = Ingestor::new(&fs, &mut sampler)
            .wav_file(Path::new("cut.wav"), NoteAssignment::Note(60));
        assert!(report.is_success());
        assert_eq!(report.skipped, 1);
        assert!(!sampler.calls.contains(&Call::FinishSample));
    }

    #[test]
    fn test_arena_full_aborts_sample() {
        let mut fs = MemoryFs::new();
        fs.add_file("big.wav", WavBuilder::new(1, 44100, 16).data(mono16(400)).build());
        fs.add_file("small.wav", WavBuilder::new(1, 44100, 16).data(mono16(10)).build());
        let mut arena = MemoryArena::new(200);

        let mut ingestor = Ingestor::new(&fs, &mut arena);
        let big = ingestor.wav_file(Path::new("big.wav"), NoteAssignment::Note(60));
        let small = ingestor.wav_file(Path::new("small.wav"), NoteAssignment::Note(61));
        assert_eq!(big.committed, 0);
        assert_eq!(big.failures.len(), 1);
        assert_eq!(small.committed, 1);
        assert_eq!(arena.samples().len(), 1);
        assert_eq!(arena.samples()[0].root_key, 61);
    }

    #[test]
    fn test_folder_to_notes() {
        let mut fs = MemoryFs::new();
        for name in ["a.wav", "b.WAV", "notes.txt", "c.wav"] {
            fs.add_file(
                format!("kit/{}", name),
                WavBuilder::new(1, 44100, 16).data(mono16(16)).build(),
            );
        }
        let mut arena = MemoryArena::new(1024);

        let report = Ingestor::new(&fs, &mut arena).wav_folder_to_notes(Path::new("kit"), 60);
        assert_eq!(report.committed, 3);
        assert_eq!(report.instruments, 1);

        // The text file still consumes a note.
        let keys: Vec<u8> = arena.samples().iter().map(|s| s.root_key).collect();
        assert_eq!(keys, vec![60, 61, 63]);
        let ranges: Vec<NoteRange> = arena.samples().iter().map(|s| s.key_range).collect();
        assert_eq!(ranges[1], NoteRange::single(61));
        assert_eq!(arena.instruments(), &[0..3]);
    }

    #[test]
    fn test_folder_to_notes_consecutive() {
        let mut fs = MemoryFs::new();
        for name in ["1.wav", "2.wav", "3.wav"] {
            fs.add_file(
                format!("set/{}", name),
                WavBuilder::new(1, 44100, 16).data(mono16(4)).build(),
            );
        }
        let mut arena = MemoryArena::new(1024);
        Ingestor::new(&fs, &mut arena).wav_folder_to_notes(Path::new("set"), 60);
        let keys: Vec<(u8, NoteRange)> = arena
            .samples()
            .iter()
            .map(|s| (s.root_key, s.key_range))
            .collect();
        assert_eq!(
            keys,
            vec![
                (60, NoteRange::single(60)),
                (61, NoteRange::single(61)),
                (62, NoteRange::single(62)),
            ]
        );
    }

    #[test]
    fn test_folder_to_samples_one_instrument() {
        let mut fs = MemoryFs::new();
        fs.add_file("pads/one.wav", WavBuilder::new(1, 44100, 16).data(mono16(8)).build());
        fs.add_file("pads/two.wav", WavBuilder::new(1, 44100, 16).data(mono16(8)).build());
        fs.add_file("pads/bad.wav", vec![0; 4]);
        let mut arena = MemoryArena::new(1024);

        let report = Ingestor::new(&fs, &mut arena).wav_folder_to_samples(Path::new("pads"));
        assert_eq!(report.files, 3);
        assert_eq!(report.committed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.instruments, 1);
        assert_eq!(arena.instruments(), &[0..2]);
        assert!(arena.samples().iter().all(|s| s.tune_cents == -82));
    }

    #[test]
    fn test_local_filesystem_with_hound() {
        let dir = tempfile::tempdir().unwrap();
        write_wav_with_bits(dir.path().join("tone.wav"), vec![vec![1, 2, 3, 4]], 44100, 16).unwrap();
        let fs = LocalFs::new("local", dir.path());
        let mut arena = MemoryArena::new(64);

        let report = Ingestor::new(&fs, &mut arena)
            .wav_file(Path::new("tone.wav"), NoteAssignment::Note(72));
        assert_eq!(report.committed, 1);
        let sample = &arena.samples()[0];
        assert_eq!(arena.sample_data(sample), &[1, 2, 3, 4]);
        assert_eq!(sample.sample_rate, 44100);
    }
}
