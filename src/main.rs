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
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use sampler_ingest::config::IngestConfig;
use sampler_ingest::fs::{Filesystem, Mounts, Session, DEFAULT_MOUNT};
use sampler_ingest::sampler::ArenaSample;
use sampler_ingest::soundfont::SoundFontReader;
use sampler_ingest::{wav, IngestReport, Ingestor, MemoryArena, NoteAssignment, SoundFontMode};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Loads WAV files and SoundFont banks into a sampler arena."
)]
struct Cli {
    /// The path to the ingest config.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// The mounted filesystem to read from.
    #[arg(long = "fs", global = true)]
    filesystem: Option<String>,
    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Loads a single WAV file.
    Wav {
        /// The path of the file on the filesystem.
        path: PathBuf,
        /// The note to map the sample to. Without it the sample covers all notes.
        #[arg(short, long)]
        note: Option<u8>,
    },
    /// Loads every WAV file in a directory.
    WavFolder {
        /// The directory on the filesystem.
        path: PathBuf,
        /// The note assigned to the first file.
        #[arg(short, long, default_value_t = 60)]
        base_note: u8,
        /// Load every file across all notes as zones of one instrument instead
        /// of mapping files to consecutive notes.
        #[arg(short, long)]
        samples: bool,
    },
    /// Loads a SoundFont bank.
    Soundfont {
        /// The path of the bank on the filesystem.
        path: PathBuf,
        /// What to load from the bank.
        #[arg(short, long, value_enum, default_value_t = SoundFontMode::Presets)]
        mode: SoundFontMode,
    },
    /// Prints the structure of a WAV file or SoundFont bank without loading it.
    Inspect {
        /// The path of the file on the filesystem.
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct LoadOutput<'a> {
    report: &'a IngestReport,
    samples: &'a [ArenaSample],
    instruments: &'a [std::ops::Range<usize>],
    used: usize,
    capacity: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => IngestConfig::deserialize(path)?,
        None => IngestConfig::default(),
    };
    let mounts = Mounts::from_config(&config);
    let fs = select_filesystem(
        &mounts,
        cli.filesystem.as_deref().or(config.default_filesystem()),
    )?;

    let mut arena =
        MemoryArena::with_max_samples(config.arena_capacity(), config.max_samples());
    let report = match cli.command {
        Commands::Wav { path, note } => {
            let assignment = match note {
                Some(note) if note > 127 => {
                    return Err(format!("note {} is out of range", note).into())
                }
                Some(note) => NoteAssignment::Note(note),
                None => NoteAssignment::AllNotes,
            };
            Ingestor::with_config(fs.as_ref(), &mut arena, &config).wav_file(&path, assignment)
        }
        Commands::WavFolder {
            path,
            base_note,
            samples,
        } => {
            let mut ingestor = Ingestor::with_config(fs.as_ref(), &mut arena, &config);
            if samples {
                ingestor.wav_folder_to_samples(&path)
            } else {
                ingestor.wav_folder_to_notes(&path, base_note)
            }
        }
        Commands::Soundfont { path, mode } => {
            Ingestor::with_config(fs.as_ref(), &mut arena, &config).soundfont(&path, mode)
        }
        Commands::Inspect { path } => return inspect(fs.as_ref(), &path, cli.json),
    };

    print_load(&report, &arena, cli.json)?;
    if !report.is_success() {
        return Err(format!("{} file(s) failed to load", report.failures.len()).into());
    }
    Ok(())
}

/// Picks the named filesystem, or the only one when none is named.
fn select_filesystem(
    mounts: &Mounts,
    id: Option<&str>,
) -> Result<Arc<dyn Filesystem>, Box<dyn Error>> {
    match id {
        Some(id) => mounts.get(id),
        None => match mounts.single() {
            Some(fs) => Ok(fs),
            None => mounts
                .get(DEFAULT_MOUNT)
                .map_err(|_| -> Box<dyn Error> {
                    "several filesystems are configured, pick one with --fs".into()
                }),
        },
    }
}

fn print_load(report: &IngestReport, arena: &MemoryArena, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        let output = LoadOutput {
            report,
            samples: arena.samples(),
            instruments: arena.instruments(),
            used: arena.used(),
            capacity: arena.capacity(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", report);
    println!(
        "Arena: {} of {} samples used, {} instruments",
        arena.used(),
        arena.capacity(),
        arena.instruments().len()
    );
    println!("Samples (count: {}):", arena.samples().len());
    for (index, sample) in arena.samples().iter().enumerate() {
        println!(
            "- #{}: [{}, {}] root {} ({:+} cents) @ {} Hz, keys {}, velocities {}, loop {:?} {:?}",
            index,
            sample.start,
            sample.end,
            sample.root_key,
            sample.tune_cents,
            sample.sample_rate,
            sample.key_range,
            sample.vel_range,
            sample.loop_mode,
            sample.loop_range,
        );
    }
    if !report.failures.is_empty() {
        println!("Failures:");
        for failure in &report.failures {
            println!("- {}: {}", failure.path.display(), failure.reason);
        }
    }
    Ok(())
}

fn is_soundfont(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sf2"))
}

fn inspect(fs: &dyn Filesystem, path: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    let mut session = Session::open(fs, path)?;

    if is_soundfont(path) {
        let summary = SoundFontReader::new(session)?.summary()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }
        println!(
            "Sample data: {} bytes at offset {}",
            summary.index.smpl_len, summary.index.smpl_offset
        );
        println!("Presets (count: {}):", summary.presets.len());
        for preset in &summary.presets {
            println!("- {:03}:{:03} {}", preset.bank, preset.preset, preset.name);
        }
        println!("Instruments (count: {}):", summary.instruments.len());
        for instrument in &summary.instruments {
            println!("- {}", instrument.name);
        }
        println!("Samples (count: {}):", summary.samples.len());
        for sample in &summary.samples {
            println!(
                "- {}: [{}, {}] loop [{}, {}] @ {} Hz, pitch {} ({:+} cents)",
                sample.name,
                sample.start,
                sample.end,
                sample.start_loop,
                sample.end_loop,
                sample.sample_rate,
                sample.original_pitch,
                sample.pitch_correction,
            );
        }
        return Ok(());
    }

    let layout = wav::read_layout(&mut session)?;
    let smpl = wav::read_trailing_smpl(&mut session, &layout.data)?;
    if json {
        #[derive(Serialize)]
        struct WavOutput<'a> {
            layout: &'a wav::WavLayout,
            frames: u32,
            smpl: Option<&'a wav::SmplChunk>,
        }
        let output = WavOutput {
            layout: &layout,
            frames: layout.frames(),
            smpl: smpl.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let format = &layout.format;
    println!(
        "Format: tag {:#06x}, {} channel(s), {} Hz, {} bits",
        format.format_tag, format.channels, format.sample_rate, format.bits_per_sample
    );
    println!(
        "Data: {} bytes at offset {} ({} frames)",
        layout.data.size,
        layout.data.offset,
        layout.frames()
    );
    match smpl {
        Some(smpl) => println!(
            "Sampler chunk: unity note {}, loops {:?}",
            smpl.midi_unity_note,
            smpl.loops
                .iter()
                .map(|l| (l.start, l.end))
                .collect::<Vec<_>>()
        ),
        None => println!("Sampler chunk: none"),
    }
    Ok(())
}
