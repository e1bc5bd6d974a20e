mod audio;
mod capabilities;
mod loader;
mod pipeline;
mod shared;
mod tui;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use audio::{CpalPlayback, LOOP_PLAYBACK_TIMEOUT, Playback, preview};
use capabilities::Capabilities;
use loader::sample_loader::SampleLibrary;
use pipeline::export::{ExportOptions, OutputFormat, export_rhythm};
use pipeline::persistence;
use pipeline::rhythm::generate_rhythm;

const LOG_FILE: &str = "rhythm_generator.log";

/// Generate rhythm loops from a sample library.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON file with generation settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Play every beat as it is mixed
    #[arg(long)]
    preview: bool,

    /// Also export one file per instrument
    #[arg(long)]
    export_stems: bool,

    /// Also export the pattern as a MIDI file
    #[arg(long)]
    export_midi: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Wav)]
    output_format: OutputFormat,

    #[arg(long)]
    debug: bool,

    /// Seed for reproducible patterns and sample picks
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "samples")]
    samples_dir: PathBuf,

    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Skip playing the finished loop
    #[arg(long)]
    no_playback: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

// stdout plus an append-only log file; stdout alone if the file won't open
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let (writer, file_error) = match OpenOptions::new().create(true).append(true).open(LOG_FILE) {
        Ok(file) => (BoxMakeWriter::new(std::io::stdout.and(Mutex::new(file))), None),
        Err(e) => (BoxMakeWriter::new(std::io::stdout), Some(e)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    if let Some(e) = file_error {
        warn!("could not open {}: {}, logging to stdout only", LOG_FILE, e);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let caps = Capabilities::probe();
    info!("capabilities: {:?}", caps);

    let config = persistence::load_config_or_default(args.config.as_deref());
    let settings = config.validate();
    tui::show_config(&settings);

    let mut rng = match args.seed {
        Some(seed) => {
            info!("using seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let library = SampleLibrary::new(&args.samples_dir, caps.synthetic_tones);
    let playback = CpalPlayback;
    let preview_with: Option<&dyn Playback> = (args.preview && caps.playback).then_some(&playback as &dyn Playback);
    if args.preview && !caps.playback {
        warn!("no playback device, beat previews disabled");
    }

    let rhythm = generate_rhythm(settings, &library, &mut rng, preview_with);
    tui::show_pattern(&rhythm.pattern);
    if rhythm.all_silent {
        warn!("every instrument is silent, the exported loop will be silence");
    }

    let options = ExportOptions {
        output_dir: args.output_dir,
        format: args.output_format,
        stems: args.export_stems,
        midi: args.export_midi,
    };
    let report = export_rhythm(&rhythm, &options, &caps)?;
    info!("saved {}", report.mix.display());

    if !args.no_playback {
        if caps.playback {
            info!("playing final loop");
            preview(&playback, &rhythm.mix, LOOP_PLAYBACK_TIMEOUT);
        } else {
            info!("no playback device, skipping final playback");
        }
    }
    Ok(())
}
