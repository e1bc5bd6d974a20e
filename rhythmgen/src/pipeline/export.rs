// Writes a finished rhythm to disk. The mixed loop must make it out or the
// whole export fails; stems and the note file are extras and only get
// logged when they go wrong.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, bail};
use tracing::{error, info, warn};

use super::midi::write_midi;
use super::rhythm::Rhythm;
use crate::audio::SampleBuffer;
use crate::capabilities::Capabilities;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Wav,
    Mp3,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub stems: bool,
    pub midi: bool,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub mix: PathBuf,
    pub stems: Vec<PathBuf>,
    pub midi: Option<PathBuf>,
}

pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn export_rhythm(rhythm: &Rhythm, options: &ExportOptions, caps: &Capabilities) -> anyhow::Result<ExportReport> {
    export_with_timestamp(rhythm, options, caps, &timestamp())
}

pub fn export_with_timestamp(
    rhythm: &Rhythm,
    options: &ExportOptions,
    caps: &Capabilities,
    stamp: &str,
) -> anyhow::Result<ExportReport> {
    std::fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("failed to create output directory: {}", options.output_dir.display()))?;

    let format = match options.format {
        OutputFormat::Mp3 if !caps.mp3_encoder => {
            warn!("mp3 export unavailable (ffmpeg not found), falling back to wav");
            OutputFormat::Wav
        }
        f => f,
    };

    let settings = &rhythm.settings;
    let prefix = format!("{}_{}", settings.project_name, settings.style.name);
    let mix_path = options.output_dir.join(format!("{}_{}.{}", prefix, stamp, format.extension()));
    write_audio(&rhythm.mix, &mix_path, format).context("failed to export mixed loop")?;
    info!("exported loop to {}", mix_path.display());

    let mut report = ExportReport { mix: mix_path, ..Default::default() };

    if options.stems {
        let assembler = rhythm.assembler();
        for (inst, stem) in &rhythm.stems {
            let path = options
                .output_dir
                .join(format!("{}_{}_{}.{}", prefix, inst, stamp, format.extension()));
            let result = assembler
                .stem_for_export(stem)
                .context("failed to prepare stem")
                .and_then(|stem| write_audio(&stem, &path, format));
            match result {
                Ok(()) => {
                    info!("exported {} stem to {}", inst, path.display());
                    report.stems.push(path);
                }
                Err(e) => error!("failed to export {} stem: {:#}", inst, e),
            }
        }
    }

    if options.midi {
        if caps.midi_export {
            let path = options.output_dir.join(format!("{}_{}.mid", prefix, stamp));
            match write_midi(&rhythm.pattern, settings, &path) {
                Ok(()) => {
                    info!("exported midi to {}", path.display());
                    report.midi = Some(path);
                }
                Err(e) => error!("failed to export midi: {:#}", e),
            }
        } else {
            warn!("midi export unavailable, skipping");
        }
    }

    Ok(report)
}

fn write_audio(buf: &SampleBuffer, path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Wav => buf
            .write_wav(path)
            .with_context(|| format!("failed to write wav file: {}", path.display())),
        OutputFormat::Mp3 => encode_mp3(buf, path),
    }
}

// render to a scratch wav, then let ffmpeg do the encoding
fn encode_mp3(buf: &SampleBuffer, path: &Path) -> anyhow::Result<()> {
    let scratch = tempfile::tempdir().context("failed to create scratch directory")?;
    let wav = scratch.path().join("render.wav");
    buf.write_wav(&wav)
        .with_context(|| format!("failed to write wav file: {}", wav.display()))?;

    let status = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error", "-i"])
        .arg(&wav)
        .args(["-codec:a", "libmp3lame", "-qscale:a", "2"])
        .arg(path)
        .stdin(Stdio::null())
        .status()
        .context("failed to run ffmpeg")?;
    if !status.success() {
        bail!("ffmpeg exited with {}", status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::sample_loader::SampleLibrary;
    use crate::pipeline::project::GenerationConfig;
    use crate::pipeline::rhythm::generate_rhythm;
    use crate::pipeline::rhythm::tests::sample_tree;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rhythm(samples: &Path, loop_repeats: i64) -> Rhythm {
        let settings = GenerationConfig {
            instruments: vec!["kick".into(), "snare".into()],
            project_name: "demo".into(),
            loop_repeats,
            ..Default::default()
        }
        .validate();
        generate_rhythm(settings, &SampleLibrary::new(samples, true), &mut StdRng::seed_from_u64(11), None)
    }

    fn options(dir: &Path, stems: bool, midi: bool) -> ExportOptions {
        ExportOptions { output_dir: dir.join("out"), format: OutputFormat::Wav, stems, midi }
    }

    fn wav_frames(path: &Path) -> u32 {
        hound::WavReader::open(path).unwrap().duration()
    }

    #[test]
    fn exports_loop_stems_and_midi_with_derived_names() {
        let dir = tempfile::tempdir().unwrap();
        sample_tree(dir.path(), &["kicks", "snares"]);
        let rhythm = rhythm(dir.path(), 3);

        let report =
            export_with_timestamp(&rhythm, &options(dir.path(), true, true), &Capabilities::offline(), "20240101_120000")
                .unwrap();

        assert_eq!(report.mix.file_name().unwrap(), "demo_pop_20240101_120000.wav");
        assert_eq!(report.midi.as_ref().unwrap().file_name().unwrap(), "demo_pop_20240101_120000.mid");
        let names: Vec<_> = report.stems.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, ["demo_pop_kick_20240101_120000.wav", "demo_pop_snare_20240101_120000.wav"]);

        let mix_frames = wav_frames(&report.mix);
        assert_eq!(mix_frames as usize, rhythm.mix.len());
        for stem in &report.stems {
            assert_eq!(wav_frames(stem), mix_frames);
        }
    }

    #[test]
    fn mp3_without_encoder_falls_back_to_wav() {
        let dir = tempfile::tempdir().unwrap();
        let rhythm = rhythm(&dir.path().join("no_samples"), 1);
        let mut opts = options(dir.path(), false, false);
        opts.format = OutputFormat::Mp3;

        let report = export_with_timestamp(&rhythm, &opts, &Capabilities::offline(), "stamp").unwrap();
        assert_eq!(report.mix.extension().unwrap(), "wav");
        assert!(report.stems.is_empty());
        assert!(report.midi.is_none());
    }

    #[test]
    fn unwritable_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, "a file, not a directory").unwrap();
        let rhythm = rhythm(&dir.path().join("no_samples"), 1);

        let result = export_with_timestamp(&rhythm, &options(dir.path(), true, true), &Capabilities::offline(), "stamp");
        assert!(result.is_err());
    }

    #[test]
    fn midi_skipped_without_capability() {
        let dir = tempfile::tempdir().unwrap();
        let rhythm = rhythm(&dir.path().join("no_samples"), 1);
        let caps = Capabilities { midi_export: false, ..Capabilities::offline() };
        let report = export_with_timestamp(&rhythm, &options(dir.path(), false, true), &caps, "stamp").unwrap();
        assert!(report.midi.is_none());
    }
}
