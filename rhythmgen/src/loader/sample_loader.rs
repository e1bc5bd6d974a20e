// Resolves an instrument to the audio it plays. Resolution is an ordered
// pipeline: exact folder, fuzzy folder, then a generated tone (or silence
// when tones are unavailable). Whatever happens, the returned set is
// never empty.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, error, warn};

use super::folder_match::{FUZZY_CUTOFF, closest_match};
use crate::audio::tone::{TONE_DURATION_MS, instrument_tone, tone_frequency};
use crate::audio::SampleBuffer;
use crate::shared::{Instrument, SAMPLE_RATE};

#[derive(Clone, Debug, PartialEq)]
pub enum SampleSource {
    Exact { dir: PathBuf },
    Fuzzy { expected: String, dir: PathBuf },
    Synthetic { frequency: f32 },
    Silent,
}

impl SampleSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, SampleSource::Synthetic { .. } | SampleSource::Silent)
    }
}

impl fmt::Display for SampleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSource::Exact { dir } => write!(f, "{}", dir.display()),
            SampleSource::Fuzzy { expected, dir } => write!(f, "{} (for '{}')", dir.display(), expected),
            SampleSource::Synthetic { frequency } => write!(f, "synthetic {} Hz tone", frequency),
            SampleSource::Silent => f.write_str("silence"),
        }
    }
}

/// Non-empty, ordered list of canonical buffers for one instrument.
#[derive(Clone, Debug)]
pub struct SampleSet {
    source: SampleSource,
    buffers: Vec<SampleBuffer>,
}

impl SampleSet {
    fn new(source: SampleSource, first: SampleBuffer, rest: Vec<SampleBuffer>) -> Self {
        let mut buffers = Vec::with_capacity(rest.len() + 1);
        buffers.push(first);
        buffers.extend(rest);
        Self { source, buffers }
    }

    /// `None` for an empty list, since a set always has something to play.
    pub fn from_buffers(source: SampleSource, buffers: Vec<SampleBuffer>) -> Option<Self> {
        let mut buffers = buffers.into_iter();
        let first = buffers.next()?;
        Some(Self::new(source, first, buffers.collect()))
    }

    pub fn source(&self) -> &SampleSource {
        &self.source
    }

    pub fn buffers(&self) -> &[SampleBuffer] {
        &self.buffers
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    // uniform pick, drawn fresh for every hit
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &SampleBuffer {
        &self.buffers[rng.random_range(0..self.buffers.len())]
    }
}

enum FolderLookup {
    Exact(PathBuf),
    Fuzzy(PathBuf),
    Missing,
}

pub struct SampleLibrary {
    root: PathBuf,
    synthetic_tones: bool,
}

impl SampleLibrary {
    pub fn new(root: impl Into<PathBuf>, synthetic_tones: bool) -> Self {
        Self { root: root.into(), synthetic_tones }
    }

    pub fn resolve(&self, instrument: Instrument) -> SampleSet {
        let expected = instrument.folder();
        let (dir, source) = match self.lookup_folder(expected) {
            FolderLookup::Exact(dir) => (dir.clone(), SampleSource::Exact { dir }),
            FolderLookup::Fuzzy(dir) => {
                warn!(
                    "instrument folder '{}' not found, using closest match '{}'",
                    expected,
                    dir.display()
                );
                let source = SampleSource::Fuzzy { expected: expected.to_string(), dir: dir.clone() };
                (dir, source)
            }
            FolderLookup::Missing => {
                warn!("no samples directory for '{}' (expected '{}'), using fallback", instrument, expected);
                return self.fallback(instrument);
            }
        };

        let paths = match index_wav_in_dir(&dir) {
            Ok(paths) => paths,
            Err(e) => {
                error!("failed to list {}: {}", dir.display(), e);
                return self.fallback(instrument);
            }
        };
        if paths.is_empty() {
            warn!("samples directory '{}' has no wav files, using fallback for '{}'", dir.display(), instrument);
            return self.fallback(instrument);
        }

        let mut loaded = Vec::with_capacity(paths.len());
        for path in &paths {
            match SampleBuffer::load_wav(path) {
                Ok(buf) => {
                    if !buf.is_canonical() {
                        debug!(
                            "converting {} from {} Hz / {} channel(s) to mono {} Hz",
                            path.display(),
                            buf.sample_rate,
                            buf.channels(),
                            SAMPLE_RATE
                        );
                    }
                    let buf = buf.to_canonical();
                    debug!("loaded sample {} ({}ms) for '{}'", path.display(), buf.duration_ms(), instrument);
                    loaded.push(buf);
                }
                Err(e) => error!("{}, skipping file", e), // one bad file never sinks the instrument
            }
        }

        let mut loaded = loaded.into_iter();
        match loaded.next() {
            Some(first) => SampleSet::new(source, first, loaded.collect()),
            None => {
                warn!("no valid samples for '{}' in '{}', using fallback", instrument, dir.display());
                self.fallback(instrument)
            }
        }
    }

    fn lookup_folder(&self, expected: &str) -> FolderLookup {
        if !self.root.is_dir() {
            error!("samples directory '{}' does not exist", self.root.display());
            return FolderLookup::Missing;
        }
        let dirs = match list_subdirs(&self.root) {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("failed to read samples directory '{}': {}", self.root.display(), e);
                return FolderLookup::Missing;
            }
        };
        if let Some(name) = dirs.iter().find(|d| d.eq_ignore_ascii_case(expected)) {
            return FolderLookup::Exact(self.root.join(name));
        }
        match closest_match(expected, &dirs, FUZZY_CUTOFF) {
            Some(name) => FolderLookup::Fuzzy(self.root.join(name)),
            None => FolderLookup::Missing,
        }
    }

    fn fallback(&self, instrument: Instrument) -> SampleSet {
        if self.synthetic_tones {
            let frequency = tone_frequency(instrument);
            SampleSet::new(SampleSource::Synthetic { frequency }, instrument_tone(instrument), Vec::new())
        } else {
            warn!("synthetic tones unavailable, '{}' will be silent", instrument);
            SampleSet::new(SampleSource::Silent, SampleBuffer::silent(TONE_DURATION_MS), Vec::new())
        }
    }
}

// Sorted so a seeded run picks the same files every time.
pub fn index_wav_in_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if is_wav && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn list_subdirs(root: &Path) -> std::io::Result<Vec<String>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                dirs.push(name.to_string());
            }
        }
    }
    dirs.sort();
    Ok(dirs)
}
