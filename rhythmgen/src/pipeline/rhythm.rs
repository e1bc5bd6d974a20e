// One generation run, start to finish: pattern, samples, per-beat mix,
// loop assembly. Everything here is in memory; files come later.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, error, info, warn};

use super::loop_assembler::LoopAssembler;
use super::pattern::Pattern;
use super::project::Settings;
use crate::audio::mixer::{BeatMixer, Stems, Track};
use crate::audio::{Playback, SampleBuffer};
use crate::loader::sample_loader::{SampleLibrary, SampleSet, SampleSource};
use crate::shared::Instrument;

pub struct Rhythm {
    pub settings: Settings,
    pub pattern: Pattern,
    pub sources: BTreeMap<Instrument, SampleSource>,
    pub mix: SampleBuffer,
    pub stems: Stems, // single pass, repeated at export
    /// Nothing could produce sound, so `mix` is plain silence.
    pub all_silent: bool,
}

impl Rhythm {
    pub fn assembler(&self) -> LoopAssembler {
        LoopAssembler::new(&self.settings)
    }
}

pub fn generate_rhythm<R: Rng + ?Sized>(
    settings: Settings,
    library: &SampleLibrary,
    rng: &mut R,
    preview: Option<&dyn Playback>,
) -> Rhythm {
    let pattern = Pattern::generate(&settings, &mut *rng);
    let assembler = LoopAssembler::new(&settings);

    let sets: Vec<(Instrument, SampleSet)> = settings
        .instruments
        .iter()
        .map(|&inst| (inst, library.resolve(inst)))
        .collect();
    let sources: BTreeMap<_, _> = sets.iter().map(|(inst, set)| (*inst, set.source().clone())).collect();
    for (inst, set) in &sets {
        if set.source().is_fallback() {
            warn!("'{}' plays {}", inst, set.source());
        } else {
            info!("'{}': {} sample(s) from {}", inst, set.len(), set.source());
        }
        let longest = set.buffers().iter().map(|b| b.duration_ms()).max().unwrap_or(0);
        if longest > settings.beat_duration_ms() {
            debug!("'{}': samples up to {}ms are cut to the {}ms beat", inst, longest, settings.beat_duration_ms());
        }
    }

    let all_silent = sets.iter().all(|(_, set)| *set.source() == SampleSource::Silent);
    if all_silent {
        error!("no instrument has a usable sample and tones are unavailable, producing a silent loop");
        return Rhythm {
            mix: assembler.silent_loop(),
            stems: Stems::new(),
            settings,
            pattern,
            sources,
            all_silent,
        };
    }

    let tracks = sets
        .iter()
        .map(|(inst, set)| Track { instrument: *inst, samples: set, effects: settings.effect_chain(*inst) })
        .collect();
    let mut mixer = BeatMixer::new(tracks, settings.beat_duration_ms(), settings.swing);
    if let Some(playback) = preview {
        mixer = mixer.with_preview(playback);
    }
    let (slots, stems) = mixer.mix_all(&pattern, rng);

    let mix = assembler.assemble(&slots);
    let stems = assembler.finish_stems(stems);
    info!(
        "generated {} beats, loop {}ms (expected {}ms)",
        slots.len(),
        mix.duration_ms(),
        assembler.expected_duration_ms()
    );

    Rhythm { settings, pattern, sources, mix, stems, all_silent }
}
