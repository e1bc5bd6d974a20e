use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, error, info};

use super::effect::EffectChain;
use super::sample_buffer::SampleBuffer;
use super::{BEAT_PREVIEW_TIMEOUT, Playback, preview};
use crate::loader::sample_loader::SampleSet;
use crate::pipeline::pattern::Pattern;
use crate::shared::Instrument;

// headroom taken off every instrument as it lands in the beat slot
pub const OVERLAY_GAIN_DB: f32 = -6.0;

pub type Stems = BTreeMap<Instrument, SampleBuffer>;

/// Offset for one beat index: odd (off-beat) steps are pushed late by a
/// share of half a beat. Negative swing would need to start a hit before
/// its own slot, so it has no effect.
pub fn swing_offset_ms(beat_index: usize, swing_percent: f64, beat_duration_ms: u64) -> f64 {
    if swing_percent <= 0.0 || beat_index % 2 == 0 {
        return 0.0;
    }
    swing_percent / 100.0 * (beat_duration_ms as f64 / 2.0)
}

pub struct Track<'a> {
    pub instrument: Instrument,
    pub samples: &'a SampleSet,
    pub effects: EffectChain,
}

// Builds beat slots one index at a time and keeps a running stem per
// instrument, padded with silence whenever that instrument rests.
pub struct BeatMixer<'a> {
    tracks: Vec<Track<'a>>,
    beat_duration_ms: u64,
    swing: f64,
    preview: Option<&'a dyn Playback>,
    stems: Stems,
}

impl<'a> BeatMixer<'a> {
    pub fn new(tracks: Vec<Track<'a>>, beat_duration_ms: u64, swing: f64) -> Self {
        let stems = tracks
            .iter()
            .map(|t| (t.instrument, SampleBuffer::silent_frames(0)))
            .collect();
        Self { tracks, beat_duration_ms, swing, preview: None, stems }
    }

    // audition every non-silent slot as it gets mixed
    pub fn with_preview(mut self, playback: &'a dyn Playback) -> Self {
        self.preview = Some(playback);
        self
    }

    pub fn mix_beat<R: Rng + ?Sized>(&mut self, index: usize, pattern: &Pattern, rng: &mut R) -> SampleBuffer {
        let duration = self.beat_duration_ms;
        let delay = swing_offset_ms(index, self.swing, duration);
        let mut slot = SampleBuffer::silent(duration);
        let mut has_content = false;

        for track in &self.tracks {
            let mut stem_segment = SampleBuffer::silent(duration);
            if pattern.is_hit(track.instrument, index) {
                let sample = track.samples.choose(rng).clone();
                let sample = track.effects.process(sample).force_duration(duration).delayed(delay);
                match slot.overlay(&sample, OVERLAY_GAIN_DB) {
                    Ok(()) => {
                        has_content = true;
                        if let Err(e) = stem_segment.overlay(&sample, 0.0) {
                            error!(instrument = %track.instrument, beat = index + 1, "stem overlay failed: {}", e);
                        }
                        debug!(
                            "adding {} to beat {} ({})",
                            track.instrument,
                            index + 1,
                            track.effects.labels().join(", ")
                        );
                    }
                    Err(e) => error!("failed to overlay {} on beat {}: {}", track.instrument, index + 1, e),
                }
            }
            if let Some(stem) = self.stems.get_mut(&track.instrument) {
                stem.append(&stem_segment.to_canonical());
            }
        }

        let slot = match slot.to_canonical().normalize() {
            Ok(slot) => slot.to_canonical(),
            Err(e) => {
                error!("failed to normalize beat {}: {}", index + 1, e);
                has_content = false;
                SampleBuffer::silent(duration)
            }
        };
        info!("beat {}: {}ms, has_content: {}", index + 1, slot.duration_ms(), has_content);

        if has_content {
            if let Some(playback) = self.preview {
                preview(playback, &slot, BEAT_PREVIEW_TIMEOUT);
            }
        }
        slot
    }

    /// Mix every beat in order. Returns the slots and the per-instrument stems.
    pub fn mix_all<R: Rng + ?Sized>(mut self, pattern: &Pattern, rng: &mut R) -> (Vec<SampleBuffer>, Stems) {
        let slots = (0..pattern.length())
            .map(|i| self.mix_beat(i, pattern, &mut *rng))
            .collect();
        (slots, self.stems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ms_to_frames;
    use crate::audio::testing::RecordingPlayback;
    use crate::audio::tone::instrument_tone;
    use crate::loader::sample_loader::SampleSource;
    use crate::shared::SAMPLE_RATE;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tone_set(inst: Instrument) -> SampleSet {
        SampleSet::from_buffers(SampleSource::Synthetic { frequency: 0.0 }, vec![instrument_tone(inst)]).unwrap()
    }

    fn two_track_pattern() -> Pattern {
        Pattern::from_rows(
            4,
            vec![
                (Instrument::Kick, vec![true, false, true, false]),
                (Instrument::Snare, vec![true, false, false, true]),
            ],
        )
    }

    #[test]
    fn slots_and_stems_stay_aligned() {
        let kick = tone_set(Instrument::Kick);
        let snare = tone_set(Instrument::Snare);
        let tracks = vec![
            Track { instrument: Instrument::Kick, samples: &kick, effects: EffectChain::new(100, 0.0) },
            Track { instrument: Instrument::Snare, samples: &snare, effects: EffectChain::new(80, 0.5) },
        ];
        let mixer = BeatMixer::new(tracks, 250, 0.0);
        let (slots, stems) = mixer.mix_all(&two_track_pattern(), &mut StdRng::seed_from_u64(1));

        assert_eq!(slots.len(), 4);
        for slot in &slots {
            assert!(slot.is_canonical());
            assert_eq!(slot.len(), ms_to_frames(250));
        }
        assert!(slots[1].is_silent());
        assert!(!slots[3].is_silent());

        for stem in stems.values() {
            assert!(stem.is_canonical());
            assert_eq!(stem.len(), 4 * ms_to_frames(250));
        }
        // kick rests on beat 2, so its stem is silent there
        let kick_stem = stems[&Instrument::Kick].mono_samples();
        let beat = ms_to_frames(250);
        assert!(kick_stem[beat..2 * beat].iter().all(|&x| x == 0.0));
        assert!(kick_stem[..beat].iter().any(|&x| x != 0.0));
    }

    #[test]
    fn beat_slots_are_peak_normalized() {
        let kick = tone_set(Instrument::Kick);
        let tracks = vec![Track { instrument: Instrument::Kick, samples: &kick, effects: EffectChain::new(10, 0.0) }];
        let mut mixer = BeatMixer::new(tracks, 100, 0.0);
        let slot = mixer.mix_beat(0, &two_track_pattern(), &mut StdRng::seed_from_u64(2));
        assert!(slot.peak() > 0.98);
    }

    #[test]
    fn broken_sample_drops_only_its_own_contribution() {
        let kick = tone_set(Instrument::Kick);
        let broken = SampleSet::from_buffers(
            SampleSource::Silent,
            vec![SampleBuffer::mono(SAMPLE_RATE, vec![f32::NAN; 100])],
        )
        .unwrap();
        let tracks = vec![
            Track { instrument: Instrument::Kick, samples: &kick, effects: EffectChain::new(100, 0.0) },
            Track { instrument: Instrument::Snare, samples: &broken, effects: EffectChain::new(100, 0.0) },
        ];
        let mixer = BeatMixer::new(tracks, 100, 0.0);
        let (slots, stems) = mixer.mix_all(&two_track_pattern(), &mut StdRng::seed_from_u64(3));

        assert!(!slots[0].is_silent()); // kick still lands
        assert!(slots[3].is_silent()); // only the broken snare hits here
        assert!(stems[&Instrument::Snare].is_silent());
        assert_eq!(stems[&Instrument::Snare].len(), 4 * ms_to_frames(100));
    }

    #[test]
    fn swing_only_moves_off_beats_later() {
        assert_eq!(swing_offset_ms(0, 50.0, 500), 0.0);
        assert_eq!(swing_offset_ms(1, 50.0, 500), 125.0);
        assert_eq!(swing_offset_ms(3, -20.0, 500), 0.0);
        assert_eq!(swing_offset_ms(3, 0.0, 500), 0.0);
    }

    #[test]
    fn swung_hits_start_late_in_their_slot() {
        let kick = tone_set(Instrument::Kick);
        let tracks = vec![Track { instrument: Instrument::Kick, samples: &kick, effects: EffectChain::new(100, 0.0) }];
        let pattern = Pattern::from_rows(2, vec![(Instrument::Kick, vec![true, true])]);
        let (slots, _) = BeatMixer::new(tracks, 200, 50.0).mix_all(&pattern, &mut StdRng::seed_from_u64(4));

        let offset = ms_to_frames(50);
        let swung = slots[1].mono_samples();
        assert!(swung[..offset].iter().all(|&x| x == 0.0));
        assert!(swung[offset..].iter().any(|&x| x != 0.0));
        assert_ne!(slots[0].mono_samples()[1], 0.0);
        assert_eq!(swung.len(), ms_to_frames(200));
    }

    #[test]
    fn preview_only_for_slots_with_content() {
        let kick = tone_set(Instrument::Kick);
        let rec = RecordingPlayback::default();
        let tracks = vec![Track { instrument: Instrument::Kick, samples: &kick, effects: EffectChain::new(100, 0.0) }];
        let mixer = BeatMixer::new(tracks, 100, 0.0).with_preview(&rec);
        mixer.mix_all(&two_track_pattern(), &mut StdRng::seed_from_u64(5));
        assert_eq!(rec.played.borrow().len(), 2);
    }
}
