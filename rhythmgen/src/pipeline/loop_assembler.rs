// Folds mixed beat slots into the final loop. The loop is repeated here,
// stems only at export; both end up padded to the same frame count so the
// exported files line up.

use tracing::{debug, warn};

use super::project::Settings;
use crate::audio::mixer::Stems;
use crate::audio::{BufferError, SampleBuffer, apply_volume, ms_to_frames};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopAssembler {
    pub pattern_length: usize,
    pub beat_duration_ms: u64,
    pub loop_repeats: u32,
    pub master_volume: u8,
}

impl LoopAssembler {
    pub fn new(settings: &Settings) -> Self {
        Self {
            pattern_length: settings.pattern_length,
            beat_duration_ms: settings.beat_duration_ms(),
            loop_repeats: settings.loop_repeats,
            master_volume: settings.master_volume,
        }
    }

    pub fn pass_duration_ms(&self) -> u64 {
        self.pattern_length as u64 * self.beat_duration_ms
    }

    pub fn expected_duration_ms(&self) -> u64 {
        self.pass_duration_ms() * self.loop_repeats as u64
    }

    pub fn pass_frames(&self) -> usize {
        ms_to_frames(self.pass_duration_ms())
    }

    pub fn expected_frames(&self) -> usize {
        ms_to_frames(self.expected_duration_ms())
    }

    pub fn assemble(&self, slots: &[SampleBuffer]) -> SampleBuffer {
        let mut pass = SampleBuffer::silent_frames(0);
        for slot in slots {
            pass.append(slot);
        }
        // slots floor to whole frames; pad each pass like the stems so they stay aligned
        let pass = pass.to_canonical().force_frames(self.pass_frames());
        let repeated = pass.repeated(self.loop_repeats);
        let mut mix = apply_volume(repeated, self.master_volume).to_canonical();

        let expected = self.expected_frames();
        if mix.len() < expected {
            debug!("padding loop with {} frames of silence", expected - mix.len());
            mix.pad_to_frames(expected);
        } else if mix.len() > expected {
            warn!("loop overshoots expected length by {} frames, truncating", mix.len() - expected);
            mix = mix.force_frames(expected);
        }
        mix
    }

    /// Single-pass stems, padded to one pass of the pattern.
    pub fn finish_stems(&self, stems: Stems) -> Stems {
        let frames = self.pass_frames();
        stems
            .into_iter()
            .map(|(inst, stem)| (inst, stem.to_canonical().force_frames(frames)))
            .collect()
    }

    // normalize, then repeat and pad to match the mixed loop exactly
    pub fn stem_for_export(&self, stem: &SampleBuffer) -> Result<SampleBuffer, BufferError> {
        let normalized = stem.clone().normalize()?.to_canonical();
        Ok(normalized.repeated(self.loop_repeats).force_frames(self.expected_frames()))
    }

    pub fn silent_loop(&self) -> SampleBuffer {
        SampleBuffer::silent_frames(self.expected_frames())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::shared::{Instrument, SAMPLE_RATE};

    fn assembler(pattern_length: usize, beat_duration_ms: u64, loop_repeats: u32) -> LoopAssembler {
        LoopAssembler { pattern_length, beat_duration_ms, loop_repeats, master_volume: 100 }
    }

    fn blip_slot(ms: u64) -> SampleBuffer {
        let mut slot = SampleBuffer::silent(ms);
        slot.overlay(&SampleBuffer::mono(SAMPLE_RATE, vec![0.5; 10]), 0.0).unwrap();
        slot
    }

    #[test]
    fn loop_duration_is_length_times_beat_times_repeats() {
        for &(len, beat, repeats) in &[(8, 500, 1), (4, 333, 3), (16, 107, 10), (7, 1, 2)] {
            let asm = assembler(len, beat, repeats);
            let slots: Vec<_> = (0..len).map(|_| blip_slot(beat)).collect();
            let mix = asm.assemble(&slots);
            assert_eq!(mix.len(), asm.expected_frames());
            assert_eq!(mix.duration_ms(), len as u64 * beat * repeats as u64);
            assert!(mix.is_canonical());
        }
    }

    #[test]
    fn short_slots_are_padded_at_the_end() {
        let asm = assembler(4, 250, 2);
        let slots = vec![SampleBuffer::silent(100); 4];
        let mix = asm.assemble(&slots);
        assert_eq!(mix.duration_ms(), 2000);
    }

    #[test]
    fn master_volume_scales_the_loop() {
        let mut asm = assembler(1, 100, 1);
        let loud = asm.assemble(&[blip_slot(100)]);
        asm.master_volume = 0;
        let quiet = asm.assemble(&[blip_slot(100)]);
        let ratio = quiet.peak() / loud.peak();
        assert!((ratio - 10f32.powf(-24.0 / 20.0)).abs() < 1e-3);
    }

    #[test]
    fn exported_stems_match_the_repeated_loop() {
        // three repeats of a 4 x 333 ms pattern
        let asm = assembler(4, 333, 3);
        let slots: Vec<_> = (0..4).map(|_| blip_slot(333)).collect();
        let mix = asm.assemble(&slots);

        let mut stems: Stems = BTreeMap::new();
        let mut stem = SampleBuffer::silent_frames(0);
        for slot in &slots {
            stem.append(slot);
        }
        stems.insert(Instrument::Kick, stem);
        let stems = asm.finish_stems(stems);
        let single = &stems[&Instrument::Kick];
        assert_eq!(single.duration_ms(), 4 * 333);

        let exported = asm.stem_for_export(single).unwrap();
        assert_eq!(exported.len(), mix.len());
        assert_eq!(exported.duration_ms(), 3 * single.duration_ms());
        assert!(exported.peak() > 0.98);
    }

    #[test]
    fn every_pass_starts_where_the_stems_do() {
        // 16 x 333 ms slots floor to 234960 frames, one pass is 234964
        let asm = assembler(16, 333, 10);
        let slots: Vec<_> = (0..16).map(|_| blip_slot(333)).collect();
        let mix = asm.assemble(&slots);

        let mut stem = SampleBuffer::silent_frames(0);
        for slot in &slots {
            stem.append(slot);
        }
        assert_eq!(stem.len(), 234960);
        let stems = asm.finish_stems(BTreeMap::from([(Instrument::Kick, stem)]));
        let exported = asm.stem_for_export(&stems[&Instrument::Kick]).unwrap();
        assert_eq!(asm.pass_frames(), 234964);
        assert_eq!(exported.len(), mix.len());

        let mix = mix.mono_samples();
        let exported = exported.mono_samples();
        for k in 0..10 {
            let start = k * asm.pass_frames();
            assert!(mix[start] > 0.0, "pass {k} of the loop is misaligned");
            assert!(exported[start] > 0.0, "pass {k} of the stem is misaligned");
            if k > 0 {
                assert_eq!(mix[start - 1], 0.0);
            }
        }
    }

    #[test]
    fn broken_stem_is_reported() {
        let asm = assembler(1, 10, 1);
        let broken = SampleBuffer::mono(SAMPLE_RATE, vec![f32::NAN; 441]);
        assert!(matches!(asm.stem_for_export(&broken), Err(BufferError::NonFinite)));
    }
}
