use super::sample_buffer::{SampleBuffer, ms_to_frames};
use crate::shared::{Instrument, SAMPLE_RATE};

const BASE_FREQ: f32 = 200.0;
const FREQ_STEP: f32 = 100.0; // per position in the instrument list
const AMPLITUDE: f32 = 0.5;
pub const TONE_DURATION_MS: u64 = 200;

// each instrument gets its own pitch so fallback tones stay tellable apart
pub fn tone_frequency(instrument: Instrument) -> f32 {
    BASE_FREQ + FREQ_STEP * instrument.index() as f32
}

/// Plain sine, already in canonical format.
pub fn synthetic_tone(freq: f32, duration_ms: u64) -> SampleBuffer {
    let n = ms_to_frames(duration_ms);
    // radians per sample
    let phase_inc = (std::f32::consts::TAU * freq) / SAMPLE_RATE as f32;
    let mut phase = 0.0f32;
    let mut data = Vec::with_capacity(n);
    for _ in 0..n {
        data.push(AMPLITUDE * phase.sin());
        phase += phase_inc;
        if phase > std::f32::consts::TAU {
            phase -= std::f32::consts::TAU;
        }
    }
    SampleBuffer::mono(SAMPLE_RATE, data).to_canonical()
}

pub fn instrument_tone(instrument: Instrument) -> SampleBuffer {
    synthetic_tone(tone_frequency(instrument), TONE_DURATION_MS)
}
