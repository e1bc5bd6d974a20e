use super::sample_buffer::SampleBuffer;

// 0..=100 volume maps linearly onto -24..=0 dB
const DB_PER_VOLUME_STEP: f32 = 0.24;
// full pan pushes one side up and the other down by this much
const PAN_RANGE_DB: f32 = 12.0;

#[derive(Clone, Debug, PartialEq)]
pub enum EffectSpec {
    Volume { volume: u8 },
    Pan { pan: f32 },
}

impl EffectSpec {
    pub fn to_effect(&self) -> Box<dyn Effect> {
        match self {
            EffectSpec::Volume { volume } => Box::new(Volume::new(*volume)),
            EffectSpec::Pan { pan } => Box::new(Pan::new(*pan)),
        }
    }

    pub fn label(&self) -> String {
        match self {
            EffectSpec::Volume { volume } => format!("Volume({})", volume),
            EffectSpec::Pan { pan } => format!("Pan({})", pan),
        }
    }
}

pub trait Effect {
    fn process(&self, buf: SampleBuffer) -> SampleBuffer;
}

//volume
pub struct Volume {
    volume: u8,
}

impl Volume {
    pub fn new(volume: u8) -> Self {
        Self { volume: volume.min(100) }
    }

    pub fn gain_db(&self) -> f32 {
        (self.volume as f32 - 100.0) * DB_PER_VOLUME_STEP
    }
}

impl Effect for Volume {
    fn process(&self, mut buf: SampleBuffer) -> SampleBuffer {
        if self.volume == 100 {
            return buf;
        }
        buf.apply_gain_db(self.gain_db());
        buf
    }
}

//pan
pub struct Pan {
    pan: f32,
}

impl Pan {
    pub fn new(pan: f32) -> Self {
        Self { pan: pan.clamp(-1.0, 1.0) }
    }
}

impl Effect for Pan {
    fn process(&self, buf: SampleBuffer) -> SampleBuffer {
        if self.pan == 0.0 { // centered stays mono
            return buf;
        }
        buf.apply_gain_stereo(-self.pan * PAN_RANGE_DB, self.pan * PAN_RANGE_DB)
    }
}

pub fn apply_volume(buf: SampleBuffer, volume: u8) -> SampleBuffer {
    Volume::new(volume).process(buf)
}

/// Per-instrument effects, always run as volume then pan.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectChain {
    specs: Vec<EffectSpec>,
}

impl EffectChain {
    pub fn new(volume: u8, pan: f32) -> Self {
        Self {
            specs: vec![EffectSpec::Volume { volume }, EffectSpec::Pan { pan }],
        }
    }

    pub fn process(&self, buf: SampleBuffer) -> SampleBuffer {
        self.specs
            .iter()
            .fold(buf, |b, spec| spec.to_effect().process(b))
    }

    pub fn labels(&self) -> Vec<String> {
        self.specs.iter().map(EffectSpec::label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sample_buffer::{Frames, db_to_gain};
    use crate::shared::SAMPLE_RATE;

    fn half_scale() -> SampleBuffer {
        SampleBuffer::mono(SAMPLE_RATE, vec![0.5, -0.25, 0.125])
    }

    #[test]
    fn full_volume_is_identity() {
        assert_eq!(apply_volume(half_scale(), 100), half_scale());
    }

    #[test]
    fn zero_volume_is_minus_24_db() {
        let out = apply_volume(half_scale(), 0);
        assert!((out.peak() - 0.5 * db_to_gain(-24.0)).abs() < 1e-6);
        assert!((Volume::new(0).gain_db() + 24.0).abs() < 1e-6);
        assert!((Volume::new(50).gain_db() + 12.0).abs() < 1e-6);
    }

    #[test]
    fn centered_pan_stays_mono() {
        let out = Pan::new(0.0).process(half_scale());
        assert_eq!(out.channels(), 1);
        assert_eq!(out, half_scale());
    }

    #[test]
    fn hard_right_pan_splits_channels() {
        let out = Pan::new(1.0).process(SampleBuffer::mono(SAMPLE_RATE, vec![0.1]));
        let Frames::Stereo(frames) = &out.frames else {
            panic!("expected stereo");
        };
        assert!((frames[0].left - 0.1 * db_to_gain(-12.0)).abs() < 1e-6);
        assert!((frames[0].right - 0.1 * db_to_gain(12.0)).abs() < 1e-6);
    }

    #[test]
    fn chain_runs_volume_before_pan() {
        let chain = EffectChain::new(0, -0.5);
        assert_eq!(chain.labels(), vec!["Volume(0)", "Pan(-0.5)"]);
        let out = chain.process(SampleBuffer::mono(SAMPLE_RATE, vec![0.5]));
        let Frames::Stereo(frames) = &out.frames else {
            panic!("expected stereo");
        };
        let expected_left = 0.5 * db_to_gain(-24.0) * db_to_gain(6.0);
        assert!((frames[0].left - expected_left).abs() < 1e-6);
    }
}
