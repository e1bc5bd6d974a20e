use std::path::{Path, PathBuf};

use thiserror::Error;

use super::frame::StereoFrame;
use crate::shared::SAMPLE_RATE;

// peak normalize stops 0.1 dB under full scale
const NORMALIZE_HEADROOM_DB: f32 = 0.1;
const I16_SCALE: f32 = i16::MAX as f32;

#[derive(Clone, Debug, PartialEq)]
pub enum Frames {
    Mono(Vec<f32>),
    Stereo(Vec<StereoFrame>), // only ever produced by panning
}

impl Frames {
    fn into_stereo(self) -> Vec<StereoFrame> {
        match self {
            Frames::Mono(d) => d.into_iter().map(StereoFrame::from_mono).collect(),
            Frames::Stereo(d) => d,
        }
    }

    fn take(&mut self) -> Frames {
        std::mem::replace(self, Frames::Mono(Vec::new()))
    }
}

/// A block of audio. Samples are floats in [-1, 1]; the canonical format
/// (mono, 44.1 kHz, 16-bit) is reached through [`SampleBuffer::to_canonical`].
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    pub sample_rate: u32,
    pub frames: Frames,
}

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("sample rate mismatch: {0} Hz vs {1} Hz")]
    RateMismatch(u32, u32),
    #[error("buffer contains non-finite samples")]
    NonFinite,
}

#[derive(Debug, Error)]
pub enum SampleLoadError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("{path} declares zero channels")]
    NoChannels { path: PathBuf },
}

/// Whole frames covering `ms` milliseconds at the canonical rate (floored).
pub fn ms_to_frames(ms: u64) -> usize {
    (ms * SAMPLE_RATE as u64 / 1000) as usize
}

pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

fn quantize(x: f32) -> f32 {
    (x.clamp(-1.0, 1.0) * I16_SCALE).round() / I16_SCALE
}

impl SampleBuffer {
    pub fn mono(sample_rate: u32, data: Vec<f32>) -> Self {
        Self { sample_rate, frames: Frames::Mono(data) }
    }

    pub fn silent(duration_ms: u64) -> Self {
        Self::silent_frames(ms_to_frames(duration_ms))
    }

    pub fn silent_frames(n: usize) -> Self {
        Self::mono(SAMPLE_RATE, vec![0.0; n])
    }

    pub fn len(&self) -> usize {
        match &self.frames {
            Frames::Mono(d) => d.len(),
            Frames::Stereo(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channels(&self) -> u16 {
        match self.frames {
            Frames::Mono(_) => 1,
            Frames::Stereo(_) => 2,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        let rate = self.sample_rate as u64;
        (self.len() as u64 * 1000 + rate / 2) / rate
    }

    pub fn is_canonical(&self) -> bool {
        self.sample_rate == SAMPLE_RATE && self.channels() == 1
    }

    pub fn peak(&self) -> f32 {
        match &self.frames {
            Frames::Mono(d) => d.iter().fold(0.0, |p, x| p.max(x.abs())),
            Frames::Stereo(d) => d.iter().fold(0.0, |p, f| p.max(f.peak())),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.peak() == 0.0
    }

    fn is_finite(&self) -> bool {
        match &self.frames {
            Frames::Mono(d) => d.iter().all(|x| x.is_finite()),
            Frames::Stereo(d) => d.iter().all(|f| f.left.is_finite() && f.right.is_finite()),
        }
    }

    pub fn to_stereo(self) -> Self {
        Self { sample_rate: self.sample_rate, frames: Frames::Stereo(self.frames.into_stereo()) }
    }

    /// Down-mix, resample and quantize into mono / 44.1 kHz / 16-bit.
    pub fn to_canonical(self) -> Self {
        let mut data = match self.frames {
            Frames::Mono(d) => d,
            Frames::Stereo(d) => d.into_iter().map(StereoFrame::to_mono).collect(),
        };
        if self.sample_rate != SAMPLE_RATE {
            data = resample_linear(&data, self.sample_rate, SAMPLE_RATE);
        }
        for x in data.iter_mut() {
            *x = quantize(*x);
        }
        Self::mono(SAMPLE_RATE, data)
    }

    /// Right-pad with silence or hard-truncate to exactly `duration_ms`.
    pub fn force_duration(self, duration_ms: u64) -> Self {
        let target = (duration_ms * self.sample_rate as u64 / 1000) as usize;
        self.force_frames(target)
    }

    pub fn force_frames(mut self, target: usize) -> Self {
        match &mut self.frames {
            Frames::Mono(d) => d.resize(target, 0.0),
            Frames::Stereo(d) => d.resize(target, StereoFrame::zero()),
        }
        self
    }

    /// Only ever grows the buffer.
    pub fn pad_to_frames(&mut self, target: usize) {
        if self.len() < target {
            let padded = std::mem::replace(self, Self::silent_frames(0)).force_frames(target);
            *self = padded;
        }
    }

    /// Shift the content later by `delay_ms`, keeping the length.
    pub fn delayed(self, delay_ms: f64) -> Self {
        let len = self.len();
        let shift = ((delay_ms.max(0.0) * self.sample_rate as f64) / 1000.0) as usize;
        if shift == 0 {
            return self;
        }
        let shift = shift.min(len);
        let frames = match self.frames {
            Frames::Mono(d) => {
                let mut out = vec![0.0; shift];
                out.extend_from_slice(&d[..len - shift]);
                Frames::Mono(out)
            }
            Frames::Stereo(d) => {
                let mut out = vec![StereoFrame::zero(); shift];
                out.extend_from_slice(&d[..len - shift]);
                Frames::Stereo(out)
            }
        };
        Self { sample_rate: self.sample_rate, frames }
    }

    pub fn apply_gain_db(&mut self, db: f32) {
        let g = db_to_gain(db);
        match &mut self.frames {
            Frames::Mono(d) => {
                for x in d.iter_mut() {
                    *x = (*x * g).clamp(-1.0, 1.0);
                }
            }
            Frames::Stereo(d) => {
                for f in d.iter_mut() {
                    f.left = (f.left * g).clamp(-1.0, 1.0);
                    f.right = (f.right * g).clamp(-1.0, 1.0);
                }
            }
        }
    }

    /// Independent left/right gain; a mono buffer is split into two channels first.
    pub fn apply_gain_stereo(self, left_db: f32, right_db: f32) -> Self {
        let mut out = self.to_stereo();
        let (gl, gr) = (db_to_gain(left_db), db_to_gain(right_db));
        if let Frames::Stereo(d) = &mut out.frames {
            for f in d.iter_mut() {
                f.left = (f.left * gl).clamp(-1.0, 1.0);
                f.right = (f.right * gr).clamp(-1.0, 1.0);
            }
        }
        out
    }

    /// Mix `other` on top of this buffer, attenuated by `gain_db`. The
    /// result keeps this buffer's length and saturates at full scale.
    pub fn overlay(&mut self, other: &SampleBuffer, gain_db: f32) -> Result<(), BufferError> {
        if self.sample_rate != other.sample_rate {
            return Err(BufferError::RateMismatch(self.sample_rate, other.sample_rate));
        }
        if !other.is_finite() {
            return Err(BufferError::NonFinite);
        }
        let g = db_to_gain(gain_db);
        match &other.frames {
            // a stereo layer turns the base stereo too
            Frames::Stereo(top) => {
                let mut base = self.frames.take().into_stereo();
                for (b, t) in base.iter_mut().zip(top) {
                    b.left = (b.left + t.left * g).clamp(-1.0, 1.0);
                    b.right = (b.right + t.right * g).clamp(-1.0, 1.0);
                }
                self.frames = Frames::Stereo(base);
            }
            Frames::Mono(top) => match &mut self.frames {
                Frames::Mono(base) => {
                    for (b, t) in base.iter_mut().zip(top) {
                        *b = (*b + t * g).clamp(-1.0, 1.0);
                    }
                }
                Frames::Stereo(base) => {
                    for (b, t) in base.iter_mut().zip(top) {
                        b.left = (b.left + t * g).clamp(-1.0, 1.0);
                        b.right = (b.right + t * g).clamp(-1.0, 1.0);
                    }
                }
            },
        }
        Ok(())
    }

    /// Scale so the loudest sample sits just under full scale. Silence is
    /// returned untouched.
    pub fn normalize(mut self) -> Result<Self, BufferError> {
        if !self.is_finite() {
            return Err(BufferError::NonFinite);
        }
        let peak = self.peak();
        if peak == 0.0 {
            return Ok(self);
        }
        let target = db_to_gain(-NORMALIZE_HEADROOM_DB);
        let scale = target / peak;
        match &mut self.frames {
            Frames::Mono(d) => d.iter_mut().for_each(|x| *x *= scale),
            Frames::Stereo(d) => d.iter_mut().for_each(|f| {
                f.left *= scale;
                f.right *= scale;
            }),
        }
        Ok(self)
    }

    pub fn append(&mut self, other: &SampleBuffer) {
        let other = if other.sample_rate != self.sample_rate {
            other.clone().resampled(self.sample_rate)
        } else {
            other.clone()
        };
        self.frames = match (self.frames.take(), other.frames) {
            (Frames::Mono(mut a), Frames::Mono(b)) => {
                a.extend(b);
                Frames::Mono(a)
            }
            (base, top) => {
                let mut a = base.into_stereo();
                a.extend(top.into_stereo());
                Frames::Stereo(a)
            }
        };
    }

    pub fn repeated(&self, times: u32) -> Self {
        let mut out = Self { sample_rate: self.sample_rate, frames: Frames::Mono(Vec::new()) };
        if self.channels() == 2 {
            out = out.to_stereo();
        }
        for _ in 0..times {
            out.append(self);
        }
        out
    }

    fn resampled(self, target_rate: u32) -> Self {
        let frames = match self.frames {
            Frames::Mono(d) => Frames::Mono(resample_linear(&d, self.sample_rate, target_rate)),
            Frames::Stereo(d) => {
                let left: Vec<f32> = d.iter().map(|f| f.left).collect();
                let right: Vec<f32> = d.iter().map(|f| f.right).collect();
                let left = resample_linear(&left, self.sample_rate, target_rate);
                let right = resample_linear(&right, self.sample_rate, target_rate);
                Frames::Stereo(
                    left.into_iter()
                        .zip(right)
                        .map(|(left, right)| StereoFrame { left, right })
                        .collect(),
                )
            }
        };
        Self { sample_rate: target_rate, frames }
    }

    pub fn mono_samples(&self) -> Vec<f32> {
        match &self.frames {
            Frames::Mono(d) => d.clone(),
            Frames::Stereo(d) => d.iter().map(|f| f.to_mono()).collect(),
        }
    }

    /// Mono samples as 16-bit integers; stereo buffers are down-mixed.
    pub fn to_i16(&self) -> Vec<i16> {
        let to_int = |x: f32| (x.clamp(-1.0, 1.0) * I16_SCALE).round() as i16;
        match &self.frames {
            Frames::Mono(d) => d.iter().map(|&x| to_int(x)).collect(),
            Frames::Stereo(d) => d.iter().map(|f| to_int(f.to_mono())).collect(),
        }
    }

    // Read any WAV hound understands, at its native rate; all channels
    // are averaged down to one.
    pub fn load_wav(path: &Path) -> Result<Self, SampleLoadError> {
        let decode = |source: hound::Error| SampleLoadError::Decode { path: path.to_path_buf(), source };
        let mut reader = hound::WavReader::open(path).map_err(decode)?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(SampleLoadError::NoChannels { path: path.to_path_buf() });
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader // float, just pass it through
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(decode)?,
            hound::SampleFormat::Int => { // int, scale into [-1, 1]
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(decode)?
            }
        };

        let channels = spec.channels as usize;
        let data = if channels == 1 {
            samples
        } else {
            samples
                .chunks_exact(channels)
                .map(|c| c.iter().sum::<f32>() / channels as f32)
                .collect()
        };
        Ok(Self::mono(spec.sample_rate, data))
    }

    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for s in self.to_i16() {
            writer.write_sample(s)?;
        }
        writer.finalize()
    }
}

pub fn resample_linear(frames: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || source_rate == 0 {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        // fractional position in the source buffer
        let src_pos = i as f64 / ratio; // ex. 3.7
        let idx = src_pos.floor() as usize; // ex. 3
        let frac = (src_pos - idx as f64) as f32; // ex. 0.7
        if idx >= frames.len().saturating_sub(1) { // edge case
            out.push(frames.last().copied().unwrap_or(0.0));
        } else {
            let a = frames[idx];
            let b = frames[idx + 1];
            out.push(a * (1.0 - frac) + b * frac);
        }
    }
    out
}
