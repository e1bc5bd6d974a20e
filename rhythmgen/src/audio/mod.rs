use std::time::Duration;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::RecvTimeoutError;
use tracing::{error, info, warn};

mod effect;
mod frame;
pub mod mixer;
mod sample_buffer;
pub mod tone;

pub use effect::{apply_volume, EffectChain};
pub use sample_buffer::{ms_to_frames, resample_linear, BufferError, SampleBuffer};

pub const BEAT_PREVIEW_TIMEOUT: Duration = Duration::from_secs(2);
pub const LOOP_PLAYBACK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    TimedOut, // stopped early once the wait ran out
}

/// Something that can audition a buffer. Blocks until the buffer finished
/// or `timeout` passed, whichever comes first.
pub trait Playback {
    fn play(&self, buf: &SampleBuffer, timeout: Duration) -> anyhow::Result<PlaybackOutcome>;
}

/// Best-effort wrapper: playback problems are logged and swallowed.
pub fn preview(playback: &dyn Playback, buf: &SampleBuffer, timeout: Duration) {
    if buf.is_empty() {
        warn!("empty audio buffer, skipping preview");
        return;
    }
    info!("playing preview (duration: {}ms)", buf.duration_ms());
    match playback.play(buf, timeout) {
        Ok(PlaybackOutcome::Completed) => info!("preview completed"),
        Ok(PlaybackOutcome::TimedOut) => warn!("preview timed out"),
        Err(e) => error!("preview failed: {:#}", e),
    }
}

// Feeds mono samples into interleaved device buffers. Reports drained only
// on the first callback that starts past the end, so the buffer holding
// the last samples has been handed to the device before the stream drops.
struct OutputCursor {
    data: Vec<f32>,
    pos: usize,
}

impl OutputCursor {
    fn new(data: Vec<f32>) -> Self {
        Self { data, pos: 0 }
    }

    fn fill(&mut self, out: &mut [f32], channels: usize) -> bool {
        let drained = self.pos >= self.data.len();
        for frame in out.chunks_mut(channels.max(1)) {
            frame.fill(self.data.get(self.pos).copied().unwrap_or(0.0)); // mono onto every channel
            self.pos = (self.pos + 1).min(self.data.len());
        }
        drained
    }
}

// Plays through the default output device, opened fresh per call.
pub struct CpalPlayback;

impl Playback for CpalPlayback {
    fn play(&self, buf: &SampleBuffer, timeout: Duration) -> anyhow::Result<PlaybackOutcome> {
        let host = cpal::default_host();
        let device = host.default_output_device().context("no default output device")?;
        let config = device.default_output_config().context("no default output config")?;
        if config.sample_format() != cpal::SampleFormat::F32 {
            anyhow::bail!("unsupported sample format (only f32 supported for now)");
        }

        let device_rate: u32 = config.sample_rate();
        let channels = config.channels() as usize;
        let canonical = buf.clone().to_canonical();
        let data = resample_linear(&canonical.mono_samples(), canonical.sample_rate, device_rate);

        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        let mut cursor = OutputCursor::new(data);
        let err_fn = |err| error!("audio output stream error: {err}");
        let stream = device.build_output_stream(
            &config.into(),
            move |out: &mut [f32], _info| {
                if cursor.fill(out, channels) {
                    let _ = done_tx.try_send(());
                }
            },
            err_fn,
            None,
        )?;
        stream.play().context("failed to play output stream")?;

        let outcome = match done_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => PlaybackOutcome::Completed,
            Err(RecvTimeoutError::Timeout) => PlaybackOutcome::TimedOut,
        };
        drop(stream); // dropping the stream is what stops it
        Ok(outcome)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingPlayback;
    use super::*;

    #[test]
    fn preview_swallows_failures() {
        let broken = RecordingPlayback { fail: true, ..Default::default() };
        preview(&broken, &SampleBuffer::silent(100), BEAT_PREVIEW_TIMEOUT);
        assert!(broken.played.borrow().is_empty());
    }

    #[test]
    fn preview_skips_empty_buffers() {
        let rec = RecordingPlayback::default();
        preview(&rec, &SampleBuffer::silent_frames(0), BEAT_PREVIEW_TIMEOUT);
        preview(&rec, &SampleBuffer::silent(250), BEAT_PREVIEW_TIMEOUT);
        assert_eq!(*rec.played.borrow(), vec![250]);
    }

    #[test]
    fn cursor_waits_one_callback_past_the_end() {
        let mut cursor = OutputCursor::new(vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        let mut out = [9.0f32; 8]; // 4 stereo frames

        assert!(!cursor.fill(&mut out, 2));
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2, 0.3, 0.3, 0.4, 0.4]);

        // last sample goes out here, the device still has to play it
        assert!(!cursor.fill(&mut out, 2));
        assert_eq!(out, [0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        assert!(cursor.fill(&mut out, 2));
        assert_eq!(out, [0.0; 8]);
    }

    #[test]
    fn cursor_on_empty_data_is_drained_at_once() {
        let mut cursor = OutputCursor::new(Vec::new());
        let mut out = [1.0f32; 4];
        assert!(cursor.fill(&mut out, 1));
        assert_eq!(out, [0.0; 4]);
    }
}
