// What the host can do, probed once at startup and handed down by
// reference. Nothing else in the crate goes looking for devices or tools.

use std::process::{Command, Stdio};

use cpal::traits::HostTrait;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub playback: bool,
    pub mp3_encoder: bool,
    pub synthetic_tones: bool,
    pub midi_export: bool,
}

impl Capabilities {
    pub fn probe() -> Self {
        let playback = cpal::default_host().default_output_device().is_some();
        if !playback {
            warn!("no audio output device, previews disabled");
        }
        let mp3_encoder = ffmpeg_available();
        if !mp3_encoder {
            debug!("ffmpeg not found, mp3 export will fall back to wav");
        }
        Self {
            playback,
            mp3_encoder,
            synthetic_tones: true,
            midi_export: true,
        }
    }

    // no devices, no external tools
    pub fn offline() -> Self {
        Self {
            playback: false,
            mp3_encoder: false,
            synthetic_tones: true,
            midi_export: true,
        }
    }
}

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
