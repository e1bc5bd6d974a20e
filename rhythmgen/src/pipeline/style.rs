// Built-in style templates. A style is a starting point only: tempo,
// swing and complexity can all be overridden by the generation config,
// and the base patterns get reshaped by the complexity policy.

use crate::shared::{Complexity, Instrument, TimeSignature};

#[derive(Debug, PartialEq)]
pub struct Style {
    pub name: &'static str,
    pub bpm: u32,
    pub swing: i32,
    pub complexity: Complexity,
    pub time_signature: TimeSignature,
    patterns: &'static [(Instrument, [u8; 8])],
}

impl Style {
    pub fn by_name(name: &str) -> Option<&'static Style> {
        let name = name.trim();
        STYLES.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn default_style() -> &'static Style {
        &STYLES[DEFAULT_STYLE]
    }

    pub fn names() -> Vec<&'static str> {
        STYLES.iter().map(|s| s.name).collect()
    }

    // instruments the style doesn't mention just rest
    pub fn base_pattern(&self, instrument: Instrument) -> Vec<bool> {
        self.patterns
            .iter()
            .find(|(inst, _)| *inst == instrument)
            .map(|(_, steps)| steps.iter().map(|&s| s != 0).collect())
            .unwrap_or_else(|| vec![false; 8])
    }
}

use Instrument::*;

const DEFAULT_STYLE: usize = 3; // pop

pub static STYLES: [Style; 4] = [
    Style {
        name: "hiphop",
        bpm: 85,
        swing: 20,
        complexity: Complexity::Medium,
        time_signature: TimeSignature::FourFour,
        patterns: &[
            (Kick, [1, 0, 1, 0, 1, 0, 1, 0]),
            (Snare, [0, 0, 0, 0, 1, 0, 0, 0]),
            (Hihat, [1, 1, 1, 1, 1, 1, 1, 1]),
            (Bass, [1, 0, 0, 0, 1, 0, 0, 0]),
            (Synth, [0, 1, 0, 1, 0, 1, 0, 1]),
            (Guitar, [0, 0, 1, 0, 0, 0, 1, 0]),
            (Percussion, [0, 0, 0, 1, 0, 0, 0, 1]),
        ],
    },
    Style {
        name: "lofi",
        bpm: 70,
        swing: 10,
        complexity: Complexity::Simple,
        time_signature: TimeSignature::FourFour,
        patterns: &[
            (Kick, [1, 0, 0, 0, 1, 0, 0, 0]),
            (Snare, [0, 0, 0, 0, 1, 0, 0, 0]),
            (Hihat, [1, 0, 1, 0, 1, 0, 1, 0]),
            (Bass, [1, 0, 0, 0, 0, 0, 0, 0]),
            (Synth, [1, 0, 1, 0, 1, 0, 1, 0]),
            (Guitar, [0, 0, 0, 0, 1, 0, 0, 0]),
            (Percussion, [0, 0, 0, 1, 0, 0, 0, 0]),
        ],
    },
    Style {
        name: "edm",
        bpm: 128,
        swing: 0,
        complexity: Complexity::Complex,
        time_signature: TimeSignature::FourFour,
        patterns: &[
            (Kick, [1, 0, 1, 0, 1, 0, 1, 0]),
            (Snare, [0, 0, 0, 0, 1, 0, 0, 0]),
            (Hihat, [1, 1, 1, 1, 1, 1, 1, 1]),
            (Bass, [1, 1, 1, 1, 1, 1, 1, 1]),
            (Synth, [1, 0, 0, 0, 1, 0, 0, 0]),
            (Guitar, [0, 0, 0, 0, 0, 0, 0, 0]),
            (Percussion, [0, 0, 0, 0, 0, 0, 0, 1]),
        ],
    },
    Style {
        name: "pop",
        bpm: 120,
        swing: 5,
        complexity: Complexity::Medium,
        time_signature: TimeSignature::FourFour,
        patterns: &[
            (Kick, [1, 0, 1, 0, 1, 0, 1, 0]),
            (Snare, [0, 0, 0, 0, 1, 0, 0, 0]),
            (Hihat, [1, 1, 1, 1, 1, 1, 1, 1]),
            (Bass, [1, 0, 0, 0, 1, 0, 0, 0]),
            (Synth, [1, 0, 1, 0, 1, 0, 1, 0]),
            (Guitar, [0, 1, 0, 1, 0, 1, 0, 1]),
            (Percussion, [0, 0, 0, 1, 0, 0, 0, 1]),
        ],
    },
];
