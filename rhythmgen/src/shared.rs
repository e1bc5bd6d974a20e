// Constants and small enums every layer agrees on. The loader, the mixer,
// the note exporter and the config validator all read from here, so the
// supported lists live in exactly one place.
//
// Instrument order matters: an instrument's position in `Instrument::ALL`
// picks both its fallback tone frequency and its note number.

use std::fmt;

pub const SAMPLE_RATE: u32 = 44100;

pub const MIN_BPM: u32 = 20;
pub const MAX_BPM: u32 = 300;
pub const MIN_SWING: i32 = -50;
pub const MAX_SWING: i32 = 50;
pub const DEFAULT_VOLUME: u8 = 80;
pub const MIN_PATTERN_LENGTH: usize = 4;
pub const MAX_PATTERN_LENGTH: usize = 16;
pub const DEFAULT_PATTERN_LENGTH: usize = 8;
pub const MIN_LOOP_REPEATS: u32 = 1;
pub const MAX_LOOP_REPEATS: u32 = 10;

pub const TICKS_PER_BEAT: u16 = 480;
pub const BASE_NOTE: u8 = 36; // GM bass drum, instruments count up from here
pub const NOTE_VELOCITY: u8 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Instrument {
    Kick,
    Snare,
    Hihat,
    Bass,
    Synth,
    Guitar,
    Clap,
    Tambourine,
    Percussion,
}

impl Instrument {
    pub const ALL: [Instrument; 9] = [
        Instrument::Kick,
        Instrument::Snare,
        Instrument::Hihat,
        Instrument::Bass,
        Instrument::Synth,
        Instrument::Guitar,
        Instrument::Clap,
        Instrument::Tambourine,
        Instrument::Percussion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Instrument::Kick => "kick",
            Instrument::Snare => "snare",
            Instrument::Hihat => "hihat",
            Instrument::Bass => "bass",
            Instrument::Synth => "synth",
            Instrument::Guitar => "guitar",
            Instrument::Clap => "clap",
            Instrument::Tambourine => "tambourine",
            Instrument::Percussion => "percussion",
        }
    }

    // sample folders are plural for the drums, singular for everything else
    pub fn folder(self) -> &'static str {
        match self {
            Instrument::Kick => "kicks",
            Instrument::Snare => "snares",
            Instrument::Hihat => "hihats",
            other => other.name(),
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&i| i == self).unwrap_or(0)
    }

    pub fn note(self) -> u8 {
        BASE_NOTE + self.index() as u8
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|i| i.name().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    pub fn name(self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Medium => "medium",
            Complexity::Complex => "complex",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Some(Complexity::Simple),
            "medium" => Some(Complexity::Medium),
            "complex" => Some(Complexity::Complex),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteType {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl NoteType {
    pub fn name(self) -> &'static str {
        match self {
            NoteType::Whole => "whole",
            NoteType::Half => "half",
            NoteType::Quarter => "quarter",
            NoteType::Eighth => "eighth",
            NoteType::Sixteenth => "sixteenth",
            NoteType::ThirtySecond => "thirty-second",
        }
    }

    // length in quarter notes
    pub fn factor(self) -> f64 {
        match self {
            NoteType::Whole => 4.0,
            NoteType::Half => 2.0,
            NoteType::Quarter => 1.0,
            NoteType::Eighth => 0.5,
            NoteType::Sixteenth => 0.25,
            NoteType::ThirtySecond => 0.125,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whole" => Some(NoteType::Whole),
            "half" => Some(NoteType::Half),
            "quarter" => Some(NoteType::Quarter),
            "eighth" => Some(NoteType::Eighth),
            "sixteenth" => Some(NoteType::Sixteenth),
            "thirty-second" => Some(NoteType::ThirtySecond),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeSignature {
    FourFour,
    ThreeFour,
    SixEight,
}

impl TimeSignature {
    pub fn name(self) -> &'static str {
        match self {
            TimeSignature::FourFour => "4/4",
            TimeSignature::ThreeFour => "3/4",
            TimeSignature::SixEight => "6/8",
        }
    }

    // (numerator, denominator as a power of two), the way SMF stores it
    pub fn smf_parts(self) -> (u8, u8) {
        match self {
            TimeSignature::FourFour => (4, 2),
            TimeSignature::ThreeFour => (3, 2),
            TimeSignature::SixEight => (6, 3),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "4/4" => Some(TimeSignature::FourFour),
            "3/4" => Some(TimeSignature::ThreeFour),
            "6/8" => Some(TimeSignature::SixEight),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subdivision {
    Straight,
    Triplet,
}

impl Subdivision {
    pub fn name(self) -> &'static str {
        match self {
            Subdivision::Straight => "straight",
            Subdivision::Triplet => "triplet",
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            Subdivision::Straight => 1.0,
            Subdivision::Triplet => 2.0 / 3.0,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "straight" => Some(Subdivision::Straight),
            "triplet" => Some(Subdivision::Triplet),
            _ => None,
        }
    }
}
