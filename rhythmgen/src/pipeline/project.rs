// Generation parameters in two shapes: `GenerationConfig` is what users
// write (loose, stringly typed, serde), `Settings` is what the engine runs
// on (typed, every value in range). `validate` is the only bridge, and it
// never fails: bad values are corrected and logged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::style::Style;
use crate::audio::EffectChain;
use crate::shared::{
    Complexity, DEFAULT_PATTERN_LENGTH, DEFAULT_VOLUME, Instrument, MAX_BPM, MAX_LOOP_REPEATS,
    MAX_PATTERN_LENGTH, MAX_SWING, MIN_BPM, MIN_LOOP_REPEATS, MIN_PATTERN_LENGTH, MIN_SWING,
    NoteType, Subdivision, TimeSignature,
};

const DEFAULT_PROJECT_NAME: &str = "quantum_love";
const FORBIDDEN_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub style: String,
    pub instruments: Vec<String>,
    pub bpm: f64,
    pub note_type: String,
    pub swing: f64,
    pub complexity: String,
    pub volumes: BTreeMap<String, f64>,
    pub pattern_length: i64,
    pub time_signature: String,
    pub subdivision: String,
    pub fill_frequency: f64,
    pub master_volume: f64,
    pub pan_settings: BTreeMap<String, f64>,
    pub loop_repeats: i64,
    pub project_name: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let table = |v: &[(&str, f64)]| {
            v.iter()
                .map(|(k, x)| (k.to_string(), *x))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            style: "pop".into(),
            instruments: names(&["kick", "snare", "hihat", "percussion"]),
            bpm: 120.0,
            note_type: "quarter".into(),
            swing: 0.0,
            complexity: "medium".into(),
            volumes: table(&[("kick", 90.0), ("snare", 80.0), ("hihat", 70.0), ("percussion", 75.0)]),
            pattern_length: DEFAULT_PATTERN_LENGTH as i64,
            time_signature: "4/4".into(),
            subdivision: "straight".into(),
            fill_frequency: 0.2,
            master_volume: 100.0,
            pan_settings: table(&[("kick", 0.0), ("snare", 0.3), ("hihat", -0.3), ("percussion", 0.1)]),
            loop_repeats: 1,
            project_name: DEFAULT_PROJECT_NAME.into(),
        }
    }
}

/// Validated, typed parameters for one generation run.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub style: &'static Style,
    pub instruments: Vec<Instrument>,
    pub bpm: f64,
    pub note_type: NoteType,
    pub swing: f64,
    pub complexity: Complexity,
    pub pattern_length: usize,
    pub time_signature: TimeSignature,
    pub subdivision: Subdivision,
    pub fill_frequency: f64,
    pub master_volume: u8,
    pub volumes: BTreeMap<Instrument, u8>,
    pub pans: BTreeMap<Instrument, f32>,
    pub loop_repeats: u32,
    pub project_name: String,
}

impl Settings {
    pub fn beat_duration_ms(&self) -> u64 {
        let mut ms = (60000.0 / self.bpm * self.note_type.factor()).trunc();
        if self.subdivision == Subdivision::Triplet {
            ms = (ms * 2.0 / 3.0).trunc();
        }
        ms as u64
    }

    pub fn volume(&self, instrument: Instrument) -> u8 {
        self.volumes.get(&instrument).copied().unwrap_or(DEFAULT_VOLUME)
    }

    pub fn pan(&self, instrument: Instrument) -> f32 {
        self.pans.get(&instrument).copied().unwrap_or(0.0)
    }

    pub fn effect_chain(&self, instrument: Instrument) -> EffectChain {
        EffectChain::new(self.volume(instrument), self.pan(instrument))
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Settings {
        let style = Style::by_name(&self.style).unwrap_or_else(|| {
            warn!(
                "invalid style '{}' (available: {}), defaulting to '{}'",
                self.style,
                Style::names().join(", "),
                Style::default_style().name
            );
            Style::default_style()
        });

        let bpm = if (MIN_BPM as f64..=MAX_BPM as f64).contains(&self.bpm) {
            self.bpm
        } else {
            warn!("BPM {} out of range, setting to {}", self.bpm, style.bpm);
            style.bpm as f64
        };

        let note_type = NoteType::parse(&self.note_type).unwrap_or_else(|| {
            warn!("invalid note type '{}', defaulting to 'quarter'", self.note_type);
            NoteType::Quarter
        });

        let swing = if (MIN_SWING as f64..=MAX_SWING as f64).contains(&self.swing) {
            self.swing
        } else {
            warn!("swing {}% out of range, setting to 0", self.swing);
            0.0
        };

        let complexity = Complexity::parse(&self.complexity).unwrap_or_else(|| {
            warn!("invalid complexity '{}', defaulting to 'medium'", self.complexity);
            Complexity::Medium
        });

        let pattern_length = match usize::try_from(self.pattern_length) {
            Ok(n) if (MIN_PATTERN_LENGTH..=MAX_PATTERN_LENGTH).contains(&n) => n,
            _ => {
                warn!("pattern length {} out of range, setting to {}", self.pattern_length, DEFAULT_PATTERN_LENGTH);
                DEFAULT_PATTERN_LENGTH
            }
        };

        let time_signature = TimeSignature::parse(&self.time_signature).unwrap_or_else(|| {
            warn!("invalid time signature '{}', defaulting to '4/4'", self.time_signature);
            TimeSignature::FourFour
        });

        let subdivision = Subdivision::parse(&self.subdivision).unwrap_or_else(|| {
            warn!("invalid subdivision '{}', defaulting to 'straight'", self.subdivision);
            Subdivision::Straight
        });

        let fill_frequency = clamp_logged("fill frequency", self.fill_frequency, 0.0, 1.0);
        let master_volume = clamp_logged("master volume", self.master_volume, 0.0, 100.0).round() as u8;

        let repeats = (self.loop_repeats.clamp(MIN_LOOP_REPEATS as i64, MAX_LOOP_REPEATS as i64)) as u32;
        if repeats as i64 != self.loop_repeats {
            warn!("loop repeats {} out of range, clamped to {}", self.loop_repeats, repeats);
        }

        let project_name = if self.project_name.trim().is_empty() || self.project_name.contains(FORBIDDEN_NAME_CHARS) {
            warn!("invalid project name '{}', using '{}'", self.project_name, DEFAULT_PROJECT_NAME);
            DEFAULT_PROJECT_NAME.to_string()
        } else {
            self.project_name.trim().to_string()
        };

        let (instruments, volumes, pans) = self.validate_instruments();

        Settings {
            style,
            instruments,
            bpm,
            note_type,
            swing,
            complexity,
            pattern_length,
            time_signature,
            subdivision,
            fill_frequency,
            master_volume,
            volumes,
            pans,
            loop_repeats: repeats,
            project_name,
        }
    }

    fn validate_instruments(&self) -> (Vec<Instrument>, BTreeMap<Instrument, u8>, BTreeMap<Instrument, f32>) {
        let mut instruments = Vec::new();
        for name in &self.instruments {
            match Instrument::parse(name) {
                Some(inst) if !instruments.contains(&inst) => instruments.push(inst),
                Some(_) => {} // duplicate
                None => warn!("unknown instrument '{}', dropping it", name),
            }
        }

        if instruments.is_empty() {
            warn!("no valid instruments, using default: kick, snare");
            let fallback = vec![Instrument::Kick, Instrument::Snare];
            let volumes = fallback.iter().map(|&i| (i, DEFAULT_VOLUME)).collect();
            let pans = fallback.iter().map(|&i| (i, 0.0)).collect();
            return (fallback, volumes, pans);
        }

        let lookup = |table: &BTreeMap<String, f64>, inst: Instrument| {
            table
                .iter()
                .find(|(k, _)| Instrument::parse(k) == Some(inst))
                .map(|(_, v)| *v)
        };
        let mut volumes = BTreeMap::new();
        let mut pans = BTreeMap::new();
        for &inst in &instruments {
            let volume = lookup(&self.volumes, inst).unwrap_or(DEFAULT_VOLUME as f64);
            let label = format!("{} volume", inst);
            volumes.insert(inst, clamp_logged(&label, volume, 0.0, 100.0).round() as u8);

            let pan = lookup(&self.pan_settings, inst).unwrap_or(0.0);
            let label = format!("{} pan", inst);
            pans.insert(inst, clamp_logged(&label, pan, -1.0, 1.0) as f32);
        }
        (instruments, volumes, pans)
    }
}

fn clamp_logged(what: &str, value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        warn!("{} is not a number, using {}", what, min);
        return min;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!("{} {} out of range, clamped to {}", what, value, clamped);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        let settings = GenerationConfig::default().validate();
        assert_eq!(settings.style.name, "pop");
        assert_eq!(settings.instruments.len(), 4);
        assert_eq!(settings.volume(Instrument::Kick), 90);
        assert_eq!(settings.pan(Instrument::Hihat), -0.3);
        assert_eq!(settings.beat_duration_ms(), 500);
        assert_eq!(settings.pattern_length, 8);
    }

    #[test]
    fn out_of_range_bpm_uses_style_tempo() {
        let config = GenerationConfig { style: "lofi".into(), bpm: 1000.0, ..Default::default() };
        let settings = config.validate();
        assert_eq!(settings.bpm, 70.0);
        assert_eq!(settings.beat_duration_ms(), 857);
    }

    #[test]
    fn unknown_style_falls_back_to_pop_tempo() {
        let config = GenerationConfig { style: "polka".into(), bpm: 5.0, ..Default::default() };
        let settings = config.validate();
        assert_eq!(settings.style.name, "pop");
        assert_eq!(settings.bpm, 120.0);
    }

    #[test]
    fn bad_values_are_corrected() {
        let config = GenerationConfig {
            note_type: "breve".into(),
            swing: 80.0,
            complexity: "insane".into(),
            pattern_length: 32,
            time_signature: "7/8".into(),
            subdivision: "dotted".into(),
            fill_frequency: 3.0,
            master_volume: 140.0,
            loop_repeats: 25,
            project_name: "bad/name".into(),
            ..Default::default()
        };
        let s = config.validate();
        assert_eq!(s.note_type, NoteType::Quarter);
        assert_eq!(s.swing, 0.0);
        assert_eq!(s.complexity, Complexity::Medium);
        assert_eq!(s.pattern_length, 8);
        assert_eq!(s.time_signature, TimeSignature::FourFour);
        assert_eq!(s.subdivision, Subdivision::Straight);
        assert_eq!(s.fill_frequency, 1.0);
        assert_eq!(s.master_volume, 100);
        assert_eq!(s.loop_repeats, 10);
        assert_eq!(s.project_name, "quantum_love");
    }

    #[test]
    fn zero_repeats_clamp_to_one() {
        let s = GenerationConfig { loop_repeats: 0, ..Default::default() }.validate();
        assert_eq!(s.loop_repeats, 1);
    }

    #[test]
    fn no_valid_instruments_means_kick_and_snare() {
        let config = GenerationConfig {
            instruments: vec!["cowbell".into(), "theremin".into()],
            ..Default::default()
        };
        let s = config.validate();
        assert_eq!(s.instruments, vec![Instrument::Kick, Instrument::Snare]);
        assert_eq!(s.volume(Instrument::Kick), DEFAULT_VOLUME);
        assert_eq!(s.pan(Instrument::Snare), 0.0);
    }

    #[test]
    fn unspecified_instrument_settings_get_defaults() {
        let config = GenerationConfig {
            instruments: vec!["bass".into(), "Kick".into(), "bass".into()],
            pan_settings: BTreeMap::from([("bass".to_string(), -4.0)]),
            ..Default::default()
        };
        let s = config.validate();
        assert_eq!(s.instruments, vec![Instrument::Bass, Instrument::Kick]);
        assert_eq!(s.volume(Instrument::Bass), DEFAULT_VOLUME);
        assert_eq!(s.pan(Instrument::Bass), -1.0);
        assert_eq!(s.volume(Instrument::Kick), 90);
    }

    #[test]
    fn triplets_shorten_the_beat() {
        let config = GenerationConfig {
            bpm: 100.0,
            note_type: "eighth".into(),
            subdivision: "triplet".into(),
            ..Default::default()
        };
        // 600 * 0.5 = 300, then 300 * 2/3
        assert_eq!(config.validate().beat_duration_ms(), 200);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: GenerationConfig = serde_json::from_str(r#"{"style": "edm", "bpm": 140}"#).unwrap();
        assert_eq!(config.style, "edm");
        assert_eq!(config.bpm, 140.0);
        assert_eq!(config.project_name, "quantum_love");
        assert_eq!(config.instruments.len(), 4);
    }
}
