// Turns a style's base patterns into the hit grid for one run.
//
// The complexity policy decides how far each row strays from the base:
//   simple  - ignore the base, ~30% density
//   medium  - keep 70% of the base, anchor the downbeat and the midpoint
//   complex - keep 50% of the base, then inject fills counting back from the end
// Whatever the policy, step 0 always hits.

use rand::Rng;

use super::project::Settings;
use crate::shared::{Complexity, Instrument};

const SIMPLE_DENSITY: f64 = 0.3;
const MEDIUM_KEEP: f64 = 0.7;
const COMPLEX_KEEP: f64 = 0.5;

/// Repeat `base` cyclically (or cut it) to exactly `length` steps.
pub fn extend_base_pattern(base: &[bool], length: usize) -> Vec<bool> {
    if base.is_empty() {
        return vec![false; length];
    }
    base.iter().copied().cycle().take(length).collect()
}

pub fn generate_row<R: Rng + ?Sized>(
    rng: &mut R,
    complexity: Complexity,
    length: usize,
    base: &[bool],
    fill_frequency: f64,
) -> Vec<bool> {
    if length == 0 {
        return Vec::new();
    }
    let base = extend_base_pattern(base, length);
    let mut row: Vec<bool> = match complexity {
        Complexity::Simple => (0..length).map(|_| rng.random_bool(SIMPLE_DENSITY)).collect(),
        Complexity::Medium => {
            let mut row = mutate(rng, &base, MEDIUM_KEEP);
            row[length / 2] = true;
            row
        }
        Complexity::Complex => {
            let mut row = mutate(rng, &base, COMPLEX_KEEP);
            if let Some(stride) = fill_stride(fill_frequency) {
                for i in (1..length).rev().step_by(stride) {
                    row[i] = true;
                }
            }
            row
        }
    };
    row[0] = true; // audible downbeat no matter what
    row
}

// keep each base step with probability `keep`, otherwise flip a coin
fn mutate<R: Rng + ?Sized>(rng: &mut R, base: &[bool], keep: f64) -> Vec<bool> {
    base.iter()
        .map(|&step| if rng.random_bool(keep) { step } else { rng.random_bool(0.5) })
        .collect()
}

// no fills at all for a zero frequency
fn fill_stride(fill_frequency: f64) -> Option<usize> {
    if fill_frequency.is_nan() || fill_frequency <= 0.0 {
        return None;
    }
    Some(((1.0 / fill_frequency.min(1.0)).floor() as usize).max(1))
}

/// Hit rows for every selected instrument, in selection order.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    length: usize,
    rows: Vec<(Instrument, Vec<bool>)>,
}

impl Pattern {
    pub fn generate<R: Rng + ?Sized>(settings: &Settings, rng: &mut R) -> Self {
        let rows = settings
            .instruments
            .iter()
            .map(|&inst| {
                let base = settings.style.base_pattern(inst);
                let row = generate_row(&mut *rng, settings.complexity, settings.pattern_length, &base, settings.fill_frequency);
                (inst, row)
            })
            .collect();
        Self { length: settings.pattern_length, rows }
    }

    pub fn from_rows(length: usize, rows: Vec<(Instrument, Vec<bool>)>) -> Self {
        Self { length, rows }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn rows(&self) -> &[(Instrument, Vec<bool>)] {
        &self.rows
    }

    pub fn row(&self, instrument: Instrument) -> Option<&[bool]> {
        self.rows
            .iter()
            .find(|(inst, _)| *inst == instrument)
            .map(|(_, row)| row.as_slice())
    }

    pub fn is_hit(&self, instrument: Instrument, step: usize) -> bool {
        self.row(instrument)
            .and_then(|row| row.get(step).copied())
            .unwrap_or(false)
    }

    pub fn hit_count(&self) -> usize {
        self.rows.iter().map(|(_, row)| row.iter().filter(|&&h| h).count()).sum()
    }
}
