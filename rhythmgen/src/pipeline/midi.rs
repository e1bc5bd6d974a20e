// Symbolic export: the hit grid as a single-track Standard MIDI File.
//
// Every hit becomes a note-on at `step * note_ticks` and a note-off one
// note later. Events from all instruments are merged by absolute tick with
// a stable sort, so delta times can never go negative.

use std::path::Path;

use anyhow::Context;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};

use super::pattern::Pattern;
use super::project::Settings;
use crate::shared::{NOTE_VELOCITY, NoteType, Subdivision, TICKS_PER_BEAT, TimeSignature};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteKind {
    On,
    Off,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteEvent {
    pub tick: u32,
    pub key: u8,
    pub velocity: u8,
    pub kind: NoteKind,
}

pub fn note_duration_ticks(ticks_per_beat: u16, note_type: NoteType, subdivision: Subdivision) -> u32 {
    (ticks_per_beat as f64 * note_type.factor() * subdivision.factor()) as u32
}

/// All note events of `pattern`, sorted by absolute tick.
pub fn build_timeline(pattern: &Pattern, note_ticks: u32) -> Vec<NoteEvent> {
    let mut events = Vec::with_capacity(pattern.hit_count() * 2);
    for (inst, row) in pattern.rows() {
        let key = inst.note();
        for (step, &hit) in row.iter().enumerate() {
            if !hit {
                continue;
            }
            let start = step as u32 * note_ticks;
            events.push(NoteEvent { tick: start, key, velocity: NOTE_VELOCITY, kind: NoteKind::On });
            events.push(NoteEvent { tick: start + note_ticks, key, velocity: 0, kind: NoteKind::Off });
        }
    }
    events.sort_by_key(|e| e.tick); // stable
    events
}

fn tempo_micros(bpm: f64) -> u32 {
    (60_000_000.0 / bpm.max(1.0)).round() as u32
}

fn track_events(timeline: &[NoteEvent], bpm: f64, time_signature: TimeSignature) -> Vec<TrackEvent<'static>> {
    let (numerator, denominator_pow) = time_signature.smf_parts();
    let mut track = Vec::with_capacity(timeline.len() + 3);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_micros(bpm)))),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, denominator_pow, 24, 8)),
    });

    let mut previous_tick = 0;
    for event in timeline {
        let message = match event.kind {
            NoteKind::On => MidiMessage::NoteOn { key: u7::new(event.key), vel: u7::new(event.velocity) },
            NoteKind::Off => MidiMessage::NoteOff { key: u7::new(event.key), vel: u7::new(0) },
        };
        track.push(TrackEvent {
            delta: u28::new(event.tick.saturating_sub(previous_tick)),
            kind: TrackEventKind::Midi { channel: u4::new(0), message },
        });
        previous_tick = event.tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

pub fn midi_bytes(pattern: &Pattern, settings: &Settings) -> anyhow::Result<Vec<u8>> {
    let note_ticks = note_duration_ticks(TICKS_PER_BEAT, settings.note_type, settings.subdivision);
    let timeline = build_timeline(pattern, note_ticks);
    let header = Header::new(Format::SingleTrack, Timing::Metrical(u15::new(TICKS_PER_BEAT)));
    let smf = Smf {
        header,
        tracks: vec![track_events(&timeline, settings.bpm, settings.time_signature)],
    };

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).context("failed to encode midi bytes")?;
    Ok(bytes)
}

pub fn write_midi(pattern: &Pattern, settings: &Settings, path: &Path) -> anyhow::Result<()> {
    let bytes = midi_bytes(pattern, settings)?;
    std::fs::write(path, bytes).with_context(|| format!("failed to write midi file: {}", path.display()))?;
    Ok(())
}
