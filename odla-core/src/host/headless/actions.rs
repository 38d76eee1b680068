use std::collections::BTreeMap;

use log::debug;

use odla_types::ViewState;

use super::score::{diatonic_neighbour, ChordRest};
use super::{ElementRef, HeadlessHost, Picked};
use crate::host::{ActionRegistry, Document, View};

const CHECKABLE: [&str; 2] = ["play", "metronome"];

const PLAIN: [&str; 33] = [
    "stop",
    "next-chord",
    "prev-chord",
    "next-measure",
    "prev-measure",
    "play-next-chord",
    "play-prev-chord",
    "play-next-measure",
    "play-prev-measure",
    "up-chord",
    "down-chord",
    "string-above",
    "string-below",
    "add-slur",
    "escape",
    "note-input",
    "undo",
    "redo",
    "copy",
    "paste",
    "delete",
    "time-delete",
    "up-diatonic",
    "down-diatonic",
    "pitch-up-octave",
    "pitch-down-octave",
    "voice-1",
    "voice-2",
    "voice-3",
    "voice-4",
    "interval1",
    "interval2",
    "interval3",
];

/// Entries kept in the triggered-action log.
pub const TRIGGER_LOG_LEN: usize = 256;

/// Registered action names, the checked state of checkable ones and a log
/// of the most recently triggered.
#[derive(Debug, Clone)]
pub struct ActionTable {
    /// `Some(checked)` for checkable actions.
    entries: BTreeMap<String, Option<bool>>,
    triggered: Vec<String>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            triggered: Vec::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, checkable: bool) {
        self.entries.insert(name.into(), checkable.then_some(false));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_checked(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(Some(true)))
    }

    /// The last `TRIGGER_LOG_LEN` actions triggered, oldest first.
    pub fn triggered(&self) -> &[String] {
        &self.triggered
    }

    fn record(&mut self, name: &str) {
        if self.triggered.len() >= TRIGGER_LOG_LEN {
            self.triggered.remove(0);
        }
        self.triggered.push(name.to_string());
    }

    fn set(&mut self, name: &str, checked: bool) -> bool {
        match self.entries.get_mut(name) {
            Some(Some(state)) => {
                *state = checked;
                true
            }
            Some(None) => true,
            None => false,
        }
    }

    fn toggle(&mut self, name: &str) {
        let checked = self.is_checked(name);
        self.set(name, !checked);
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        let mut table = Self::new();
        for name in CHECKABLE {
            table.register(name, true);
        }
        for name in PLAIN {
            table.register(name, false);
        }
        for n in 4..=9 {
            table.register(format!("interval{}", n), false);
        }
        table
    }
}

impl HeadlessHost {
    /// Slot and note index of the selected note or chord.
    fn selected_slot(&self) -> Option<(usize, usize, usize, Option<usize>)> {
        match self.picked {
            Picked::Single(ElementRef::ChordRest { measure, staff, beat }) => Some((measure, staff, beat, None)),
            Picked::Single(ElementRef::Note {
                measure,
                staff,
                beat,
                note,
            }) => Some((measure, staff, beat, Some(note))),
            _ => None,
        }
    }

    /// Repitch the selected notes, keeping each chord sorted.
    fn transpose_selected(&mut self, shift: impl Fn(u8) -> Option<u8>) -> bool {
        let Some((measure, staff, beat, only)) = self.selected_slot() else {
            return false;
        };
        let Some(cr) = self.score.slot_mut(measure, staff, beat) else {
            return false;
        };
        let mut moved = None;
        for (i, n) in cr.notes.iter_mut().enumerate() {
            if only.map_or(true, |o| o == i) {
                if let Some(p) = shift(n.pitch) {
                    n.pitch = p;
                    moved = Some(p);
                }
            }
        }
        cr.notes.sort_by_key(|n| n.pitch);
        cr.notes.dedup_by_key(|n| n.pitch);
        if let (Some(_), Some(pitch)) = (only, moved) {
            let note = cr.notes.iter().position(|n| n.pitch == pitch).unwrap_or(0);
            self.picked = Picked::Single(ElementRef::Note {
                measure,
                staff,
                beat,
                note,
            });
        }
        moved.is_some()
    }

    fn edit<F: FnOnce(&mut Self) -> bool>(&mut self, f: F) -> bool {
        self.start_cmd();
        let done = f(self);
        self.end_cmd();
        done
    }

    fn delete_selected(&mut self) -> bool {
        let Some((measure, staff, beat, _)) = self.selected_slot() else {
            return false;
        };
        let Some(cr) = self.score.slot_mut(measure, staff, beat) else {
            return false;
        };
        let voice = cr.voice;
        *cr = ChordRest::rest(cr.duration);
        cr.voice = voice;
        self.picked = Picked::Single(ElementRef::ChordRest { measure, staff, beat });
        true
    }

    fn add_interval(&mut self, interval: i32) -> bool {
        let Some((measure, staff, beat, Some(note))) = self.selected_slot() else {
            return false;
        };
        let key = self.score.key_at(staff, self.score.beat_tick(measure, beat));
        let Some(base) = self.score.slot(measure, staff, beat).and_then(|cr| cr.notes.get(note)).map(|n| n.pitch) else {
            return false;
        };
        // interval1 is the unison, each further step one scale degree
        let mut pitch = Some(base);
        for _ in 1..interval {
            pitch = pitch.and_then(|p| diatonic_neighbour(p, key, true));
        }
        let Some(pitch) = pitch.filter(|p| *p != base) else {
            return false;
        };
        let Some(cr) = self.score.slot_mut(measure, staff, beat) else {
            return false;
        };
        cr.add_note(super::Note::new(pitch));
        let note = cr.notes.iter().position(|n| n.pitch == pitch).unwrap_or(0);
        self.picked = Picked::Single(ElementRef::Note {
            measure,
            staff,
            beat,
            note,
        });
        true
    }

    fn move_string(&mut self, above: bool) -> bool {
        let strings = self
            .score
            .staves()
            .get(self.cursor.staff)
            .map(|s| s.strings)
            .unwrap_or(0);
        if strings == 0 {
            return false;
        }
        let string = if above {
            self.cursor.string.checked_sub(1)
        } else {
            Some(self.cursor.string + 1).filter(|s| *s < strings)
        };
        match string {
            Some(s) => {
                self.cursor.string = s;
                true
            }
            None => false,
        }
    }
}

impl ActionRegistry for HeadlessHost {
    fn has_action(&self, name: &str) -> bool {
        self.actions.contains(name)
    }

    fn is_checked(&self, name: &str) -> bool {
        self.actions.is_checked(name)
    }

    fn set_checked(&mut self, name: &str, checked: bool) -> bool {
        self.actions.set(name, checked)
    }

    fn trigger(&mut self, name: &str) -> bool {
        if !self.actions.contains(name) {
            debug!("no action named {}", name);
            return false;
        }
        self.actions.record(name);

        match name {
            "play" => self.actions.toggle("play"),
            "stop" => {
                self.actions.set("play", false);
            }
            "metronome" => self.actions.toggle("metronome"),
            "next-chord" => {
                self.step_chord(true);
            }
            "prev-chord" => {
                self.step_chord(false);
            }
            "next-measure" => {
                self.step_measure(true);
            }
            "prev-measure" => {
                self.step_measure(false);
            }
            "add-slur" => self.cursor.slur = self.cursor.active,
            "escape" => self.change_state(ViewState::Normal),
            "note-input" => self.change_state(ViewState::NoteEntry),
            "undo" => {
                self.undo_step();
            }
            "redo" => {
                self.redo_step();
            }
            "delete" => {
                self.edit(Self::delete_selected);
            }
            "up-diatonic" | "down-diatonic" => {
                let up = name == "up-diatonic";
                let key = self
                    .selected_slot()
                    .map(|(m, s, b, _)| self.score.key_at(s, self.score.beat_tick(m, b)))
                    .unwrap_or_default();
                self.edit(|host| host.transpose_selected(|p| diatonic_neighbour(p, key, up)));
            }
            "pitch-up-octave" => {
                self.edit(|host| host.transpose_selected(|p| p.checked_add(12).filter(|p| *p <= 127)));
            }
            "pitch-down-octave" => {
                self.edit(|host| host.transpose_selected(|p| p.checked_sub(12)));
            }
            "string-above" => {
                self.move_string(true);
            }
            "string-below" => {
                self.move_string(false);
            }
            _ => {
                if let Some(voice) = name.strip_prefix("voice-").and_then(|v| v.parse::<u8>().ok()) {
                    self.cursor.voice = voice.saturating_sub(1);
                } else if let Some(n) = name.strip_prefix("interval").and_then(|v| v.parse::<i32>().ok()) {
                    self.edit(|host| host.add_interval(n));
                }
            }
        }
        true
    }
}
