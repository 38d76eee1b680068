use log::debug;

use odla_types::ViewState;

use super::{ElementRef, HeadlessHost, Picked};
use crate::host::{ActionRegistry, Document, View};

impl HeadlessHost {
    /// Where note entry starts: the selected element, else the first beat.
    fn entry_start(&self) -> (usize, usize, usize) {
        match self.picked {
            Picked::Single(ElementRef::ChordRest { measure, staff, beat })
            | Picked::Single(ElementRef::Note {
                measure, staff, beat, ..
            }) => (measure, staff, beat),
            Picked::Range {
                first, first_staff, ..
            } => (first, first_staff, 0),
            _ => (self.focused_measure, 0, 0),
        }
    }

    /// Step the cursor (note entry) or the selected chord-rest (otherwise)
    /// by one slot.
    pub(super) fn step_chord(&mut self, forward: bool) -> bool {
        if self.cursor.active {
            let (m, b) = (self.cursor.measure, self.cursor.beat);
            let next = if forward {
                self.score.next_slot(m, b)
            } else {
                self.score.prev_slot(m, b)
            };
            if let Some((measure, beat)) = next {
                self.cursor.measure = measure;
                self.cursor.beat = beat;
                return true;
            }
            return false;
        }

        let (measure, staff, beat) = match self.picked {
            Picked::Single(ElementRef::ChordRest { measure, staff, beat })
            | Picked::Single(ElementRef::Note {
                measure, staff, beat, ..
            }) => (measure, staff, beat),
            _ => return false,
        };
        let next = if forward {
            self.score.next_slot(measure, beat)
        } else {
            self.score.prev_slot(measure, beat)
        };
        match next {
            Some((measure, beat)) => {
                self.picked = Picked::Single(ElementRef::ChordRest { measure, staff, beat });
                true
            }
            None => false,
        }
    }

    pub(super) fn step_measure(&mut self, forward: bool) -> bool {
        let current = if self.cursor.active {
            self.cursor.measure
        } else {
            self.focused_measure
        };
        let target = if forward {
            current + 1
        } else {
            match current.checked_sub(1) {
                Some(m) => m,
                None => return false,
            }
        };
        if target >= self.measure_count() {
            return false;
        }
        self.focused_measure = target;
        if self.cursor.active {
            self.cursor.measure = target;
            self.cursor.beat = 0;
        }
        true
    }
}

impl View for HeadlessHost {
    fn view_state(&self) -> ViewState {
        self.view_state
    }

    fn change_state(&mut self, state: ViewState) {
        if state == self.view_state {
            return;
        }
        debug!("view state {} -> {}", self.view_state.name(), state.name());
        match state {
            ViewState::NoteEntry | ViewState::EntryPlay => {
                if !self.cursor.active && self.measure_count() > 0 {
                    let (measure, staff, beat) = self.entry_start();
                    let (measure, beat) = self.clamped_slot(measure, beat);
                    self.cursor.active = true;
                    self.cursor.measure = measure;
                    self.cursor.staff = staff.min(self.staff_count().saturating_sub(1));
                    self.cursor.beat = beat;
                    self.cursor.last_entered = None;
                }
            }
            _ => {
                self.cursor.active = false;
                self.cursor.last_entered = None;
            }
        }
        self.view_state = state;
    }

    fn search_measure(&mut self, measure: usize) -> bool {
        if measure == 0 || measure > self.measure_count() {
            return false;
        }
        self.focused_measure = measure - 1;
        if self.cursor.active {
            self.cursor.measure = measure - 1;
            self.cursor.beat = 0;
            self.cursor.last_entered = None;
        }
        true
    }

    fn insert_measures(&mut self, count: usize) {
        let at = match self.picked {
            Picked::Single(ElementRef::ChordRest { measure, .. })
            | Picked::Single(ElementRef::Note { measure, .. }) => measure,
            Picked::Range { first, .. } => first,
            _ => self.measure_count(),
        };
        self.start_cmd();
        self.score.insert_measures(at, count);
        self.end_cmd();
        // The selection moves with the measures it was on
        match &mut self.picked {
            Picked::Single(ElementRef::ChordRest { measure, .. })
            | Picked::Single(ElementRef::Note { measure, .. }) => *measure += count,
            Picked::Range { first, last, .. } => {
                *first += count;
                *last += count;
            }
            _ => {}
        }
        if self.cursor.active && self.cursor.measure >= at {
            self.cursor.measure += count;
        }
    }

    fn view_cmd(&mut self, name: &str) -> bool {
        match name {
            "next-chord" => self.step_chord(true),
            "prev-chord" => self.step_chord(false),
            "next-measure" => self.step_measure(true),
            "prev-measure" => self.step_measure(false),
            "add-slur" => {
                self.cursor.slur = self.cursor.active;
                self.cursor.active
            }
            "escape" => {
                self.change_state(ViewState::Normal);
                true
            }
            _ => self.trigger(name),
        }
    }
}
