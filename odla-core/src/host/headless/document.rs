use log::debug;

use odla_types::{AccidentalType, ClefType, ElementType, KeySignature, Tick, TimeSig};

use super::score::{step_to_pitch, ChordRest, Note};
use super::{Cursor, ElementRef, HeadlessHost, Picked};
use crate::host::{
    Document, ElementInfo, ElementPayload, InputState, MeasureRef, PaletteElement,
    RangeSelection, Selection, StaffInfo,
};

impl HeadlessHost {
    pub(super) fn element_info(&self, element: ElementRef) -> Option<ElementInfo> {
        match element {
            ElementRef::ChordRest { measure, staff, beat } => {
                let cr = self.score.slot(measure, staff, beat)?;
                Some(ElementInfo {
                    kind: if cr.is_rest() {
                        ElementType::Rest
                    } else {
                        ElementType::Chord
                    },
                    staff,
                    voice: cr.voice,
                    tick: self.score.beat_tick(measure, beat),
                    pitch: None,
                    accidental: AccidentalType::None,
                    duration: Some((cr.duration, cr.dots)),
                })
            }
            ElementRef::Note {
                measure,
                staff,
                beat,
                note,
            } => {
                let cr = self.score.slot(measure, staff, beat)?;
                let n = cr.notes.get(note)?;
                Some(ElementInfo {
                    kind: ElementType::Note,
                    staff,
                    voice: cr.voice,
                    tick: self.score.beat_tick(measure, beat),
                    pitch: Some(n.pitch),
                    accidental: n.accidental,
                    duration: Some((cr.duration, cr.dots)),
                })
            }
            ElementRef::Annotation(index) => {
                let a = self.score.annotations().get(index)?;
                Some(ElementInfo {
                    kind: a.kind,
                    staff: a.staff,
                    voice: 0,
                    tick: a.tick,
                    pitch: None,
                    accidental: AccidentalType::None,
                    duration: None,
                })
            }
        }
    }

    fn range_count(&self, first: usize, last: usize, first_staff: usize, last_staff: usize) -> usize {
        self.score
            .measures()
            .get(first..=last)
            .into_iter()
            .flatten()
            .flat_map(|m| m.slots.get(first_staff..=last_staff).into_iter().flatten().flatten())
            .map(|cr| cr.notes.len().max(1))
            .sum()
    }

    /// Measure the selection starts in.
    fn picked_measure(&self) -> Option<usize> {
        match self.picked {
            Picked::Single(ElementRef::ChordRest { measure, .. })
            | Picked::Single(ElementRef::Note { measure, .. }) => Some(measure),
            Picked::Single(ElementRef::Annotation(index)) => {
                let tick = self.score.annotations().get(index)?.tick;
                self.score.locate(tick).map(|(measure, _)| measure)
            }
            Picked::Range { first, .. } => Some(first),
            Picked::None => None,
        }
    }

    fn cursor_tick(&self) -> Tick {
        self.score.beat_tick(self.cursor.measure, self.cursor.beat)
    }

    /// (staff, tick) of every position the selection covers.
    fn selection_targets(&self) -> Vec<(usize, Tick)> {
        match self.picked {
            Picked::None => Vec::new(),
            Picked::Single(e) => self
                .element_info(e)
                .map(|info| vec![(info.staff, info.tick)])
                .unwrap_or_default(),
            Picked::Range {
                first,
                first_staff,
                last_staff,
                ..
            } => {
                let tick = self.score.measure(first).map(|m| m.tick).unwrap_or(0);
                (first_staff..=last_staff).map(|s| (s, tick)).collect()
            }
        }
    }

    fn place(&mut self, element: &PaletteElement, staff: usize, tick: Tick) {
        match &element.payload {
            ElementPayload::Clef(clef) => self.score.set_clef(staff, tick, *clef),
            ElementPayload::KeySig(key) => self.score.set_key(staff, tick, *key),
            ElementPayload::TimeSig(sig) => {
                if let Some((measure, _)) = self.score.locate(tick) {
                    self.score.set_time_sig(measure, *sig);
                }
                return;
            }
            ElementPayload::Tempo(mark) => self.score.set_tempo(tick, f64::from(mark.bpm)),
            ElementPayload::None => {}
        }
        self.score.annotate(element.kind, element.name.clone(), staff, tick);
    }
}

impl Document for HeadlessHost {
    fn measure_count(&self) -> usize {
        self.score.measures().len()
    }

    fn staff_count(&self) -> usize {
        self.score.staves().len()
    }

    fn first_measure(&self) -> Option<MeasureRef> {
        (self.measure_count() > 0).then_some(MeasureRef(0))
    }

    fn next_measure(&self, measure: MeasureRef) -> Option<MeasureRef> {
        (measure.0 + 1 < self.measure_count()).then_some(MeasureRef(measure.0 + 1))
    }

    fn last_measure(&self) -> Option<MeasureRef> {
        self.measure_count().checked_sub(1).map(MeasureRef)
    }

    fn start_cmd(&mut self) {
        if self.cmd_depth == 0 {
            self.cmd_snapshot = Some(self.score.clone());
        }
        self.cmd_depth += 1;
    }

    fn end_cmd(&mut self) {
        if self.cmd_depth == 0 {
            debug!("end_cmd without start_cmd");
            return;
        }
        self.cmd_depth -= 1;
        if self.cmd_depth == 0 {
            if let Some(before) = self.cmd_snapshot.take() {
                if before != self.score {
                    self.push_undo(before);
                    self.redo.clear();
                }
            }
        }
    }

    fn selection(&self) -> Selection {
        match self.picked {
            Picked::None => Selection::None,
            Picked::Single(e) => self
                .element_info(e)
                .map(Selection::Single)
                .unwrap_or(Selection::None),
            Picked::Range {
                first,
                last,
                first_staff,
                last_staff,
            } => {
                let Some(start) = self.score.measure(first).map(|m| m.tick) else {
                    return Selection::None;
                };
                Selection::Range(RangeSelection {
                    start,
                    end: self.score.measure(last + 1).map(|m| m.tick),
                    first_staff,
                    last_staff,
                    count: self.range_count(first, last, first_staff, last_staff),
                })
            }
        }
    }

    fn select_range(&mut self, from: MeasureRef, to: MeasureRef, first_staff: usize, last_staff: usize) {
        let measures = self.measure_count();
        let staves = self.staff_count();
        if measures == 0 || staves == 0 {
            return;
        }
        let (first, last) = (from.0.min(to.0), from.0.max(to.0));
        self.picked = Picked::Range {
            first: first.min(measures - 1),
            last: last.min(measures - 1),
            first_staff: first_staff.min(last_staff).min(staves - 1),
            last_staff: last_staff.max(first_staff).min(staves - 1),
        };
    }

    fn measure_and_beat(&self, tick: Tick) -> (usize, usize) {
        let (bar, beat, _) = self.score.sigmap().tick_values(tick);
        (bar, beat)
    }

    fn prev_segment(&self, tick: Tick) -> Option<Tick> {
        if tick <= 0 {
            return None;
        }
        let (measure, beat) = self.score.locate(tick - 1)?;
        Some(self.score.beat_tick(measure, beat))
    }

    fn last_segment(&self) -> Option<Tick> {
        let (measure, beat) = self.score.last_slot()?;
        Some(self.score.beat_tick(measure, beat))
    }

    fn clef_at(&self, staff: usize, tick: Tick) -> ClefType {
        self.score.clef_at(staff, tick)
    }

    fn key_at(&self, staff: usize, tick: Tick) -> KeySignature {
        self.score.key_at(staff, tick)
    }

    fn time_sig_at(&self, _staff: usize, tick: Tick) -> TimeSig {
        self.score.sigmap().timesig(tick)
    }

    fn tempo_at(&self, tick: Tick) -> f64 {
        self.score.tempo_at(tick)
    }

    fn staff(&self, index: usize) -> Option<StaffInfo> {
        self.score.staves().get(index).map(|s| StaffInfo {
            is_tab: s.is_tab,
            upside_down: s.upside_down,
            strings: s.strings,
        })
    }

    fn input(&self) -> InputState {
        let c = &self.cursor;
        InputState {
            segment: c.active.then(|| self.cursor_tick()),
            tick: self.cursor_tick(),
            // Outside note entry the input follows the selection
            measure: if c.active {
                Some(MeasureRef(c.measure))
            } else {
                self.picked_measure().map(MeasureRef)
            },
            at_last_segment: self.score.last_slot() == Some((c.measure, c.beat)),
            staff: c.staff,
            string: c.string,
            slur_active: c.slur,
        }
    }

    fn clear_slur(&mut self) {
        self.cursor.slur = false;
    }

    fn add_pitch(&mut self, step: i32, add_to_chord: bool) {
        if !self.cursor.active {
            return;
        }
        let key = self.score.key_at(self.cursor.staff, self.cursor_tick());
        let Some(pitch) = step_to_pitch(step, key) else {
            debug!("step {} is out of pitch range", step);
            return;
        };

        // A plain entry never overwrites the chord just written
        if !add_to_chord && self.cursor.last_entered == Some((self.cursor.measure, self.cursor.beat)) {
            if let Some((measure, beat)) = self.score.next_slot(self.cursor.measure, self.cursor.beat) {
                self.cursor.measure = measure;
                self.cursor.beat = beat;
            }
        }

        let Cursor { measure, beat, staff, voice, slur, .. } = self.cursor;
        let Some(slot) = self.score.slot_mut(measure, staff, beat) else {
            return;
        };
        if add_to_chord && !slot.is_rest() {
            slot.add_note(Note::new(pitch));
        } else {
            *slot = ChordRest::chord(slot.duration, vec![Note::new(pitch)]);
            slot.voice = voice;
        }
        slot.slurred |= slur;
        let note = slot.notes.iter().position(|n| n.pitch == pitch).unwrap_or(0);

        self.cursor.last_entered = Some((measure, beat));
        self.picked = Picked::Single(ElementRef::Note {
            measure,
            staff,
            beat,
            note,
        });
    }

    fn set_input_string(&mut self, string: usize) {
        self.cursor.string = string;
    }

    fn add_at_input(&mut self, element: PaletteElement) {
        if !self.cursor.active {
            return;
        }
        let tick = self.cursor_tick();
        self.place(&element, self.cursor.staff, tick);
    }

    fn drop_at_measure(&mut self, element: PaletteElement, measure: MeasureRef) {
        let Some(tick) = self.score.measure(measure.0).map(|m| m.tick) else {
            return;
        };
        match &element.payload {
            ElementPayload::KeySig(key) => {
                for staff in 0..self.staff_count() {
                    self.score.set_key(staff, tick, *key);
                }
                self.score.annotate(element.kind, element.name.clone(), 0, tick);
            }
            ElementPayload::TimeSig(sig) => self.score.set_time_sig(measure.0, *sig),
            _ => self.place(&element, 0, tick),
        }
    }

    fn apply_to_selection(&mut self, element: PaletteElement) {
        for (staff, tick) in self.selection_targets() {
            self.place(&element, staff, tick);
        }
    }

    fn bracket_selected_accidentals(&mut self) {
        let mut slots = Vec::new();
        match self.picked {
            Picked::Single(ElementRef::Note {
                measure,
                staff,
                beat,
                note,
            }) => slots.push((measure, staff, beat, Some(note))),
            Picked::Range {
                first,
                last,
                first_staff,
                last_staff,
            } => {
                for measure in first..=last {
                    let beats = self.score.measure(measure).map(|m| m.beats()).unwrap_or(0);
                    for staff in first_staff..=last_staff {
                        for beat in 0..beats {
                            slots.push((measure, staff, beat, None));
                        }
                    }
                }
            }
            _ => {}
        }

        for (measure, staff, beat, only) in slots {
            if let Some(cr) = self.score.slot_mut(measure, staff, beat) {
                for (i, n) in cr.notes.iter_mut().enumerate() {
                    if only.map_or(true, |o| o == i) && n.accidental != AccidentalType::None {
                        n.bracketed = true;
                    }
                }
            }
        }
    }
}
