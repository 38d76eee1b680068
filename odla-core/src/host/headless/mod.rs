//! In-memory editor host: a beat-slot score with a view, an action table
//! and stock palettes. Runs the bridge without an editor attached and backs
//! the driver tests.

mod actions;
mod document;
pub mod index;
pub mod palette;
pub mod score;
pub mod sigmap;
mod view;

pub use actions::ActionTable;
pub use palette::PaletteCatalog;
pub use score::{Annotation, ChordRest, Note, Score, StaffDef};

use std::collections::VecDeque;

use odla_types::{LayoutMode, ViewState};

use crate::host::{Host, HostWindow};

/// What the headless selection points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    /// The chord or rest in a beat slot.
    ChordRest { measure: usize, staff: usize, beat: usize },
    Note {
        measure: usize,
        staff: usize,
        beat: usize,
        note: usize,
    },
    Annotation(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Picked {
    #[default]
    None,
    Single(ElementRef),
    /// Whole measures `first..=last` on staves `first_staff..=last_staff`.
    Range {
        first: usize,
        last: usize,
        first_staff: usize,
        last_staff: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Cursor {
    active: bool,
    measure: usize,
    beat: usize,
    staff: usize,
    string: usize,
    voice: u8,
    slur: bool,
    /// Slot of the chord most recently written from input.
    last_entered: Option<(usize, usize)>,
}

/// Undo steps kept by default.
pub const UNDO_DEPTH: usize = 100;

pub struct HeadlessHost {
    score: Score,
    picked: Picked,
    cursor: Cursor,
    view_state: ViewState,
    focused_measure: usize,
    actions: ActionTable,
    palettes: PaletteCatalog,
    undo: VecDeque<Score>,
    redo: VecDeque<Score>,
    max_undo: usize,
    cmd_depth: usize,
    cmd_snapshot: Option<Score>,
    layout: LayoutMode,
    raised: usize,
    document_open: bool,
    view_open: bool,
}

impl HeadlessHost {
    pub fn new(score: Score) -> Self {
        Self {
            score,
            picked: Picked::None,
            cursor: Cursor::default(),
            view_state: ViewState::Normal,
            focused_measure: 0,
            actions: ActionTable::default(),
            palettes: PaletteCatalog::default(),
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            max_undo: UNDO_DEPTH,
            cmd_depth: 0,
            cmd_snapshot: None,
            layout: LayoutMode::Page,
            raised: 0,
            document_open: true,
            view_open: true,
        }
    }

    /// Keep at most `depth` undo steps; older ones are forgotten.
    pub fn with_undo_depth(mut self, depth: usize) -> Self {
        self.max_undo = depth.max(1);
        self
    }

    pub fn with_palettes(mut self, palettes: PaletteCatalog) -> Self {
        self.palettes = palettes;
        self
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn score_mut(&mut self) -> &mut Score {
        &mut self.score
    }

    pub fn picked(&self) -> Picked {
        self.picked
    }

    pub fn select(&mut self, picked: Picked) {
        self.picked = picked;
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    pub fn focused_measure(&self) -> usize {
        self.focused_measure
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn raised(&self) -> usize {
        self.raised
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Input cursor as (measure, beat), when note entry is active.
    pub fn cursor_slot(&self) -> Option<(usize, usize)> {
        self.cursor.active.then_some((self.cursor.measure, self.cursor.beat))
    }

    pub fn input_voice(&self) -> u8 {
        self.cursor.voice
    }

    pub fn set_document_open(&mut self, open: bool) {
        self.document_open = open;
    }

    pub fn set_view_open(&mut self, open: bool) {
        self.view_open = open;
    }

    /// Move the input cursor to a slot on a staff. Only meaningful in note entry.
    pub fn place_cursor(&mut self, measure: usize, staff: usize, beat: usize) {
        self.cursor.measure = measure;
        self.cursor.staff = staff;
        self.cursor.beat = beat;
        self.cursor.last_entered = None;
    }

    fn undo_step(&mut self) -> bool {
        match self.undo.pop_back() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.score, previous);
                self.redo.push_back(current);
                self.after_history_step();
                true
            }
            None => false,
        }
    }

    fn push_undo(&mut self, before: Score) {
        if self.undo.len() >= self.max_undo {
            self.undo.pop_front();
        }
        self.undo.push_back(before);
    }

    fn redo_step(&mut self) -> bool {
        match self.redo.pop_back() {
            Some(next) => {
                let current = std::mem::replace(&mut self.score, next);
                self.push_undo(current);
                self.after_history_step();
                true
            }
            None => false,
        }
    }

    /// Drop references the restored score may no longer have.
    fn after_history_step(&mut self) {
        self.picked = Picked::None;
        self.cursor.last_entered = None;
        let (measure, beat) = self.clamped_slot(self.cursor.measure, self.cursor.beat);
        self.cursor.measure = measure;
        self.cursor.beat = beat;
    }

    fn clamped_slot(&self, measure: usize, beat: usize) -> (usize, usize) {
        let last = self.score.measures().len().saturating_sub(1);
        let measure = measure.min(last);
        let beats = self.score.measure(measure).map(|m| m.beats()).unwrap_or(1);
        (measure, beat.min(beats - 1))
    }
}

impl HostWindow for HeadlessHost {
    fn raise(&mut self) {
        self.raised += 1;
    }

    fn set_layout_mode(&mut self, mode: LayoutMode) {
        if self.layout != mode {
            log::debug!("layout mode {:?}", mode);
        }
        self.layout = mode;
    }

    fn process_events(&mut self) {}
}

impl Host for HeadlessHost {
    fn has_document(&self) -> bool {
        self.document_open
    }

    fn has_view(&self) -> bool {
        self.view_open
    }
}
