//! Capabilities the driver needs from the score editor.
//!
//! The editor is reached only through these traits. [`Host`] bundles them
//! so the driver can hold one reference for a whole dispatch cycle.
//! [`headless`] provides an in-memory implementation.

pub mod headless;

use odla_types::{
    AccidentalType, ClefType, DurationType, ElementType, KeySignature, LayoutMode,
    SelectionState, Tick, TimeSig, ViewState,
};

/// Zero-based measure index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeasureRef(pub usize);

/// Read-only projection of one selected element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInfo {
    pub kind: ElementType,
    pub staff: usize,
    /// Zero-based voice.
    pub voice: u8,
    /// Tick of the segment holding the element.
    pub tick: Tick,
    /// MIDI pitch, notes only.
    pub pitch: Option<u8>,
    pub accidental: AccidentalType,
    /// Duration class and dot count, chords and rests only.
    pub duration: Option<(DurationType, u8)>,
}

/// A contiguous span. `end` is exclusive and absent when the span runs to
/// the end of the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSelection {
    pub start: Tick,
    pub end: Option<Tick>,
    pub first_staff: usize,
    pub last_staff: usize,
    pub count: usize,
}

/// The document's current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    None,
    Single(ElementInfo),
    List(usize),
    Range(RangeSelection),
}

impl Selection {
    pub fn state(&self) -> SelectionState {
        match self {
            Selection::None => SelectionState::None,
            Selection::Single(_) => SelectionState::Single,
            Selection::List(_) => SelectionState::List,
            Selection::Range(_) => SelectionState::Range,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Selection::None => 0,
            Selection::Single(_) => 1,
            Selection::List(n) => *n,
            Selection::Range(r) => r.count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffInfo {
    pub is_tab: bool,
    pub upside_down: bool,
    pub strings: usize,
}

/// Step-time input cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputState {
    /// Tick of the input segment, absent outside note entry.
    pub segment: Option<Tick>,
    pub tick: Tick,
    pub measure: Option<MeasureRef>,
    pub at_last_segment: bool,
    pub staff: usize,
    pub string: usize,
    pub slur_active: bool,
}

/// Tempo marking carried by a tempo-text element.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMark {
    pub bpm: i32,
    pub xml_text: String,
    pub follow_text: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementPayload {
    None,
    Clef(ClefType),
    KeySig(KeySignature),
    TimeSig(TimeSig),
    Tempo(TempoMark),
}

/// A detached element, cloned out of the palette tree or built by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteElement {
    pub kind: ElementType,
    pub name: String,
    pub payload: ElementPayload,
}

impl PaletteElement {
    pub fn new(kind: ElementType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            payload: ElementPayload::None,
        }
    }

    pub fn with_payload(mut self, payload: ElementPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn time_sig(sig: TimeSig) -> Self {
        Self::new(ElementType::TimeSig, sig.to_string()).with_payload(ElementPayload::TimeSig(sig))
    }

    pub fn tempo(xml_text: String, bpm: i32) -> Self {
        Self::new(ElementType::TempoText, xml_text.clone()).with_payload(ElementPayload::Tempo(
            TempoMark {
                bpm,
                xml_text,
                follow_text: true,
            },
        ))
    }

    /// Overrides the tempo of a tempo-text element. Other kinds are unchanged.
    pub fn set_tempo(&mut self, bpm: i32) {
        if let ElementPayload::Tempo(mark) = &mut self.payload {
            mark.bpm = bpm;
        }
    }
}

/// The score being edited.
pub trait Document {
    fn measure_count(&self) -> usize;
    fn staff_count(&self) -> usize;
    fn first_measure(&self) -> Option<MeasureRef>;
    fn next_measure(&self, measure: MeasureRef) -> Option<MeasureRef>;
    fn last_measure(&self) -> Option<MeasureRef>;

    /// Open an undoable edit. Calls nest.
    fn start_cmd(&mut self);
    fn end_cmd(&mut self);

    fn selection(&self) -> Selection;
    fn select_range(&mut self, from: MeasureRef, to: MeasureRef, first_staff: usize, last_staff: usize);

    /// Zero-based (measure, beat) of a tick, from the time-signature map.
    fn measure_and_beat(&self, tick: Tick) -> (usize, usize);
    fn prev_segment(&self, tick: Tick) -> Option<Tick>;
    fn last_segment(&self) -> Option<Tick>;
    fn clef_at(&self, staff: usize, tick: Tick) -> ClefType;
    fn key_at(&self, staff: usize, tick: Tick) -> KeySignature;
    fn time_sig_at(&self, staff: usize, tick: Tick) -> TimeSig;
    /// Beats per minute in effect at a tick.
    fn tempo_at(&self, tick: Tick) -> f64;
    fn staff(&self, index: usize) -> Option<StaffInfo>;

    fn input(&self) -> InputState;
    fn clear_slur(&mut self);
    /// Enter a diatonic step at the input cursor, optionally into the chord
    /// being built.
    fn add_pitch(&mut self, step: i32, add_to_chord: bool);
    fn set_input_string(&mut self, string: usize);

    fn add_at_input(&mut self, element: PaletteElement);
    fn drop_at_measure(&mut self, element: PaletteElement, measure: MeasureRef);
    fn apply_to_selection(&mut self, element: PaletteElement);
    fn bracket_selected_accidentals(&mut self);
}

/// The on-screen editing surface.
pub trait View {
    fn view_state(&self) -> ViewState;
    fn change_state(&mut self, state: ViewState);
    /// Bring a one-based measure into view. False when it does not exist.
    fn search_measure(&mut self, measure: usize) -> bool;
    fn insert_measures(&mut self, count: usize);
    /// Run a named action through the view.
    fn view_cmd(&mut self, name: &str) -> bool;
}

/// Named, possibly checkable, editor actions.
pub trait ActionRegistry {
    fn has_action(&self, name: &str) -> bool;
    fn is_checked(&self, name: &str) -> bool;
    /// Returns false when no such action exists.
    fn set_checked(&mut self, name: &str, checked: bool) -> bool;
    /// Returns false when no such action exists.
    fn trigger(&mut self, name: &str) -> bool;
}

/// Catalog of element prototypes. Lookups return clones.
pub trait PaletteTree {
    fn palette_cell(&self, palette_type: i32, cell: i32) -> Option<PaletteElement>;
    fn palette_named(&self, key: &str) -> Option<PaletteElement>;
}

pub trait HostWindow {
    fn raise(&mut self);
    fn set_layout_mode(&mut self, mode: LayoutMode);
    /// Let the editor settle pending events after a state change.
    fn process_events(&mut self);
}

/// Everything the driver talks to during one dispatch.
pub trait Host: Document + View + ActionRegistry + PaletteTree + HostWindow {
    fn has_document(&self) -> bool;
    fn has_view(&self) -> bool;
}
