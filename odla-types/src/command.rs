//! Device command types.
//!
//! A `Command` is what every wire revision decodes into, whatever its
//! framing: an optional view-state transition, a kind, two integer
//! parameters and an optional text parameter.

use serde::{Deserialize, Serialize};

/// Interaction mode of the host's score view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewState {
    #[default]
    Normal,
    Drag,
    DragObject,
    Edit,
    DragEdit,
    Lasso,
    NoteEntry,
    Play,
    EntryPlay,
    Foto,
}

impl ViewState {
    pub const ALL: [ViewState; 10] = [
        ViewState::Normal,
        ViewState::Drag,
        ViewState::DragObject,
        ViewState::Edit,
        ViewState::DragEdit,
        ViewState::Lasso,
        ViewState::NoteEntry,
        ViewState::Play,
        ViewState::EntryPlay,
        ViewState::Foto,
    ];

    pub fn as_u8(self) -> u8 {
        match self {
            ViewState::Normal => 0,
            ViewState::Drag => 1,
            ViewState::DragObject => 2,
            ViewState::Edit => 3,
            ViewState::DragEdit => 4,
            ViewState::Lasso => 5,
            ViewState::NoteEntry => 6,
            ViewState::Play => 7,
            ViewState::EntryPlay => 8,
            ViewState::Foto => 9,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| i32::from(s.as_u8()) == value)
    }

    /// Parse the state names used by the map protocol (`NORMAL`, `NOTE_ENTRY`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "NORMAL" => Some(ViewState::Normal),
            "NOTE_ENTRY" => Some(ViewState::NoteEntry),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ViewState::Normal => "NORMAL",
            ViewState::Drag => "DRAG",
            ViewState::DragObject => "DRAG_OBJECT",
            ViewState::Edit => "EDIT",
            ViewState::DragEdit => "DRAG_EDIT",
            ViewState::Lasso => "LASSO",
            ViewState::NoteEntry => "NOTE_ENTRY",
            ViewState::Play => "PLAY",
            ViewState::EntryPlay => "ENTRY_PLAY",
            ViewState::Foto => "FOTO",
        }
    }
}

/// What a command asks the driver to do. The binary discriminants are part
/// of the wire format and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Trigger the host action named in `text`.
    Action,
    Play,
    Pause,
    Stop,
    /// `par1` = 1-based measure.
    Goto,
    /// `par1` = first measure, `par2` = last measure.
    SelectMeasures,
    /// `par1` = staff line, `par2` = [`StaffPressFlags`] bits.
    StaffPressed,
    /// `par1` = palette type, `par2` = cell index.
    Palette,
    /// `text` = palette key such as `clef:treble`.
    PaletteNamed,
    /// `par1` = number of measures.
    InsertMeasures,
    LineView,
    PageView,
    /// `par1` = [`TempoPreset`] index, `par2` = bpm.
    Tempo,
    /// `par1`: 0 = off, 1 = on, anything else toggles.
    Metronome,
    /// `par1` = numerator, `par2` = denominator.
    TimeSignature,
    /// Run the action named in `text` through the score view.
    ViewCommand,
}

impl CommandKind {
    pub const ALL: [CommandKind; 16] = [
        CommandKind::Action,
        CommandKind::Play,
        CommandKind::Pause,
        CommandKind::Stop,
        CommandKind::Goto,
        CommandKind::SelectMeasures,
        CommandKind::StaffPressed,
        CommandKind::Palette,
        CommandKind::PaletteNamed,
        CommandKind::InsertMeasures,
        CommandKind::LineView,
        CommandKind::PageView,
        CommandKind::Tempo,
        CommandKind::Metronome,
        CommandKind::TimeSignature,
        CommandKind::ViewCommand,
    ];

    pub fn as_u8(self) -> u8 {
        match self {
            CommandKind::Action => 0,
            CommandKind::Play => 1,
            CommandKind::Pause => 2,
            CommandKind::Stop => 3,
            CommandKind::Goto => 4,
            CommandKind::SelectMeasures => 5,
            CommandKind::StaffPressed => 6,
            CommandKind::Palette => 7,
            CommandKind::PaletteNamed => 8,
            CommandKind::InsertMeasures => 9,
            CommandKind::LineView => 10,
            CommandKind::PageView => 11,
            CommandKind::Tempo => 12,
            CommandKind::Metronome => 13,
            CommandKind::TimeSignature => 14,
            CommandKind::ViewCommand => 15,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_u8() == value)
    }
}

/// Flag bits carried in `par2` of a staff-line press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StaffPressFlags {
    pub keep_chord: bool,
    pub slur: bool,
}

impl StaffPressFlags {
    const KEEP_CHORD: i32 = 1;
    const SLUR: i32 = 2;

    pub fn from_bits(bits: i32) -> Self {
        Self {
            keep_chord: bits & Self::KEEP_CHORD != 0,
            slur: bits & Self::SLUR != 0,
        }
    }

    pub fn bits(self) -> i32 {
        let mut bits = 0;
        if self.keep_chord {
            bits |= Self::KEEP_CHORD;
        }
        if self.slur {
            bits |= Self::SLUR;
        }
        bits
    }
}

/// Metronome-mark shapes a tempo command can insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TempoPreset {
    Half,
    Quarter,
    Eighth,
    DottedHalf,
    DottedQuarter,
    DottedEighth,
}

impl TempoPreset {
    pub const ALL: [TempoPreset; 6] = [
        TempoPreset::Half,
        TempoPreset::Quarter,
        TempoPreset::Eighth,
        TempoPreset::DottedHalf,
        TempoPreset::DottedQuarter,
        TempoPreset::DottedEighth,
    ];

    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> i32 {
        match self {
            TempoPreset::Half => 0,
            TempoPreset::Quarter => 1,
            TempoPreset::Eighth => 2,
            TempoPreset::DottedHalf => 3,
            TempoPreset::DottedQuarter => 4,
            TempoPreset::DottedEighth => 5,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "HALF" => Some(TempoPreset::Half),
            "QUARTER" => Some(TempoPreset::Quarter),
            "EIGHTH" => Some(TempoPreset::Eighth),
            "DOTTED_HALF" => Some(TempoPreset::DottedHalf),
            "DOTTED_QUARTER" => Some(TempoPreset::DottedQuarter),
            "DOTTED_EIGHTH" => Some(TempoPreset::DottedEighth),
            _ => None,
        }
    }

    /// Symbol markup for the metronome mark, `%1` is replaced by the bpm.
    pub fn pattern(self) -> &'static str {
        match self {
            TempoPreset::Half => "<sym>metNoteHalfUp</sym> = %1",
            TempoPreset::Quarter => "<sym>metNoteQuarterUp</sym> = %1",
            TempoPreset::Eighth => "<sym>metNote8thUp</sym> = %1",
            TempoPreset::DottedHalf => {
                "<sym>metNoteHalfUp</sym><sym>space</sym><sym>metAugmentationDot</sym> = %1"
            }
            TempoPreset::DottedQuarter => {
                "<sym>metNoteQuarterUp</sym><sym>space</sym><sym>metAugmentationDot</sym> = %1"
            }
            TempoPreset::DottedEighth => {
                "<sym>metNote8thUp</sym><sym>space</sym><sym>metAugmentationDot</sym> = %1"
            }
        }
    }

    pub fn markup(self, bpm: i32) -> String {
        self.pattern().replace("%1", &bpm.to_string())
    }
}

/// A decoded device command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Transition applied before the command runs.
    pub state_before: Option<ViewState>,
    /// Transition applied after the command runs.
    pub state_after: Option<ViewState>,
    pub kind: CommandKind,
    pub par1: i32,
    pub par2: i32,
    pub text: Option<String>,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            state_before: None,
            state_after: None,
            kind,
            par1: 0,
            par2: 0,
            text: None,
        }
    }

    /// A command that triggers a named host action.
    pub fn action(name: impl Into<String>) -> Self {
        Self::new(CommandKind::Action).with_text(name)
    }

    pub fn with_params(mut self, par1: i32, par2: i32) -> Self {
        self.par1 = par1;
        self.par2 = par2;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_state_before(mut self, state: ViewState) -> Self {
        self.state_before = Some(state);
        self
    }

    pub fn with_state_after(mut self, state: ViewState) -> Self {
        self.state_after = Some(state);
        self
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn staff_flags(&self) -> StaffPressFlags {
        StaffPressFlags::from_bits(self.par2)
    }
}
