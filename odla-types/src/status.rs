//! Status replies sent to the device after every dispatch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ViewState;

/// Shape of the host selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionState {
    #[default]
    None,
    List,
    Range,
    Single,
}

impl SelectionState {
    pub fn as_u8(self) -> u8 {
        match self {
            SelectionState::None => 0,
            SelectionState::List => 1,
            SelectionState::Range => 2,
            SelectionState::Single => 4,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(SelectionState::None),
            1 => Some(SelectionState::List),
            2 => Some(SelectionState::Range),
            4 => Some(SelectionState::Single),
            _ => None,
        }
    }
}

/// Which tail follows the common header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyKind {
    NoElement,
    SingleElement,
    RangeElement,
}

impl ReplyKind {
    pub fn as_u8(self) -> u8 {
        match self {
            ReplyKind::NoElement => 0,
            ReplyKind::SingleElement => 1,
            ReplyKind::RangeElement => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ReplyKind::NoElement),
            1 => Some(ReplyKind::SingleElement),
            2 => Some(ReplyKind::RangeElement),
            _ => None,
        }
    }
}

/// Fields common to every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHeader {
    pub view_state: ViewState,
    pub selection_state: SelectionState,
    pub selected_count: i32,
}

/// Sentinel pitch for a non-note selection.
pub const INVALID_PITCH: u8 = 0xFF;
/// Sentinel dot count for an element that is neither a chord nor a rest.
pub const INVALID_DOTS: u8 = 0xFF;

/// Tail of a single-element reply. Raw wire codes, 1-based where the
/// device counts from one (measure, beat, staff, voice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleFields {
    pub element_type: u8,
    pub note_pitch: u8,
    pub note_accidental: u8,
    pub duration: u8,
    pub dots: u8,
    pub measure: u16,
    pub beat: u8,
    pub staff: u8,
    pub clef: u8,
    pub time_sig_num: u8,
    pub time_sig_den: u8,
    pub key_signature: i8,
    pub voice: u8,
    pub bpm: u16,
}

/// Tail of a range reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFields {
    pub first_measure: u16,
    pub last_measure: u16,
    pub first_beat: u8,
    pub last_beat: u8,
    pub first_staff: u8,
    pub last_staff: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusBody {
    None,
    Single(SingleFields),
    Range(RangeFields),
}

/// Snapshot of the selection after a dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    pub header: StatusHeader,
    pub body: StatusBody,
}

impl StatusReply {
    pub fn empty(view_state: ViewState, selection_state: SelectionState, selected_count: i32) -> Self {
        Self {
            header: StatusHeader {
                view_state,
                selection_state,
                selected_count,
            },
            body: StatusBody::None,
        }
    }

    pub fn kind(&self) -> ReplyKind {
        match self.body {
            StatusBody::None => ReplyKind::NoElement,
            StatusBody::Single(_) => ReplyKind::SingleElement,
            StatusBody::Range(_) => ReplyKind::RangeElement,
        }
    }

    pub fn single(&self) -> Option<&SingleFields> {
        match &self.body {
            StatusBody::Single(f) => Some(f),
            _ => None,
        }
    }

    pub fn range(&self) -> Option<&RangeFields> {
        match &self.body {
            StatusBody::Range(f) => Some(f),
            _ => None,
        }
    }
}

/// One field of the spoken-feedback reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackField {
    Note,
    Duration,
    Measure,
    Beat,
    Staff,
    TimeSig,
    Clef,
    Key,
    Voice,
    Bpm,
}

impl FeedbackField {
    pub const ALL: [FeedbackField; 10] = [
        FeedbackField::Note,
        FeedbackField::Duration,
        FeedbackField::Measure,
        FeedbackField::Beat,
        FeedbackField::Staff,
        FeedbackField::TimeSig,
        FeedbackField::Clef,
        FeedbackField::Key,
        FeedbackField::Voice,
        FeedbackField::Bpm,
    ];

    /// Key used in the reply map.
    pub fn code(self) -> &'static str {
        match self {
            FeedbackField::Note => "NOT",
            FeedbackField::Duration => "DUR",
            FeedbackField::Measure => "MEA",
            FeedbackField::Beat => "BEA",
            FeedbackField::Staff => "STA",
            FeedbackField::TimeSig => "TIM",
            FeedbackField::Clef => "CLE",
            FeedbackField::Key => "KEY",
            FeedbackField::Voice => "VOI",
            FeedbackField::Bpm => "BPM",
        }
    }

    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Bitmask of [`FeedbackField`]s the device wants read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpeechFlags(pub u32);

impl SpeechFlags {
    pub fn contains(self, field: FeedbackField) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn fields(self) -> impl Iterator<Item = FeedbackField> {
        FeedbackField::ALL
            .into_iter()
            .filter(move |f| self.contains(*f))
    }
}

/// Key/value reply of the map protocol.
pub type FeedbackReply = BTreeMap<String, String>;
