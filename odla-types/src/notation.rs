//! Notation vocabulary shared by the driver and the wire encoder.
//!
//! These are projections of the host's notation model, carrying only what
//! a status reply needs. Numeric codes are the values written on the wire.

use serde::{Deserialize, Serialize};

/// Score time in ticks.
pub type Tick = i32;

/// Ticks per quarter note.
pub const DIVISION: Tick = 480;

/// Kind of a score element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Invalid,
    Note,
    Rest,
    Chord,
    Measure,
    Clef,
    KeySig,
    TimeSig,
    BarLine,
    Marker,
    Jump,
    TempoText,
    Articulation,
    Fermata,
    Dynamic,
    Hairpin,
    Slur,
    Ottava,
    Pedal,
    Trill,
    Volta,
    TextLine,
    Breath,
    Arpeggio,
    Glissando,
    Fingering,
}

impl ElementType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Elements that are placed by dropping them on a measure rather than
    /// applied to the selection.
    pub fn is_measure_anchored(self) -> bool {
        matches!(
            self,
            ElementType::Marker
                | ElementType::Jump
                | ElementType::BarLine
                | ElementType::KeySig
                | ElementType::TimeSig
        )
    }

    pub fn is_chord_rest(self) -> bool {
        matches!(self, ElementType::Note | ElementType::Rest)
    }
}

/// Accidental attached to a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccidentalType {
    #[default]
    None,
    Flat,
    Natural,
    Sharp,
    Sharp2,
    Flat2,
    NaturalFlat,
    NaturalSharp,
}

impl AccidentalType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Chromatic offset from the natural step.
    pub fn alteration(self) -> i32 {
        match self {
            AccidentalType::None | AccidentalType::Natural => 0,
            AccidentalType::Flat | AccidentalType::NaturalFlat => -1,
            AccidentalType::Sharp | AccidentalType::NaturalSharp => 1,
            AccidentalType::Sharp2 => 2,
            AccidentalType::Flat2 => -2,
        }
    }
}

/// Notated duration class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DurationType {
    Long,
    Breve,
    Whole,
    Half,
    Quarter,
    Eighth,
    D16th,
    D32nd,
    D64th,
    D128th,
    D256th,
    D512th,
    D1024th,
    Zero,
    Measure,
    #[default]
    Invalid,
}

impl DurationType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Undotted length in ticks, `None` for the non-metric classes.
    pub fn ticks(self) -> Option<Tick> {
        let quarters_x8: Tick = match self {
            DurationType::Long => 128,
            DurationType::Breve => 64,
            DurationType::Whole => 32,
            DurationType::Half => 16,
            DurationType::Quarter => 8,
            DurationType::Eighth => 4,
            DurationType::D16th => 2,
            DurationType::D32nd => 1,
            DurationType::D64th => return Some(DIVISION / 16),
            DurationType::D128th => return Some(DIVISION / 32),
            DurationType::D256th => return Some(DIVISION / 64),
            DurationType::D512th => return Some(DIVISION / 128),
            DurationType::D1024th => return Some(DIVISION / 256),
            DurationType::Zero | DurationType::Measure | DurationType::Invalid => return None,
        };
        Some(quarters_x8 * DIVISION / 8)
    }
}

/// Clef kinds understood by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClefType {
    #[default]
    Treble,
    Treble8vb,
    Treble8va,
    Soprano,
    MezzoSoprano,
    Alto,
    Tenor,
    Baritone,
    Bass,
    Bass8vb,
    Percussion,
    Tab,
}

impl ClefType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Diatonic step of the top staff line. Subtracting a staff line
    /// (half-space units, 0 = top line) gives the step of that line.
    pub fn pitch_offset(self) -> i32 {
        match self {
            ClefType::Treble | ClefType::Percussion | ClefType::Tab => 45,
            ClefType::Treble8vb => 38,
            ClefType::Treble8va => 52,
            ClefType::Soprano => 43,
            ClefType::MezzoSoprano => 41,
            ClefType::Alto => 39,
            ClefType::Tenor => 37,
            ClefType::Baritone => 35,
            ClefType::Bass => 33,
            ClefType::Bass8vb => 26,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "treble" | "g" => Some(ClefType::Treble),
            "treble8vb" | "g8vb" => Some(ClefType::Treble8vb),
            "treble8va" | "g8va" => Some(ClefType::Treble8va),
            "soprano" | "c1" => Some(ClefType::Soprano),
            "mezzosoprano" | "c2" => Some(ClefType::MezzoSoprano),
            "alto" | "c3" => Some(ClefType::Alto),
            "tenor" | "c4" => Some(ClefType::Tenor),
            "baritone" | "c5" => Some(ClefType::Baritone),
            "bass" | "f" => Some(ClefType::Bass),
            "bass8vb" | "f8vb" => Some(ClefType::Bass8vb),
            "percussion" | "perc" => Some(ClefType::Percussion),
            "tab" => Some(ClefType::Tab),
            _ => None,
        }
    }
}

/// Key signature as a count of sharps (positive) or flats (negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeySignature(i8);

impl KeySignature {
    pub const C: KeySignature = KeySignature(0);

    /// Returns `None` outside -7..=7.
    pub fn new(accidentals: i8) -> Option<Self> {
        (-7..=7).contains(&accidentals).then_some(Self(accidentals))
    }

    pub fn get(self) -> i8 {
        self.0
    }
}

/// A time signature fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSig {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSig {
    pub const COMMON: TimeSig = TimeSig {
        numerator: 4,
        denominator: 4,
    };

    /// Returns `None` unless the numerator is non-zero and the denominator
    /// a power of two.
    pub fn new(numerator: i32, denominator: i32) -> Option<Self> {
        let num = u8::try_from(numerator).ok().filter(|n| *n > 0)?;
        let den = u8::try_from(denominator)
            .ok()
            .filter(|d| d.is_power_of_two())?;
        Some(Self {
            numerator: num,
            denominator: den,
        })
    }

    pub fn beat_ticks(self) -> Tick {
        DIVISION * 4 / Tick::from(self.denominator)
    }

    pub fn measure_ticks(self) -> Tick {
        self.beat_ticks() * Tick::from(self.numerator)
    }
}

impl Default for TimeSig {
    fn default() -> Self {
        Self::COMMON
    }
}

impl std::fmt::Display for TimeSig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Page or continuous layout of the score window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutMode {
    #[default]
    Page,
    Line,
}
