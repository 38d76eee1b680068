//! In-memory score: measures of beat slots per staff, plus ordered indexes
//! for clefs, keys and tempo.

use odla_types::{
    AccidentalType, ClefType, DurationType, ElementType, KeySignature, Tick, TimeSig,
};

use super::index::PositionIndex;
use super::sigmap::TimeSigMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub pitch: u8,
    pub accidental: AccidentalType,
    pub bracketed: bool,
}

impl Note {
    pub fn new(pitch: u8) -> Self {
        Self {
            pitch,
            accidental: AccidentalType::None,
            bracketed: false,
        }
    }

    pub fn with_accidental(mut self, accidental: AccidentalType) -> Self {
        self.accidental = accidental;
        self
    }
}

/// A chord, or a rest when it has no notes. Occupies one beat slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordRest {
    pub notes: Vec<Note>,
    pub duration: DurationType,
    pub dots: u8,
    pub voice: u8,
    pub slurred: bool,
}

impl ChordRest {
    pub fn rest(duration: DurationType) -> Self {
        Self {
            notes: Vec::new(),
            duration,
            dots: 0,
            voice: 0,
            slurred: false,
        }
    }

    pub fn chord(duration: DurationType, notes: Vec<Note>) -> Self {
        Self {
            notes,
            ..Self::rest(duration)
        }
    }

    pub fn is_rest(&self) -> bool {
        self.notes.is_empty()
    }

    /// Adds a note unless that pitch is already present. Keeps notes sorted low to high.
    pub fn add_note(&mut self, note: Note) {
        if self.notes.iter().all(|n| n.pitch != note.pitch) {
            self.notes.push(note);
            self.notes.sort_by_key(|n| n.pitch);
        }
    }
}

/// Something attached to the score that is not a chord or rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: ElementType,
    pub name: String,
    pub staff: usize,
    pub tick: Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffDef {
    pub clef: ClefType,
    pub is_tab: bool,
    pub upside_down: bool,
    pub strings: usize,
}

impl StaffDef {
    pub fn standard(clef: ClefType) -> Self {
        Self {
            clef,
            is_tab: false,
            upside_down: false,
            strings: 0,
        }
    }

    pub fn tab(strings: usize, upside_down: bool) -> Self {
        Self {
            clef: ClefType::Tab,
            is_tab: true,
            upside_down,
            strings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    pub tick: Tick,
    /// Effective signature.
    pub sig: TimeSig,
    /// Signature change placed at the start of this measure.
    pub sig_change: Option<TimeSig>,
    /// `slots[staff][beat]`
    pub slots: Vec<Vec<ChordRest>>,
}

impl Measure {
    fn empty(tick: Tick, sig: TimeSig, staves: usize) -> Self {
        Self {
            tick,
            sig,
            sig_change: None,
            slots: vec![rests_for(sig); staves],
        }
    }

    pub fn end_tick(&self) -> Tick {
        self.tick + self.sig.measure_ticks()
    }

    pub fn beats(&self) -> usize {
        usize::from(self.sig.numerator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    staves: Vec<StaffDef>,
    measures: Vec<Measure>,
    sigmap: TimeSigMap,
    clefs: Vec<PositionIndex<ClefType>>,
    keys: Vec<PositionIndex<KeySignature>>,
    tempos: PositionIndex<f64>,
    annotations: Vec<Annotation>,
}

impl Score {
    pub fn new(measure_count: usize, staves: Vec<StaffDef>, sig: TimeSig, bpm: f64) -> Self {
        let mut measures = Vec::with_capacity(measure_count);
        let mut tick = 0;
        for _ in 0..measure_count {
            measures.push(Measure::empty(tick, sig, staves.len()));
            tick += sig.measure_ticks();
        }
        if let Some(first) = measures.first_mut() {
            first.sig_change = Some(sig);
        }

        let clefs = staves
            .iter()
            .map(|s| {
                let mut index = PositionIndex::new();
                index.insert(0, s.clef);
                index
            })
            .collect();
        let keys = staves.iter().map(|_| PositionIndex::new()).collect();
        let mut tempos = PositionIndex::new();
        tempos.insert(0, bpm);

        Self {
            sigmap: TimeSigMap::from_measures(measures.iter().map(|m| m.sig)),
            staves,
            measures,
            clefs,
            keys,
            tempos,
            annotations: Vec::new(),
        }
    }

    /// One treble staff in 4/4 at 120 bpm.
    pub fn single_staff(measure_count: usize) -> Self {
        Self::new(
            measure_count,
            vec![StaffDef::standard(ClefType::Treble)],
            TimeSig::COMMON,
            120.0,
        )
    }

    pub fn staves(&self) -> &[StaffDef] {
        &self.staves
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn measure(&self, index: usize) -> Option<&Measure> {
        self.measures.get(index)
    }

    pub fn sigmap(&self) -> &TimeSigMap {
        &self.sigmap
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn slot(&self, measure: usize, staff: usize, beat: usize) -> Option<&ChordRest> {
        self.measures.get(measure)?.slots.get(staff)?.get(beat)
    }

    pub fn slot_mut(&mut self, measure: usize, staff: usize, beat: usize) -> Option<&mut ChordRest> {
        self.measures.get_mut(measure)?.slots.get_mut(staff)?.get_mut(beat)
    }

    pub fn beat_tick(&self, measure: usize, beat: usize) -> Tick {
        self.measures
            .get(measure)
            .map(|m| m.tick + m.sig.beat_ticks() * beat as Tick)
            .unwrap_or(0)
    }

    /// Measure and beat slot covering `tick`, clamped to the score.
    pub fn locate(&self, tick: Tick) -> Option<(usize, usize)> {
        if self.measures.is_empty() {
            return None;
        }
        let index = self
            .measures
            .partition_point(|m| m.tick <= tick)
            .saturating_sub(1);
        let m = &self.measures[index];
        let beat = ((tick - m.tick).max(0) / m.sig.beat_ticks()) as usize;
        Some((index, beat.min(m.beats() - 1)))
    }

    /// Slot after (measure, beat), crossing barlines.
    pub fn next_slot(&self, measure: usize, beat: usize) -> Option<(usize, usize)> {
        let m = self.measures.get(measure)?;
        if beat + 1 < m.beats() {
            Some((measure, beat + 1))
        } else if measure + 1 < self.measures.len() {
            Some((measure + 1, 0))
        } else {
            None
        }
    }

    pub fn prev_slot(&self, measure: usize, beat: usize) -> Option<(usize, usize)> {
        if beat > 0 {
            Some((measure, beat - 1))
        } else if measure > 0 {
            let prev = self.measures.get(measure - 1)?;
            Some((measure - 1, prev.beats() - 1))
        } else {
            None
        }
    }

    pub fn last_slot(&self) -> Option<(usize, usize)> {
        let last = self.measures.len().checked_sub(1)?;
        Some((last, self.measures[last].beats() - 1))
    }

    pub fn clef_at(&self, staff: usize, tick: Tick) -> ClefType {
        self.clefs
            .get(staff)
            .and_then(|c| c.at(tick))
            .copied()
            .unwrap_or_default()
    }

    pub fn key_at(&self, staff: usize, tick: Tick) -> KeySignature {
        self.keys
            .get(staff)
            .and_then(|k| k.at(tick))
            .copied()
            .unwrap_or(KeySignature::C)
    }

    pub fn tempo_at(&self, tick: Tick) -> f64 {
        self.tempos.at(tick).copied().unwrap_or(120.0)
    }

    pub fn set_clef(&mut self, staff: usize, tick: Tick, clef: ClefType) {
        if let Some(index) = self.clefs.get_mut(staff) {
            index.insert(tick, clef);
        }
    }

    pub fn set_key(&mut self, staff: usize, tick: Tick, key: KeySignature) {
        if let Some(index) = self.keys.get_mut(staff) {
            index.insert(tick, key);
        }
    }

    pub fn set_tempo(&mut self, tick: Tick, bpm: f64) {
        self.tempos.insert(tick, bpm);
    }

    pub fn annotate(&mut self, kind: ElementType, name: impl Into<String>, staff: usize, tick: Tick) -> usize {
        self.annotations.push(Annotation {
            kind,
            name: name.into(),
            staff,
            tick,
        });
        self.annotations.len() - 1
    }

    /// Place a signature change at a measure. Measures whose effective
    /// signature changes are refilled with rests.
    pub fn set_time_sig(&mut self, measure: usize, sig: TimeSig) {
        let Some(m) = self.measures.get_mut(measure) else {
            return;
        };
        m.sig_change = Some(sig);
        let old_ticks = self.measure_ticks();
        self.relayout(&old_ticks, |i| i);
    }

    /// Insert empty measures before `at` (or append when `at` is the count).
    pub fn insert_measures(&mut self, at: usize, count: usize) {
        let at = at.min(self.measures.len());
        let sig = match at {
            0 => self.measures.first().map(|m| m.sig),
            _ => self.measures.get(at - 1).map(|m| m.sig),
        }
        .unwrap_or_default();

        let old_ticks = self.measure_ticks();
        let staves = self.staves.len();
        for offset in 0..count {
            self.measures.insert(at + offset, Measure::empty(0, sig, staves));
        }
        if at == 0 && count > 0 {
            // The opening signature belongs to the new first measure
            let opening = self.measures[count].sig_change.take();
            self.measures[0].sig_change = opening.or(Some(sig));
        }
        self.relayout(&old_ticks, |i| if i >= at { i + count } else { i });
    }

    fn measure_ticks(&self) -> Vec<Tick> {
        self.measures.iter().map(|m| m.tick).collect()
    }

    /// Recompute signatures and ticks, then move positioned items along
    /// with the measure they belonged to.
    fn relayout(&mut self, old_ticks: &[Tick], map_index: impl Fn(usize) -> usize) {
        let mut sig = TimeSig::COMMON;
        let mut tick = 0;
        for m in &mut self.measures {
            if let Some(change) = m.sig_change {
                sig = change;
            }
            if m.sig != sig {
                m.sig = sig;
                m.slots = vec![rests_for(sig); m.slots.len()];
            }
            m.tick = tick;
            tick += sig.measure_ticks();
        }
        self.sigmap = TimeSigMap::from_measures(self.measures.iter().map(|m| m.sig));

        let layout: Vec<(Tick, Tick)> = self
            .measures
            .iter()
            .map(|m| (m.tick, m.sig.measure_ticks()))
            .collect();
        let remap = |t: Tick| -> Tick {
            let found = old_ticks.partition_point(|s| *s <= t);
            let Some(old) = found.checked_sub(1) else {
                return t;
            };
            let offset = t - old_ticks[old];
            match layout.get(map_index(old)) {
                Some((start, len)) => start + offset.min(len - 1),
                None => t,
            }
        };

        for index in &mut self.clefs {
            index.remap(&remap);
        }
        for index in &mut self.keys {
            index.remap(&remap);
        }
        self.tempos.remap(&remap);
        for a in &mut self.annotations {
            a.tick = remap(a.tick);
        }
    }
}

fn rests_for(sig: TimeSig) -> Vec<ChordRest> {
    vec![ChordRest::rest(beat_duration(sig)); usize::from(sig.numerator)]
}

/// Duration class of one beat.
pub fn beat_duration(sig: TimeSig) -> DurationType {
    match sig.denominator {
        1 => DurationType::Whole,
        2 => DurationType::Half,
        4 => DurationType::Quarter,
        8 => DurationType::Eighth,
        16 => DurationType::D16th,
        32 => DurationType::D32nd,
        64 => DurationType::D64th,
        _ => DurationType::Quarter,
    }
}

const STEP_SEMITONES: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];
/// Note names (C = 0) altered by each added sharp, then by each added flat.
const SHARP_ORDER: [i32; 7] = [3, 0, 4, 1, 5, 2, 6];
const FLAT_ORDER: [i32; 7] = [6, 2, 5, 1, 4, 0, 3];

/// MIDI pitch of a diatonic step (7 per octave, 0 = C-1) in a key.
pub fn step_to_pitch(step: i32, key: KeySignature) -> Option<u8> {
    let name = step.rem_euclid(7);
    let octave = step.div_euclid(7);
    let k = i32::from(key.get());
    let alter = if k > 0 && SHARP_ORDER[..k as usize].contains(&name) {
        1
    } else if k < 0 && FLAT_ORDER[..(-k) as usize].contains(&name) {
        -1
    } else {
        0
    };
    let pitch = octave
        .checked_mul(12)?
        .checked_add(STEP_SEMITONES[name as usize] + alter)?;
    u8::try_from(pitch).ok().filter(|p| *p <= 127)
}

fn in_key(pitch: i32, key: KeySignature) -> bool {
    let tonic = (i32::from(key.get()) * 7).rem_euclid(12);
    STEP_SEMITONES.contains(&(pitch - tonic).rem_euclid(12))
}

/// Next pitch above (or below) that belongs to the key's major scale.
pub fn diatonic_neighbour(pitch: u8, key: KeySignature, up: bool) -> Option<u8> {
    let delta = if up { 1 } else { -1 };
    let mut p = i32::from(pitch);
    for _ in 0..2 {
        p += delta;
        if in_key(p, key) {
            return u8::try_from(p).ok().filter(|p| *p <= 127);
        }
    }
    None
}
