//! Status collection after a dispatch.
//!
//! [`collect_status`] projects the host's selection into the fixed reply the
//! binary and text revisions send; [`feedback`] builds the key/value reply of
//! the map revision.

use odla_types::{
    ClefType, DurationType, ElementType, FeedbackField, FeedbackReply, KeySignature, RangeFields, SingleFields,
    SpeechFlags, StatusBody, StatusReply, Tick, TimeSig, INVALID_DOTS, INVALID_PITCH,
};

use crate::host::{Document, ElementInfo, Host, RangeSelection, Selection, View};

/// Notation context in effect at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Context {
    /// One-based.
    measure: u16,
    /// One-based.
    beat: u8,
    /// One-based.
    staff: u8,
    clef: ClefType,
    sig: TimeSig,
    key: KeySignature,
    bpm: u16,
}

fn to_u8(value: usize) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

fn context(host: &dyn Host, staff: usize, tick: Tick) -> Context {
    let (measure, beat) = host.measure_and_beat(tick);
    let bpm = host.tempo_at(tick).round().clamp(0.0, f64::from(u16::MAX));
    Context {
        measure: u16::try_from(measure + 1).unwrap_or(u16::MAX),
        beat: to_u8(beat + 1),
        staff: to_u8(staff + 1),
        clef: host.clef_at(staff, tick),
        sig: host.time_sig_at(staff, tick),
        key: host.key_at(staff, tick),
        bpm: bpm as u16,
    }
}

/// Duration class and dots, or the invalid markers for anything that is
/// not a note or rest.
fn duration_of(info: &ElementInfo) -> (DurationType, u8) {
    match info.duration {
        Some(duration) if info.kind.is_chord_rest() => duration,
        _ => (DurationType::Invalid, INVALID_DOTS),
    }
}

fn single_fields(host: &dyn Host, info: &ElementInfo) -> SingleFields {
    let ctx = context(host, info.staff, info.tick);
    let (duration, dots) = duration_of(info);
    let is_note = info.kind == ElementType::Note;
    SingleFields {
        element_type: info.kind.as_u8(),
        note_pitch: info.pitch.filter(|_| is_note).unwrap_or(INVALID_PITCH),
        note_accidental: if is_note { info.accidental.as_u8() } else { 0 },
        duration: duration.as_u8(),
        dots,
        measure: ctx.measure,
        beat: ctx.beat,
        staff: ctx.staff,
        clef: ctx.clef.as_u8(),
        time_sig_num: ctx.sig.numerator,
        time_sig_den: ctx.sig.denominator,
        key_signature: ctx.key.get(),
        voice: info.voice.saturating_add(1),
        bpm: ctx.bpm,
    }
}

/// The last boundary of a range is the segment before its exclusive end, or
/// the last segment of the score.
fn range_end(host: &dyn Host, range: &RangeSelection) -> Option<Tick> {
    match range.end {
        Some(end) => host.prev_segment(end),
        None => host.last_segment(),
    }
}

fn range_fields(host: &dyn Host, range: &RangeSelection) -> Option<RangeFields> {
    let end = range_end(host, range)?;
    let (first_measure, first_beat) = host.measure_and_beat(range.start);
    let (last_measure, last_beat) = host.measure_and_beat(end);
    Some(RangeFields {
        first_measure: u16::try_from(first_measure + 1).unwrap_or(u16::MAX),
        last_measure: u16::try_from(last_measure + 1).unwrap_or(u16::MAX),
        first_beat: to_u8(first_beat + 1),
        last_beat: to_u8(last_beat + 1),
        first_staff: to_u8(range.first_staff + 1),
        last_staff: to_u8(range.last_staff + 1),
    })
}

/// Snapshot the selection for the device. `None` when a range has no
/// resolvable end, in which case nothing is sent.
pub fn collect_status(host: &dyn Host) -> Option<StatusReply> {
    let selection = host.selection();
    let count = i32::try_from(selection.count()).unwrap_or(i32::MAX);
    let mut reply = StatusReply::empty(host.view_state(), selection.state(), count);
    match &selection {
        Selection::Single(info) => reply.body = StatusBody::Single(single_fields(host, info)),
        Selection::Range(range) => reply.body = StatusBody::Range(range_fields(host, range)?),
        Selection::None | Selection::List(_) => {}
    }
    Some(reply)
}

/// Key/value readback of the fields in `flags`. Fields that do not apply
/// to the selection are left out; an empty selection gives an empty map.
pub fn feedback(host: &dyn Host, flags: SpeechFlags) -> FeedbackReply {
    let mut reply = FeedbackReply::new();
    let (info, staff, tick) = match host.selection() {
        Selection::Single(info) => {
            let (staff, tick) = (info.staff, info.tick);
            (Some(info), staff, tick)
        }
        Selection::Range(range) => (None, range.first_staff, range.start),
        Selection::None | Selection::List(_) => return reply,
    };
    let ctx = context(host, staff, tick);

    for field in flags.fields() {
        let value = match field {
            FeedbackField::Note => info
                .as_ref()
                .filter(|i| i.kind == ElementType::Note)
                .and_then(|i| i.pitch)
                .map(|p| p.to_string()),
            FeedbackField::Duration => info
                .as_ref()
                .filter(|i| i.kind.is_chord_rest())
                .and_then(|i| i.duration)
                .map(|(d, _)| d.as_u8().to_string()),
            FeedbackField::Voice => info.as_ref().map(|i| i.voice.saturating_add(1).to_string()),
            FeedbackField::Measure => Some(ctx.measure.to_string()),
            FeedbackField::Beat => Some(ctx.beat.to_string()),
            FeedbackField::Staff => Some(ctx.staff.to_string()),
            FeedbackField::TimeSig => Some(ctx.sig.to_string()),
            FeedbackField::Clef => Some(ctx.clef.as_u8().to_string()),
            FeedbackField::Key => Some(ctx.key.get().to_string()),
            FeedbackField::Bpm => Some(ctx.bpm.to_string()),
        };
        if let Some(value) = value {
            reply.insert(field.code().to_string(), value);
        }
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::{ElementRef, HeadlessHost, Picked, Score};
    use odla_types::{ReplyKind, SelectionState, ViewState};

    fn note_host() -> HeadlessHost {
        let mut host = HeadlessHost::new(Score::single_staff(8));
        host.change_state(ViewState::NoteEntry);
        host.place_cursor(2, 0, 1);
        // Treble line 3 is C5
        host.add_pitch(42, false);
        host
    }

    #[test]
    fn empty_selection_is_header_only() {
        let host = HeadlessHost::new(Score::single_staff(4));
        let reply = collect_status(&host).unwrap();
        assert_eq!(reply.kind(), ReplyKind::NoElement);
        assert_eq!(reply.header.selection_state, SelectionState::None);
        assert_eq!(reply.header.selected_count, 0);
        assert!(feedback(&host, SpeechFlags(0x3FF)).is_empty());
    }

    #[test]
    fn single_note_fields() {
        let host = note_host();
        let reply = collect_status(&host).unwrap();
        let f = reply.single().unwrap();
        assert_eq!(reply.header.view_state, ViewState::NoteEntry);
        assert_eq!(f.element_type, ElementType::Note.as_u8());
        assert_eq!(f.note_pitch, 72);
        assert_eq!(f.duration, DurationType::Quarter.as_u8());
        assert_eq!(f.dots, 0);
        assert_eq!((f.measure, f.beat, f.staff, f.voice), (3, 2, 1, 1));
        assert_eq!((f.time_sig_num, f.time_sig_den), (4, 4));
        assert_eq!(f.bpm, 120);
    }

    #[test]
    fn rest_and_annotation_use_sentinels() {
        let mut host = HeadlessHost::new(Score::single_staff(4));
        host.select(Picked::Single(ElementRef::ChordRest {
            measure: 0,
            staff: 0,
            beat: 0,
        }));
        let f = *collect_status(&host).unwrap().single().unwrap();
        assert_eq!(f.element_type, ElementType::Rest.as_u8());
        assert_eq!(f.note_pitch, INVALID_PITCH);
        assert_eq!(f.note_accidental, 0);
        assert_eq!(f.duration, DurationType::Quarter.as_u8());

        let index = host.score_mut().annotate(ElementType::Dynamic, "mf", 0, 1920);
        host.select(Picked::Single(ElementRef::Annotation(index)));
        let f = *collect_status(&host).unwrap().single().unwrap();
        assert_eq!(f.note_pitch, INVALID_PITCH);
        assert_eq!(f.duration, DurationType::Invalid.as_u8());
        assert_eq!(f.dots, INVALID_DOTS);
        assert_eq!((f.measure, f.beat), (2, 1));
    }

    #[test]
    fn range_ends_on_previous_segment() {
        let mut host = HeadlessHost::new(Score::single_staff(10));
        host.select(Picked::Range {
            first: 1,
            last: 3,
            first_staff: 0,
            last_staff: 0,
        });
        let reply = collect_status(&host).unwrap();
        let r = reply.range().unwrap();
        assert_eq!((r.first_measure, r.first_beat), (2, 1));
        assert_eq!((r.last_measure, r.last_beat), (4, 4));
        assert_eq!((r.first_staff, r.last_staff), (1, 1));
        assert_eq!(reply.header.selected_count, 12);

        // Range to the end of the score
        host.select(Picked::Range {
            first: 8,
            last: 9,
            first_staff: 0,
            last_staff: 0,
        });
        let reply = collect_status(&host).unwrap();
        assert_eq!(reply.range().unwrap().last_measure, 10);
    }

    #[test]
    fn feedback_selects_requested_fields() {
        let host = note_host();
        let flags = SpeechFlags(
            FeedbackField::Note.bit() | FeedbackField::TimeSig.bit() | FeedbackField::Measure.bit(),
        );
        let reply = feedback(&host, flags);
        assert_eq!(reply.len(), 3);
        assert_eq!(reply["NOT"], "72");
        assert_eq!(reply["TIM"], "4/4");
        assert_eq!(reply["MEA"], "3");
    }
}
