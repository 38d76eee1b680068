//! End-to-end device exchanges against the headless host.

mod common;

use common::*;
use odla_core::host::headless::{ElementRef, Picked};
use odla_core::host::{ActionRegistry, Document, View};
use odla_net::binary::COMMON_LEN;
use odla_net::Protocol;
use odla_types::{
    Command, CommandKind, DurationType, ElementType, ReplyKind, SelectionState, TimeSig, ViewState,
    INVALID_PITCH,
};

#[test]
fn goto_measure_replies_with_empty_selection() {
    let mut host = host(10);
    let mut session = session(Protocol::Binary);

    let reply = only(send_binary(
        &mut session,
        &mut host,
        &Command::new(CommandKind::Goto).with_params(5, 0),
    ));
    assert_eq!(reply.kind(), ReplyKind::NoElement);
    assert_eq!(reply.header.selection_state, SelectionState::None);
    assert_eq!(reply.header.selected_count, 0);
    assert_eq!(host.focused_measure(), 4);

    send_lines(&mut session, &mut host, &["GOTO END"]);
    assert_eq!(host.focused_measure(), 9);
    send_lines(&mut session, &mut host, &["GOTO MEASURE 0"]);
    assert_eq!(host.focused_measure(), 0);
}

#[test]
fn goto_leaves_no_undo_entry() {
    let mut host = host(10);
    let mut session = session(Protocol::Text);
    send_lines(&mut session, &mut host, &["GOTO MEASURE 3"]);
    assert_eq!(host.undo_depth(), 0);
}

#[test]
fn select_measures_reports_range() {
    let mut host = host(10);
    let mut session = session(Protocol::Text);

    let reply = only(send_lines(&mut session, &mut host, &["SELECT:2-4"]));
    assert_eq!(reply.header.selection_state, SelectionState::Range);
    let range = reply.range().unwrap();
    assert_eq!((range.first_measure, range.last_measure), (2, 4));
    assert_eq!((range.first_beat, range.last_beat), (1, 4));
    assert_eq!((range.first_staff, range.last_staff), (1, 1));

    // A missing end measure extends to the last one
    let reply = only(send_lines(&mut session, &mut host, &["SELECT:8-20"]));
    let range = reply.range().unwrap();
    assert_eq!((range.first_measure, range.last_measure), (8, 10));

    // A missing start measure changes nothing
    let reply = only(send_lines(&mut session, &mut host, &["SELECT:11-12"]));
    assert_eq!(reply.range().unwrap().first_measure, 8);
}

#[test]
fn entered_note_is_reported() {
    let mut host = host(4);
    let mut session = session(Protocol::Text);

    let reply = only(send_lines(&mut session, &mut host, &["^STFLN 3"]));
    assert_eq!(reply.header.view_state, ViewState::NoteEntry);
    assert_eq!(reply.header.selection_state, SelectionState::Single);
    let note = reply.single().unwrap();
    assert_eq!(note.element_type, ElementType::Note.as_u8());
    assert_eq!(note.note_pitch, 72);
    assert_eq!(note.duration, DurationType::Quarter.as_u8());
    assert_eq!((note.measure, note.beat, note.staff, note.voice), (1, 1, 1, 1));

    // Leaving note entry afterwards
    let reply = only(send_lines(&mut session, &mut host, &["!STFLN 2"]));
    assert_eq!(reply.header.view_state, ViewState::Normal);
    assert_eq!(reply.single().unwrap().note_pitch, 74);
    assert_eq!(reply.single().unwrap().beat, 2);
}

#[test]
fn rest_selection_has_no_pitch() {
    let mut host = host(4);
    host.select(Picked::Single(ElementRef::ChordRest {
        measure: 1,
        staff: 0,
        beat: 2,
    }));
    let mut session = session(Protocol::Text);
    let reply = only(send_lines(&mut session, &mut host, &["cs::copy"]));
    let rest = reply.single().unwrap();
    assert_eq!(rest.element_type, ElementType::Rest.as_u8());
    assert_eq!(rest.note_pitch, INVALID_PITCH);
    assert_eq!((rest.measure, rest.beat), (2, 3));
}

#[test]
fn chord_is_built_across_presses() {
    let mut host = host(4);
    let mut session = session(Protocol::Text);

    send_lines(&mut session, &mut host, &["^STFLN 5 CHORD"]);
    assert!(session.driver().editing_chord());
    // The new chord starts one position on
    assert_eq!(host.cursor_slot(), Some((0, 1)));

    send_lines(&mut session, &mut host, &["STFLN 3 CHORD"]);
    let pitches: Vec<u8> = host.score().slot(0, 0, 1).unwrap().notes.iter().map(|n| n.pitch).collect();
    assert_eq!(pitches, vec![69, 72]);
    assert!(session.driver().editing_chord());

    send_lines(&mut session, &mut host, &["STFLN 2"]);
    assert!(!session.driver().editing_chord());
    assert_eq!(host.cursor_slot(), Some((0, 2)));
    let next = host.score().slot(0, 0, 2).unwrap();
    assert_eq!(next.notes.len(), 1);
    assert_eq!(next.notes[0].pitch, 74);
    assert_eq!(host.score().slot(0, 0, 1).unwrap().notes.len(), 2);
}

#[test]
fn slur_press_starts_one_slur() {
    let mut host = host(4);
    let mut session = session(Protocol::Text);
    send_lines(&mut session, &mut host, &["^STFLN 3 SLUR"]);
    assert!(host.input().slur_active);
    send_lines(&mut session, &mut host, &["STFLN 4"]);
    assert!(!host.input().slur_active);
}

#[test]
fn staff_press_outside_note_entry_is_ignored() {
    let mut host = host(4);
    let mut session = session(Protocol::Text);
    let reply = only(send_lines(&mut session, &mut host, &["STFLN 3"]));
    assert_eq!(reply.kind(), ReplyKind::NoElement);
    assert!(host.score().slot(0, 0, 0).unwrap().is_rest());
}

#[test]
fn staff_line_far_off_the_staff_is_ignored() {
    let mut host = host(4);
    let mut binary = session(Protocol::Binary);
    let mut session = session(Protocol::Text);
    let replies = send_lines(
        &mut session,
        &mut host,
        &["^STFLN -2147483648", "STFLN -2147483000", "STFLN 2147483647"],
    );
    assert_eq!(replies.len(), 3);
    assert!(host.score().slot(0, 0, 0).unwrap().is_rest());

    let press = Command::new(CommandKind::StaffPressed).with_params(i32::MIN, 1);
    only(send_binary(&mut binary, &mut host, &press));
    assert!(host.score().slot(0, 0, 0).unwrap().is_rest());
    assert_eq!(host.undo_depth(), 0);
}

#[test]
fn invalid_time_signature_changes_nothing() {
    let mut host = host(4);
    let mut session = session(Protocol::Binary);
    let enter = Command::new(CommandKind::StaffPressed)
        .with_params(3, 0)
        .with_state_before(ViewState::NoteEntry);
    let before = only(send_binary(&mut session, &mut host, &enter));
    let score = host.score().clone();

    let bad = Command::new(CommandKind::TimeSignature).with_params(3, 6);
    let after = only(send_binary(&mut session, &mut host, &bad));
    assert_eq!(before, after);
    assert_eq!(host.score(), &score);

    let good = Command::new(CommandKind::TimeSignature).with_params(3, 4);
    send_binary(&mut session, &mut host, &good);
    assert_eq!(host.score().measure(0).unwrap().sig, TimeSig::new(3, 4).unwrap());
    assert_eq!(host.score().measure(0).unwrap().beats(), 3);
}

#[test]
fn metronome_off_is_idempotent() {
    let mut host = host(4);
    let mut session = session(Protocol::Text);
    let replies = send_lines(&mut session, &mut host, &["METRONOME OFF", "METRONOME OFF"]);
    assert_eq!(replies.len(), 2);
    assert!(!host.is_checked("metronome"));
    send_lines(&mut session, &mut host, &["METRONOME ON"]);
    assert!(host.is_checked("metronome"));
}

#[test]
fn tempo_uses_default_bpm_without_one() {
    let mut host = host(4);
    let mut session = session(Protocol::Text);
    send_lines(&mut session, &mut host, &["^TEMPO QUARTER 96"]);
    assert_eq!(host.score().tempo_at(0), 96.0);
    send_lines(&mut session, &mut host, &["TEMPO HALF"]);
    assert_eq!(host.score().tempo_at(0), 120.0);
    let marks = host
        .score()
        .annotations()
        .iter()
        .filter(|a| a.kind == ElementType::TempoText)
        .count();
    assert_eq!(marks, 2);
}

#[test]
fn palette_needs_selection() {
    let mut host = host(4);
    let mut session = session(Protocol::Text);
    send_lines(&mut session, &mut host, &["pal::dynamic:mf"]);
    assert!(host.score().annotations().is_empty());

    send_lines(&mut session, &mut host, &["^STFLN 3", "pal::dynamic:mf"]);
    let mf = &host.score().annotations()[0];
    assert_eq!((mf.kind, mf.tick), (ElementType::Dynamic, 0));
}

#[test]
fn key_signature_drops_at_input_measure() {
    let mut host = host(4);
    let mut session = session(Protocol::Text);
    send_lines(&mut session, &mut host, &["^!STFLN 3"]);
    assert_eq!(host.view_state(), ViewState::Normal);
    let reply = only(send_lines(&mut session, &mut host, &["pal::keysig:2sharps"]));
    assert_eq!(reply.single().unwrap().key_signature, 2);
}

#[test]
fn play_pause_over_text() {
    let mut host = host(4);
    let mut session = session(Protocol::Text);
    send_lines(&mut session, &mut host, &["PLAY", "PAUSE"]);
    assert!(!host.is_checked("play"));
    assert!(session.driver().paused());
    send_lines(&mut session, &mut host, &["PAUSE"]);
    assert!(host.is_checked("play"));
    send_lines(&mut session, &mut host, &["STOP"]);
    assert!(!host.is_checked("play"));
    assert!(!session.driver().paused());
}

#[test]
fn closed_score_gets_no_reply() {
    let mut host = host(4);
    host.set_document_open(false);
    let mut session = session(Protocol::Binary);
    assert!(send_binary(&mut session, &mut host, &Command::new(CommandKind::Play)).is_empty());
}

#[test]
fn unknown_action_gets_no_reply() {
    let mut host = host(4);
    let mut session = session(Protocol::Text);
    assert!(send_lines(&mut session, &mut host, &["cs::frobnicate"]).is_empty());
    let raw = session.handle_bytes(b"cs::undo\n", &mut host);
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].len(), COMMON_LEN);
}

#[test]
fn map_feedback_only_when_requested() {
    let mut host = host(4);
    let mut session = session(Protocol::Map);

    let replies = send_map(
        &mut session,
        &mut host,
        &[("STATE", "NOTE_ENTRY"), ("COM", "staff-pressed"), ("PAR1", "3"), ("PAR2", "0")],
    );
    assert!(replies.is_empty());

    let replies = send_map(
        &mut session,
        &mut host,
        &[("COM", ""), ("SpeechFlags", "7")],
    );
    assert_eq!(replies.len(), 1);
    let fb = &replies[0];
    assert_eq!(fb.len(), 3);
    assert_eq!(fb["NOT"], "72");
    assert_eq!(fb["DUR"], DurationType::Quarter.as_u8().to_string());
    assert_eq!(fb["MEA"], "1");
}

#[test]
fn map_feedback_for_empty_selection_is_empty() {
    let mut host = host(4);
    let mut session = session(Protocol::Map);
    let replies = send_map(&mut session, &mut host, &[("COM", "metronome"), ("SpeechFlags", "1023")]);
    assert_eq!(replies.len(), 1);
    assert!(replies[0].is_empty());
    assert!(host.is_checked("metronome"));
}
