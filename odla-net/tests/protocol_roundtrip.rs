//! Wire roundtrip tests for every command kind and reply variant.

use odla_net::binary::{
    decode_command, decode_status, encode_command, encode_status, CommandLayout, COMMON_LEN,
    RANGE_LEN, SINGLE_LEN,
};
use odla_net::map::{encode_feedback, MapMessage};
use odla_net::{InboundDecoder, Protocol};
use odla_types::*;

fn sample_command(kind: CommandKind) -> Command {
    let cmd = Command::new(kind).with_params(-7, 1 << 20);
    match kind {
        CommandKind::Action | CommandKind::ViewCommand => cmd.with_text("next-chord"),
        CommandKind::PaletteNamed | CommandKind::Palette => cmd.with_text("clef:bass"),
        _ => cmd,
    }
}

#[test]
fn test_every_kind_roundtrips_basic_layout() {
    for kind in CommandKind::ALL {
        let cmd = sample_command(kind).with_state_before(ViewState::NoteEntry);
        let bytes = encode_command(&cmd, CommandLayout::BASIC).unwrap();
        let (decoded, used) = decode_command(&bytes, CommandLayout::BASIC).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded.kind, kind);
        assert_eq!(decoded.par1, -7);
        assert_eq!(decoded.par2, 1 << 20);
        assert_eq!(decoded.text, cmd.text);
        assert_eq!(decoded.state_before, Some(ViewState::NoteEntry));
        assert_eq!(decoded.state_after, None);
    }
}

#[test]
fn test_every_kind_roundtrips_post_state_layout() {
    for kind in CommandKind::ALL {
        let cmd = sample_command(kind).with_state_after(ViewState::Normal);
        let bytes = encode_command(&cmd, CommandLayout::WITH_POST_STATE).unwrap();
        let (decoded, _) = decode_command(&bytes, CommandLayout::WITH_POST_STATE).unwrap();
        assert_eq!(decoded, cmd);
    }
}

#[test]
fn test_utf8_text_survives() {
    let cmd = Command::new(CommandKind::PaletteNamed).with_text("tempo:allegro ♩");
    let bytes = encode_command(&cmd, CommandLayout::BASIC).unwrap();
    let (decoded, _) = decode_command(&bytes, CommandLayout::BASIC).unwrap();
    assert_eq!(decoded.text(), "tempo:allegro ♩");
}

#[test]
fn test_binary_decoder_handles_back_to_back_commands() {
    let mut buf = Vec::new();
    for kind in [CommandKind::Goto, CommandKind::Play, CommandKind::Stop] {
        buf.extend(encode_command(&Command::new(kind), CommandLayout::BASIC).unwrap());
    }
    let mut dec = InboundDecoder::new(Protocol::Binary);
    let kinds: Vec<_> = dec.push(&buf).into_iter().map(|i| i.command.kind).collect();
    assert_eq!(kinds, vec![CommandKind::Goto, CommandKind::Play, CommandKind::Stop]);
}

#[test]
fn test_reply_lengths_match_variants() {
    let header = StatusHeader {
        view_state: ViewState::NoteEntry,
        selection_state: SelectionState::Single,
        selected_count: 1,
    };
    let single = StatusReply {
        header,
        body: StatusBody::Single(SingleFields {
            element_type: ElementType::Note.as_u8(),
            note_pitch: 60,
            note_accidental: AccidentalType::Sharp.as_u8(),
            duration: DurationType::Quarter.as_u8(),
            dots: 1,
            measure: 12,
            beat: 3,
            staff: 1,
            clef: ClefType::Treble.as_u8(),
            time_sig_num: 3,
            time_sig_den: 4,
            key_signature: -2,
            voice: 1,
            bpm: 132,
        }),
    };
    let bytes = encode_status(&single).unwrap();
    assert_eq!(bytes.len(), SINGLE_LEN);
    assert_eq!(bytes[0] as usize, SINGLE_LEN);
    assert_eq!(bytes[1], ReplyKind::SingleElement.as_u8());
    assert_eq!(decode_status(&bytes).unwrap(), single);

    let empty = StatusReply::empty(ViewState::Normal, SelectionState::None, 0);
    let bytes = encode_status(&empty).unwrap();
    assert_eq!(bytes[0] as usize, COMMON_LEN);
    assert_eq!(bytes.len(), COMMON_LEN);

    let range = StatusReply {
        header: StatusHeader {
            selection_state: SelectionState::Range,
            ..header
        },
        body: StatusBody::Range(RangeFields {
            first_measure: 2,
            last_measure: 4,
            first_beat: 1,
            last_beat: 4,
            first_staff: 1,
            last_staff: 2,
        }),
    };
    let bytes = encode_status(&range).unwrap();
    assert_eq!(bytes[0] as usize, RANGE_LEN);
    assert_eq!(decode_status(&bytes).unwrap(), range);
}

#[test]
fn test_truncated_reply_is_rejected() {
    let reply = StatusReply {
        header: StatusHeader {
            view_state: ViewState::Normal,
            selection_state: SelectionState::Range,
            selected_count: 4,
        },
        body: StatusBody::Range(RangeFields {
            first_measure: 1,
            last_measure: 1,
            first_beat: 1,
            last_beat: 1,
            first_staff: 1,
            last_staff: 1,
        }),
    };
    let bytes = encode_status(&reply).unwrap();
    assert!(decode_status(&bytes[..RANGE_LEN - 1]).is_err());
}

#[test]
fn test_feedback_reply_is_a_framed_map() {
    let mut reply = FeedbackReply::new();
    reply.insert("MEA".into(), "5".into());
    reply.insert("BPM".into(), "120".into());
    let frame = encode_feedback(&reply).unwrap();

    let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    assert_eq!(len, frame.len() - 4);
    let decoded: MapMessage = serde_json::from_slice(&frame[4..]).unwrap();
    assert_eq!(decoded["MEA"], "5");
    assert_eq!(decoded["BPM"], "120");
}
