//! Newline-delimited text protocol.
//!
//! Each line is one command: optional `^` (enter note entry first) and `!`
//! (return to normal afterwards) markers, then a verb and its arguments.

use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use odla_types::{Command, CommandKind, StaffPressFlags, TempoPreset, ViewState};

/// Verbs that select a palette cell by name. The command text is
/// `<verb>:<argument>` in lower case.
const PALETTE_VERBS: [&str; 13] = [
    "CLEF",
    "BARS",
    "MARKER",
    "JUMP",
    "VOLTA",
    "LINE",
    "TRILL",
    "OTTAVA",
    "PEDAL",
    "HAIRPIN",
    "ARTICULATION",
    "ORNAMENT",
    "GRACE",
];

/// Argument-less verbs that map directly onto a host action.
fn simple_action(verb: &str) -> Option<&'static str> {
    match verb {
        "COPY" => Some("copy"),
        "PASTE" => Some("paste"),
        "UNDO" => Some("undo"),
        "REDO" => Some("redo"),
        "DELETE" => Some("delete"),
        "TIME-DELETE" => Some("time-delete"),
        "UPDIATONIC" => Some("up-diatonic"),
        "DOWNDIATONIC" => Some("down-diatonic"),
        "UPOCTAVE" => Some("pitch-up-octave"),
        "DOWNOCTAVE" => Some("pitch-down-octave"),
        _ => None,
    }
}

fn select_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^SELECT:\s*(\d+)\s*-\s*(\d+)$").expect("valid SELECT pattern")
    })
}

/// Parse one trimmed line. Returns `None` for empty or unrecognised lines.
pub fn parse_line(line: &str) -> Option<Command> {
    let mut rest = line.trim();
    let mut state_before = None;
    let mut state_after = None;
    loop {
        if let Some(r) = rest.strip_prefix('^') {
            state_before = Some(ViewState::NoteEntry);
            rest = r;
        } else if let Some(r) = rest.strip_prefix('!') {
            state_after = Some(ViewState::Normal);
            rest = r;
        } else {
            break;
        }
    }
    let rest = rest.trim_start();
    if rest.is_empty() {
        return None;
    }

    let mut cmd = parse_verb(rest)?;
    cmd.state_before = state_before;
    cmd.state_after = state_after;
    Some(cmd)
}

fn parse_verb(text: &str) -> Option<Command> {
    if let Some(action) = text.strip_prefix("cs::") {
        return non_empty(action).map(Command::action);
    }
    if let Some(action) = text.strip_prefix("sv::") {
        return non_empty(action).map(|a| Command::new(CommandKind::ViewCommand).with_text(a));
    }
    if let Some(action) = text.strip_prefix("ms::") {
        return non_empty(action).map(Command::action);
    }
    if let Some(key) = text.strip_prefix("pal::") {
        return non_empty(key).map(|k| Command::new(CommandKind::PaletteNamed).with_text(k));
    }
    if text.starts_with("SELECT:") {
        let caps = select_re().captures(text)?;
        let from = caps[1].parse().ok()?;
        let to = caps[2].parse().ok()?;
        return Some(Command::new(CommandKind::SelectMeasures).with_params(from, to));
    }

    let mut words = text.split_whitespace();
    let verb = words.next()?;
    let args: Vec<&str> = words.collect();

    match verb {
        "GOTO" => parse_goto(&args),
        "STFLN" => parse_staff_line(&args),
        "TEMPO" => parse_tempo(&args),
        "METRONOME" => match args.as_slice() {
            ["ON"] => Some(Command::new(CommandKind::Metronome).with_params(1, 0)),
            ["OFF"] => Some(Command::new(CommandKind::Metronome).with_params(0, 0)),
            _ => None,
        },
        "PLAY" => Some(Command::new(CommandKind::Play)),
        "PAUSE" => Some(Command::new(CommandKind::Pause)),
        "STOP" => Some(Command::new(CommandKind::Stop)),
        "INTERVAL" => {
            let n: i32 = args.first()?.parse().ok()?;
            Some(Command::action(format!("interval{}", n)))
        }
        "VOICE" => {
            let n: u8 = args.first()?.parse().ok()?;
            Some(Command::action(format!("voice-{}", n)))
        }
        _ => {
            if let Some(action) = simple_action(verb) {
                return args.is_empty().then(|| Command::action(action));
            }
            if PALETTE_VERBS.contains(&verb) {
                let name = args.join("_");
                if name.is_empty() {
                    return None;
                }
                return Some(
                    Command::new(CommandKind::PaletteNamed)
                        .with_text(format!("{}:{}", verb, name).to_lowercase()),
                );
            }
            None
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

fn parse_goto(args: &[&str]) -> Option<Command> {
    let target = match args {
        ["START"] => 1,
        ["END"] => i32::MAX,
        ["MEASURE", n] => n.parse().ok()?,
        _ => return None,
    };
    Some(Command::new(CommandKind::Goto).with_params(target, 0))
}

fn parse_staff_line(args: &[&str]) -> Option<Command> {
    let (line, options) = args.split_first()?;
    let line: i32 = line.parse().ok()?;
    let mut flags = StaffPressFlags::default();
    for opt in options {
        match *opt {
            "CHORD" => flags.keep_chord = true,
            "SLUR" => flags.slur = true,
            _ => return None,
        }
    }
    Some(Command::new(CommandKind::StaffPressed).with_params(line, flags.bits()))
}

fn parse_tempo(args: &[&str]) -> Option<Command> {
    let (shape, rest) = args.split_first()?;
    if let Some(preset) = TempoPreset::from_name(shape) {
        // Zero asks the driver for its default tempo
        let bpm: i32 = match rest.first() {
            Some(bpm) => bpm.parse().ok()?,
            None => 0,
        };
        return Some(Command::new(CommandKind::Tempo).with_params(preset.index(), bpm));
    }
    if shape.starts_with("TEXT_") || shape.starts_with("MOD_") {
        let mut cmd = Command::new(CommandKind::PaletteNamed)
            .with_text(format!("tempo:{}", shape.to_lowercase()));
        if let Some(bpm) = rest.first() {
            let bpm: i32 = bpm.parse().ok()?;
            cmd.par1 = bpm;
        }
        return Some(cmd);
    }
    None
}

/// Longest partial line held while waiting for its newline.
pub const MAX_LINE_LEN: usize = 1 << 20;

/// Splits a byte stream into lines, holding back a trailing partial line.
#[derive(Debug, Default)]
pub struct LineDecoder {
    partial: Vec<u8>,
    /// Set after an overlong line was dropped; its tail is skipped up to
    /// the next newline.
    skipping: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the commands of every completed line, in order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Command> {
        self.partial.extend_from_slice(bytes);
        let mut commands = Vec::new();

        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=pos).collect();
            if std::mem::take(&mut self.skipping) {
                continue;
            }
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            match parse_line(&line) {
                Some(cmd) => commands.push(cmd),
                None => {
                    if !line.trim().is_empty() {
                        debug!("ignoring unrecognised line {:?}", line.trim());
                    }
                }
            }
        }

        if self.partial.len() > MAX_LINE_LEN {
            warn!("dropping {} bytes of text without a newline", self.partial.len());
            self.partial.clear();
            self.skipping = true;
        }
        commands
    }

    pub fn pending(&self) -> usize {
        self.partial.len()
    }
}
