use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use odla_types::{Command, CommandKind, ElementType};

use super::DispatchResult;
use crate::host::{Document, Host, PaletteElement, PaletteTree, Selection};

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid digits pattern"))
}

/// First run of digits in a palette command name, e.g. `palette-tempo-96`.
fn bpm_in_text(text: &str) -> Option<i32> {
    digits_re()
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .filter(|bpm| *bpm > 0)
}

fn resolve(command: &Command, host: &dyn Host) -> Option<PaletteElement> {
    match command.kind {
        CommandKind::PaletteNamed => host.palette_named(command.text()),
        _ => host.palette_cell(command.par1, command.par2),
    }
}

/// Place a palette element relative to the current selection.
pub(super) fn apply(command: &Command, host: &mut dyn Host) -> DispatchResult {
    if host.selection() == Selection::None {
        debug!("palette command without a selection");
        return DispatchResult::Handled;
    }
    let Some(mut element) = resolve(command, host) else {
        debug!("no palette element for {:?} {:?}", command.kind, command.text);
        return DispatchResult::Handled;
    };

    if element.kind.is_measure_anchored() {
        // Anchored elements go at the start of the input measure
        let Some(measure) = host.input().measure else {
            return DispatchResult::Handled;
        };
        host.start_cmd();
        host.drop_at_measure(element, measure);
        host.end_cmd();
        return DispatchResult::Handled;
    }

    let is_tempo = element.kind == ElementType::TempoText;
    if is_tempo {
        let bpm = match command.kind {
            CommandKind::PaletteNamed => Some(command.par1).filter(|bpm| *bpm > 0),
            _ => bpm_in_text(command.text()),
        };
        if let Some(bpm) = bpm {
            debug!("palette tempo {} bpm", bpm);
            element.set_tempo(bpm);
        }
    }

    host.start_cmd();
    host.apply_to_selection(element);
    if !is_tempo && command.text().contains("bracket") {
        host.bracket_selected_accidentals();
    }
    host.end_cmd();
    DispatchResult::Handled
}
