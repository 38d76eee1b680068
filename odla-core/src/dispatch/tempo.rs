use log::debug;

use odla_types::TempoPreset;

use super::DispatchResult;
use crate::host::{Document, Host, PaletteElement};

/// Add a metronome mark at the input position. A bpm of zero or less uses
/// `default_bpm`.
pub(super) fn insert(preset: i32, bpm: i32, default_bpm: u16, host: &mut dyn Host) -> DispatchResult {
    let Some(preset) = TempoPreset::from_index(preset) else {
        debug!("unknown tempo preset {}", preset);
        return DispatchResult::Handled;
    };
    if host.input().segment.is_none() {
        return DispatchResult::Handled;
    }
    let bpm = if bpm > 0 { bpm } else { i32::from(default_bpm) };

    host.start_cmd();
    host.add_at_input(PaletteElement::tempo(preset.markup(bpm), bpm));
    host.end_cmd();
    DispatchResult::Handled
}
