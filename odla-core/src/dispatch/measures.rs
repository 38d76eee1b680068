use log::debug;

use odla_types::TimeSig;

use super::DispatchResult;
use crate::host::{ActionRegistry, Document, Host, PaletteElement, View};

/// Drop `numerator/denominator` at the input measure. Invalid fractions are
/// rejected before anything is touched.
pub(super) fn time_signature(numerator: i32, denominator: i32, host: &mut dyn Host) -> DispatchResult {
    let Some(sig) = TimeSig::new(numerator, denominator) else {
        debug!("ignoring time signature {}/{}", numerator, denominator);
        return DispatchResult::Handled;
    };
    let Some(measure) = host.input().measure else {
        return DispatchResult::Handled;
    };
    host.start_cmd();
    host.drop_at_measure(PaletteElement::time_sig(sig), measure);
    host.end_cmd();
    // Step off and back so the input cursor picks up the new layout
    host.trigger("next-chord");
    host.trigger("prev-chord");
    DispatchResult::Handled
}

pub(super) fn insert(count: i32, host: &mut dyn Host) -> DispatchResult {
    match usize::try_from(count) {
        Ok(count) if count > 0 => host.insert_measures(count),
        _ => debug!("ignoring insert of {} measures", count),
    }
    DispatchResult::Handled
}
