use log::debug;

use super::DispatchResult;
use crate::host::{Document, Host, MeasureRef, View};

/// The measure a goto lands on: `requested` clamped to `[1, total]`.
/// `None` for an empty score.
pub fn goto_target(requested: i32, total: usize) -> Option<usize> {
    if total == 0 {
        return None;
    }
    let requested = usize::try_from(requested).unwrap_or(0);
    Some(requested.clamp(1, total))
}

pub(super) fn goto(requested: i32, host: &mut dyn Host) -> DispatchResult {
    let Some(target) = goto_target(requested, host.measure_count()) else {
        return DispatchResult::Handled;
    };
    host.start_cmd();
    host.search_measure(target);
    host.end_cmd();
    DispatchResult::Handled
}

/// Walk `steps` measure links forward.
fn walk(host: &dyn Host, from: MeasureRef, steps: usize) -> Option<MeasureRef> {
    (0..steps).try_fold(from, |m, _| host.next_measure(m))
}

/// Select one-based measures `from..=to` on every staff. A missing `to`
/// extends the selection to the last measure.
pub(super) fn select_measures(from: i32, to: i32, host: &mut dyn Host) -> DispatchResult {
    let Ok(from) = usize::try_from(from) else {
        return DispatchResult::Handled;
    };
    if !host.search_measure(from) {
        debug!("select from missing measure {}", from);
        return DispatchResult::Handled;
    }
    let Some(first) = host.first_measure().and_then(|m| walk(host, m, from - 1)) else {
        return DispatchResult::Handled;
    };

    let to = usize::try_from(to).unwrap_or(0);
    let last = if host.search_measure(to) {
        walk(host, first, to.saturating_sub(from))
    } else {
        None
    };
    let Some(last) = last.or_else(|| host.last_measure()) else {
        return DispatchResult::Handled;
    };

    let staves = host.staff_count();
    host.select_range(first, last, 0, staves.saturating_sub(1));
    DispatchResult::Handled
}
