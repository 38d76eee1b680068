use log::debug;

use odla_types::{ClefType, Command};

use super::{DispatchResult, Driver};
use crate::host::{Document, Host, View};

/// Diatonic step of a staff line (half-space units, 0 = top line) under a
/// clef. `None` when the line is too far off the staff to name a step.
pub fn rel_step(line: i32, clef: ClefType) -> Option<i32> {
    clef.pitch_offset().checked_sub(line)
}

impl Driver {
    /// A press on the device's staff lines: enter a note at the input cursor,
    /// or pick a string on tablature.
    pub(super) fn staff_pressed(&mut self, command: &Command, host: &mut dyn Host) -> DispatchResult {
        let line = command.par1;
        let flags = command.staff_flags();
        if !flags.slur {
            host.clear_slur();
        }

        let input = host.input();
        let Some(tick) = input.segment else {
            debug!("staff press outside note entry");
            return DispatchResult::Handled;
        };

        if let Some(staff) = host.staff(input.staff).filter(|s| s.is_tab) {
            let Ok(line) = usize::try_from(line) else {
                return DispatchResult::Handled;
            };
            if line >= staff.strings {
                return DispatchResult::Handled;
            }
            let string = if staff.upside_down {
                staff.strings - 1 - line
            } else {
                line
            };
            host.set_input_string(string);
            return DispatchResult::Handled;
        }

        let clef = host.clef_at(input.staff, tick);
        let Some(step) = rel_step(line, clef) else {
            debug!("staff line {} is out of range", line);
            return DispatchResult::Handled;
        };
        host.start_cmd();
        if !self.editing_chord && flags.keep_chord && !input.at_last_segment {
            // First note of a new chord goes on the next position
            host.view_cmd("next-chord");
        }
        host.add_pitch(step, flags.keep_chord);
        host.end_cmd();

        self.editing_chord = flags.keep_chord;

        if flags.slur && !host.input().slur_active {
            host.view_cmd("add-slur");
        }
        DispatchResult::Handled
    }
}
