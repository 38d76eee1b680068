use log::debug;

use odla_types::ViewState;

use super::{DispatchResult, Driver};
use crate::host::{ActionRegistry, Host, View};

impl Driver {
    /// Play while already playing drops back to note entry at the playhead.
    pub(super) fn play(&mut self, host: &mut dyn Host) -> DispatchResult {
        if host.is_checked("play") {
            host.change_state(ViewState::NoteEntry);
        } else {
            host.trigger("play");
        }
        self.paused = false;
        DispatchResult::Handled
    }

    /// Pause toggles `play`, but only while playing or already paused.
    pub(super) fn pause(&mut self, host: &mut dyn Host) -> DispatchResult {
        if host.is_checked("play") || self.paused {
            host.trigger("play");
            self.paused = !self.paused;
        }
        DispatchResult::Handled
    }

    pub(super) fn stop(&mut self, host: &mut dyn Host) -> DispatchResult {
        host.trigger("stop");
        self.paused = false;
        DispatchResult::Handled
    }
}

/// 0 turns the metronome off, 1 on, anything else toggles it.
pub(super) fn metronome(value: i32, host: &mut dyn Host) -> DispatchResult {
    let checked = match value {
        0 => false,
        1 => true,
        _ => !host.is_checked("metronome"),
    };
    if !host.set_checked("metronome", checked) {
        debug!("host has no metronome action");
    }
    DispatchResult::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverSettings;
    use crate::host::headless::{HeadlessHost, Score};
    use odla_types::{Command, CommandKind};

    fn run(driver: &mut Driver, host: &mut HeadlessHost, kind: CommandKind) {
        driver.dispatch(&Command::new(kind), host);
    }

    #[test]
    fn pause_resumes_and_play_enters_note_entry() {
        let mut host = HeadlessHost::new(Score::single_staff(4));
        let mut driver = Driver::new(DriverSettings::default());

        // Pause while stopped does nothing
        run(&mut driver, &mut host, CommandKind::Pause);
        assert!(!host.is_checked("play"));
        assert!(!driver.paused());

        run(&mut driver, &mut host, CommandKind::Play);
        assert!(host.is_checked("play"));

        run(&mut driver, &mut host, CommandKind::Pause);
        assert!(!host.is_checked("play"));
        assert!(driver.paused());

        run(&mut driver, &mut host, CommandKind::Pause);
        assert!(host.is_checked("play"));
        assert!(!driver.paused());

        run(&mut driver, &mut host, CommandKind::Play);
        assert_eq!(host.view_state(), ViewState::NoteEntry);
        assert!(host.is_checked("play"));
    }

    #[test]
    fn stop_clears_pause() {
        let mut host = HeadlessHost::new(Score::single_staff(4));
        let mut driver = Driver::new(DriverSettings::default());
        run(&mut driver, &mut host, CommandKind::Play);
        run(&mut driver, &mut host, CommandKind::Pause);
        run(&mut driver, &mut host, CommandKind::Stop);
        assert!(!driver.paused());
        assert!(!host.is_checked("play"));
    }

    #[test]
    fn metronome_set_is_idempotent() {
        let mut host = HeadlessHost::new(Score::single_staff(1));
        let mut driver = Driver::new(DriverSettings::default());
        let off = Command::new(CommandKind::Metronome).with_params(0, 0);
        driver.dispatch(&off, &mut host);
        driver.dispatch(&off, &mut host);
        assert!(!host.is_checked("metronome"));

        let toggle = Command::new(CommandKind::Metronome).with_params(-1, 0);
        driver.dispatch(&toggle, &mut host);
        assert!(host.is_checked("metronome"));
        driver.dispatch(&toggle, &mut host);
        assert!(!host.is_checked("metronome"));
    }
}
