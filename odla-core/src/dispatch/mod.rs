mod measures;
mod navigation;
mod note_entry;
mod palette;
mod tempo;
mod transport;

use log::debug;

use odla_types::{Command, CommandKind, LayoutMode};

use crate::config::DriverSettings;
use crate::host::{ActionRegistry, Document, Host, HostWindow, View};

pub use navigation::goto_target;
pub use note_entry::rel_step;

/// Substrings of navigation actions that follow the playhead while playing.
const PLAY_FOLLOW: [&str; 4] = ["next-chord", "prev-chord", "next-measure", "prev-measure"];

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// No document or view was open; the command was dropped.
    NoHost,
    /// The named action does not exist.
    Unknown,
    Handled,
}

impl DispatchResult {
    /// Whether a status reply follows.
    pub fn wants_reply(self) -> bool {
        self == DispatchResult::Handled
    }
}

/// Applies device commands to a host. Carries the little state that spans
/// commands: whether a chord is being built and whether playback is paused.
#[derive(Debug, Clone)]
pub struct Driver {
    settings: DriverSettings,
    editing_chord: bool,
    paused: bool,
}

impl Driver {
    pub fn new(settings: DriverSettings) -> Self {
        Self {
            settings,
            editing_chord: false,
            paused: false,
        }
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    pub fn editing_chord(&self) -> bool {
        self.editing_chord
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Run one command against the host.
    pub fn dispatch(&mut self, command: &Command, host: &mut dyn Host) -> DispatchResult {
        if !host.has_document() || !host.has_view() {
            debug!("no open score, dropping {:?}", command.kind);
            return DispatchResult::NoHost;
        }
        if self.settings.raise_window {
            host.raise();
        }

        let mut command = command.clone();
        follow_playback(&mut command, host);
        remap_for_tab(&mut command, host);
        debug!("dispatch {:?} {} {} {:?}", command.kind, command.par1, command.par2, command.text);

        if let Some(state) = command.state_before {
            host.change_state(state);
            host.process_events();
        }

        let result = match command.kind {
            CommandKind::Play => self.play(host),
            CommandKind::Pause => self.pause(host),
            CommandKind::Stop => self.stop(host),
            CommandKind::Metronome => transport::metronome(command.par1, host),
            CommandKind::Goto => navigation::goto(command.par1, host),
            CommandKind::SelectMeasures => navigation::select_measures(command.par1, command.par2, host),
            CommandKind::StaffPressed => self.staff_pressed(&command, host),
            CommandKind::Palette | CommandKind::PaletteNamed => palette::apply(&command, host),
            CommandKind::Tempo => tempo::insert(command.par1, command.par2, self.settings.default_bpm, host),
            CommandKind::TimeSignature => measures::time_signature(command.par1, command.par2, host),
            CommandKind::InsertMeasures => measures::insert(command.par1, host),
            CommandKind::LineView => {
                host.set_layout_mode(LayoutMode::Line);
                DispatchResult::Handled
            }
            CommandKind::PageView => {
                host.set_layout_mode(LayoutMode::Page);
                DispatchResult::Handled
            }
            CommandKind::Action => run_action(command.text(), host, false),
            CommandKind::ViewCommand => run_action(command.text(), host, true),
        };
        if result != DispatchResult::Handled {
            return result;
        }

        if let Some(state) = command.state_after {
            host.change_state(state);
        }
        host.process_events();
        DispatchResult::Handled
    }
}

/// While playing, chord and measure steps move the playhead instead of the
/// selection and leave the view state alone.
fn follow_playback(command: &mut Command, host: &dyn Host) {
    if !matches!(command.kind, CommandKind::Action | CommandKind::ViewCommand) || !host.is_checked("play") {
        return;
    }
    let name = command.text();
    if name.starts_with("play-") || !PLAY_FOLLOW.iter().any(|p| name.contains(p)) {
        return;
    }
    command.text = Some(format!("play-{}", name));
    command.state_before = None;
}

/// On tablature, chord up/down moves between strings.
fn remap_for_tab(command: &mut Command, host: &dyn Host) {
    if !matches!(command.kind, CommandKind::Action | CommandKind::ViewCommand) {
        return;
    }
    let Some(staff) = host.staff(host.input().staff).filter(|s| s.is_tab) else {
        return;
    };
    let above = match command.text() {
        "up-chord" => !staff.upside_down,
        "down-chord" => staff.upside_down,
        _ => return,
    };
    command.text = Some(if above { "string-above" } else { "string-below" }.to_string());
}

/// An empty name only carries the view-state transition.
fn run_action(name: &str, host: &mut dyn Host, through_view: bool) -> DispatchResult {
    if name.is_empty() {
        return DispatchResult::Handled;
    }
    if !host.has_action(name) {
        debug!("unknown action {}", name);
        return DispatchResult::Unknown;
    }
    if through_view {
        host.view_cmd(name);
    } else {
        host.trigger(name);
    }
    DispatchResult::Handled
}
