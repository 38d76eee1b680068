//! # odla-core
//!
//! The ODLA driver: turns decoded device commands into score-editor
//! operations and reports the resulting selection back to the device.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use odla_core::config::Config;
//! use odla_core::host::headless::{HeadlessHost, Score};
//! use odla_core::session::Session;
//!
//! let config = Config::load();
//! let mut host = HeadlessHost::new(Score::single_staff(32));
//! let mut session = Session::new(config.protocol(), config.driver_settings());
//!
//! // Bytes read from the device; every completed command is dispatched
//! for reply in session.handle_bytes(b"GOTO MEASURE 5\n", &mut host) {
//!     // write `reply` back to the device
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`host`]: collaborator traits the driver needs from the editor
//!   (`Document`, `View`, `ActionRegistry`, `PaletteTree`, `HostWindow`) and
//!   an in-memory `HeadlessHost`
//! - [`dispatch`]: `Driver::dispatch()`, the per-command state machine
//! - [`status`]: status and spoken-feedback replies built from the selection
//! - [`session`]: one peer's decoder and driver, bytes in and replies out
//! - [`config`]: TOML configuration loading (embedded defaults + user override)

pub mod config;
pub mod dispatch;
pub mod host;
pub mod session;
pub mod status;
