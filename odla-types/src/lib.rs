//! # odla-types
//!
//! Shared type definitions for the ODLA bridge.
//! This crate contains the command and status types used by odla-net and odla-core.

pub mod command;
pub mod notation;
pub mod status;

pub use command::{Command, CommandKind, StaffPressFlags, TempoPreset, ViewState};
pub use notation::{
    AccidentalType, ClefType, DurationType, ElementType, KeySignature, LayoutMode, Tick, TimeSig,
    DIVISION,
};
pub use status::{
    FeedbackField, FeedbackReply, RangeFields, ReplyKind, SelectionState, SingleFields,
    SpeechFlags, StatusBody, StatusHeader, StatusReply, INVALID_DOTS, INVALID_PITCH,
};
