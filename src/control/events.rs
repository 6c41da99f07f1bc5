use tracing::trace;

use super::commands::Command;
use super::session::SessionId;
use super::state::ControllerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    ScrollUp,
    ScrollDown,
    ProvisionalWakeupIntent,
    ProvisionalSelectionIntent,
    VerifyIntent25,
    VerifyIntent50,
    VerifyIntent75,
    ConfirmWakeupIntent,
    ConfirmSelectionIntent,
    CancelIntent,
    Timeout,
}

/// Raw-sample diagnostics, optional and never load-bearing for control flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSampleDiagnostic {
    pub session: SessionId,
    pub raw_x: i16,
    pub raw_y: i16,
    pub raw_z: i16,
    pub raw_scroll_pos: f64,
    pub filtered_scroll_pos: f64,
    pub filtered_scroll_diff: f64,
    pub raw_net_g: f64,
    pub filtered_net_g: f64,
    pub is_tap: bool,
    pub delta_ms: Option<u64>,
}

pub type StateSink = Box<dyn FnMut(ControllerState) + Send>;
pub type ControlEventSink = Box<dyn FnMut(ControlEvent) + Send>;
pub type RawSampleSink = Box<dyn FnMut(RawSampleDiagnostic) + Send>;
pub type CommandSink = Box<dyn FnMut(Command) + Send>;

pub fn tracing_state_sink() -> StateSink {
    Box::new(|state| trace!(state = %state, "state changed"))
}

pub fn tracing_control_sink() -> ControlEventSink {
    Box::new(|event| trace!(event = ?event, "control event"))
}

pub fn tracing_raw_sink() -> RawSampleSink {
    Box::new(|sample| {
        trace!(
            session = sample.session.value(),
            raw_x = sample.raw_x,
            raw_y = sample.raw_y,
            raw_z = sample.raw_z,
            raw_net_g = sample.raw_net_g,
            filtered_net_g = sample.filtered_net_g,
            filtered_scroll_diff = sample.filtered_scroll_diff,
            is_tap = sample.is_tap,
            delta_ms = sample.delta_ms,
            "raw sample",
        )
    })
}
