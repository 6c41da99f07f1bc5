mod commands;
mod events;
mod machine;
mod session;
mod state;
mod tunables;

pub use commands::Command;
pub use events::{
    tracing_control_sink, tracing_raw_sink, tracing_state_sink, CommandSink, ControlEvent,
    ControlEventSink, RawSampleDiagnostic, RawSampleSink, StateSink,
};
pub use machine::Controller;
pub use session::SessionId;
pub use state::{ControllerState, VerificationContext};
pub use tunables::{Tunables, TunablesOverride};
