/// Data valid only while the controller is in `VerifyWakeup`/`VerifySelect`;
/// carrying it as enum payload rather than as optional fields on the
/// controller makes the spec's "valid iff" invariant a compile-time fact
/// instead of a runtime one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationContext {
    pub verify_start_pos: f64,
    pub verify_start_time_ms: u64,
    /// Whether pi/2, pi, 3*pi/2 of progress have already been reported this episode.
    pub crossed: [bool; 3],
}

impl VerificationContext {
    pub fn begin(current_abs_pos: f64, now_ms: u64) -> Self {
        Self {
            verify_start_pos: current_abs_pos,
            verify_start_time_ms: now_ms,
            crossed: [false; 3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerState {
    Scanning,
    Connecting,
    Connected,
    Idle,
    VerifyWakeup(VerificationContext),
    UserInput,
    VerifySelect(VerificationContext),
    Disconnected,
}

impl ControllerState {
    pub fn is_idle(self) -> bool {
        matches!(self, ControllerState::Idle)
    }

    /// Raw-data polling is active iff state is one of these three (spec section 3).
    pub fn is_polling(self) -> bool {
        matches!(
            self,
            ControllerState::UserInput
                | ControllerState::VerifyWakeup(_)
                | ControllerState::VerifySelect(_)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ControllerState::Scanning => "Scanning",
            ControllerState::Connecting => "Connecting",
            ControllerState::Connected => "Connected",
            ControllerState::Idle => "Idle",
            ControllerState::VerifyWakeup(_) => "VerifyWakeup",
            ControllerState::UserInput => "UserInput",
            ControllerState::VerifySelect(_) => "VerifySelect",
            ControllerState::Disconnected => "Disconnected",
        }
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
