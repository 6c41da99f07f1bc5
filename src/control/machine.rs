use std::f64::consts::PI;

use tracing::{trace, warn};

use crate::frame::{self, FrameEvent};
use crate::gesture::{self, ExtractInput, History};

use super::commands::Command;
use super::events::{CommandSink, ControlEvent, ControlEventSink, RawSampleDiagnostic, RawSampleSink, StateSink};
use super::session::SessionId;
use super::state::{ControllerState, VerificationContext};
use super::tunables::Tunables;

const QUARTER_MARKS: [f64; 3] = [PI / 2.0, PI, 3.0 * PI / 2.0];
const QUARTER_EVENTS: [ControlEvent; 3] = [
    ControlEvent::VerifyIntent25,
    ControlEvent::VerifyIntent50,
    ControlEvent::VerifyIntent75,
];

/// The single-threaded, cooperative gesture core (spec sections 4.4, 5).
/// One call in, zero or more callback invocations out, no suspension.
pub struct Controller {
    state: ControllerState,
    tunables: Tunables,
    session: SessionId,
    sample_number: u64,
    history: History,
    current_abs_pos: f64,
    last_received_at: Option<u64>,

    state_sink: StateSink,
    control_sink: ControlEventSink,
    raw_sink: Option<RawSampleSink>,
    command_sink: CommandSink,
}

impl Controller {
    pub fn new(
        tunables: Tunables,
        state_sink: StateSink,
        control_sink: ControlEventSink,
        raw_sink: Option<RawSampleSink>,
        command_sink: CommandSink,
    ) -> Self {
        Self {
            state: ControllerState::Disconnected,
            tunables,
            session: SessionId::default(),
            sample_number: 0,
            history: History::default(),
            current_abs_pos: 0.0,
            last_received_at: None,
            state_sink,
            control_sink,
            raw_sink,
            command_sink,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn current_abs_pos(&self) -> f64 {
        self.current_abs_pos
    }

    pub fn begin_scanning(&mut self) {
        self.transition(ControllerState::Scanning);
    }

    pub fn begin_connecting(&mut self) {
        self.transition(ControllerState::Connecting);
    }

    /// Services discovered, notifications subscribed: settle into Connected then Idle.
    pub fn mark_connected(&mut self) {
        self.transition(ControllerState::Connected);
        self.transition(ControllerState::Idle);
    }

    /// Tears down state unconditionally, from any prior state.
    pub fn disconnect(&mut self) {
        self.state = ControllerState::Disconnected;
        (self.state_sink)(self.state);
        self.reset_session();
    }

    /// Feeds one raw notification payload through the frame router.
    pub fn on_payload(&mut self, payload: &[u8], now_ms: u64) {
        match frame::route(payload) {
            None => {}
            Some(FrameEvent::WaveDetected) => self.on_wave_detected(now_ms),
            Some(FrameEvent::Accelerometer(axes)) => {
                self.on_accelerometer(axes.x, axes.y, axes.z, now_ms)
            }
        }
    }

    fn on_wave_detected(&mut self, now_ms: u64) {
        if !self.state.is_idle() {
            warn!(state = %self.state, "wave-detected received outside Idle, ignoring");
            return;
        }

        let ctx = VerificationContext::begin(self.current_abs_pos, now_ms);
        (self.control_sink)(ControlEvent::ProvisionalWakeupIntent);
        self.transition(ControllerState::VerifyWakeup(ctx));
    }

    fn on_accelerometer(&mut self, raw_x: i16, raw_y: i16, raw_z: i16, now_ms: u64) {
        if !self.state.is_polling() {
            trace!(state = %self.state, "accelerometer sample received while not polling, ignored");
            return;
        }

        let gap_reset = match self.last_received_at {
            Some(prev) => now_ms.saturating_sub(prev) > self.tunables.session_gap_ms,
            None => false,
        };
        if gap_reset {
            self.session = self.session.next();
            self.sample_number = 0;
            self.history.reset();
        }

        let delta_ms = match self.last_received_at {
            Some(prev) if !gap_reset => Some(now_ms.saturating_sub(prev)),
            _ => None,
        };
        self.last_received_at = Some(now_ms);

        let extract_input = ExtractInput {
            state: self.state,
            session: self.session,
            sample_number: self.sample_number,
            raw_x,
            raw_y,
            raw_z,
            delta_ms,
            prev_abs_pos: self.current_abs_pos,
        };
        let output = gesture::extract(&extract_input, &mut self.history, &self.tunables);
        self.current_abs_pos = output.abs_pos;
        let window = output.window;

        if let Some(sink) = self.raw_sink.as_mut() {
            sink(RawSampleDiagnostic {
                session: self.session,
                raw_x,
                raw_y,
                raw_z,
                raw_scroll_pos: window.raw_scroll_pos,
                filtered_scroll_pos: window.filtered_scroll_pos,
                filtered_scroll_diff: window.filtered_scroll_diff,
                raw_net_g: window.raw_net_g,
                filtered_net_g: window.filtered_net_g,
                is_tap: window.is_tap,
                delta_ms,
            });
        }

        match self.state {
            ControllerState::UserInput => self.handle_user_input(window, now_ms),
            ControllerState::VerifyWakeup(ctx) => {
                self.handle_verification(ctx, window, delta_ms, now_ms, true)
            }
            ControllerState::VerifySelect(ctx) => {
                self.handle_verification(ctx, window, delta_ms, now_ms, false)
            }
            _ => unreachable!("is_polling() guarantees one of the three polling states"),
        }

        // One-outstanding-request backpressure: ask for the next sample only
        // after this one has been fully consumed.
        if self.state.is_polling() {
            (self.command_sink)(Command::GetAllRawData);
        }

        self.sample_number += 1;
    }

    fn handle_user_input(&mut self, window: gesture::SessionWindow, now_ms: u64) {
        if window.is_tap {
            let ctx = VerificationContext::begin(self.current_abs_pos, now_ms);
            (self.control_sink)(ControlEvent::ProvisionalSelectionIntent);
            self.transition(ControllerState::VerifySelect(ctx));
        } else if window.is_scroll_up {
            (self.control_sink)(ControlEvent::ScrollUp);
        } else if window.is_scroll_down {
            (self.control_sink)(ControlEvent::ScrollDown);
        }
    }

    fn handle_verification(
        &mut self,
        mut ctx: VerificationContext,
        window: gesture::SessionWindow,
        delta_ms: Option<u64>,
        now_ms: u64,
        is_wakeup: bool,
    ) {
        let fallback_state = if is_wakeup {
            ControllerState::Idle
        } else {
            ControllerState::UserInput
        };

        if self.current_abs_pos < ctx.verify_start_pos - self.tunables.scroll_cancel_threshold_rad {
            (self.control_sink)(ControlEvent::CancelIntent);
            self.transition(fallback_state);
            return;
        }

        if now_ms.saturating_sub(ctx.verify_start_time_ms) > self.tunables.intent_initial_ms {
            (self.control_sink)(ControlEvent::Timeout);
            self.transition(fallback_state);
            return;
        }

        let is_verification_scroll_up = window.filtered_net_g == 0.0
            && delta_ms.is_some_and(|ms| {
                let threshold = (self.tunables.scroll_event_threshold_rad_per_s * (ms as f64 / 1000.0))
                    .max(self.tunables.scroll_threshold_floor_rad);
                window.filtered_scroll_diff > threshold
            });

        if !is_verification_scroll_up {
            return;
        }

        let confirm_threshold = ctx.verify_start_pos + 2.0 * PI;
        if self.current_abs_pos >= confirm_threshold {
            let confirm_event = if is_wakeup {
                ControlEvent::ConfirmWakeupIntent
            } else {
                ControlEvent::ConfirmSelectionIntent
            };
            (self.control_sink)(confirm_event);

            let next_state = if is_wakeup {
                ControllerState::UserInput
            } else if self.tunables.verify_select_returns_to_idle {
                ControllerState::Idle
            } else {
                ControllerState::UserInput
            };
            self.transition(next_state);
            return;
        }

        let progressed = self.current_abs_pos - ctx.verify_start_pos;
        for i in 0..QUARTER_MARKS.len() {
            if !ctx.crossed[i] && progressed >= QUARTER_MARKS[i] {
                ctx.crossed[i] = true;
                ctx.verify_start_time_ms += self.tunables.intent_extra_ms;
                (self.control_sink)(QUARTER_EVENTS[i]);
            }
        }

        // In-place context update: still the same macro state, so no state-change callback.
        self.state = if is_wakeup {
            ControllerState::VerifyWakeup(ctx)
        } else {
            ControllerState::VerifySelect(ctx)
        };
    }

    fn transition(&mut self, new_state: ControllerState) {
        let old_state = self.state;
        self.sync_ring_modes(old_state, new_state);
        self.state = new_state;
        (self.state_sink)(new_state);
    }

    fn sync_ring_modes(&mut self, old: ControllerState, new: ControllerState) {
        if new.is_idle() && !old.is_idle() {
            (self.command_sink)(Command::EnableWave);
            (self.command_sink)(Command::WaitingForWave);
        } else if old.is_idle() && !new.is_idle() {
            (self.command_sink)(Command::DisableWave);
        }

        if new.is_polling() && !old.is_polling() {
            (self.command_sink)(Command::GetAllRawData);
        }
    }

    fn reset_session(&mut self) {
        self.session = self.session.next();
        self.sample_number = 0;
        self.history.reset();
        self.current_abs_pos = 0.0;
        self.last_received_at = None;
    }
}
