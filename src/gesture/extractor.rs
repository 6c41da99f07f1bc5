use std::f64::consts::PI;

use crate::control::{ControllerState, SessionId, Tunables};

use super::history::History;
use super::window::SessionWindow;

/// Wrap-aware angular delta from `p` to `c`, both in `[-pi, pi]`. Result lies
/// in `(-pi, pi]` and preserves the sign of motion across the +/-pi seam.
pub fn wrap_delta(c: f64, p: f64) -> f64 {
    let same_sign = (c >= 0.0 && p >= 0.0) || (c <= 0.0 && p <= 0.0);

    if same_sign {
        c - p
    } else if c <= 0.0 && p >= 0.0 {
        if p - c < PI {
            c - p
        } else {
            2.0 * PI + (c - p)
        }
    } else if c - p < PI {
        c - p
    } else {
        (c - p) - 2.0 * PI
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Rest,
    Impact,
    Ambiguous,
}

fn classify_band(raw_net_g: f64, t: &Tunables) -> Band {
    if raw_net_g < t.rest_band_g {
        Band::Rest
    } else if raw_net_g > t.impact_band_g {
        Band::Impact
    } else {
        Band::Ambiguous
    }
}

pub struct ExtractInput {
    pub state: ControllerState,
    pub session: SessionId,
    pub sample_number: u64,
    pub raw_x: i16,
    pub raw_y: i16,
    pub raw_z: i16,
    pub delta_ms: Option<u64>,
    pub prev_abs_pos: f64,
}

pub struct ExtractOutput {
    pub window: SessionWindow,
    pub abs_pos: f64,
}

/// Classifies one sample and updates `history` in place. `input.state` must
/// be one of the three polling states; the caller is responsible for never
/// calling this outside of them.
pub fn extract(input: &ExtractInput, history: &mut History, tunables: &Tunables) -> ExtractOutput {
    let x = input.raw_x as f64 / 512.0;
    let y = input.raw_y as f64 / 512.0;
    let z = input.raw_z as f64 / 512.0;

    let magnitude = (x * x + y * y + z * z).sqrt();
    let raw_net_g = (magnitude - 1.0).abs();
    let raw_scroll_pos = y.atan2(x);

    let prev_scroll_pos = history.scroll_pos_newest();
    let is_verification = matches!(
        input.state,
        ControllerState::VerifyWakeup(_) | ControllerState::VerifySelect(_)
    );
    let is_bootstrap = !is_verification && input.sample_number < 2;

    let filtered_scroll_pos;
    let filtered_scroll_diff;
    let filtered_net_g;
    let abs_pos;

    if is_verification {
        // Verification always treats samples as rest: full-speed rotation tracking.
        filtered_scroll_pos = raw_scroll_pos;
        filtered_scroll_diff = if input.sample_number == 0 {
            0.0
        } else {
            wrap_delta(raw_scroll_pos, prev_scroll_pos)
        };
        filtered_net_g = 0.0;
        abs_pos = input.prev_abs_pos + filtered_scroll_diff;
    } else if is_bootstrap {
        filtered_scroll_pos = raw_scroll_pos;
        filtered_scroll_diff = if input.sample_number == 0 {
            0.0
        } else {
            wrap_delta(raw_scroll_pos, prev_scroll_pos)
        };
        filtered_net_g = raw_net_g.max(tunables.rest_band_g);
        abs_pos = raw_scroll_pos;
    } else {
        match classify_band(raw_net_g, tunables) {
            Band::Rest => {
                filtered_scroll_pos = raw_scroll_pos;
                filtered_scroll_diff = wrap_delta(raw_scroll_pos, prev_scroll_pos);
                filtered_net_g = 0.0;
                abs_pos = raw_scroll_pos;
            }
            Band::Impact => {
                filtered_scroll_pos = prev_scroll_pos;
                filtered_scroll_diff = 0.0;
                filtered_net_g = raw_net_g;
                abs_pos = input.prev_abs_pos;
            }
            Band::Ambiguous => {
                filtered_scroll_pos = prev_scroll_pos;
                filtered_scroll_diff = 0.0;
                filtered_net_g = 0.0;
                abs_pos = input.prev_abs_pos;
            }
        }
    }

    let net_g_oldest = history.net_g_oldest();
    let net_g_newest = history.net_g_newest();

    let (is_tap, is_scroll_up, is_scroll_down) = if !is_verification && input.sample_number >= 2 {
        let tap = net_g_newest > tunables.extreme_band_g
            || (net_g_oldest == 0.0 && net_g_newest > tunables.impact_band_g && filtered_net_g == 0.0);

        if tap {
            (true, false, false)
        } else {
            let threshold = match input.delta_ms {
                Some(ms) => (tunables.scroll_event_threshold_rad_per_s * (ms as f64 / 1000.0))
                    .max(tunables.scroll_threshold_floor_rad),
                None => tunables.scroll_threshold_floor_rad,
            };
            (false, filtered_scroll_diff > threshold, filtered_scroll_diff < -threshold)
        }
    } else {
        (false, false, false)
    };

    history.push(filtered_net_g, filtered_scroll_pos, filtered_scroll_diff);

    ExtractOutput {
        window: SessionWindow {
            session: input.session,
            raw_net_g,
            raw_scroll_pos,
            filtered_scroll_pos,
            filtered_scroll_diff,
            filtered_net_g,
            is_tap,
            is_scroll_up,
            is_scroll_down,
        },
        abs_pos,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn input(state: ControllerState, sample_number: u64, raw: (i16, i16, i16), delta_ms: Option<u64>, prev_abs_pos: f64) -> ExtractInput {
        ExtractInput {
            state,
            session: SessionId::default(),
            sample_number,
            raw_x: raw.0,
            raw_y: raw.1,
            raw_z: raw.2,
            delta_ms,
            prev_abs_pos,
        }
    }

    #[test]
    fn wrap_delta_stays_in_range_and_is_antisymmetric() {
        let cases = [(0.1, -0.1), (3.0, -3.0), (-3.1, 3.1), (0.0, 0.0), (1.5, 1.4)];
        for (c, p) in cases {
            let fwd = wrap_delta(c, p);
            let back = wrap_delta(p, c);
            assert!(fwd > -PI - 1e-9 && fwd <= PI + 1e-9, "fwd={fwd}");
            assert!((fwd + back).rem_euclid(2.0 * PI) < 1e-9 || ((fwd + back).rem_euclid(2.0 * PI) - 2.0 * PI).abs() < 1e-9);
        }
    }

    #[test]
    fn bootstrap_clamps_net_g_and_zeroes_first_diff() {
        let t = Tunables::default();
        let mut h = History::default();
        // sample 0: rest, magnitude ~1g so raw_net_g ~ 0
        let out0 = extract(&input(ControllerState::UserInput, 0, (512, 0, 0), None, 0.0), &mut h, &t);
        assert_eq!(out0.window.filtered_scroll_diff, 0.0);
        assert!(out0.window.filtered_net_g >= t.rest_band_g);

        let out1 = extract(&input(ControllerState::UserInput, 1, (512, 50, 0), Some(30), out0.abs_pos), &mut h, &t);
        assert!(out1.window.filtered_net_g >= t.rest_band_g);
    }

    #[test]
    fn rest_band_zeroes_net_g_and_tracks_scroll_pos() {
        let t = Tunables::default();
        let mut h = History::default();
        extract(&input(ControllerState::UserInput, 0, (512, 0, 0), None, 0.0), &mut h, &t);
        extract(&input(ControllerState::UserInput, 1, (512, 0, 0), Some(30), 0.0), &mut h, &t);
        let out = extract(&input(ControllerState::UserInput, 2, (512, 0, 0), Some(30), 0.0), &mut h, &t);
        assert_eq!(out.window.filtered_net_g, 0.0);
    }

    #[test]
    fn impact_band_freezes_scroll_pos_and_zeroes_diff() {
        let t = Tunables::default();
        let mut h = History::default();
        extract(&input(ControllerState::UserInput, 0, (512, 0, 0), None, 0.0), &mut h, &t);
        extract(&input(ControllerState::UserInput, 1, (512, 0, 0), Some(30), 0.0), &mut h, &t);
        // big magnitude spike: raw_net_g way above 1.25
        let out = extract(&input(ControllerState::UserInput, 2, (2000, 0, 0), Some(30), 0.0), &mut h, &t);
        assert_eq!(out.window.filtered_scroll_diff, 0.0);
        assert!(out.window.filtered_net_g > t.impact_band_g);
        assert_eq!(out.window.filtered_scroll_pos, 0.0);
    }

    #[test]
    fn scroll_up_detected_above_threshold() {
        let t = Tunables::default();
        let mut h = History::default();
        // seed two bootstrap samples at angle 0; delta_ms=50 keeps the rate
        // term (5.0 * 0.05 = 0.25) below the 0.4 rad floor, so the floor governs
        extract(&input(ControllerState::UserInput, 0, (512, 0, 0), None, 0.0), &mut h, &t);
        extract(&input(ControllerState::UserInput, 1, (512, 0, 0), Some(50), 0.0), &mut h, &t);
        let angle = 0.41f64;
        let (y, x) = (angle.sin() * 512.0, angle.cos() * 512.0);
        let out = extract(
            &input(ControllerState::UserInput, 2, (x as i16, y as i16, 0), Some(50), 0.0),
            &mut h,
            &t,
        );
        assert!(out.window.is_scroll_up);
        assert!(!out.window.is_scroll_down);
        assert!(!out.window.is_tap);
    }

    #[test]
    fn scroll_edge_exactly_at_threshold_does_not_fire() {
        let t = Tunables::default();
        let mut h = History::default();
        extract(&input(ControllerState::UserInput, 0, (512, 0, 0), None, 0.0), &mut h, &t);
        extract(&input(ControllerState::UserInput, 1, (512, 0, 0), Some(50), 0.0), &mut h, &t);
        let angle = 0.40f64;
        let (y, x) = (angle.sin() * 512.0, angle.cos() * 512.0);
        let out = extract(
            &input(ControllerState::UserInput, 2, (x as i16, y as i16, 0), Some(50), 0.0),
            &mut h,
            &t,
        );
        assert!(!out.window.is_scroll_up);
    }
}
