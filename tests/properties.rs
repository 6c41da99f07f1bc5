//! Property-based checks against the testable properties enumerated in the
//! gesture-recognition design. Property 2 (no events survive `disconnect()`
//! until the next `connect()`) is covered by a unit test in
//! `control::machine` instead of a proptest, since it concerns a sequencing
//! invariant rather than a numeric one.

use std::f64::consts::PI;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use ringd::control::{Command, ControlEvent, Controller, ControllerState, Tunables};
use ringd::frame;
use ringd::gesture::{self, wrap_delta, ExtractInput, History};

fn encode_accel(x: i16, y: i16, z: i16) -> [u8; 16] {
    let mut f = [0u8; 16];
    f[0] = 0xA1;
    f[1] = 0x03;
    let yv = (y as i32 & 0xFFF) as u16;
    f[2] = (yv >> 4) as u8;
    f[3] = (yv & 0x0F) as u8;
    let zv = (z as i32 & 0xFFF) as u16;
    f[4] = (zv >> 4) as u8;
    f[5] = (zv & 0x0F) as u8;
    let xv = (x as i32 & 0xFFF) as u16;
    f[6] = (xv >> 4) as u8;
    f[7] = (xv & 0x0F) as u8;
    f
}

proptest! {
    /// Property 1: any payload whose length isn't 16 produces no FrameEvent.
    #[test]
    fn prop1_wrong_length_never_routes(bytes in prop::collection::vec(any::<u8>(), 0..40)) {
        prop_assume!(bytes.len() != 16);
        prop_assert_eq!(frame::route(&bytes), None);
    }

    /// Property 3: in UserInput, is_tap and (is_scroll_up || is_scroll_down)
    /// are never simultaneously true, across arbitrary raw axis inputs.
    #[test]
    fn prop3_tap_and_scroll_are_exclusive(
        x0 in -2048i32..=2047, y0 in -2048i32..=2047, z0 in -2048i32..=2047,
        x1 in -2048i32..=2047, y1 in -2048i32..=2047, z1 in -2048i32..=2047,
        x2 in -2048i32..=2047, y2 in -2048i32..=2047, z2 in -2048i32..=2047,
        delta_ms in 10u64..300,
    ) {
        let t = Tunables::default();
        let mut h = History::default();

        let session = ringd::control::SessionId::default();

        gesture::extract(
            &ExtractInput { state: ControllerState::UserInput, session, sample_number: 0, raw_x: x0 as i16, raw_y: y0 as i16, raw_z: z0 as i16, delta_ms: None, prev_abs_pos: 0.0 },
            &mut h, &t,
        );
        gesture::extract(
            &ExtractInput { state: ControllerState::UserInput, session, sample_number: 1, raw_x: x1 as i16, raw_y: y1 as i16, raw_z: z1 as i16, delta_ms: Some(delta_ms), prev_abs_pos: 0.0 },
            &mut h, &t,
        );
        let out = gesture::extract(
            &ExtractInput { state: ControllerState::UserInput, session, sample_number: 2, raw_x: x2 as i16, raw_y: y2 as i16, raw_z: z2 as i16, delta_ms: Some(delta_ms), prev_abs_pos: 0.0 },
            &mut h, &t,
        );

        prop_assert!(!(out.window.is_tap && (out.window.is_scroll_up || out.window.is_scroll_down)));
    }

    /// Property 4: during verification, absolute position accumulates exactly
    /// the sum of emitted filtered_scroll_diff values.
    #[test]
    fn prop4_abs_pos_tracks_sum_of_diffs(
        angles in prop::collection::vec(-PI..PI, 2..12),
    ) {
        let t = Tunables::default();
        let mut h = History::default();
        let mut abs_pos = 0.0f64;
        let mut expected_sum = 0.0f64;

        for (i, angle) in angles.iter().enumerate() {
            let x = (angle.cos() * 512.0) as i16;
            let y = (angle.sin() * 512.0) as i16;
            let out = gesture::extract(
                &ExtractInput {
                    state: ControllerState::VerifyWakeup(ringd::control::VerificationContext::begin(0.0, 0)),
                    session: ringd::control::SessionId::default(),
                    sample_number: i as u64,
                    raw_x: x, raw_y: y, raw_z: 0,
                    delta_ms: Some(30),
                    prev_abs_pos: abs_pos,
                },
                &mut h, &t,
            );
            expected_sum += out.window.filtered_scroll_diff;
            abs_pos = out.abs_pos;
        }

        prop_assert!((abs_pos - expected_sum).abs() < 1e-9);
    }

    /// Property 5: wrap-aware delta always lies in (-pi, pi] and is antisymmetric mod 2*pi.
    #[test]
    fn prop5_wrap_delta_bounds_and_antisymmetry(c in -PI..=PI, p in -PI..=PI) {
        let fwd = wrap_delta(c, p);
        let back = wrap_delta(p, c);
        prop_assert!(fwd > -PI - 1e-9 && fwd <= PI + 1e-9);
        let sum_mod = (fwd + back).rem_euclid(2.0 * PI);
        prop_assert!(sum_mod < 1e-6 || (2.0 * PI - sum_mod) < 1e-6);
    }

    /// Property 7: every emitted command's checksum byte matches the sum of
    /// the preceding 15 bytes mod 256.
    #[test]
    fn prop7_command_checksum_always_valid(variant in 0u8..4) {
        let command = match variant {
            0 => Command::EnableWave,
            1 => Command::DisableWave,
            2 => Command::WaitingForWave,
            _ => Command::GetAllRawData,
        };
        let bytes = command.to_bytes();
        let sum: u32 = bytes[0..15].iter().map(|&b| b as u32).sum();
        prop_assert_eq!((sum % 256) as u8, bytes[15]);
    }

    /// Property 6: exactly one of Confirm*, Cancel*, or Timeout terminates a
    /// verification episode, never zero or more than one, across randomised
    /// rotation sequences.
    #[test]
    fn prop6_exactly_one_terminal_event_per_episode(
        steps in prop::collection::vec(-1.0f64..1.0, 1..40),
    ) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let e = events.clone();

        let mut controller = Controller::new(
            Tunables::default(),
            Box::new(|_state| {}),
            Box::new(move |event| e.lock().unwrap().push(event)),
            None,
            Box::new(|_cmd| {}),
        );
        controller.mark_connected();

        let mut wave = [0u8; 16];
        wave[0] = 0x02;
        wave[1] = 0x02;
        controller.on_payload(&wave, 0);

        let mut t = 30u64;
        let mut angle = 0.0f64;
        for step in steps {
            angle += step;
            controller.on_payload(&encode_accel((angle.cos() * 512.0) as i16, (angle.sin() * 512.0) as i16, 0), t);
            t += 30;
            if !matches!(controller.state(), ControllerState::VerifyWakeup(_)) {
                break;
            }
        }
        // force a timeout if still pending, to guarantee exactly one terminal event fires
        if matches!(controller.state(), ControllerState::VerifyWakeup(_)) {
            controller.on_payload(&encode_accel((angle.cos() * 512.0) as i16, (angle.sin() * 512.0) as i16, 0), t + 10_000);
        }

        let terminal_count = events.lock().unwrap().iter().filter(|e| {
            matches!(e, ControlEvent::ConfirmWakeupIntent | ControlEvent::CancelIntent | ControlEvent::Timeout)
        }).count();
        prop_assert_eq!(terminal_count, 1);
    }
}
