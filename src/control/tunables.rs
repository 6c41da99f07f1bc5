use serde::{Deserialize, Serialize};

/// Compile-time defaults from spec section 6, overridable from config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunables {
    pub intent_initial_ms: u64,
    pub intent_extra_ms: u64,
    pub scroll_event_threshold_rad_per_s: f64,
    pub scroll_threshold_floor_rad: f64,
    pub scroll_cancel_threshold_rad: f64,
    pub rest_band_g: f64,
    pub impact_band_g: f64,
    pub extreme_band_g: f64,
    pub session_gap_ms: u64,
    pub verify_select_returns_to_idle: bool,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            intent_initial_ms: 2000,
            intent_extra_ms: 500,
            scroll_event_threshold_rad_per_s: 5.0,
            scroll_threshold_floor_rad: 0.4,
            scroll_cancel_threshold_rad: std::f64::consts::FRAC_PI_4,
            rest_band_g: 0.50,
            impact_band_g: 1.25,
            extreme_band_g: 3.0,
            session_gap_ms: 2000,
            verify_select_returns_to_idle: true,
        }
    }
}

impl Tunables {
    pub fn with_overrides(mut self, overrides: &TunablesOverride) -> Self {
        if let Some(v) = overrides.intent_initial_ms {
            self.intent_initial_ms = v;
        }
        if let Some(v) = overrides.intent_extra_ms {
            self.intent_extra_ms = v;
        }
        if let Some(v) = overrides.scroll_event_threshold_rad_per_s {
            self.scroll_event_threshold_rad_per_s = v;
        }
        if let Some(v) = overrides.scroll_threshold_floor_rad {
            self.scroll_threshold_floor_rad = v;
        }
        if let Some(v) = overrides.scroll_cancel_threshold_rad {
            self.scroll_cancel_threshold_rad = v;
        }
        if let Some(v) = overrides.rest_band_g {
            self.rest_band_g = v;
        }
        if let Some(v) = overrides.impact_band_g {
            self.impact_band_g = v;
        }
        if let Some(v) = overrides.extreme_band_g {
            self.extreme_band_g = v;
        }
        if let Some(v) = overrides.session_gap_ms {
            self.session_gap_ms = v;
        }
        if let Some(v) = overrides.verify_select_returns_to_idle {
            self.verify_select_returns_to_idle = v;
        }
        self
    }
}

/// Sparse tunable overrides loaded from the config file; `None` keeps the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TunablesOverride {
    pub intent_initial_ms: Option<u64>,
    pub intent_extra_ms: Option<u64>,
    pub scroll_event_threshold_rad_per_s: Option<f64>,
    pub scroll_threshold_floor_rad: Option<f64>,
    pub scroll_cancel_threshold_rad: Option<f64>,
    pub rest_band_g: Option<f64>,
    pub impact_band_g: Option<f64>,
    pub extreme_band_g: Option<f64>,
    pub session_gap_ms: Option<u64>,
    pub verify_select_returns_to_idle: Option<bool>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_matches_spec_constants() {
        let t = Tunables::default();
        assert_eq!(t.intent_initial_ms, 2000);
        assert_eq!(t.intent_extra_ms, 500);
        assert_eq!(t.scroll_event_threshold_rad_per_s, 5.0);
        assert_eq!(t.scroll_threshold_floor_rad, 0.4);
        assert!((t.scroll_cancel_threshold_rad - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn overrides_apply_selectively() {
        let overrides = TunablesOverride {
            scroll_event_threshold_rad_per_s: Some(7.5),
            ..Default::default()
        };
        let t = Tunables::default().with_overrides(&overrides);
        assert_eq!(t.scroll_event_threshold_rad_per_s, 7.5);
        assert_eq!(t.intent_initial_ms, 2000);
    }
}
