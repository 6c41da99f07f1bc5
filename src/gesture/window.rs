/// Derived features for one sample, rebuilt fresh each time (spec section 3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionWindow {
    pub session: crate::control::SessionId,
    pub raw_net_g: f64,
    pub raw_scroll_pos: f64,
    pub filtered_scroll_pos: f64,
    pub filtered_scroll_diff: f64,
    pub filtered_net_g: f64,
    pub is_tap: bool,
    pub is_scroll_up: bool,
    pub is_scroll_down: bool,
}
