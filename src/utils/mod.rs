mod misc;

pub use misc::{get_config_path, mono_time_ms};
