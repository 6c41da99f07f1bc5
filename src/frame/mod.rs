mod router;
mod sample;

pub use router::{route, FrameEvent};
pub use sample::{decode, RawAxes};
