#[allow(clippy::module_inception)]
mod link;

pub use link::{DiscoveredRing, Link};
