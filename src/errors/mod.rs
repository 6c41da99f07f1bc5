mod core;
mod kinds;
mod tracing;

pub use self::core::{Error, Result};
pub use kinds::ErrorKind;
pub use self::tracing::{debug, error, info, trace, warn};
