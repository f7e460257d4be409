mod identity;
mod liveness;
mod registry;

pub use identity::*;
pub use liveness::*;
pub use registry::*;
