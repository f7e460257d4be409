mod bus;
mod discovery;
mod topics;

pub use bus::*;
pub use discovery::*;
pub use topics::*;
