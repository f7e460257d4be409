mod measurement;
mod packet;

pub use measurement::*;
pub use packet::*;
