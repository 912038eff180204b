mod atomic;
mod id;

pub use atomic::*;
pub use id::*;
