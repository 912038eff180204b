mod preset;
mod resolve;

pub use preset::*;
pub use resolve::*;
