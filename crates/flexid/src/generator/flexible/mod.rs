mod lock;
mod mixer;
mod state;

pub use lock::*;
