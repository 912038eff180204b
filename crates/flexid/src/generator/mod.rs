mod baseline;
mod flexible;
mod interface;
mod mutex;

pub use baseline::*;
pub use flexible::*;
pub use interface::*;
pub(crate) use mutex::*;
