#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod base36;
mod config;
mod error;
mod generator;
mod layout;
mod rand;
mod time;

pub use crate::base36::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::layout::*;
pub use crate::rand::*;
pub use crate::time::*;
