#![doc = include_str!("../README.md")]

mod error;
mod generator;
mod id;
mod mono_clock;
mod node;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::mono_clock::*;
pub use crate::node::*;
pub use crate::time::*;
