#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod error;
pub mod receipt;
pub mod util;

#[cfg(test)]
pub(crate) mod fixtures;

pub use receipt::parser::{decode, is_valid};
