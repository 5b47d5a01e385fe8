#![warn(clippy::all)]

pub mod config;
pub mod console;
mod errors;
pub mod link;
pub mod notify;
pub mod outputs;
pub mod terminal;

pub use crate::errors::*;
