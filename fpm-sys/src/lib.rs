#![warn(clippy::all)]

pub mod consts;
mod packet;
mod port;

pub use crate::{consts::*, packet::*, port::*};
