//! Domain models for the Pesticide Stock Management Platform

mod code;
mod medicine;
mod scan;
mod sequence;

pub use code::*;
pub use medicine::*;
pub use scan::*;
pub use sequence::*;
