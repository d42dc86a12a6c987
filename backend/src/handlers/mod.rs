//! HTTP request handlers

pub mod codes;
pub mod health;
pub mod medicines;
pub mod reporting;
pub mod scan;

pub use codes::*;
pub use health::*;
pub use medicines::*;
pub use reporting::*;
pub use scan::*;
