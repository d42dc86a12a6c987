//! Shared types and models for the Pesticide Stock Management Platform
//!
//! This crate contains types shared between the backend, frontend (via WASM),
//! and other components of the system.

pub mod code;
pub mod models;
pub mod types;
pub mod validation;

pub use code::*;
pub use models::*;
pub use types::*;
pub use validation::*;
