//! External API integrations

pub mod qr_render;

pub use qr_render::{CodeRenderer, QrRenderClient};
