//! macOS-specific implementations

pub mod window;
