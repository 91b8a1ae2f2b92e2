//! Windows-specific implementations

pub mod window;
