//! Linux-specific implementations

pub mod window;
