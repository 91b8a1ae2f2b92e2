//! Cross-platform window query contract

use crate::WindowRecord;

/// Owner pid reported when a window cannot be resolved to a live process.
pub const NO_OWNER: i64 = -1;

/// Window lookup failure types. The exported functions flatten all of
/// these to `NO_OWNER` or an empty list; the distinction only feeds
/// debug traces.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("No display server connection")]
    DisplayUnavailable,

    #[error("Window list unavailable")]
    ListUnavailable,

    #[error("Window not found: {0}")]
    WindowNotFound(i64),

    #[error("No owning process recorded for window {0}")]
    OwnerUnknown(i64),
}

/// Trait for platform-specific window queries, one implementation per
/// target OS, selected at compile time.
pub trait WindowQuery {
    /// Process id owning `window_id`.
    fn owning_pid(&self, window_id: i64) -> Result<i64, WindowError>;

    /// Visible, titled top-level windows owned by `pid`, in native
    /// enumeration order.
    fn windows_for_pid(&self, pid: i64) -> Result<Vec<WindowRecord>, WindowError>;
}

/// Stand-in for targets without a supported windowing API: every window
/// is unresolvable and every process owns no windows.
#[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
pub struct UnsupportedBackend;

#[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
impl UnsupportedBackend {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
impl WindowQuery for UnsupportedBackend {
    fn owning_pid(&self, window_id: i64) -> Result<i64, WindowError> {
        Err(WindowError::WindowNotFound(window_id))
    }

    fn windows_for_pid(&self, pid: i64) -> Result<Vec<WindowRecord>, WindowError> {
        let _ = pid;
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_handle() {
        assert_eq!(
            WindowError::WindowNotFound(71).to_string(),
            "Window not found: 71"
        );
        assert_eq!(
            WindowError::OwnerUnknown(9).to_string(),
            "No owning process recorded for window 9"
        );
        assert_eq!(
            WindowError::DisplayUnavailable.to_string(),
            "No display server connection"
        );
        assert_eq!(
            WindowError::ListUnavailable.to_string(),
            "Window list unavailable"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WindowError>();
    }
}
