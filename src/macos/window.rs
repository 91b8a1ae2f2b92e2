//! macOS window queries backed by the CoreGraphics window list

use crate::window::{WindowError, WindowQuery};
use crate::WindowRecord;
use core_foundation::array::CFArray;
use core_foundation::base::{CFType, TCFType};
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::display::{
    kCGNullWindowID, kCGWindowListExcludeDesktopElements, kCGWindowListOptionIncludingWindow,
    kCGWindowListOptionOnScreenOnly, CGWindowID, CGWindowListCopyWindowInfo, CGWindowListOption,
};

/// Layer shared by ordinary application windows; menus and overlay
/// chrome report other layers.
const APP_WINDOW_LAYER: i64 = 0;

pub struct CoreGraphicsBackend;

impl CoreGraphicsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl WindowQuery for CoreGraphicsBackend {
    fn owning_pid(&self, window_id: i64) -> Result<i64, WindowError> {
        let list = copy_window_info(kCGWindowListOptionIncludingWindow, window_id as CGWindowID)
            .ok_or(WindowError::ListUnavailable)?;
        let info = list.get(0).ok_or(WindowError::WindowNotFound(window_id))?;
        dict_i64(&info, "kCGWindowOwnerPID").ok_or(WindowError::OwnerUnknown(window_id))
    }

    fn windows_for_pid(&self, pid: i64) -> Result<Vec<WindowRecord>, WindowError> {
        let list = copy_window_info(
            kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements,
            kCGNullWindowID,
        )
        .ok_or(WindowError::ListUnavailable)?;

        let mut records = Vec::new();
        for info in list.iter() {
            if dict_i64(&info, "kCGWindowOwnerPID") != Some(pid) {
                continue;
            }
            // A missing layer entry does not exclude; a non-default one does.
            if dict_i64(&info, "kCGWindowLayer").is_some_and(|layer| layer != APP_WINDOW_LAYER) {
                continue;
            }
            let Some(window_id) = dict_i64(&info, "kCGWindowNumber") else {
                continue;
            };
            // An unobtainable or empty name marks a helper window.
            let title = dict_string(&info, "kCGWindowName").unwrap_or_default();
            if title.is_empty() {
                continue;
            }
            records.push(WindowRecord { window_id, title });
        }

        Ok(records)
    }
}

/// Copy the window-info list, `None` when the window server rejects the
/// query (no session, no permission).
fn copy_window_info(
    options: CGWindowListOption,
    relative_to: CGWindowID,
) -> Option<CFArray<CFDictionary<CFString, CFType>>> {
    unsafe {
        let window_list = CGWindowListCopyWindowInfo(options, relative_to);
        if window_list.is_null() {
            return None;
        }
        // Copy rule: the list is owned here and released on drop.
        Some(CFArray::wrap_under_create_rule(window_list as *const _))
    }
}

fn dict_i64(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<i64> {
    let value = dict.find(&CFString::new(key))?;
    let num_ref = value.as_CFTypeRef();
    let num: CFNumber = unsafe { CFNumber::wrap_under_get_rule(num_ref as *const _) };
    num.to_i64()
}

fn dict_string(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<String> {
    let value = dict.find(&CFString::new(key))?;
    let str_ref = value.as_CFTypeRef();
    let s: CFString = unsafe { CFString::wrap_under_get_rule(str_ref as *const _) };
    Some(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_window_has_no_owner() {
        let backend = CoreGraphicsBackend::new();
        assert!(backend.owning_pid(0x7fff_fff0).is_err());
    }

    #[test]
    fn test_enumeration_smoke() {
        // Either a list or a collapsed failure, never a panic.
        let backend = CoreGraphicsBackend::new();
        let _ = backend.windows_for_pid(std::process::id() as i64);
    }
}
