//! Windows window queries using the Win32 API

use crate::window::{WindowError, WindowQuery};
use crate::WindowRecord;

use std::ffi::{c_void, OsString};
use std::os::windows::ffi::OsStringExt;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowLongW, GetWindowTextW, GetWindowThreadProcessId, IsWindowVisible,
    GWL_EXSTYLE, WS_EX_TOOLWINDOW,
};

pub struct Win32Backend;

impl Win32Backend {
    pub fn new() -> Self {
        Self
    }
}

impl WindowQuery for Win32Backend {
    fn owning_pid(&self, window_id: i64) -> Result<i64, WindowError> {
        let hwnd = HWND(window_id as isize as *mut c_void);

        let mut pid: u32 = 0;
        unsafe {
            GetWindowThreadProcessId(hwnd, Some(&mut pid));
        }

        if pid == 0 {
            return Err(WindowError::WindowNotFound(window_id));
        }
        Ok(i64::from(pid))
    }

    fn windows_for_pid(&self, pid: i64) -> Result<Vec<WindowRecord>, WindowError> {
        let mut ctx = EnumCtx {
            target_pid: pid as u32,
            records: Vec::new(),
        };

        unsafe {
            // An aborted enumeration still hands back whatever the
            // callback collected.
            let _ = EnumWindows(
                Some(enum_window_callback),
                LPARAM(&mut ctx as *mut EnumCtx as isize),
            );
        }

        Ok(ctx.records)
    }
}

struct EnumCtx {
    target_pid: u32,
    records: Vec<WindowRecord>,
}

unsafe extern "system" fn enum_window_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let ctx = &mut *(lparam.0 as *mut EnumCtx);

    let mut pid: u32 = 0;
    GetWindowThreadProcessId(hwnd, Some(&mut pid));
    if pid != ctx.target_pid {
        return BOOL(1);
    }

    if !IsWindowVisible(hwnd).as_bool() {
        return BOOL(1);
    }

    // Tool windows can be titled and visible without being user-facing
    // top levels.
    let ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE) as u32;
    if ex_style & WS_EX_TOOLWINDOW.0 != 0 {
        return BOOL(1);
    }

    let mut title_buf = [0u16; 512];
    let len = GetWindowTextW(hwnd, &mut title_buf);
    if len <= 0 {
        return BOOL(1);
    }

    let title = decode_title(&title_buf[..len as usize]);
    if title.is_empty() {
        return BOOL(1);
    }

    ctx.records.push(WindowRecord {
        window_id: hwnd.0 as i64,
        title,
    });

    BOOL(1)
}

/// UTF-16 to UTF-8, replacing unpaired surrogates.
fn decode_title(units: &[u16]) -> String {
    OsString::from_wide(units).to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_window_has_no_owner() {
        let backend = Win32Backend::new();
        assert!(backend.owning_pid(0x7fff_fff0).is_err());
    }

    #[test]
    fn test_own_pid_lists_no_windows() {
        // The test binary creates no top-level windows.
        let backend = Win32Backend::new();
        let records = backend.windows_for_pid(std::process::id() as i64).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_title_decoding_replaces_unpaired_surrogates() {
        let units = [0x0048, 0xD800, 0x0049];
        assert_eq!(decode_title(&units), "H\u{FFFD}I");
    }

    #[test]
    fn test_title_decoding_keeps_non_ascii() {
        let title = "Fenêtre 設定";
        let units: Vec<u16> = title.encode_utf16().collect();
        assert_eq!(decode_title(&units), title);
    }
}
