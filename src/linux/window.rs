//! Linux window queries over Xlib and the EWMH properties

use crate::window::{WindowError, WindowQuery};
use crate::WindowRecord;

use std::os::raw::{c_char, c_int, c_uchar, c_uint, c_ulong};
use std::ptr;

use once_cell::sync::OnceCell;
use x11::xlib;

/// Owned Xlib connection. Every napi entry point runs on the host's one
/// JS thread, so the pointer is never used from two threads at once.
struct DisplayHandle(*mut xlib::Display);

unsafe impl Send for DisplayHandle {}
unsafe impl Sync for DisplayHandle {}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        unsafe {
            xlib::XCloseDisplay(self.0);
        }
    }
}

/// The EWMH atoms every query needs. `pid` and `name` are interned
/// only-if-exists: a server where no client ever set them cannot match
/// anything anyway.
struct Atoms {
    pid: xlib::Atom,
    name: xlib::Atom,
    utf8: xlib::Atom,
}

pub struct X11Backend {
    display: OnceCell<Option<DisplayHandle>>,
}

impl X11Backend {
    pub fn new() -> Self {
        Self {
            display: OnceCell::new(),
        }
    }

    /// Connection shared by every query, opened on first use. A failed
    /// open is cached as well, so a session without X never retries.
    fn display(&self) -> Option<*mut xlib::Display> {
        self.display
            .get_or_init(|| unsafe {
                let dpy = xlib::XOpenDisplay(ptr::null());
                if dpy.is_null() {
                    tracing::debug!("XOpenDisplay failed, window queries disabled");
                    return None;
                }
                // The stock Xlib handler exits the process on protocol
                // errors, and callers may pass ids of windows that are
                // already gone. Failed requests still report through
                // their status returns.
                xlib::XSetErrorHandler(Some(ignore_x_error));
                Some(DisplayHandle(dpy))
            })
            .as_ref()
            .map(|handle| handle.0)
    }

    fn atoms(&self, dpy: *mut xlib::Display) -> Atoms {
        unsafe {
            Atoms {
                pid: xlib::XInternAtom(
                    dpy,
                    b"_NET_WM_PID\0".as_ptr() as *const c_char,
                    xlib::True,
                ),
                name: xlib::XInternAtom(
                    dpy,
                    b"_NET_WM_NAME\0".as_ptr() as *const c_char,
                    xlib::True,
                ),
                utf8: xlib::XInternAtom(
                    dpy,
                    b"UTF8_STRING\0".as_ptr() as *const c_char,
                    xlib::False,
                ),
            }
        }
    }
}

impl WindowQuery for X11Backend {
    fn owning_pid(&self, window_id: i64) -> Result<i64, WindowError> {
        let dpy = self.display().ok_or(WindowError::DisplayUnavailable)?;
        let atoms = self.atoms(dpy);
        if atoms.pid == 0 {
            return Err(WindowError::ListUnavailable);
        }

        unsafe { read_cardinal(dpy, window_id as xlib::Window, atoms.pid) }
            .ok_or(WindowError::OwnerUnknown(window_id))
    }

    fn windows_for_pid(&self, pid: i64) -> Result<Vec<WindowRecord>, WindowError> {
        let dpy = self.display().ok_or(WindowError::DisplayUnavailable)?;
        let atoms = self.atoms(dpy);
        if atoms.pid == 0 {
            return Err(WindowError::ListUnavailable);
        }

        let mut records = Vec::new();
        unsafe {
            let root = xlib::XDefaultRootWindow(dpy);
            collect_windows_for_pid(dpy, root, pid, &atoms, &mut records);
        }
        Ok(records)
    }
}

/// Protocol errors are expected for stale window ids; keep the process
/// alive and let the failing call report itself.
unsafe extern "C" fn ignore_x_error(
    _dpy: *mut xlib::Display,
    _err: *mut xlib::XErrorEvent,
) -> c_int {
    0
}

/// Depth-first walk over the window tree. Real application windows can
/// hang under intermediate container windows, so every node's children
/// are visited whether or not the node itself matched.
unsafe fn collect_windows_for_pid(
    dpy: *mut xlib::Display,
    node: xlib::Window,
    pid: i64,
    atoms: &Atoms,
    records: &mut Vec<WindowRecord>,
) {
    let mut root: xlib::Window = 0;
    let mut parent: xlib::Window = 0;
    let mut children: *mut xlib::Window = ptr::null_mut();
    let mut n_children: c_uint = 0;

    let status = xlib::XQueryTree(
        dpy,
        node,
        &mut root,
        &mut parent,
        &mut children,
        &mut n_children,
    );
    if status == 0 || children.is_null() {
        return;
    }

    for &child in std::slice::from_raw_parts(children, n_children as usize) {
        if read_cardinal(dpy, child, atoms.pid) == Some(pid) && is_viewable(dpy, child) {
            if let Some(title) = read_window_title(dpy, child, atoms) {
                if !title.is_empty() {
                    records.push(WindowRecord {
                        window_id: child as i64,
                        title,
                    });
                }
            }
        }

        collect_windows_for_pid(dpy, child, pid, atoms, records);
    }

    xlib::XFree(children as *mut _);
}

/// First 32-bit CARDINAL of `property` on `window`, if present.
unsafe fn read_cardinal(
    dpy: *mut xlib::Display,
    window: xlib::Window,
    property: xlib::Atom,
) -> Option<i64> {
    let mut actual_type: xlib::Atom = 0;
    let mut actual_format: c_int = 0;
    let mut nitems: c_ulong = 0;
    let mut bytes_after: c_ulong = 0;
    let mut prop: *mut c_uchar = ptr::null_mut();

    let status = xlib::XGetWindowProperty(
        dpy,
        window,
        property,
        0,
        1,
        xlib::False,
        xlib::XA_CARDINAL,
        &mut actual_type,
        &mut actual_format,
        &mut nitems,
        &mut bytes_after,
        &mut prop,
    );
    if status != 0 || prop.is_null() {
        return None;
    }

    // Format-32 properties arrive as native longs.
    let value = if nitems > 0 && actual_format == 32 {
        Some(*(prop as *const c_ulong) as i64)
    } else {
        None
    };
    xlib::XFree(prop as *mut _);
    value
}

/// `_NET_WM_NAME` as a UTF8_STRING, up to 1 KiB.
unsafe fn read_window_title(
    dpy: *mut xlib::Display,
    window: xlib::Window,
    atoms: &Atoms,
) -> Option<String> {
    let mut actual_type: xlib::Atom = 0;
    let mut actual_format: c_int = 0;
    let mut nitems: c_ulong = 0;
    let mut bytes_after: c_ulong = 0;
    let mut prop: *mut c_uchar = ptr::null_mut();

    let status = xlib::XGetWindowProperty(
        dpy,
        window,
        atoms.name,
        0,
        256,
        xlib::False,
        atoms.utf8,
        &mut actual_type,
        &mut actual_format,
        &mut nitems,
        &mut bytes_after,
        &mut prop,
    );
    if status != 0 || prop.is_null() {
        return None;
    }

    let title = if nitems > 0 && actual_format == 8 {
        Some(decode_title(std::slice::from_raw_parts(
            prop as *const u8,
            nitems as usize,
        )))
    } else {
        None
    };
    xlib::XFree(prop as *mut _);
    title
}

unsafe fn is_viewable(dpy: *mut xlib::Display, window: xlib::Window) -> bool {
    let mut attrs: xlib::XWindowAttributes = std::mem::zeroed();
    xlib::XGetWindowAttributes(dpy, window, &mut attrs) != 0
        && attrs.map_state == xlib::IsViewable
}

/// Clients declare the property UTF-8; do not trust them.
fn decode_title(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_window_is_unresolvable() {
        let backend = X11Backend::new();
        assert!(backend.owning_pid(0x7fff_fff0).is_err());
    }

    #[test]
    fn test_enumeration_collapses_cleanly() {
        // With a display the test runner owns no windows; without one
        // (headless, Wayland-only) the connection is reported missing.
        let backend = X11Backend::new();
        match backend.windows_for_pid(std::process::id() as i64) {
            Ok(records) => assert!(records.is_empty()),
            Err(err) => assert!(matches!(
                err,
                WindowError::DisplayUnavailable | WindowError::ListUnavailable
            )),
        }
    }

    #[test]
    fn test_title_decoding_replaces_invalid_bytes() {
        assert_eq!(decode_title(b"caf\xC3\xA9"), "café");
        assert_eq!(decode_title(b"bad\xFFbyte"), "bad\u{FFFD}byte");
    }
}
