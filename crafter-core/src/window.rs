//! Foreground window queries via Win32 API.
//!
//! The craft loop only ever needs the title of whatever window currently has
//! focus; it compares that title against the profile's `window_title` to
//! decide whether the game client is active.

use crate::errors::Result;

/// Whether a foreground title belongs to the target window.
///
/// Titles are compared exactly after trimming trailing NULs and whitespace.
pub fn title_matches(title: &str, target: &str) -> bool {
    title.trim_end_matches(['\0', ' ']) == target
}

#[cfg(windows)]
mod win32 {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;

    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{
        GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW,
    };

    use crate::errors::{CrafterError, Result};

    /// Read the window title, sized by `GetWindowTextLengthW`.
    fn read_window_title(hwnd: HWND) -> String {
        let len = unsafe { GetWindowTextLengthW(hwnd) };
        if len <= 0 {
            return String::new();
        }
        let mut buf = vec![0u16; (len + 1) as usize];
        let copied = unsafe { GetWindowTextW(hwnd, &mut buf) };
        if copied <= 0 {
            return String::new();
        }
        OsString::from_wide(&buf[..copied as usize])
            .to_string_lossy()
            .into_owned()
    }

    pub fn foreground_window_title() -> Result<String> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            return Err(CrafterError::Window("no foreground window".into()));
        }
        Ok(read_window_title(hwnd))
    }
}

/// Title of the window that currently has focus.
///
/// Fails with [`crate::errors::CrafterError::Window`] when no window is in
/// the foreground (e.g. mid Alt+Tab).  An untitled window yields `""`.
#[cfg(windows)]
pub fn foreground_window_title() -> Result<String> {
    win32::foreground_window_title()
}

#[cfg(not(windows))]
pub fn foreground_window_title() -> Result<String> {
    Err(crate::errors::CrafterError::Unsupported(
        "GetForegroundWindow requires Windows".into(),
    ))
}
