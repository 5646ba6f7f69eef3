//! Clipboard access via Win32 `OpenClipboard` / `GetClipboardData`.
//!
//! [`ClipboardGuard`] wraps `OpenClipboard` / `CloseClipboard` in an RAII
//! pattern so the clipboard is released even on early return.  The game
//! writes item text to the clipboard on a copy keystroke; the craft loop
//! empties it first, sends the copy, then reads it back as
//! `CF_UNICODETEXT`.

use crate::errors::Result;

/// Standard clipboard format for UTF-16 text.
#[cfg_attr(not(windows), allow(dead_code))]
const CF_UNICODETEXT: u32 = 13;

/// Decode a NUL-terminated UTF-16 buffer, stopping at the first NUL.
pub fn decode_wide(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}

#[cfg(windows)]
mod win32 {
    use windows::Win32::Foundation::{HGLOBAL, HWND};
    use windows::Win32::System::DataExchange::{
        CloseClipboard, EmptyClipboard, GetClipboardData, OpenClipboard,
    };
    use windows::Win32::System::Memory::{GlobalLock, GlobalSize, GlobalUnlock};

    use super::{decode_wide, CF_UNICODETEXT};
    use crate::errors::{CrafterError, Result};

    /// RAII wrapper that calls `CloseClipboard` on `Drop`.
    ///
    /// Only one process can hold the clipboard at a time; keep the guard's
    /// lifetime as short as the read or write it protects.
    #[must_use = "ClipboardGuard must be kept alive while the clipboard is in use"]
    pub struct ClipboardGuard {
        _not_send: std::marker::PhantomData<*const ()>,
    }

    impl ClipboardGuard {
        /// Open the clipboard without an owner window.
        pub fn open() -> Result<Self> {
            unsafe { OpenClipboard(HWND(std::ptr::null_mut())) }
                .map_err(|e| CrafterError::Clipboard(format!("cant open clipboard: {e}")))?;
            Ok(Self {
                _not_send: std::marker::PhantomData,
            })
        }

        pub fn read_text(&self) -> Result<String> {
            let handle = unsafe { GetClipboardData(CF_UNICODETEXT) }
                .map_err(|e| CrafterError::Clipboard(format!("cant read clipboard: {e}")))?;
            let hglobal = HGLOBAL(handle.0);

            let ptr = unsafe { GlobalLock(hglobal) } as *const u16;
            if ptr.is_null() {
                return Err(CrafterError::Clipboard("cant lock clipboard data".into()));
            }

            let units = unsafe { GlobalSize(hglobal) } / std::mem::size_of::<u16>();
            let text = decode_wide(unsafe { std::slice::from_raw_parts(ptr, units) });

            // GlobalUnlock reports an "error" once the lock count reaches zero.
            let _ = unsafe { GlobalUnlock(hglobal) };
            Ok(text)
        }

        pub fn empty(&self) -> Result<()> {
            unsafe { EmptyClipboard() }
                .map_err(|e| CrafterError::Clipboard(format!("cant empty clipboard: {e}")))
        }
    }

    impl Drop for ClipboardGuard {
        fn drop(&mut self) {
            if let Err(e) = unsafe { CloseClipboard() } {
                log::warn!("CloseClipboard failed: {e}");
            }
        }
    }
}

#[cfg(windows)]
pub use win32::ClipboardGuard;

/// Read the clipboard as text.
///
/// Fails when the clipboard cannot be opened or holds no text.
#[cfg(windows)]
pub fn read_clipboard_text() -> Result<String> {
    let guard = ClipboardGuard::open()?;
    guard.read_text()
}

/// Empty the clipboard so the next read only sees freshly copied text.
#[cfg(windows)]
pub fn clear_clipboard() -> Result<()> {
    let guard = ClipboardGuard::open()?;
    guard.empty()
}

#[cfg(not(windows))]
pub fn read_clipboard_text() -> Result<String> {
    Err(crate::errors::CrafterError::Unsupported(
        "GetClipboardData requires Windows".into(),
    ))
}

#[cfg(not(windows))]
pub fn clear_clipboard() -> Result<()> {
    Err(crate::errors::CrafterError::Unsupported(
        "EmptyClipboard requires Windows".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wide_stops_at_nul() {
        let mut buf: Vec<u16> = "Rarity: Magic".encode_utf16().collect();
        buf.extend_from_slice(&[0, 0x41, 0x42]);
        assert_eq!(decode_wide(&buf), "Rarity: Magic");
    }

    #[test]
    fn test_decode_wide_without_terminator() {
        let buf: Vec<u16> = "Ring".encode_utf16().collect();
        assert_eq!(decode_wide(&buf), "Ring");
    }

    #[test]
    fn test_decode_wide_non_ascii() {
        let buf: Vec<u16> = "Größe\0".encode_utf16().collect();
        assert_eq!(decode_wide(&buf), "Größe");
    }
}
