//! Error types for `crafter_core`.
//!
//! All failures are funnelled through [`CrafterError`], which uses
//! `thiserror` for `Display` and `Error` derives.  Binaries wrap it in
//! `anyhow` at the top level.

use thiserror::Error;

/// Top-level error type for the `crafter_core` library.
///
/// Each variant corresponds to a distinct subsystem.  None of them are
/// retried: the craft loop stops on the first one.
#[derive(Debug, Error)]
pub enum CrafterError {
    /// Foreground window lookup failure.
    #[error("WindowError: {0}")]
    Window(String),

    /// Clipboard open/read/empty failure.
    #[error("ClipboardError: {0}")]
    Clipboard(String),

    /// Input simulation failure (SendInput / keyboard / mouse).
    #[error("InputError: {0}")]
    Input(String),

    /// GetCursorPos / SetCursorPos failure.
    #[error("CursorError: {0}")]
    Cursor(String),

    /// Copied text did not look like an item.
    #[error("ItemParseError: {0}")]
    ItemParse(String),

    /// Invalid craft profile.
    #[error("ConfigError: {0}")]
    Config(String),

    /// Target window never came to the foreground.
    #[error("FocusError: {0}")]
    Focus(String),

    /// Platform call attempted on a host without Win32.
    #[error("UnsupportedPlatform: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, CrafterError>;

/// Convert a `windows::core::Error` (Win32 failure) into a
/// `CrafterError::Window`.  Call sites that know their subsystem map the
/// error themselves; this covers the rest.
#[cfg(windows)]
impl From<windows::core::Error> for CrafterError {
    fn from(err: windows::core::Error) -> Self {
        CrafterError::Window(format!("Win32 error: {err}"))
    }
}
