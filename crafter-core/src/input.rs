//! Keyboard and mouse input simulation via Win32 `SendInput`, plus cursor
//! position queries.
//!
//! Every injecting function checks the event count `SendInput` reports and
//! turns a short count into [`CrafterError::Input`]; nothing is retried.
//!
//! Key-name parsing and coordinate normalisation are plain Rust and build on
//! every host.  The Win32 calls are only compiled on Windows; elsewhere the
//! same functions exist and return [`CrafterError::Unsupported`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CrafterError, Result};

/// Maximum text length to prevent unbounded allocation.
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Maximum hotkey combo length (no real hotkey uses more than 5-6 keys).
pub const MAX_HOTKEY_KEYS: usize = 8;

/// Virtual-key codes used by the crafter.
pub mod vk {
    pub const TAB: u16 = 0x09;
    pub const RETURN: u16 = 0x0D;
    pub const SHIFT: u16 = 0x10;
    pub const CONTROL: u16 = 0x11;
    pub const MENU: u16 = 0x12;
    pub const ESCAPE: u16 = 0x1B;
    pub const SPACE: u16 = 0x20;
    pub const F1: u16 = 0x70;
    pub const F12: u16 = 0x7B;
    pub const C: u16 = 0x43;
}

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Screen position in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl FromStr for MouseButton {
    type Err = CrafterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => Err(CrafterError::Input(format!("unknown mouse button: {other}"))),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Key names
// ---------------------------------------------------------------------------

/// Map a key name to its virtual-key code.
///
/// Accepts modifier names (`ctrl`, `alt`, `shift`), a handful of named keys,
/// single letters and digits, `f1`..`f24`, and raw hex codes (`0x43`).
pub fn parse_key_name(name: &str) -> Option<u16> {
    let lower = name.trim().to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix("0x") {
        return u16::from_str_radix(hex, 16).ok();
    }

    let named = match lower.as_str() {
        "ctrl" | "control" => Some(vk::CONTROL),
        "alt" | "menu" => Some(vk::MENU),
        "shift" => Some(vk::SHIFT),
        "enter" | "return" => Some(vk::RETURN),
        "esc" | "escape" => Some(vk::ESCAPE),
        "space" => Some(vk::SPACE),
        "tab" => Some(vk::TAB),
        _ => None,
    };
    if named.is_some() {
        return named;
    }

    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_lowercase() {
            return Some(c.to_ascii_uppercase() as u16);
        }
        if c.is_ascii_digit() {
            return Some(c as u16);
        }
        return None;
    }

    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u16>().ok()) {
        if (1..=24).contains(&n) {
            return Some(vk::F1 + n - 1);
        }
    }

    None
}

/// Parse a `+`-separated combination such as `ctrl+alt+c`.
pub fn parse_combo(combo: &str) -> Result<Vec<u16>> {
    let keys: Vec<u16> = combo
        .split('+')
        .map(|part| {
            parse_key_name(part)
                .ok_or_else(|| CrafterError::Config(format!("unknown key name: {part:?}")))
        })
        .collect::<Result<_>>()?;

    if keys.is_empty() || keys.len() > MAX_HOTKEY_KEYS {
        return Err(CrafterError::Config(format!(
            "key combo must have 1..={MAX_HOTKEY_KEYS} keys, got {}",
            keys.len()
        )));
    }
    Ok(keys)
}

// ---------------------------------------------------------------------------
// Coordinate normalisation
// ---------------------------------------------------------------------------

/// Convert pixel coordinates to 0..65535 normalised space for the virtual
/// desktop described by `(origin_x, origin_y, width, height)`.
///
/// Uses the MSDN formula: `((pixel - origin) * 65535) / (screen_size - 1)`,
/// clamped to `[0, 65535]`.
pub fn normalise_coords(x: i32, y: i32, geometry: (i32, i32, i32, i32)) -> (i32, i32) {
    let (origin_x, origin_y, screen_w, screen_h) = geometry;

    if screen_w <= 1 || screen_h <= 1 {
        return (0, 0);
    }

    // Widen before subtracting; far coordinates overflow i32.
    let abs_x = (((x as i64 - origin_x as i64) * 65535) / (screen_w as i64 - 1)).clamp(0, 65535) as i32;
    let abs_y = (((y as i64 - origin_y as i64) * 65535) / (screen_h as i64 - 1)).clamp(0, 65535) as i32;
    (abs_x, abs_y)
}

#[cfg_attr(not(windows), allow(dead_code))]
fn check_sent(sent: u32, expected: usize, what: &str) -> Result<()> {
    if sent as usize == expected {
        Ok(())
    } else {
        Err(CrafterError::Input(format!(
            "{what}: SendInput injected {sent} of {expected} events"
        )))
    }
}

// ---------------------------------------------------------------------------
// Win32
// ---------------------------------------------------------------------------

#[cfg(windows)]
mod win32 {
    use windows::Win32::Foundation::POINT;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT,
        KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, MOUSEEVENTF_ABSOLUTE,
        MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP,
        MOUSEEVENTF_MOVE, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_VIRTUALDESK,
        MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetCursorPos, GetSystemMetrics, SetCursorPos, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN,
        SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN,
    };

    use super::{check_sent, normalise_coords, MouseButton, Point, MAX_HOTKEY_KEYS, MAX_TEXT_LENGTH};
    use crate::errors::{CrafterError, Result};

    /// Pre-computed size of `INPUT` struct for `SendInput` calls.
    const INPUT_SIZE: i32 = std::mem::size_of::<INPUT>() as i32;

    /// Flags for absolute mouse positioning on the virtual desktop.
    const ABSOLUTE_MOVE: MOUSE_EVENT_FLAGS =
        MOUSE_EVENT_FLAGS(MOUSEEVENTF_ABSOLUTE.0 | MOUSEEVENTF_MOVE.0 | MOUSEEVENTF_VIRTUALDESK.0);

    /// Virtual screen origin and size (covers all monitors).
    fn screen_geometry() -> (i32, i32, i32, i32) {
        unsafe {
            let x = GetSystemMetrics(SM_XVIRTUALSCREEN);
            let y = GetSystemMetrics(SM_YVIRTUALSCREEN);
            let w = GetSystemMetrics(SM_CXVIRTUALSCREEN);
            let h = GetSystemMetrics(SM_CYVIRTUALSCREEN);
            // GetSystemMetrics returns 0 on failure
            if w > 0 && h > 0 {
                (x, y, w, h)
            } else {
                (0, 0, 1920, 1080)
            }
        }
    }

    fn unicode_key_input(scan_code: u16, key_up: bool) -> INPUT {
        let flags = if key_up {
            KEYEVENTF_UNICODE | KEYEVENTF_KEYUP
        } else {
            KEYEVENTF_UNICODE
        };

        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(0),
                    wScan: scan_code,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn virtual_key_input(vk: u16, key_up: bool) -> INPUT {
        let flags = if key_up {
            KEYEVENTF_KEYUP
        } else {
            KEYBD_EVENT_FLAGS(0)
        };

        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn mouse_input(abs_x: i32, abs_y: i32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: abs_x,
                    dy: abs_y,
                    mouseData: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    pub fn cursor_position() -> Result<Point> {
        let mut pt = POINT::default();
        unsafe { GetCursorPos(&mut pt) }
            .map_err(|e| CrafterError::Cursor(format!("cant get cursor pos: {e}")))?;
        Ok(Point::new(pt.x, pt.y))
    }

    pub fn set_cursor_position(point: Point) -> Result<()> {
        unsafe { SetCursorPos(point.x, point.y) }
            .map_err(|e| CrafterError::Cursor(format!("cant set cursor pos to {point}: {e}")))
    }

    pub fn send_text(text: &str) -> Result<()> {
        if text.is_empty() || text.len() > MAX_TEXT_LENGTH {
            return Err(CrafterError::Input(format!(
                "text length must be 1..={MAX_TEXT_LENGTH}, got {}",
                text.len()
            )));
        }

        let mut inputs: Vec<INPUT> = Vec::with_capacity(text.len() * 2);
        for ch in text.encode_utf16() {
            inputs.push(unicode_key_input(ch, false));
            inputs.push(unicode_key_input(ch, true));
        }
        let sent = unsafe { SendInput(&inputs, INPUT_SIZE) };
        check_sent(sent, inputs.len(), "text")
    }

    pub fn send_key(vk_code: u16, key_up: bool) -> Result<()> {
        let input = virtual_key_input(vk_code, key_up);
        let sent = unsafe { SendInput(&[input], INPUT_SIZE) };
        check_sent(sent, 1, "key")
    }

    pub fn send_click(point: Point, button: MouseButton) -> Result<()> {
        let (abs_x, abs_y) = normalise_coords(point.x, point.y, screen_geometry());

        let (down_flag, up_flag) = match button {
            MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
            MouseButton::Middle => (MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP),
            MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
        };

        let inputs = [
            mouse_input(abs_x, abs_y, MOUSE_EVENT_FLAGS(ABSOLUTE_MOVE.0 | down_flag.0)),
            mouse_input(abs_x, abs_y, MOUSE_EVENT_FLAGS(ABSOLUTE_MOVE.0 | up_flag.0)),
        ];

        let sent = unsafe { SendInput(&inputs, INPUT_SIZE) };
        check_sent(sent, inputs.len(), "click")
    }

    pub fn send_mouse_move(point: Point) -> Result<()> {
        let (abs_x, abs_y) = normalise_coords(point.x, point.y, screen_geometry());
        let input = mouse_input(abs_x, abs_y, ABSOLUTE_MOVE);
        let sent = unsafe { SendInput(&[input], INPUT_SIZE) };
        check_sent(sent, 1, "move")
    }

    /// Presses all keys in order, releases in reverse -- all in a single
    /// atomic `SendInput` call.
    pub fn send_hotkey(vk_codes: &[u16]) -> Result<()> {
        if vk_codes.is_empty() || vk_codes.len() > MAX_HOTKEY_KEYS {
            return Err(CrafterError::Input(format!(
                "hotkey must have 1..={MAX_HOTKEY_KEYS} keys, got {}",
                vk_codes.len()
            )));
        }

        let mut inputs: Vec<INPUT> = Vec::with_capacity(vk_codes.len() * 2);
        for &vk in vk_codes {
            inputs.push(virtual_key_input(vk, false));
        }
        for &vk in vk_codes.iter().rev() {
            inputs.push(virtual_key_input(vk, true));
        }

        let sent = unsafe { SendInput(&inputs, INPUT_SIZE) };
        check_sent(sent, inputs.len(), "hotkey")
    }

    pub fn is_key_down(vk_code: u16) -> bool {
        let state = unsafe { GetAsyncKeyState(vk_code as i32) };
        (state as u16) & 0x8000 != 0
    }
}

#[cfg(windows)]
pub use win32::{
    cursor_position, is_key_down, send_click, send_hotkey, send_key, send_mouse_move, send_text,
    set_cursor_position,
};

#[cfg(not(windows))]
mod unsupported {
    use super::{MouseButton, Point};
    use crate::errors::{CrafterError, Result};

    fn unsupported<T>(what: &str) -> Result<T> {
        Err(CrafterError::Unsupported(format!("{what} requires Windows")))
    }

    pub fn cursor_position() -> Result<Point> {
        unsupported("GetCursorPos")
    }

    pub fn set_cursor_position(_point: Point) -> Result<()> {
        unsupported("SetCursorPos")
    }

    pub fn send_text(_text: &str) -> Result<()> {
        unsupported("SendInput")
    }

    pub fn send_key(_vk_code: u16, _key_up: bool) -> Result<()> {
        unsupported("SendInput")
    }

    pub fn send_click(_point: Point, _button: MouseButton) -> Result<()> {
        unsupported("SendInput")
    }

    pub fn send_mouse_move(_point: Point) -> Result<()> {
        unsupported("SendInput")
    }

    pub fn send_hotkey(_vk_codes: &[u16]) -> Result<()> {
        unsupported("SendInput")
    }

    pub fn is_key_down(_vk_code: u16) -> bool {
        false
    }
}

#[cfg(not(windows))]
pub use unsupported::{
    cursor_position, is_key_down, send_click, send_hotkey, send_key, send_mouse_move, send_text,
    set_cursor_position,
};
