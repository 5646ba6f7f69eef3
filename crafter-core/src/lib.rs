//! `crafter_core` -- core library for the orb crafter.
//!
//! Drives a currency-crafting sequence in a game client by reading the
//! foreground window title and the clipboard, moving the cursor and
//! injecting synthetic clicks and key combinations.
//!
//! It is consumed by `crafter-cli` (the `crafter` and `crafter-input`
//! binaries).
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`errors`] | `CrafterError` enum via `thiserror` |
//! | [`input`] | `SendInput` keyboard/mouse simulation, cursor position, key names |
//! | [`window`] | Foreground window title via `windows-rs` |
//! | [`clipboard`] | `ClipboardGuard` RAII wrapper and `CF_UNICODETEXT` reads |
//! | [`item`] | Regex extraction over copied item text |
//! | [`config`] | TOML craft profiles |
//! | [`craft`] | `Desktop` trait and the alteration/augmentation loop |
//!
//! The Win32 halves of [`input`], [`window`] and [`clipboard`] only exist on
//! Windows; everything else builds and tests on any host.

pub mod clipboard;
pub mod config;
pub mod craft;
pub mod errors;
pub mod input;
pub mod item;
pub mod window;
