//! Standalone CLI tool for sending one-shot input events, used to check
//! profile positions and key names before a run.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use crafter_core::input::{self, parse_combo, parse_key_name, MouseButton, Point};

#[derive(Parser)]
#[command(name = "crafter-input", about = "Send keyboard/mouse input via Win32 SendInput")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Type Unicode text
    Text {
        /// The text to type
        text: String,
    },
    /// Click at screen coordinates
    Click {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
        /// Button: left, right, middle
        #[arg(short, long, default_value = "left")]
        button: MouseButton,
    },
    /// Press and release a key by name (e.g. `f12`, `c`, `0x0D`)
    Key {
        name: String,
    },
    /// Move cursor to coordinates
    Move {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
        /// Inject an absolute SendInput move instead of SetCursorPos
        #[arg(long)]
        send_input: bool,
    },
    /// Send a key combination (e.g. `ctrl+alt+c`)
    Hotkey {
        combo: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Text { text } => {
            input::send_text(&text)?;
            println!("Typed {} chars", text.chars().count());
        }
        Command::Click { x, y, button } => {
            input::send_click(Point::new(x, y), button)?;
            println!("Clicked {button} at {x},{y}");
        }
        Command::Key { name } => {
            let vk_code = parse_key_name(&name).ok_or_else(|| anyhow!("unknown key: {name}"))?;
            input::send_key(vk_code, false)?;
            input::send_key(vk_code, true)?;
            println!("Sent key 0x{vk_code:04X}");
        }
        Command::Move { x, y, send_input } => {
            if send_input {
                input::send_mouse_move(Point::new(x, y))?;
            } else {
                input::set_cursor_position(Point::new(x, y))?;
            }
            println!("Moved cursor to {x},{y}");
        }
        Command::Hotkey { combo } => {
            let vk_codes = parse_combo(&combo)?;
            input::send_hotkey(&vk_codes)?;
            let hex: Vec<String> = vk_codes.iter().map(|v| format!("0x{v:04X}")).collect();
            println!("Sent hotkey [{}]", hex.join("+"));
        }
    }

    Ok(())
}
