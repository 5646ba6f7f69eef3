//! `crafter` -- runs the alteration/augmentation loop and the desktop probes
//! used to set up a profile.
//!
//! `crafter run` prints two integers on success: alterations spent, then
//! augmentations spent.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crafter_core::config::CraftProfile;
use crafter_core::craft::{Crafter, Outcome, Win32Desktop};
use crafter_core::item::ItemText;

#[derive(Parser)]
#[command(name = "crafter", about = "Spam alterations on an item until it rolls the target")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run the craft loop
    Run {
        /// Profile file (TOML); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the target regex
        #[arg(short, long)]
        target: Option<String>,
        /// Override the alteration budget
        #[arg(short, long)]
        max_attempts: Option<u32>,
        /// Print the full report as JSON instead of the two counts
        #[arg(long)]
        json: bool,
    },
    /// Print the current cursor position
    Cursor,
    /// Print the foreground window title
    Window,
    /// Print the clipboard text (and how it parses as an item)
    Clipboard,
    /// Validate a profile without touching the desktop
    Check {
        /// Profile file (TOML)
        config: PathBuf,
    },
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
        .context("failed to initialise logger")
}

fn load_profile(path: Option<&PathBuf>) -> Result<CraftProfile> {
    match path {
        Some(path) => Ok(CraftProfile::load(path)?),
        None => Ok(CraftProfile::default()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    match args.command {
        Command::Run {
            config,
            target,
            max_attempts,
            json,
        } => {
            let mut profile = load_profile(config.as_ref())?;
            profile.apply_overrides(target, max_attempts)?;
            let resolved = profile.resolve()?;

            info!(
                "crafting in {:?} until {:?} (max {} alterations)",
                resolved.window_title,
                resolved.target.as_str(),
                resolved.max_attempts
            );
            let report = Crafter::new(Win32Desktop, resolved).run()?;

            match report.outcome {
                Outcome::Matched => info!("target rolled"),
                Outcome::Exhausted => info!("alteration budget spent without a hit"),
                Outcome::Aborted => info!("aborted by abort key"),
                Outcome::FocusLost => info!("game window lost focus"),
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.alterations);
                println!("{}", report.augmentations);
            }
        }
        Command::Cursor => {
            let pos = crafter_core::input::cursor_position()?;
            println!("{{ x = {}, y = {} }}", pos.x, pos.y);
        }
        Command::Window => {
            let title = crafter_core::window::foreground_window_title()?;
            println!("{title}");
        }
        Command::Clipboard => {
            let text = crafter_core::clipboard::read_clipboard_text()?;
            println!("{text}");
            match ItemText::parse(&text) {
                Ok(item) => info!(
                    "parsed as {} {:?}, affixes {:?}",
                    item.rarity, item.name, item.affixes
                ),
                Err(e) => info!("not an item: {e}"),
            }
        }
        Command::Check { config } => {
            let profile = CraftProfile::load(&config)?;
            let resolved = profile
                .resolve()
                .with_context(|| format!("profile {} is invalid", config.display()))?;
            println!(
                "ok: {:?} target {:?}, {} alterations max",
                resolved.window_title,
                resolved.target.as_str(),
                resolved.max_attempts
            );
        }
    }

    Ok(())
}
