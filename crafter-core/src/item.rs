//! Parsing of the item text the game writes to the clipboard.
//!
//! The text is a sequence of `--------`-separated sections.  The first
//! section carries `Item Class:`, `Rarity:` and the item name.  The
//! advanced copy (Ctrl+Alt+C) additionally prefixes every modifier with a
//! `{ Prefix Modifier ... }` / `{ Suffix Modifier ... }` header, which is
//! what [`ItemText::affixes`] counts.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::errors::{CrafterError, Result};

const SECTION_SEPARATOR: &str = "--------";

static RARITY_RE: OnceLock<Regex> = OnceLock::new();
static AFFIX_RE: OnceLock<Regex> = OnceLock::new();

fn rarity_re() -> &'static Regex {
    RARITY_RE.get_or_init(|| Regex::new(r"(?m)^Rarity: *(.+?) *$").expect("valid rarity regex"))
}

fn affix_re() -> &'static Regex {
    AFFIX_RE.get_or_init(|| {
        Regex::new(r"(?m)^\{ (?:Master Crafted )?(Prefix|Suffix) Modifier")
            .expect("valid affix regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rarity {
    Normal,
    Magic,
    Rare,
    Unique,
    Other(String),
}

impl Rarity {
    fn from_label(label: &str) -> Self {
        match label {
            "Normal" => Rarity::Normal,
            "Magic" => Rarity::Magic,
            "Rare" => Rarity::Rare,
            "Unique" => Rarity::Unique,
            other => Rarity::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rarity::Normal => f.write_str("Normal"),
            Rarity::Magic => f.write_str("Magic"),
            Rarity::Rare => f.write_str("Rare"),
            Rarity::Unique => f.write_str("Unique"),
            Rarity::Other(s) => f.write_str(s),
        }
    }
}

/// Explicit affix counts from an advanced copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Affixes {
    pub prefixes: u32,
    pub suffixes: u32,
}

impl Affixes {
    /// Prefixes plus suffixes.
    pub fn total(&self) -> u32 {
        self.prefixes + self.suffixes
    }
}

/// Owned, parsed snapshot of one copied item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemText {
    /// Full text with `\r\n` normalised to `\n`.
    pub raw: String,
    pub rarity: Rarity,
    /// First line after `Rarity:`; empty if the section ends there.
    pub name: String,
    /// `None` for a simple copy (no modifier headers present).
    pub affixes: Option<Affixes>,
}

impl ItemText {
    /// Parse clipboard text.  Text without a `Rarity:` line is not an item
    /// and yields [`CrafterError::ItemParse`].
    pub fn parse(text: &str) -> Result<Self> {
        let raw = text.replace("\r\n", "\n");

        let caps = rarity_re()
            .captures(&raw)
            .ok_or_else(|| CrafterError::ItemParse(format!("no rarity line in {:?}", preview(&raw))))?;
        let rarity = Rarity::from_label(&caps[1]);
        let rarity_end = caps.get(0).map_or(0, |m| m.end());

        let name = raw[rarity_end..]
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .filter(|l| *l != SECTION_SEPARATOR)
            .unwrap_or_default()
            .to_owned();

        let mut affixes = Affixes::default();
        let mut headers = 0;
        for caps in affix_re().captures_iter(&raw) {
            headers += 1;
            match &caps[1] {
                "Prefix" => affixes.prefixes += 1,
                _ => affixes.suffixes += 1,
            }
        }

        Ok(Self {
            rarity,
            name,
            affixes: (headers > 0).then_some(affixes),
            raw,
        })
    }

    /// Only Magic items take alterations and augmentations.
    pub fn is_magic(&self) -> bool {
        self.rarity == Rarity::Magic
    }

    /// Whether `target` matches anywhere in the normalised text.
    pub fn matches(&self, target: &Regex) -> bool {
        target.is_match(&self.raw)
    }

    /// Sections of the item text between `--------` separators.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.raw
            .split(SECTION_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn preview(text: &str) -> String {
    text.chars().take(40).collect()
}
