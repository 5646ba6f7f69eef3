//! Craft profiles.
//!
//! A profile is a TOML file describing where things are on screen, how long
//! to wait after each action, and what the crafter is looking for.  Every
//! field has a default so an empty file is a valid profile.
//!
//! ```toml
//! window_title = "Path of Exile"
//! target = '\+\d+ to maximum Life'
//! max_attempts = 200
//!
//! [positions]
//! alteration = { x = 110, y = 275 }
//! augmentation = { x = 230, y = 275 }
//! item = { x = 330, y = 450 }
//!
//! [delays]
//! click_ms = 120
//! ```

use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{CrafterError, Result};
use crate::input::{parse_combo, parse_key_name, Point};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CraftProfile {
    /// Exact foreground title of the game client.
    pub window_title: String,
    /// Regex the copied item text must match to stop.
    pub target: String,
    /// Upper bound on alterations spent in one run.
    pub max_attempts: u32,
    /// Spend an augmentation when the item rolled a single affix.
    pub use_augmentation: bool,
    /// Key combination that copies the hovered item.
    pub copy_combo: String,
    /// Key that, while held, stops the loop.
    pub abort_key: String,
    pub positions: Positions,
    pub delays: Delays,
}

impl Default for CraftProfile {
    fn default() -> Self {
        Self {
            window_title: "Path of Exile".to_owned(),
            target: String::new(),
            max_attempts: 500,
            use_augmentation: true,
            copy_combo: "ctrl+alt+c".to_owned(),
            abort_key: "f12".to_owned(),
            positions: Positions::default(),
            delays: Delays::default(),
        }
    }
}

/// Fixed screen positions for the currency stacks and the crafted item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Positions {
    pub alteration: Point,
    pub augmentation: Point,
    pub item: Point,
}

impl Default for Positions {
    fn default() -> Self {
        Self {
            alteration: Point::new(110, 275),
            augmentation: Point::new(230, 275),
            item: Point::new(330, 450),
        }
    }
}

/// Fixed waits, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Delays {
    pub focus_poll_ms: u64,
    pub focus_timeout_ms: u64,
    pub move_ms: u64,
    pub click_ms: u64,
    pub copy_ms: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            focus_poll_ms: 500,
            focus_timeout_ms: 30_000,
            move_ms: 60,
            click_ms: 100,
            copy_ms: 120,
        }
    }
}

impl CraftProfile {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CrafterError::Config(format!("invalid profile: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CrafterError::Config(format!("cant read profile {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply command-line overrides on top of the loaded profile.
    ///
    /// Fails when neither the profile nor the override supplies a target.
    pub fn apply_overrides(&mut self, target: Option<String>, max_attempts: Option<u32>) -> Result<()> {
        if let Some(target) = target {
            self.target = target;
        }
        if let Some(max_attempts) = max_attempts {
            self.max_attempts = max_attempts;
        }
        if self.target.is_empty() {
            return Err(CrafterError::Config(
                "no target regex: pass --target or set `target` in the profile".into(),
            ));
        }
        Ok(())
    }

    /// Compile the regex and key names.  Nothing touches the desktop until
    /// this has succeeded.
    pub fn resolve(&self) -> Result<ResolvedProfile> {
        if self.window_title.is_empty() {
            return Err(CrafterError::Config("window_title must not be empty".into()));
        }
        if self.target.is_empty() {
            return Err(CrafterError::Config("target regex must not be empty".into()));
        }
        if self.max_attempts == 0 {
            return Err(CrafterError::Config("max_attempts must be at least 1".into()));
        }
        if self.delays.focus_poll_ms == 0 {
            return Err(CrafterError::Config("focus_poll_ms must be at least 1".into()));
        }

        let target = Regex::new(&self.target)
            .map_err(|e| CrafterError::Config(format!("invalid target regex: {e}")))?;
        let copy_combo = parse_combo(&self.copy_combo)?;
        let abort_key = parse_key_name(&self.abort_key).ok_or_else(|| {
            CrafterError::Config(format!("unknown abort key: {:?}", self.abort_key))
        })?;

        Ok(ResolvedProfile {
            window_title: self.window_title.clone(),
            target,
            max_attempts: self.max_attempts,
            use_augmentation: self.use_augmentation,
            copy_combo,
            abort_key,
            positions: self.positions.clone(),
            delays: ResolvedDelays {
                focus_poll: Duration::from_millis(self.delays.focus_poll_ms),
                focus_timeout: Duration::from_millis(self.delays.focus_timeout_ms),
                after_move: Duration::from_millis(self.delays.move_ms),
                after_click: Duration::from_millis(self.delays.click_ms),
                after_copy: Duration::from_millis(self.delays.copy_ms),
            },
        })
    }
}

/// A validated profile, ready for [`crate::craft::Crafter`].
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub window_title: String,
    pub target: Regex,
    pub max_attempts: u32,
    pub use_augmentation: bool,
    pub copy_combo: Vec<u16>,
    pub abort_key: u16,
    pub positions: Positions,
    pub delays: ResolvedDelays,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedDelays {
    pub focus_poll: Duration,
    pub focus_timeout: Duration,
    pub after_move: Duration,
    pub after_click: Duration,
    pub after_copy: Duration,
}
