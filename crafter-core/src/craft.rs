//! The alteration/augmentation loop.
//!
//! [`Crafter`] drives a [`Desktop`] through a fixed decision procedure:
//!
//! 1. wait for the game window to be in the foreground;
//! 2. copy the item under the cursor and parse it;
//! 3. stop if it matches the target, the abort key is held, or the game lost
//!    focus;
//! 4. otherwise spend an augmentation (single-affix item) or an alteration
//!    and go back to 2.
//!
//! Every pause is a fixed sleep from the profile.  Any platform failure ends
//! the run with an error; there is no retry.

use std::time::Duration;

use serde::Serialize;

use crate::clipboard;
use crate::config::ResolvedProfile;
use crate::errors::{CrafterError, Result};
use crate::input::{self, MouseButton, Point};
use crate::item::ItemText;
use crate::window;

/// Platform surface the crafter needs.  [`Win32Desktop`] is the real one.
pub trait Desktop {
    /// Title of the focused window.
    fn foreground_title(&mut self) -> Result<String>;
    /// Put the cursor at `to` without clicking.
    fn move_cursor(&mut self, to: Point) -> Result<()>;
    /// Press and release `button` at `at`.
    fn click(&mut self, at: Point, button: MouseButton) -> Result<()>;
    /// Press `keys` in order, release in reverse.
    fn hotkey(&mut self, keys: &[u16]) -> Result<()>;
    fn clear_clipboard(&mut self) -> Result<()>;
    /// Clipboard contents as text; an empty clipboard is an error.
    fn clipboard_text(&mut self) -> Result<String>;
    /// Whether `vk_code` is held right now.
    fn key_down(&mut self, vk_code: u16) -> bool;
    fn sleep(&mut self, duration: Duration);
}

/// [`Desktop`] backed by the live Win32 session.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Desktop;

impl Desktop for Win32Desktop {
    fn foreground_title(&mut self) -> Result<String> {
        window::foreground_window_title()
    }

    fn move_cursor(&mut self, to: Point) -> Result<()> {
        input::set_cursor_position(to)
    }

    fn click(&mut self, at: Point, button: MouseButton) -> Result<()> {
        input::send_click(at, button)
    }

    fn hotkey(&mut self, keys: &[u16]) -> Result<()> {
        input::send_hotkey(keys)
    }

    fn clear_clipboard(&mut self) -> Result<()> {
        clipboard::clear_clipboard()
    }

    fn clipboard_text(&mut self) -> Result<String> {
        clipboard::read_clipboard_text()
    }

    fn key_down(&mut self, vk_code: u16) -> bool {
        input::is_key_down(vk_code)
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Matched,
    Exhausted,
    Aborted,
    FocusLost,
}

#[derive(Debug, Clone, Serialize)]
pub struct CraftReport {
    pub alterations: u32,
    pub augmentations: u32,
    pub outcome: Outcome,
    /// Last item text read from the clipboard.
    pub last_item: Option<ItemText>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Currency {
    Alteration,
    Augmentation,
}

/// Runs one craft session against a [`Desktop`] with a validated profile.
pub struct Crafter<D: Desktop> {
    desktop: D,
    profile: ResolvedProfile,
}

impl<D: Desktop> Crafter<D> {
    pub fn new(desktop: D, profile: ResolvedProfile) -> Self {
        Self { desktop, profile }
    }

    /// Give back the desktop, e.g. to inspect a scripted one after a run.
    pub fn into_desktop(self) -> D {
        self.desktop
    }

    /// Wait for focus, then roll the item until a stop condition holds.
    ///
    /// Stop checks run in this order on every roll: target match, abort
    /// key, focus loss, alteration budget.  A matching item therefore wins
    /// over a held abort key.  Platform and parse failures end the run with
    /// an error.
    pub fn run(&mut self) -> Result<CraftReport> {
        self.wait_for_focus()?;

        let mut alterations = 0;
        let mut augmentations = 0;
        // Set after an augmentation, cleared by the next alteration, so a
        // failed augmentation is never repeated on the same roll.
        let mut augmented = false;

        let mut item = self.inspect()?;

        let outcome = loop {
            if item.matches(&self.profile.target) {
                log::info!("target hit on {:?}", item.name);
                break Outcome::Matched;
            }
            if self.desktop.key_down(self.profile.abort_key) {
                log::warn!("abort key held, stopping");
                break Outcome::Aborted;
            }
            if !self.is_focused()? {
                log::warn!("{:?} lost focus, stopping", self.profile.window_title);
                break Outcome::FocusLost;
            }

            let single_affix = item.affixes.is_some_and(|a| a.total() == 1);
            if self.profile.use_augmentation && single_affix && !augmented {
                self.apply(Currency::Augmentation)?;
                augmentations += 1;
                augmented = true;
            } else {
                if alterations >= self.profile.max_attempts {
                    log::info!("no hit after {alterations} alterations");
                    break Outcome::Exhausted;
                }
                self.apply(Currency::Alteration)?;
                alterations += 1;
                augmented = false;
            }

            item = self.inspect()?;
            log::debug!(
                "roll {alterations}/{augmentations}: {:?} ({:?})",
                item.name,
                item.affixes
            );
        };

        Ok(CraftReport {
            alterations,
            augmentations,
            outcome,
            last_item: Some(item),
        })
    }

    fn is_focused(&mut self) -> Result<bool> {
        let title = self.desktop.foreground_title()?;
        Ok(window::title_matches(&title, &self.profile.window_title))
    }

    fn wait_for_focus(&mut self) -> Result<()> {
        let poll = self.profile.delays.focus_poll;
        let timeout = self.profile.delays.focus_timeout;
        let mut waited = Duration::ZERO;

        loop {
            if self.is_focused()? {
                return Ok(());
            }
            if waited >= timeout {
                return Err(CrafterError::Focus(format!(
                    "{:?} not in foreground after {}ms",
                    self.profile.window_title,
                    timeout.as_millis()
                )));
            }
            if waited.is_zero() {
                log::info!("waiting for {:?} to be focused", self.profile.window_title);
            }
            self.desktop.sleep(poll);
            waited += poll;
        }
    }

    /// Hover the item, copy it and parse the clipboard.
    fn inspect(&mut self) -> Result<ItemText> {
        let delays = self.profile.delays;

        self.desktop.move_cursor(self.profile.positions.item)?;
        self.desktop.sleep(delays.after_move);
        self.desktop.clear_clipboard()?;
        self.desktop.hotkey(&self.profile.copy_combo)?;
        self.desktop.sleep(delays.after_copy);

        let text = self.desktop.clipboard_text()?;
        let item = ItemText::parse(&text)?;
        if !item.is_magic() {
            return Err(CrafterError::ItemParse(format!(
                "expected a Magic item, found {} {:?}",
                item.rarity, item.name
            )));
        }
        Ok(item)
    }

    /// Right-click the currency stack, then left-click the item.
    fn apply(&mut self, currency: Currency) -> Result<()> {
        let delays = self.profile.delays;
        let source = match currency {
            Currency::Alteration => self.profile.positions.alteration,
            Currency::Augmentation => self.profile.positions.augmentation,
        };
        let target = self.profile.positions.item;

        self.desktop.move_cursor(source)?;
        self.desktop.sleep(delays.after_move);
        self.desktop.click(source, MouseButton::Right)?;
        self.desktop.sleep(delays.after_click);
        self.desktop.move_cursor(target)?;
        self.desktop.sleep(delays.after_move);
        self.desktop.click(target, MouseButton::Left)?;
        self.desktop.sleep(delays.after_click);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::config::CraftProfile;
    use crate::input::vk;

    const TWO_AFFIXES: &str = "Item Class: Rings
Rarity: Magic
Glinting Sapphire Ring of the Whelpling
--------
{ Prefix Modifier \"Glinting\" (Tier: 8) }
Adds 1 to 4 Physical Damage to Attacks
{ Suffix Modifier \"of the Whelpling\" (Tier: 7) }
+12 to maximum Life
";

    const ONE_AFFIX: &str = "Item Class: Rings
Rarity: Magic
Sapphire Ring of the Whelpling
--------
{ Suffix Modifier \"of the Whelpling\" (Tier: 7) }
+12 to maximum Life
";

    const TARGET: &str = "Item Class: Rings
Rarity: Magic
Sapphire Ring of the Lynx
--------
{ Suffix Modifier \"of the Lynx\" (Tier: 1) }
+55 to Dexterity
";

    const RARE: &str = "Item Class: Rings
Rarity: Rare
Doom Loop
Sapphire Ring
";

    #[derive(Debug, Clone, PartialEq)]
    enum Action {
        Move(Point),
        Click(Point, MouseButton),
        Hotkey(Vec<u16>),
    }

    /// Scripted desktop.  Each queue yields its front element; the last one
    /// sticks.
    struct FakeDesktop {
        titles: VecDeque<String>,
        copies: VecDeque<String>,
        clipboard: Option<String>,
        abort_after: Option<usize>,
        key_polls: usize,
        actions: Vec<Action>,
        slept: Duration,
    }

    impl FakeDesktop {
        fn new(titles: &[&str], copies: &[&str]) -> Self {
            Self {
                titles: titles.iter().map(|s| s.to_string()).collect(),
                copies: copies.iter().map(|s| s.to_string()).collect(),
                clipboard: None,
                abort_after: None,
                key_polls: 0,
                actions: Vec::new(),
                slept: Duration::ZERO,
            }
        }

        fn focused(copies: &[&str]) -> Self {
            Self::new(&["Path of Exile"], copies)
        }

        fn clicks(&self) -> Vec<(Point, MouseButton)> {
            self.actions
                .iter()
                .filter_map(|a| match a {
                    Action::Click(p, b) => Some((*p, *b)),
                    _ => None,
                })
                .collect()
        }
    }

    fn next_sticky(queue: &mut VecDeque<String>) -> Option<String> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    impl Desktop for FakeDesktop {
        fn foreground_title(&mut self) -> Result<String> {
            next_sticky(&mut self.titles)
                .ok_or_else(|| CrafterError::Window("no foreground window".into()))
        }

        fn move_cursor(&mut self, to: Point) -> Result<()> {
            self.actions.push(Action::Move(to));
            Ok(())
        }

        fn click(&mut self, at: Point, button: MouseButton) -> Result<()> {
            self.actions.push(Action::Click(at, button));
            Ok(())
        }

        fn hotkey(&mut self, keys: &[u16]) -> Result<()> {
            self.actions.push(Action::Hotkey(keys.to_vec()));
            self.clipboard = next_sticky(&mut self.copies);
            Ok(())
        }

        fn clear_clipboard(&mut self) -> Result<()> {
            self.clipboard = None;
            Ok(())
        }

        fn clipboard_text(&mut self) -> Result<String> {
            self.clipboard
                .clone()
                .ok_or_else(|| CrafterError::Clipboard("cant read clipboard".into()))
        }

        fn key_down(&mut self, _vk_code: u16) -> bool {
            self.key_polls += 1;
            self.abort_after.is_some_and(|n| self.key_polls > n)
        }

        fn sleep(&mut self, duration: Duration) {
            self.slept += duration;
        }
    }

    fn profile() -> ResolvedProfile {
        CraftProfile {
            target: "of the Lynx".into(),
            ..CraftProfile::default()
        }
        .resolve()
        .unwrap()
    }

    fn run(desktop: FakeDesktop, profile: ResolvedProfile) -> (Result<CraftReport>, FakeDesktop) {
        let mut crafter = Crafter::new(desktop, profile);
        let result = crafter.run();
        (result, crafter.into_desktop())
    }

    #[test]
    fn test_already_matching_item_spends_nothing() {
        let (report, desktop) = run(FakeDesktop::focused(&[TARGET]), profile());
        let report = report.unwrap();
        assert_eq!(report.outcome, Outcome::Matched);
        assert_eq!((report.alterations, report.augmentations), (0, 0));
        assert!(desktop.clicks().is_empty());
    }

    #[test]
    fn test_alt_aug_sequence_until_match() {
        let desktop = FakeDesktop::focused(&[TWO_AFFIXES, ONE_AFFIX, TWO_AFFIXES, TARGET]);
        let (report, desktop) = run(desktop, profile());
        let report = report.unwrap();

        assert_eq!(report.outcome, Outcome::Matched);
        assert_eq!(report.alterations, 2);
        assert_eq!(report.augmentations, 1);
        assert_eq!(report.last_item.unwrap().name, "Sapphire Ring of the Lynx");

        let positions = profile().positions;
        let right_clicks: Vec<Point> = desktop
            .clicks()
            .into_iter()
            .filter(|(_, b)| *b == MouseButton::Right)
            .map(|(p, _)| p)
            .collect();
        assert_eq!(
            right_clicks,
            vec![positions.alteration, positions.augmentation, positions.alteration]
        );
    }

    #[test]
    fn test_apply_order_right_click_currency_then_left_click_item() {
        let desktop = FakeDesktop::focused(&[TWO_AFFIXES, TARGET]);
        let (report, desktop) = run(desktop, profile());
        assert_eq!(report.unwrap().alterations, 1);

        let positions = profile().positions;
        assert_eq!(
            desktop.clicks(),
            vec![
                (positions.alteration, MouseButton::Right),
                (positions.item, MouseButton::Left),
            ]
        );
    }

    #[test]
    fn test_copy_combo_sent_on_each_inspect() {
        let desktop = FakeDesktop::focused(&[TWO_AFFIXES, TARGET]);
        let (_, desktop) = run(desktop, profile());
        let copies: Vec<&Action> = desktop
            .actions
            .iter()
            .filter(|a| matches!(a, Action::Hotkey(_)))
            .collect();
        assert_eq!(copies.len(), 2);
        assert_eq!(
            copies[0],
            &Action::Hotkey(vec![vk::CONTROL, vk::MENU, vk::C])
        );
    }

    #[test]
    fn test_exhausted_after_max_attempts() {
        let mut profile = profile();
        profile.max_attempts = 3;
        let (report, _) = run(FakeDesktop::focused(&[TWO_AFFIXES]), profile);
        let report = report.unwrap();
        assert_eq!(report.outcome, Outcome::Exhausted);
        assert_eq!(report.alterations, 3);
        assert_eq!(report.augmentations, 0);
    }

    #[test]
    fn test_augmentation_disabled() {
        let mut profile = profile();
        profile.use_augmentation = false;
        profile.max_attempts = 2;
        let (report, _) = run(FakeDesktop::focused(&[ONE_AFFIX]), profile);
        let report = report.unwrap();
        assert_eq!(report.alterations, 2);
        assert_eq!(report.augmentations, 0);
    }

    #[test]
    fn test_failed_augmentation_not_repeated() {
        let desktop = FakeDesktop::focused(&[ONE_AFFIX, ONE_AFFIX, TARGET]);
        let (report, _) = run(desktop, profile());
        let report = report.unwrap();
        assert_eq!(report.outcome, Outcome::Matched);
        assert_eq!((report.alterations, report.augmentations), (1, 1));
    }

    #[test]
    fn test_focus_lost_stops_loop() {
        let desktop = FakeDesktop::new(
            &["Path of Exile", "Path of Exile", "Desktop"],
            &[TWO_AFFIXES],
        );
        let (report, _) = run(desktop, profile());
        let report = report.unwrap();
        assert_eq!(report.outcome, Outcome::FocusLost);
        assert_eq!(report.alterations, 1);
    }

    #[test]
    fn test_waits_for_focus_before_starting() {
        let desktop = FakeDesktop::new(&["Desktop", "Desktop", "Path of Exile"], &[TARGET]);
        let (report, desktop) = run(desktop, profile());
        assert_eq!(report.unwrap().outcome, Outcome::Matched);
        let poll = profile().delays.focus_poll;
        assert!(desktop.slept >= poll * 2);
    }

    #[test]
    fn test_focus_timeout() {
        let mut profile = profile();
        profile.delays.focus_poll = Duration::from_millis(500);
        profile.delays.focus_timeout = Duration::from_millis(1000);
        let (report, desktop) = run(FakeDesktop::new(&["Desktop"], &[TARGET]), profile);
        assert!(matches!(report.unwrap_err(), CrafterError::Focus(_)));
        assert_eq!(desktop.slept, Duration::from_millis(1000));
        assert!(desktop.actions.is_empty());
    }

    #[test]
    fn test_abort_key_stops_loop() {
        let mut desktop = FakeDesktop::focused(&[TWO_AFFIXES]);
        desktop.abort_after = Some(2);
        let (report, _) = run(desktop, profile());
        let report = report.unwrap();
        assert_eq!(report.outcome, Outcome::Aborted);
        assert_eq!(report.alterations, 2);
    }

    #[test]
    fn test_match_wins_over_held_abort_key() {
        let mut desktop = FakeDesktop::focused(&[TWO_AFFIXES, TARGET]);
        desktop.abort_after = Some(1);
        let (report, _) = run(desktop, profile());
        let report = report.unwrap();
        assert_eq!(report.outcome, Outcome::Matched);
        assert_eq!(report.alterations, 1);

        let mut desktop = FakeDesktop::focused(&[TARGET]);
        desktop.abort_after = Some(0);
        let (report, _) = run(desktop, profile());
        assert_eq!(report.unwrap().outcome, Outcome::Matched);
    }

    #[test]
    fn test_non_magic_item_is_error() {
        let (report, _) = run(FakeDesktop::focused(&[RARE]), profile());
        let err = report.unwrap_err();
        assert!(matches!(err, CrafterError::ItemParse(_)));
        assert!(err.to_string().contains("Rare"));
    }

    #[test]
    fn test_clipboard_without_item_is_error() {
        let (report, _) = run(FakeDesktop::focused(&["hello"]), profile());
        assert!(matches!(report.unwrap_err(), CrafterError::ItemParse(_)));
    }

    #[test]
    fn test_report_serialization() {
        let report = CraftReport {
            alterations: 7,
            augmentations: 2,
            outcome: Outcome::FocusLost,
            last_item: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"alterations\":7"));
        assert!(json.contains("\"outcome\":\"focus_lost\""));
        assert!(json.contains("\"last_item\":null"));
    }
}
