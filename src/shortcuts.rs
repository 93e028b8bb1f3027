//! Configurable key bindings, one table per view.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every binding table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Shortcuts {
    pub global: GlobalShortcuts,
    pub intro: IntroShortcuts,
    pub entrance: EntranceShortcuts,
    pub dial: DialShortcuts,
    pub guestboard: GuestboardShortcuts,
}

/// Bindings active in every view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalShortcuts {
    pub quit: Vec<String>,
    /// Back to the entrance page.
    pub back: Vec<String>,
    /// Replay the intro from the start.
    #[serde(default = "default_restart")]
    pub restart: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntroShortcuts {
    pub skip: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntranceShortcuts {
    pub roll: Vec<String>,
    pub next_link: Vec<String>,
    pub prev_link: Vec<String>,
    pub open: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialShortcuts {
    pub focus: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestboardShortcuts {
    /// Drop the note at the current cursor position.
    pub place: Vec<String>,
}

impl Shortcuts {
    /// Read from TOML, falling back to defaults when the file is missing.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let shortcuts: Shortcuts = toml::from_str(&content)?;
            Ok(shortcuts)
        } else {
            Ok(Self::default())
        }
    }

    #[allow(dead_code)]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_restart() -> Vec<String> {
    keys(&["Ctrl+r"])
}

impl Default for GlobalShortcuts {
    fn default() -> Self {
        Self {
            quit: keys(&["q", "Ctrl+c"]),
            back: keys(&["Esc"]),
            restart: default_restart(),
        }
    }
}

impl Default for IntroShortcuts {
    fn default() -> Self {
        Self {
            skip: keys(&["Enter", "Space", "s"]),
        }
    }
}

impl Default for EntranceShortcuts {
    fn default() -> Self {
        Self {
            roll: keys(&["r"]),
            next_link: keys(&["Tab", "Right", "l"]),
            prev_link: keys(&["Shift+BackTab", "BackTab", "Left", "h"]),
            open: keys(&["Enter"]),
        }
    }
}

impl Default for DialShortcuts {
    fn default() -> Self {
        Self {
            focus: keys(&["Tab"]),
            up: keys(&["Up", "k"]),
            down: keys(&["Down", "j"]),
        }
    }
}

impl Default for GuestboardShortcuts {
    fn default() -> Self {
        Self {
            place: keys(&["Enter"]),
        }
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            global: GlobalShortcuts::default(),
            intro: IntroShortcuts::default(),
            entrance: EntranceShortcuts::default(),
            dial: DialShortcuts::default(),
            guestboard: GuestboardShortcuts::default(),
        }
    }
}

/// True when `key` matches any of the binding strings.
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts.iter().any(|s| matches_single_shortcut(key, s))
}

fn matches_single_shortcut(key: &KeyEvent, shortcut: &str) -> bool {
    // e.g. "Ctrl+u", "a", "Enter"
    let parts: Vec<&str> = shortcut.split('+').collect();

    let (modifiers_str, key_str) = if parts.len() > 1 {
        (&parts[0..parts.len() - 1], parts[parts.len() - 1])
    } else {
        (&[][..], parts[0])
    };

    let mut expected_modifiers = KeyModifiers::empty();
    for modifier in modifiers_str {
        match *modifier {
            "Ctrl" | "ctrl" => expected_modifiers |= KeyModifiers::CONTROL,
            "Alt" | "alt" => expected_modifiers |= KeyModifiers::ALT,
            "Shift" | "shift" => expected_modifiers |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }

    if key.modifiers != expected_modifiers {
        return false;
    }

    match key_str {
        "Enter" | "enter" => key.code == KeyCode::Enter,
        "Esc" | "esc" => key.code == KeyCode::Esc,
        "Tab" | "tab" => key.code == KeyCode::Tab,
        "BackTab" | "backtab" => key.code == KeyCode::BackTab,
        "Space" | "space" => key.code == KeyCode::Char(' '),
        "Backspace" | "backspace" => key.code == KeyCode::Backspace,
        "Delete" | "delete" => key.code == KeyCode::Delete,
        "Up" | "up" => key.code == KeyCode::Up,
        "Down" | "down" => key.code == KeyCode::Down,
        "Left" | "left" => key.code == KeyCode::Left,
        "Right" | "right" => key.code == KeyCode::Right,
        "Home" | "home" => key.code == KeyCode::Home,
        "End" | "end" => key.code == KeyCode::End,
        s if s.len() == 1 => {
            if let Some(c) = s.chars().next() {
                key.code == KeyCode::Char(c)
            } else {
                false
            }
        }
        _ => false,
    }
}
