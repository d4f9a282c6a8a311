use crate::tui::action::Action;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Single keybinding entry as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub action: Action,
}

impl KeyBinding {
    pub fn new(key: &str, action: Action) -> Self {
        Self {
            key: key.to_string(),
            action,
        }
    }
}

/// Normalised key press used for lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyPattern {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self::normalized(code, modifiers)
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self::normalized(event.code, event.modifiers)
    }

    /// Character keys already encode Shift in the character itself, and
    /// terminals disagree on whether they also report the modifier.
    fn normalized(code: KeyCode, modifiers: KeyModifiers) -> Self {
        match code {
            KeyCode::Char(_) => Self {
                code,
                modifiers: modifiers - KeyModifiers::SHIFT,
            },
            KeyCode::Tab if modifiers.contains(KeyModifiers::SHIFT) => Self {
                code: KeyCode::BackTab,
                modifiers: modifiers - KeyModifiers::SHIFT,
            },
            KeyCode::BackTab => Self {
                code,
                modifiers: modifiers - KeyModifiers::SHIFT,
            },
            _ => Self { code, modifiers },
        }
    }
}

impl FromStr for KeyPattern {
    type Err = String;

    /// Parse "Ctrl+c", "Shift+Tab", "space", "F1", "?" and the like
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mods, key_part) = match s.rsplit_once('+') {
            Some((mods, key)) if !key.is_empty() => (Some(mods), key),
            _ => (None, s),
        };

        let mut modifiers = KeyModifiers::empty();
        for part in mods.into_iter().flat_map(|m| m.split('+')) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                other => return Err(format!("Unknown modifier: {other}")),
            }
        }

        let mut chars = key_part.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(ch), None) => KeyCode::Char(ch),
            _ => match key_part.to_ascii_lowercase().as_str() {
                "up" => KeyCode::Up,
                "down" => KeyCode::Down,
                "left" => KeyCode::Left,
                "right" => KeyCode::Right,
                "pageup" | "pgup" => KeyCode::PageUp,
                "pagedown" | "pgdn" => KeyCode::PageDown,
                "home" => KeyCode::Home,
                "end" => KeyCode::End,
                "tab" => KeyCode::Tab,
                "backtab" => KeyCode::BackTab,
                "enter" | "return" => KeyCode::Enter,
                "esc" | "escape" => KeyCode::Esc,
                "backspace" => KeyCode::Backspace,
                "delete" | "del" => KeyCode::Delete,
                "space" => KeyCode::Char(' '),
                f if f.starts_with('f') => match f[1..].parse::<u8>() {
                    Ok(n) if (1..=12).contains(&n) => KeyCode::F(n),
                    _ => return Err(format!("Invalid function key: {key_part}")),
                },
                _ => return Err(format!("Unknown key: {key_part}")),
            },
        };

        Ok(Self::normalized(code, modifiers))
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "Ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "Alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            write!(f, "Shift+")?;
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "Space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Up => write!(f, "↑"),
            KeyCode::Down => write!(f, "↓"),
            KeyCode::Left => write!(f, "←"),
            KeyCode::Right => write!(f, "→"),
            KeyCode::BackTab => write!(f, "Shift+Tab"),
            KeyCode::F(n) => write!(f, "F{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Maps key presses to actions
#[derive(Debug, Clone, Default)]
pub struct KeyBindings {
    bindings: Vec<KeyBinding>,
    map: HashMap<KeyPattern, Action>,
}

impl KeyBindings {
    /// Build from config entries; unparsable keys are skipped (see [`validate`](Self::validate))
    pub fn from_bindings(bindings: Vec<KeyBinding>) -> Self {
        let map = bindings
            .iter()
            .filter_map(|b| b.key.parse::<KeyPattern>().ok().map(|p| (p, b.action)))
            .collect();
        Self { bindings, map }
    }

    pub fn get_action(&self, key: &KeyEvent) -> Option<Action> {
        self.map.get(&KeyPattern::from_event(key)).copied()
    }

    /// Keys bound to `action`, formatted for the help screen
    pub fn keys_for_action(&self, action: Action) -> Vec<String> {
        self.bindings
            .iter()
            .filter(|b| b.action == action)
            .filter_map(|b| b.key.parse::<KeyPattern>().ok())
            .map(|p| p.to_string())
            .collect()
    }

    pub fn unbound_actions(&self) -> Vec<Action> {
        let bound: HashSet<Action> = self.bindings.iter().map(|b| b.action).collect();
        Action::all()
            .into_iter()
            .filter(|a| !bound.contains(a))
            .collect()
    }

    /// Human-readable problems with the configured bindings
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen: HashMap<KeyPattern, Action> = HashMap::new();
        for binding in &self.bindings {
            match binding.key.parse::<KeyPattern>() {
                Ok(pattern) => {
                    if let Some(existing) = seen.insert(pattern, binding.action)
                        && existing != binding.action
                    {
                        warnings.push(format!(
                            "Duplicate key '{}': bound to both {:?} and {:?}",
                            binding.key, existing, binding.action
                        ));
                    }
                }
                Err(e) => warnings.push(format!(
                    "Invalid key pattern '{}' for action {:?}: {e}",
                    binding.key, binding.action
                )),
            }
        }
        let unbound = self.unbound_actions();
        if !unbound.is_empty() {
            warnings.push(format!("{} action(s) have no keybindings: {unbound:?}", unbound.len()));
        }
        warnings
    }
}
