use std::borrow::Cow;
use std::collections::HashMap;

use winit::keyboard::{KeyCode, ModifiersState};

use super::scroll::ScrollKey;

/// Modifier flags for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierFlags {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl ModifierFlags {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
}

impl From<ModifiersState> for ModifierFlags {
    fn from(state: ModifiersState) -> Self {
        Self {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
        }
    }
}

/// A key combination: modifier flags + a physical key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub modifiers: ModifierFlags,
    pub key: KeyCode,
}

impl KeyCombo {
    /// Plain key, no modifiers.
    pub const fn plain(key: KeyCode) -> Self {
        Self::new(ModifierFlags::NONE, key)
    }

    pub const fn new(modifiers: ModifierFlags, key: KeyCode) -> Self {
        Self { modifiers, key }
    }
}

/// Actions that can be triggered by keyboard shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Scroll the hovered text up one step per frame while held.
    ScrollUp,
    /// Scroll the hovered text down one step per frame while held.
    ScrollDown,
    /// Half a viewport up.
    PageUp,
    /// Half a viewport down.
    PageDown,
    /// Jump to the top of the hovered text.
    ScrollTop,
    /// Jump to the bottom of the hovered text.
    ScrollBottom,
    /// Continue to the next line of dialogue.
    Advance,
}

impl Action {
    /// Scroll input this action stands for, if any.
    pub fn scroll_key(self) -> Option<ScrollKey> {
        match self {
            Action::ScrollUp => Some(ScrollKey::Up),
            Action::ScrollDown => Some(ScrollKey::Down),
            Action::PageUp => Some(ScrollKey::PageUp),
            Action::PageDown => Some(ScrollKey::PageDown),
            Action::ScrollTop => Some(ScrollKey::Home),
            Action::ScrollBottom => Some(ScrollKey::End),
            Action::Advance => None,
        }
    }

    /// Held actions repeat every frame; the rest fire once per press.
    pub fn repeats_while_held(self) -> bool {
        matches!(self, Action::ScrollUp | Action::ScrollDown)
    }
}

/// Configurable keyboard shortcut map.
pub struct KeyBindings {
    map: HashMap<KeyCombo, Action>,
    /// Reverse lookup: action → first combo bound to it.
    reverse: HashMap<Action, KeyCombo>,
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Arrow/page keys scroll, Enter or Space advance the dialogue.
    pub fn defaults() -> Self {
        let mut kb = Self::empty();

        kb.bind(KeyCombo::plain(KeyCode::ArrowUp), Action::ScrollUp);
        kb.bind(KeyCombo::plain(KeyCode::ArrowDown), Action::ScrollDown);
        kb.bind(KeyCombo::plain(KeyCode::PageUp), Action::PageUp);
        kb.bind(KeyCombo::plain(KeyCode::PageDown), Action::PageDown);
        kb.bind(KeyCombo::plain(KeyCode::Home), Action::ScrollTop);
        kb.bind(KeyCombo::plain(KeyCode::End), Action::ScrollBottom);
        kb.bind(KeyCombo::plain(KeyCode::Enter), Action::Advance);
        kb.bind(KeyCombo::plain(KeyCode::Space), Action::Advance);

        kb
    }

    /// Bind a combo, replacing whatever it did before. The first combo bound
    /// to an action is the one shown by [`KeyBindings::label_for`].
    pub fn bind(&mut self, combo: KeyCombo, action: Action) {
        if let Some(previous) = self.map.insert(combo, action)
            && previous != action
            && self.reverse.get(&previous) == Some(&combo)
        {
            self.reverse.remove(&previous);
        }
        self.reverse.entry(action).or_insert(combo);
    }

    /// Look up the action for a key combination.
    pub fn lookup(&self, combo: KeyCombo) -> Option<Action> {
        self.map.get(&combo).copied()
    }

    /// Action for an unmodified key.
    pub fn lookup_key(&self, key: KeyCode) -> Option<Action> {
        self.lookup(KeyCombo::plain(key))
    }

    /// Action for `key` with the modifiers held this frame. Combos match
    /// exactly, so Ctrl+Enter does not trigger a plain Enter binding.
    pub fn lookup_with(&self, modifiers: ModifierFlags, key: KeyCode) -> Option<Action> {
        self.lookup(KeyCombo::new(modifiers, key))
    }

    /// Display label for an action's first binding, e.g. "Enter" or "Ctrl+N".
    pub fn label_for(&self, action: Action) -> Option<String> {
        let combo = self.reverse.get(&action)?;
        let mut label = String::new();
        for (held, name) in [
            (combo.modifiers.ctrl, "Ctrl+"),
            (combo.modifiers.alt, "Alt+"),
            (combo.modifiers.shift, "Shift+"),
        ] {
            if held {
                label.push_str(name);
            }
        }
        label.push_str(&key_name(combo.key));
        Some(label)
    }
}

/// Short name for a key code. Letters and digits drop winit's `Key`/`Digit`
/// prefix; navigation keys use the abbreviations printed on keyboards.
fn key_name(key: KeyCode) -> Cow<'static, str> {
    let name = match key {
        KeyCode::Space => "Space",
        KeyCode::Enter => "Enter",
        KeyCode::Escape => "Esc",
        KeyCode::Tab => "Tab",
        KeyCode::Backspace => "Bksp",
        KeyCode::ArrowUp => "Up",
        KeyCode::ArrowDown => "Down",
        KeyCode::ArrowLeft => "Left",
        KeyCode::ArrowRight => "Right",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PgUp",
        KeyCode::PageDown => "PgDn",
        other => {
            let debug = format!("{other:?}");
            let short = debug
                .strip_prefix("Key")
                .or_else(|| debug.strip_prefix("Digit"))
                .unwrap_or(&debug);
            return Cow::Owned(short.to_string());
        }
    };
    Cow::Borrowed(name)
}
