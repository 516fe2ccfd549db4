use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt::{Display, Formatter};

/// A normalized key as bound in the action tables. Shifted letters arrive as
/// their uppercase `Char`, so `Char('R')` is Shift-R.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Enter,
    Esc,
    Up,
    Down,
    Home,
    End,
}

impl Key {
    pub fn from_event(key: KeyEvent) -> Option<Self> {
        match key.code {
            KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Self::Ctrl(c.to_ascii_lowercase()))
            }
            KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::ALT) => None,
            KeyCode::Char(c) => Some(Self::Char(c)),
            KeyCode::Enter => Some(Self::Enter),
            KeyCode::Esc => Some(Self::Esc),
            KeyCode::Up => Some(Self::Up),
            KeyCode::Down => Some(Self::Down),
            KeyCode::Home => Some(Self::Home),
            KeyCode::End => Some(Self::End),
            _ => None,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Char(c) if c.is_ascii_uppercase() => {
                write!(f, "<shift-{}>", c.to_ascii_lowercase())
            }
            Self::Char(c) => write!(f, "<{c}>"),
            Self::Ctrl(c) => write!(f, "<ctrl-{c}>"),
            Self::Enter => write!(f, "<enter>"),
            Self::Esc => write!(f, "<esc>"),
            Self::Up => write!(f, "<up>"),
            Self::Down => write!(f, "<down>"),
            Self::Home => write!(f, "<home>"),
            Self::End => write!(f, "<end>"),
        }
    }
}
