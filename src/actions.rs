use crate::input::Key;
use std::collections::BTreeMap;

/// What a bound key does once the view accepts it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Command {
    Quit,
    ToggleHelp,
    Refresh,
    Up,
    Down,
    Top,
    Bottom,
    Back,
    SortColumn { column: usize, ascending: bool },
    Logs,
    Shell,
    Confirm,
    TogglePrevious,
}

impl Command {
    /// Commands that act on the highlighted row and must not run without one.
    pub fn row_scoped(self) -> bool {
        matches!(self, Self::Logs | Self::Shell)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KeyAction {
    pub description: String,
    pub command: Command,
    pub visible: bool,
}

impl KeyAction {
    pub fn new(description: impl Into<String>, command: Command, visible: bool) -> Self {
        Self {
            description: description.into(),
            command,
            visible,
        }
    }
}

/// Hook a specialized view uses to layer its own bindings over the base set.
pub type ExtraActionsFn = fn(&mut KeyActions);

#[derive(Debug, Clone, Default)]
pub struct KeyActions {
    entries: BTreeMap<Key, KeyAction>,
}

impl KeyActions {
    /// Builds the dispatch table for one view instance: `base` first, then
    /// whatever `extra` registers on top of it.
    pub fn merged(base: KeyActions, extra: Option<ExtraActionsFn>) -> Self {
        let mut actions = base;
        if let Some(extra) = extra {
            extra(&mut actions);
        }
        actions
    }

    /// Registers `action` under `key`, returning the entry it shadows.
    pub fn insert(&mut self, key: Key, action: KeyAction) -> Option<KeyAction> {
        self.entries.insert(key, action)
    }

    pub fn extend(&mut self, extra: KeyActions) {
        for (key, action) in extra.entries {
            self.entries.insert(key, action);
        }
    }

    pub fn dispatch(&self, key: Key) -> Option<&KeyAction> {
        self.entries.get(&key)
    }

    pub fn hints(&self) -> impl Iterator<Item = (Key, &KeyAction)> {
        self.entries
            .iter()
            .filter(|(_, action)| action.visible)
            .map(|(key, action)| (*key, action))
    }
}

impl FromIterator<(Key, KeyAction)> for KeyActions {
    fn from_iter<T: IntoIterator<Item = (Key, KeyAction)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
