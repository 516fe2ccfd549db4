use tracing::warn;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Page {
    name: String,
    resident: bool,
    visible: bool,
}

impl Page {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resident pages keep their state while hidden; the others are reset
    /// every time they are shown.
    pub fn resident(&self) -> bool {
        self.resident
    }

    pub fn visible(&self) -> bool {
        self.visible
    }
}

/// Named screens with one visible at a time.
///
/// History is a single slot: `switch_page` remembers the page it hides and
/// `back` returns to it once. This is not a stack.
#[derive(Debug, Clone, Default)]
pub struct PageStack {
    pages: Vec<Page>,
    current: Option<usize>,
    previous: Option<usize>,
}

impl PageStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page. A visible page takes over the screen without being
    /// recorded in history. Re-adding a name replaces its flags.
    pub fn add_page(&mut self, name: impl Into<String>, resident: bool, visible: bool) {
        let name = name.into();
        let index = match self.position(&name) {
            Some(index) => {
                self.pages[index].resident = resident;
                index
            }
            None => {
                self.pages.push(Page {
                    name,
                    resident,
                    visible: false,
                });
                self.pages.len() - 1
            }
        };

        if visible {
            if let Some(current) = self.current {
                self.pages[current].visible = false;
            }
            self.pages[index].visible = true;
            self.current = Some(index);
        }
    }

    /// Shows `name` and hides the current page, remembering it for `back`.
    /// Returns the page now shown, or `None` when nothing changed.
    pub fn switch_page(&mut self, name: &str) -> Option<&Page> {
        let Some(target) = self.position(name) else {
            warn!(page = name, "switch to unknown page ignored");
            return None;
        };
        if self.current == Some(target) {
            return None;
        }

        if let Some(current) = self.current {
            self.pages[current].visible = false;
        }
        self.previous = self.current;
        self.current = Some(target);
        self.pages[target].visible = true;
        Some(&self.pages[target])
    }

    /// Re-shows the remembered page and forgets it. Without one this is a
    /// no-op and the current page stays up.
    pub fn back(&mut self) -> Option<&Page> {
        let previous = self.previous.take()?;
        if let Some(current) = self.current {
            self.pages[current].visible = false;
        }
        self.current = Some(previous);
        self.pages[previous].visible = true;
        Some(&self.pages[previous])
    }

    pub fn current(&self) -> Option<&str> {
        self.current.map(|index| self.pages[index].name.as_str())
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.map(|index| self.pages[index].name.as_str())
    }

    pub fn page(&self, name: &str) -> Option<&Page> {
        self.position(name).map(|index| &self.pages[index])
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.page(name).is_some_and(Page::visible)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.pages.iter().position(|page| page.name == name)
    }
}
