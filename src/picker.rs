type ConfirmFn<R> = Box<dyn FnOnce(usize, &str) -> R>;

/// Selectable list filled on demand. Confirming hands the highlighted entry
/// to the continuation registered with `on_confirm`, which runs at most once
/// per populate cycle.
pub struct Picker<R> {
    title: String,
    items: Vec<String>,
    selected: usize,
    on_confirm: Option<ConfirmFn<R>>,
}

impl<R> Picker<R> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
            selected: 0,
            on_confirm: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Replaces the entries and moves the cursor back to the first one.
    pub fn populate(&mut self, items: Vec<String>) {
        self.items = items;
        self.selected = 0;
    }

    pub fn on_confirm(&mut self, callback: impl FnOnce(usize, &str) -> R + 'static) {
        self.on_confirm = Some(Box::new(callback));
    }

    pub fn reset(&mut self) {
        self.items.clear();
        self.selected = 0;
        self.on_confirm = None;
    }

    pub fn confirm(&mut self) -> Option<R> {
        let item = self.items.get(self.selected)?;
        let callback = self.on_confirm.take()?;
        Some(callback(self.selected, item))
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.selected)
    }

    pub fn select(&mut self, index: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = index.min(self.items.len() - 1);
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let max = self.items.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, max) as usize;
    }

    pub fn select_first(&mut self) {
        self.select(0);
    }

    pub fn select_last(&mut self) {
        self.select(usize::MAX);
    }
}
