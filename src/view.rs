use crate::actions::{Command, ExtraActionsFn, KeyAction, KeyActions};
use crate::error::ViewError;
use crate::input::Key;
use crate::model::{Flash, FlashLevel, NamespaceScope, ResourceList, RowData};
use crate::pages::PageStack;
use crate::picker::Picker;
use crate::session::{SessionRequest, SessionTarget};
use crate::table::{SortSpec, TableView};
use chrono::{DateTime, Local, TimeDelta};
use std::collections::HashMap;
use tracing::{debug, error};

pub const LOGS_PAGE: &str = "logs";
pub const PICKER_PAGE: &str = "choose";

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ViewCommand {
    None,
    Refresh,
    Launch(SessionRequest),
}

/// Outcome of a key press. `Ignored` leaves the event to the caller.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Dispatch {
    Ignored,
    Handled(ViewCommand),
}

#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub context: String,
    pub namespace_scope: NamespaceScope,
    pub shell: String,
    pub flash_ttl: TimeDelta,
}

pub struct LogsPage {
    pub(crate) picker: Picker<SessionTarget>,
    pub(crate) previous: bool,
}

impl LogsPage {
    fn new() -> Self {
        Self {
            picker: Picker::new("Logs"),
            previous: false,
        }
    }

    pub fn picker(&self) -> &Picker<SessionTarget> {
        &self.picker
    }

    pub fn previous(&self) -> bool {
        self.previous
    }

    fn reset(&mut self) {
        self.picker.reset();
        self.previous = false;
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Focus {
    List,
    Picker,
    Logs,
}

/// A resource list screen plus the pages stacked on top of it.
pub struct ResourceView<L> {
    name: String,
    title: String,
    settings: ViewSettings,
    list: L,
    table: TableView,
    selected: usize,
    selected_item: String,
    page_actions: HashMap<String, KeyActions>,
    pages: PageStack,
    pub(crate) picker: Picker<SessionTarget>,
    pub(crate) logs: LogsPage,
    flash: Option<Flash>,
    show_help: bool,
    running: bool,
}

impl<L: ResourceList> ResourceView<L> {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        list: L,
        settings: ViewSettings,
        extra_actions: Option<ExtraActionsFn>,
    ) -> Self {
        let name = name.into();
        let mut view = Self {
            name: name.clone(),
            title: title.into(),
            settings,
            list,
            table: TableView::default(),
            selected: 0,
            selected_item: String::new(),
            page_actions: HashMap::new(),
            pages: PageStack::new(),
            picker: Picker::new("Containers"),
            logs: LogsPage::new(),
            flash: None,
            show_help: false,
            running: true,
        };
        let actions = KeyActions::merged(base_actions(), extra_actions);
        view.add_page(name, actions, true, true);
        view.refresh_table();
        view
    }

    pub fn add_page(
        &mut self,
        name: impl Into<String>,
        actions: KeyActions,
        resident: bool,
        visible: bool,
    ) {
        let name = name.into();
        self.pages.add_page(name.clone(), resident, visible);
        self.page_actions.insert(name, actions);
    }

    pub fn handle_key(&mut self, key: Key) -> Dispatch {
        let command = {
            let Some(page) = self.pages.current() else {
                return Dispatch::Ignored;
            };
            match self
                .page_actions
                .get(page)
                .and_then(|actions| actions.dispatch(key))
            {
                Some(action) => action.command,
                None => return Dispatch::Ignored,
            }
        };

        if command.row_scoped() && !self.row_selected() {
            return Dispatch::Ignored;
        }
        if self.show_help && command != Command::ToggleHelp {
            self.show_help = false;
        }
        debug!(?key, ?command, "dispatch");
        self.run(command)
    }

    fn run(&mut self, command: Command) -> Dispatch {
        match command {
            Command::Quit => {
                self.running = false;
                Dispatch::Handled(ViewCommand::None)
            }
            Command::ToggleHelp => {
                self.show_help = !self.show_help;
                Dispatch::Handled(ViewCommand::None)
            }
            Command::Refresh => {
                self.flash(FlashLevel::Info, format!("Refreshing {}", self.title));
                Dispatch::Handled(ViewCommand::Refresh)
            }
            Command::Up => self.move_cursor(-1),
            Command::Down => self.move_cursor(1),
            Command::Top => self.jump_cursor(false),
            Command::Bottom => self.jump_cursor(true),
            Command::Back => {
                self.back();
                Dispatch::Handled(ViewCommand::None)
            }
            Command::SortColumn { column, ascending } => {
                self.sort_by(column, ascending);
                Dispatch::Handled(ViewCommand::None)
            }
            Command::Logs => self.logs_cmd(),
            Command::Shell => self.shell_cmd(),
            Command::Confirm => match self.focus() {
                Focus::Picker => self.confirm_shell(),
                Focus::Logs => self.confirm_logs(),
                Focus::List => Dispatch::Ignored,
            },
            Command::TogglePrevious => {
                self.logs.previous = !self.logs.previous;
                Dispatch::Handled(ViewCommand::None)
            }
        }
    }

    fn focus(&self) -> Focus {
        match self.pages.current() {
            Some(PICKER_PAGE) => Focus::Picker,
            Some(LOGS_PAGE) => Focus::Logs,
            _ => Focus::List,
        }
    }

    fn focused_picker(&mut self) -> Option<&mut Picker<SessionTarget>> {
        match self.focus() {
            Focus::Picker => Some(&mut self.picker),
            Focus::Logs => Some(&mut self.logs.picker),
            Focus::List => None,
        }
    }

    fn move_cursor(&mut self, delta: isize) -> Dispatch {
        match self.focused_picker() {
            Some(picker) => picker.move_selection(delta),
            None => {
                let target = (self.selected as isize).saturating_add(delta).max(0) as usize;
                self.select_index(target);
            }
        }
        Dispatch::Handled(ViewCommand::None)
    }

    fn jump_cursor(&mut self, last: bool) -> Dispatch {
        match (self.focused_picker(), last) {
            (Some(picker), false) => picker.select_first(),
            (Some(picker), true) => picker.select_last(),
            (None, false) => self.select_index(0),
            (None, true) => self.select_index(usize::MAX),
        }
        Dispatch::Handled(ViewCommand::None)
    }

    /// Points the sort at a column relative to the name column and re-renders.
    pub fn sort_by(&mut self, column: usize, ascending: bool) {
        self.table
            .sort_by(self.list.name_col_index(), column, ascending);
        self.refresh_table();
    }

    /// Shows `name`. Transient pages come up empty.
    pub fn switch_page(&mut self, name: &str) {
        let transient = self
            .pages
            .switch_page(name)
            .is_some_and(|page| !page.resident());
        if transient {
            self.reset_page(name);
        }
    }

    pub fn back(&mut self) {
        let shown = self
            .pages
            .back()
            .map(|page| (page.name().to_string(), page.resident()));
        if let Some((name, false)) = shown {
            self.reset_page(&name);
        }
    }

    fn reset_page(&mut self, name: &str) {
        match name {
            PICKER_PAGE => self.picker.reset(),
            LOGS_PAGE => self.logs.reset(),
            _ => {}
        }
    }

    /// Swaps in a fresh snapshot, keeping the highlighted row when it is
    /// still listed.
    pub fn set_list(&mut self, list: L) {
        self.list = list;
        self.refresh_table();
    }

    fn refresh_table(&mut self) {
        let previous = std::mem::take(&mut self.selected_item);
        self.table.refresh(self.list.rows());
        let position = self
            .table
            .order()
            .iter()
            .position(|index| self.list.rows()[*index].path() == previous);
        match position {
            Some(position) => self.select_index(position),
            None => self.select_index(self.selected),
        }
    }

    fn select_index(&mut self, index: usize) {
        if self.table.is_empty() {
            self.selected = 0;
            self.selected_item.clear();
            return;
        }
        self.selected = index.min(self.table.len() - 1);
        let row = self.table.order()[self.selected];
        self.selected_item = self.list.rows()[row].path();
    }

    pub fn row_selected(&self) -> bool {
        !self.selected_item.is_empty()
    }

    pub fn selected_item(&self) -> &str {
        &self.selected_item
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.row_selected().then_some(self.selected)
    }

    pub fn visible_rows(&self) -> Vec<&RowData> {
        let rows = self.list.rows();
        self.table.order().iter().map(|index| &rows[*index]).collect()
    }

    pub fn list(&self) -> &L {
        &self.list
    }

    pub fn sort(&self) -> SortSpec {
        self.table.sort()
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flash = Some(Flash {
            level,
            message: message.into(),
            raised_at: Local::now(),
        });
    }

    pub fn flash_error(&mut self, error: &ViewError) {
        if !error.surfaced() {
            return;
        }
        error!(%error, "command failed");
        self.flash(FlashLevel::Error, error.to_string());
    }

    pub fn current_flash(&self) -> Option<&Flash> {
        self.flash.as_ref()
    }

    pub fn expire_flash(&mut self, now: DateTime<Local>) {
        if self
            .flash
            .as_ref()
            .is_some_and(|flash| now - flash.raised_at >= self.settings.flash_ttl)
        {
            self.flash = None;
        }
    }

    pub fn hints(&self) -> Vec<(Key, &KeyAction)> {
        self.pages
            .current()
            .and_then(|page| self.page_actions.get(page))
            .map(|actions| actions.hints().collect())
            .unwrap_or_default()
    }

    pub fn current_page(&self) -> &str {
        self.pages.current().unwrap_or(&self.name)
    }

    pub fn pages(&self) -> &PageStack {
        &self.pages
    }

    pub fn picker(&self) -> &Picker<SessionTarget> {
        &self.picker
    }

    pub fn logs(&self) -> &LogsPage {
        &self.logs
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn set_shell(&mut self, shell: impl Into<String>) {
        self.settings.shell = shell.into();
    }

    pub fn set_flash_ttl(&mut self, ttl: TimeDelta) {
        self.settings.flash_ttl = ttl;
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn running(&self) -> bool {
        self.running
    }
}

/// Bindings every resource list gets before its kind adds its own.
pub fn base_actions() -> KeyActions {
    [
        (Key::Char('q'), KeyAction::new("Quit", Command::Quit, true)),
        (Key::Ctrl('c'), KeyAction::new("Quit", Command::Quit, false)),
        (Key::Char('?'), KeyAction::new("Help", Command::ToggleHelp, true)),
        (Key::Char('r'), KeyAction::new("Refresh", Command::Refresh, true)),
        (Key::Esc, KeyAction::new("Back", Command::Back, false)),
        (
            Key::Char('N'),
            KeyAction::new(
                "Sort Name",
                Command::SortColumn {
                    column: 0,
                    ascending: true,
                },
                true,
            ),
        ),
    ]
    .into_iter()
    .chain(navigation_actions())
    .collect()
}

/// Bindings for the selectable pages: move, confirm, go back.
pub fn picker_actions() -> KeyActions {
    [
        (Key::Esc, KeyAction::new("Back", Command::Back, true)),
        (Key::Enter, KeyAction::new("Select", Command::Confirm, true)),
        (Key::Ctrl('c'), KeyAction::new("Quit", Command::Quit, false)),
    ]
    .into_iter()
    .chain(navigation_actions())
    .collect()
}

fn navigation_actions() -> [(Key, KeyAction); 8] {
    [
        (Key::Char('j'), KeyAction::new("Down", Command::Down, false)),
        (Key::Down, KeyAction::new("Down", Command::Down, false)),
        (Key::Char('k'), KeyAction::new("Up", Command::Up, false)),
        (Key::Up, KeyAction::new("Up", Command::Up, false)),
        (Key::Char('g'), KeyAction::new("Top", Command::Top, false)),
        (Key::Home, KeyAction::new("Top", Command::Top, false)),
        (Key::Char('G'), KeyAction::new("Bottom", Command::Bottom, false)),
        (Key::End, KeyAction::new("Bottom", Command::Bottom, false)),
    ]
}


#[cfg(test)]
mod tests {
    use super::fixtures::{FakeList, view};
    use super::{Dispatch, ViewCommand, picker_actions};
    use crate::actions::{Command, KeyAction, KeyActions};
    use crate::input::Key;
    use crate::model::{FlashLevel, RowData};
    use crate::table::SortSpec;
    use chrono::{Local, TimeDelta};

    fn sort_ready(actions: &mut KeyActions) {
        actions.insert(
            Key::Char('R'),
            KeyAction::new(
                "Sort Ready",
                Command::SortColumn {
                    column: 1,
                    ascending: false,
                },
                true,
            ),
        );
    }

    #[test]
    fn sort_binding_offsets_by_name_column() {
        let mut list = FakeList::with_pods(&["web-1"], &["nginx"]);
        list.name_col_index = 6;
        let mut view = view(list, Some(sort_ready));

        let outcome = view.handle_key(Key::Char('R'));
        assert_eq!(outcome, Dispatch::Handled(ViewCommand::None));
        assert_eq!(
            view.sort(),
            SortSpec {
                column: 7,
                ascending: false
            }
        );
    }

    #[test]
    fn unbound_key_is_ignored_without_side_effects() {
        let mut view = view(FakeList::with_pods(&["web-1"], &["nginx"]), None);
        let before = view.sort();

        assert_eq!(view.handle_key(Key::Char('z')), Dispatch::Ignored);
        assert_eq!(view.sort(), before);
        assert_eq!(view.current_page(), "po");
        assert!(view.current_flash().is_none());
        assert!(view.running());
    }

    #[test]
    fn cursor_moves_within_bounds_and_tracks_path() {
        let mut view = view(FakeList::with_pods(&["web-1", "web-2", "web-3"], &[]), None);
        assert_eq!(view.selected_item(), "demo/web-1");

        view.handle_key(Key::Char('j'));
        view.handle_key(Key::Down);
        view.handle_key(Key::Down);
        assert_eq!(view.selected_index(), Some(2));
        assert_eq!(view.selected_item(), "demo/web-3");

        view.handle_key(Key::Char('g'));
        assert_eq!(view.selected_item(), "demo/web-1");
        view.handle_key(Key::Char('k'));
        assert_eq!(view.selected_index(), Some(0));
    }

    #[test]
    fn selection_follows_row_across_refresh() {
        let mut view = view(FakeList::with_pods(&["web-1", "web-2"], &[]), None);
        view.handle_key(Key::Down);
        assert_eq!(view.selected_item(), "demo/web-2");

        view.set_list(FakeList::with_pods(&["api-0", "web-1", "web-2"], &[]));
        assert_eq!(view.selected_item(), "demo/web-2");
        assert_eq!(view.selected_index(), Some(2));
    }

    #[test]
    fn selection_keeps_index_when_row_disappears() {
        let mut view = view(FakeList::with_pods(&["web-1", "web-2", "web-3"], &[]), None);
        view.handle_key(Key::Down);
        view.set_list(FakeList::with_pods(&["web-1", "web-3"], &[]));
        assert_eq!(view.selected_item(), "demo/web-3");

        view.set_list(FakeList::with_pods(&[], &[]));
        assert!(!view.row_selected());
        assert_eq!(view.selected_index(), None);
    }

    #[test]
    fn esc_on_list_without_history_stays_put() {
        let mut view = view(FakeList::with_pods(&["web-1"], &[]), None);
        assert_eq!(
            view.handle_key(Key::Esc),
            Dispatch::Handled(ViewCommand::None)
        );
        assert_eq!(view.current_page(), "po");
        assert!(view.pages().is_visible("po"));
    }

    #[test]
    fn page_tables_route_keys_to_current_page() {
        let mut view = view(FakeList::with_pods(&["web-1"], &[]), None);
        view.add_page("choose", picker_actions(), false, false);

        assert_eq!(view.handle_key(Key::Enter), Dispatch::Ignored);
        view.switch_page("choose");
        assert_eq!(view.handle_key(Key::Char('r')), Dispatch::Ignored);
        assert_eq!(
            view.handle_key(Key::Esc),
            Dispatch::Handled(ViewCommand::None)
        );
        assert_eq!(view.current_page(), "po");
    }

    #[test]
    fn refresh_requests_a_reload() {
        let mut view = view(FakeList::with_pods(&["web-1"], &[]), None);
        assert_eq!(
            view.handle_key(Key::Char('r')),
            Dispatch::Handled(ViewCommand::Refresh)
        );
        assert_eq!(
            view.current_flash().map(|flash| flash.level),
            Some(FlashLevel::Info)
        );
    }

    #[test]
    fn flash_expires_after_ttl() {
        let mut view = view(FakeList::with_pods(&["web-1"], &[]), None);
        view.flash(FlashLevel::Warn, "careful");
        view.expire_flash(Local::now());
        assert!(view.current_flash().is_some());

        view.set_flash_ttl(TimeDelta::seconds(1));
        view.expire_flash(Local::now() + TimeDelta::seconds(2));
        assert!(view.current_flash().is_none());
    }

    #[test]
    fn help_toggles_and_closes_on_next_command() {
        let mut view = view(FakeList::with_pods(&["web-1", "web-2"], &[]), None);
        view.handle_key(Key::Char('?'));
        assert!(view.show_help());
        view.handle_key(Key::Down);
        assert!(!view.show_help());
    }

    #[test]
    fn quit_stops_the_view() {
        let mut view = view(FakeList::with_pods(&[], &[]), None);
        view.handle_key(Key::Char('q'));
        assert!(!view.running());
    }

    #[test]
    fn name_sort_reorders_visible_rows() {
        let mut list = FakeList::with_pods(&["web-2", "web-1"], &[]);
        list.rows.push(RowData {
            name: "api-0".to_string(),
            namespace: Some("demo".to_string()),
            columns: vec!["api-0".to_string(), "0/1".to_string()],
        });
        let view = view(list, None);
        let names = view
            .visible_rows()
            .iter()
            .map(|row| row.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["api-0", "web-1", "web-2"]);
        assert_eq!(view.selected_item(), "demo/api-0");
    }
}
