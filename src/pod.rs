use crate::actions::{Command, KeyAction, KeyActions};
use crate::error::ViewError;
use crate::input::Key;
use crate::model::{FlashLevel, ResourceList, namespaced};
use crate::session::{SessionRequest, SessionTarget, logs_request, shell_request};
use crate::view::{
    Dispatch, LOGS_PAGE, PICKER_PAGE, ResourceView, ViewCommand, ViewSettings, picker_actions,
};
use tracing::debug;

pub const POD_PAGE: &str = "po";

/// The pod list: the generic resource view plus logs, shell and the pod sort
/// bindings, with the log viewer and the container picker stacked on top.
pub fn new_pod_view<L: ResourceList>(list: L, settings: ViewSettings) -> ResourceView<L> {
    let mut view = ResourceView::new(POD_PAGE, "Pods", list, settings, Some(extra_actions));
    view.add_page(LOGS_PAGE, logs_actions(), false, false);
    view.add_page(PICKER_PAGE, picker_actions(), false, false);
    view
}

fn extra_actions(actions: &mut KeyActions) {
    actions.insert(Key::Char('l'), KeyAction::new("Logs", Command::Logs, true));
    actions.insert(Key::Char('s'), KeyAction::new("Shell", Command::Shell, true));
    actions.insert(Key::Char('R'), sort_col("Sort Ready", 1, false));
    actions.insert(Key::Char('S'), sort_col("Sort Status", 2, true));
    actions.insert(Key::Char('T'), sort_col("Sort Restart", 3, false));
    actions.insert(Key::Char('C'), sort_col("Sort CPU", 4, false));
    actions.insert(Key::Char('M'), sort_col("Sort MEM", 5, false));
    actions.insert(Key::Char('O'), sort_col("Sort Node", 7, true));
    actions.insert(Key::Char('Q'), sort_col("Sort QOS", 8, true));
}

fn sort_col(description: &str, column: usize, ascending: bool) -> KeyAction {
    KeyAction::new(description, Command::SortColumn { column, ascending }, true)
}

fn logs_actions() -> KeyActions {
    let mut actions = picker_actions();
    actions.extend(
        [(
            Key::Char('p'),
            KeyAction::new("Previous", Command::TogglePrevious, true),
        )]
        .into_iter()
        .collect(),
    );
    actions
}

impl<L: ResourceList> ResourceView<L> {
    pub(crate) fn logs_cmd(&mut self) -> Dispatch {
        let Some(containers) = self.fetch_containers(true) else {
            return Dispatch::Ignored;
        };
        let path = self.selected_item().to_string();
        match containers.len() {
            0 => Dispatch::Ignored,
            1 => {
                let target = SessionTarget {
                    path,
                    container: None,
                };
                Dispatch::Handled(ViewCommand::Launch(self.show_logs(&target, false)))
            }
            _ => {
                self.switch_page(LOGS_PAGE);
                self.logs.picker.set_title(format!("Logs {path}"));
                self.logs.picker.populate(containers);
                self.logs
                    .picker
                    .on_confirm(move |_, container| SessionTarget {
                        path,
                        container: Some(container.to_string()),
                    });
                Dispatch::Handled(ViewCommand::None)
            }
        }
    }

    pub(crate) fn shell_cmd(&mut self) -> Dispatch {
        let Some(containers) = self.fetch_containers(false) else {
            return Dispatch::Ignored;
        };
        let path = self.selected_item().to_string();
        match containers.len() {
            0 => Dispatch::Ignored,
            1 => {
                let target = SessionTarget {
                    path,
                    container: None,
                };
                Dispatch::Handled(ViewCommand::Launch(self.shell_in(&target)))
            }
            _ => {
                self.switch_page(PICKER_PAGE);
                self.picker.set_title(format!("Shell {path}"));
                self.picker.populate(containers);
                self.picker.on_confirm(move |_, container| SessionTarget {
                    path,
                    container: Some(container.to_string()),
                });
                Dispatch::Handled(ViewCommand::None)
            }
        }
    }

    pub(crate) fn confirm_shell(&mut self) -> Dispatch {
        let Some(target) = self.picker.confirm() else {
            return Dispatch::Handled(ViewCommand::None);
        };
        self.back();
        Dispatch::Handled(ViewCommand::Launch(self.shell_in(&target)))
    }

    pub(crate) fn confirm_logs(&mut self) -> Dispatch {
        let previous = self.logs.previous;
        let Some(target) = self.logs.picker.confirm() else {
            return Dispatch::Handled(ViewCommand::None);
        };
        self.back();
        Dispatch::Handled(ViewCommand::Launch(self.show_logs(&target, previous)))
    }

    fn fetch_containers(&mut self, include_init: bool) -> Option<Vec<String>> {
        let containers = if self.row_selected() {
            self.list().containers(self.selected_item(), include_init)
        } else {
            Err(ViewError::NoSelection)
        };
        match containers {
            Ok(containers) => Some(containers),
            Err(error) => {
                self.flash_error(&error);
                None
            }
        }
    }

    fn shell_in(&self, target: &SessionTarget) -> SessionRequest {
        let request = shell_request(&self.settings().context, target, &self.settings().shell);
        debug!(args = ?request.args, "shell args");
        request
    }

    fn show_logs(&mut self, target: &SessionTarget, previous: bool) -> SessionRequest {
        let request = logs_request(&self.settings().context, target, previous);
        let (_, pod) = namespaced(&target.path);
        let message = match target.container.as_deref() {
            Some(container) => format!("Viewing logs from container {container} on pod {pod}"),
            None => format!("Viewing logs from pod {pod}"),
        };
        self.flash(FlashLevel::Info, message);
        debug!(args = ?request.args, "log args");
        request
    }
}

#[cfg(test)]
mod tests {
    use super::{POD_PAGE, new_pod_view};
    use crate::error::ViewError;
    use crate::input::Key;
    use crate::model::{FlashLevel, PodContainers, PodList, RowData};
    use crate::session::SessionRequest;
    use crate::table::SortSpec;
    use crate::view::fixtures::{FakeList, settings};
    use crate::view::{Dispatch, LOGS_PAGE, PICKER_PAGE, ResourceView, ViewCommand};

    fn pod_view(names: &[&str], containers: &[&str]) -> ResourceView<FakeList> {
        new_pod_view(FakeList::with_pods(names, containers), settings())
    }

    fn launched(outcome: Dispatch) -> SessionRequest {
        match outcome {
            Dispatch::Handled(ViewCommand::Launch(request)) => request,
            other => panic!("expected a session launch, got {other:?}"),
        }
    }

    #[test]
    fn starts_on_the_pod_list() {
        let view = pod_view(&["web-1"], &["nginx"]);
        assert_eq!(view.current_page(), POD_PAGE);
        assert!(!view.pages().is_visible(PICKER_PAGE));
        assert!(!view.pages().is_visible(LOGS_PAGE));
        assert_eq!(view.pages().previous(), None);
    }

    #[test]
    fn shell_without_selection_is_a_noop() {
        let mut view = pod_view(&[], &["nginx"]);
        let sort = view.sort();

        assert_eq!(view.handle_key(Key::Char('s')), Dispatch::Ignored);
        assert_eq!(view.handle_key(Key::Char('l')), Dispatch::Ignored);
        assert_eq!(view.current_page(), POD_PAGE);
        assert_eq!(view.sort(), sort);
        assert!(view.current_flash().is_none());
    }

    #[test]
    fn single_container_shells_in_directly() {
        let mut view = pod_view(&["web-1"], &["nginx"]);

        let request = launched(view.handle_key(Key::Char('s')));
        assert_eq!(
            request.args,
            vec![
                "exec", "-it", "--context", "kind-dev", "-n", "demo", "web-1", "--", "sh"
            ]
        );
        assert_eq!(view.current_page(), POD_PAGE);
        assert!(!view.pages().is_visible(PICKER_PAGE));
    }

    #[test]
    fn several_containers_open_the_picker_in_order() {
        let mut view = pod_view(&["web-1"], &["nginx", "sidecar", "metrics"]);

        assert_eq!(
            view.handle_key(Key::Char('s')),
            Dispatch::Handled(ViewCommand::None)
        );
        assert!(view.pages().is_visible(PICKER_PAGE));
        assert_eq!(view.picker().items(), ["nginx", "sidecar", "metrics"]);

        view.handle_key(Key::Down);
        view.handle_key(Key::Down);
        let request = launched(view.handle_key(Key::Enter));
        assert_eq!(
            request.args,
            vec![
                "exec", "-it", "--context", "kind-dev", "-n", "demo", "web-1", "-c", "metrics",
                "--", "sh"
            ]
        );
        assert_eq!(view.current_page(), POD_PAGE);
    }

    #[test]
    fn no_containers_is_a_noop() {
        let mut view = pod_view(&["web-1"], &[]);
        assert_eq!(view.handle_key(Key::Char('s')), Dispatch::Ignored);
        assert_eq!(view.handle_key(Key::Char('l')), Dispatch::Ignored);
        assert_eq!(view.current_page(), POD_PAGE);
    }

    #[test]
    fn enumeration_failure_flashes_and_stays_on_list() {
        let mut list = FakeList::with_pods(&["web-1"], &[]);
        list.containers = Err(ViewError::CandidateEnumerationFailed {
            path: "demo/web-1".to_string(),
            reason: "pod is no longer listed".to_string(),
        });
        let mut view = new_pod_view(list, settings());

        assert_eq!(view.handle_key(Key::Char('s')), Dispatch::Ignored);
        assert_eq!(view.current_page(), POD_PAGE);
        let flash = view.current_flash().expect("error flash");
        assert_eq!(flash.level, FlashLevel::Error);
        assert!(flash.message.contains("demo/web-1"));
    }

    #[test]
    fn escape_cancels_the_picker() {
        let mut view = pod_view(&["web-1"], &["nginx", "sidecar"]);
        view.handle_key(Key::Char('s'));
        assert!(view.pages().is_visible(PICKER_PAGE));

        assert_eq!(
            view.handle_key(Key::Esc),
            Dispatch::Handled(ViewCommand::None)
        );
        assert_eq!(view.current_page(), POD_PAGE);
        assert!(!view.pages().is_visible(PICKER_PAGE));
    }

    #[test]
    fn picker_keeps_the_row_selected_when_it_opened() {
        let mut view = pod_view(&["web-1", "web-2"], &["nginx", "sidecar"]);
        view.handle_key(Key::Char('s'));

        let mut refreshed = FakeList::with_pods(&["web-2"], &["nginx", "sidecar"]);
        refreshed.rows.insert(
            0,
            RowData {
                name: "api-0".to_string(),
                namespace: Some("demo".to_string()),
                columns: vec!["api-0".to_string(), "1/1".to_string()],
            },
        );
        view.set_list(refreshed);
        assert_eq!(view.selected_item(), "demo/api-0");

        let request = launched(view.handle_key(Key::Enter));
        assert!(request.args.contains(&"web-1".to_string()));
        assert_eq!(request.summary, "shell demo/web-1 (container: nginx)");
    }

    #[test]
    fn reopening_the_picker_starts_fresh() {
        let mut view = pod_view(&["web-1"], &["nginx", "sidecar"]);
        view.handle_key(Key::Char('s'));
        view.handle_key(Key::Down);
        view.handle_key(Key::Esc);

        view.handle_key(Key::Char('s'));
        assert_eq!(view.picker().selected_index(), Some(0));
        let request = launched(view.handle_key(Key::Enter));
        assert!(request.args.contains(&"nginx".to_string()));
    }

    #[test]
    fn single_container_logs_follow_pod() {
        let mut view = pod_view(&["web-1"], &["nginx"]);
        let request = launched(view.handle_key(Key::Char('l')));
        assert_eq!(
            request.args,
            vec!["logs", "-f", "-n", "demo", "--context", "kind-dev", "web-1"]
        );
        assert_eq!(
            view.current_flash().map(|flash| flash.message.as_str()),
            Some("Viewing logs from pod web-1")
        );
    }

    #[test]
    fn logs_page_lists_init_containers_and_honors_previous() {
        let mut list = PodList::new(vec!["NAME".to_string()], 0);
        list.push(
            RowData {
                name: "web-1".to_string(),
                namespace: Some("demo".to_string()),
                columns: vec!["web-1".to_string()],
            },
            PodContainers {
                containers: vec!["nginx".to_string()],
                init_containers: vec!["migrate".to_string()],
            },
        );
        let mut view = new_pod_view(list, settings());

        let outcome = view.handle_key(Key::Char('l'));
        assert_eq!(outcome, Dispatch::Handled(ViewCommand::None));
        assert_eq!(view.current_page(), LOGS_PAGE);
        assert_eq!(view.logs().picker().items(), ["nginx", "migrate"]);

        view.handle_key(Key::Char('p'));
        assert!(view.logs().previous());
        view.handle_key(Key::Char('G'));
        let request = launched(view.handle_key(Key::Enter));
        assert_eq!(
            request.args,
            vec![
                "logs", "-f", "-n", "demo", "--context", "kind-dev", "-c", "migrate",
                "--previous", "web-1"
            ]
        );
        assert_eq!(view.current_page(), POD_PAGE);
        assert_eq!(
            view.current_flash().map(|flash| flash.message.as_str()),
            Some("Viewing logs from container migrate on pod web-1")
        );
    }

    #[test]
    fn shell_skips_init_containers() {
        let mut list = PodList::new(vec!["NAME".to_string()], 0);
        list.push(
            RowData {
                name: "web-1".to_string(),
                namespace: Some("demo".to_string()),
                columns: vec!["web-1".to_string()],
            },
            PodContainers {
                containers: vec!["nginx".to_string()],
                init_containers: vec!["migrate".to_string()],
            },
        );
        let mut view = new_pod_view(list, settings());

        let request = launched(view.handle_key(Key::Char('s')));
        assert!(!request.args.contains(&"-c".to_string()));
    }

    #[test]
    fn pod_sort_bindings_shadow_nothing_and_offset_columns() {
        let mut list = FakeList::with_pods(&["web-1"], &["nginx"]);
        list.name_col_index = 1;
        let mut view = new_pod_view(list, settings());

        view.handle_key(Key::Char('O'));
        assert_eq!(
            view.sort(),
            SortSpec {
                column: 8,
                ascending: true
            }
        );
        view.handle_key(Key::Char('N'));
        assert_eq!(
            view.sort(),
            SortSpec {
                column: 1,
                ascending: true
            }
        );
    }

    #[test]
    fn list_hints_include_pod_commands() {
        let view = pod_view(&["web-1"], &["nginx"]);
        let descriptions = view
            .hints()
            .into_iter()
            .map(|(_, action)| action.description.clone())
            .collect::<Vec<_>>();
        assert!(descriptions.contains(&"Logs".to_string()));
        assert!(descriptions.contains(&"Shell".to_string()));
        assert!(descriptions.contains(&"Sort Ready".to_string()));
        assert!(!descriptions.contains(&"Down".to_string()));
    }
}
