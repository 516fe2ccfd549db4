//! kubectl argument vectors for attached sessions. Nothing here spawns a
//! process; the event loop hands the argv to the process runner.

use crate::model::namespaced;

/// An attached session the event loop should run with the terminal released.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SessionRequest {
    pub args: Vec<String>,
    pub summary: String,
}

/// Sub-target chosen for a row: the pod path captured when the command was
/// issued plus the container, if one had to be picked.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SessionTarget {
    pub path: String,
    pub container: Option<String>,
}

pub fn shell_args(
    context: &str,
    namespace: &str,
    pod: &str,
    container: Option<&str>,
    shell: &str,
) -> Vec<String> {
    let mut args = Vec::with_capacity(12);
    args.extend(["exec", "-it"].map(String::from));
    args.extend(["--context".to_string(), context.to_string()]);
    args.extend(["-n".to_string(), namespace.to_string()]);
    args.push(pod.to_string());
    if let Some(container) = container.filter(|container| !container.is_empty()) {
        args.extend(["-c".to_string(), container.to_string()]);
    }
    args.extend(["--".to_string(), shell.to_string()]);
    args
}

pub fn log_args(
    context: &str,
    namespace: &str,
    pod: &str,
    container: Option<&str>,
    previous: bool,
) -> Vec<String> {
    let mut args = Vec::with_capacity(10);
    args.extend(["logs", "-f"].map(String::from));
    args.extend(["-n".to_string(), namespace.to_string()]);
    args.extend(["--context".to_string(), context.to_string()]);
    if let Some(container) = container.filter(|container| !container.is_empty()) {
        args.extend(["-c".to_string(), container.to_string()]);
    }
    if previous {
        args.push("--previous".to_string());
    }
    args.push(pod.to_string());
    args
}

pub fn shell_request(context: &str, target: &SessionTarget, shell: &str) -> SessionRequest {
    let (namespace, pod) = namespaced(&target.path);
    let container = target.container.as_deref();
    SessionRequest {
        args: shell_args(context, namespace, pod, container, shell),
        summary: match container {
            Some(container) => format!("shell {namespace}/{pod} (container: {container})"),
            None => format!("shell {namespace}/{pod}"),
        },
    }
}

pub fn logs_request(context: &str, target: &SessionTarget, previous: bool) -> SessionRequest {
    let (namespace, pod) = namespaced(&target.path);
    let container = target.container.as_deref();
    let kind = if previous { "previous logs" } else { "logs" };
    SessionRequest {
        args: log_args(context, namespace, pod, container, previous),
        summary: match container {
            Some(container) => format!("{kind} {namespace}/{pod} (container: {container})"),
            None => format!("{kind} {namespace}/{pod}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionTarget, log_args, logs_request, shell_args, shell_request};

    #[test]
    fn shell_args_omit_container_flag_when_empty() {
        let args = shell_args("kind-dev", "demo", "web-1", Some(""), "sh");
        assert_eq!(
            args,
            vec![
                "exec", "-it", "--context", "kind-dev", "-n", "demo", "web-1", "--", "sh"
            ]
        );
        assert_eq!(args, shell_args("kind-dev", "demo", "web-1", None, "sh"));
    }

    #[test]
    fn shell_args_target_named_container() {
        let args = shell_args("kind-dev", "demo", "web-1", Some("nginx"), "sh");
        assert_eq!(
            args,
            vec![
                "exec", "-it", "--context", "kind-dev", "-n", "demo", "web-1", "-c", "nginx",
                "--", "sh"
            ]
        );
    }

    #[test]
    fn log_args_follow_and_optionally_show_previous() {
        assert_eq!(
            log_args("kind-dev", "demo", "web-1", None, false),
            vec!["logs", "-f", "-n", "demo", "--context", "kind-dev", "web-1"]
        );
        assert_eq!(
            log_args("kind-dev", "demo", "web-1", Some("nginx"), true),
            vec![
                "logs", "-f", "-n", "demo", "--context", "kind-dev", "-c", "nginx",
                "--previous", "web-1"
            ]
        );
    }

    #[test]
    fn requests_split_the_captured_path() {
        let target = SessionTarget {
            path: "demo/web-1".to_string(),
            container: Some("nginx".to_string()),
        };
        let shell = shell_request("kind-dev", &target, "bash");
        assert_eq!(shell.args.last().map(String::as_str), Some("bash"));
        assert_eq!(shell.summary, "shell demo/web-1 (container: nginx)");

        let logs = logs_request("kind-dev", &target, true);
        assert_eq!(logs.args.last().map(String::as_str), Some("web-1"));
        assert_eq!(logs.summary, "previous logs demo/web-1 (container: nginx)");
    }
}
