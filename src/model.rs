use crate::error::ViewError;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NamespaceScope {
    All,
    Named(String),
}

impl Display for NamespaceScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Named(namespace) => write!(f, "{namespace}"),
        }
    }
}

/// Splits a `<namespace>/<name>` path. A bare name has an empty namespace.
pub fn namespaced(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((namespace, name)) => (namespace, name),
        None => ("", path),
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RowData {
    pub name: String,
    pub namespace: Option<String>,
    pub columns: Vec<String>,
}

impl RowData {
    pub fn path(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// The backing list a resource view reads rows and sub-targets from.
pub trait ResourceList {
    fn headers(&self) -> &[String];

    fn rows(&self) -> &[RowData];

    /// Column holding the resource name. Sort bindings are relative to it.
    fn name_col_index(&self) -> usize;

    /// Container names for the resource at `path`, regular containers first.
    fn containers(&self, path: &str, include_init: bool) -> Result<Vec<String>, ViewError>;
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PodContainers {
    pub containers: Vec<String>,
    pub init_containers: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PodList {
    headers: Vec<String>,
    rows: Vec<RowData>,
    name_col_index: usize,
    containers: HashMap<String, PodContainers>,
}

impl PodList {
    pub fn new(headers: Vec<String>, name_col_index: usize) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            name_col_index,
            containers: HashMap::new(),
        }
    }

    pub fn push(&mut self, row: RowData, containers: PodContainers) {
        self.containers.insert(row.path(), containers);
        self.rows.push(row);
    }
}

impl ResourceList for PodList {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn rows(&self) -> &[RowData] {
        &self.rows
    }

    fn name_col_index(&self) -> usize {
        self.name_col_index
    }

    fn containers(&self, path: &str, include_init: bool) -> Result<Vec<String>, ViewError> {
        if path.is_empty() {
            return Ok(Vec::new());
        }
        let Some(pod) = self.containers.get(path) else {
            return Err(ViewError::CandidateEnumerationFailed {
                path: path.to_string(),
                reason: "pod is no longer listed".to_string(),
            });
        };

        let mut names = pod.containers.clone();
        if include_init {
            names.extend(pod.init_containers.iter().cloned());
        }
        Ok(names)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FlashLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
    pub raised_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::{PodContainers, PodList, ResourceList, RowData, namespaced};
    use crate::error::ViewError;

    fn list() -> PodList {
        let mut list = PodList::new(vec!["NAME".to_string()], 0);
        list.push(
            RowData {
                name: "web-1".to_string(),
                namespace: Some("demo".to_string()),
                columns: vec!["web-1".to_string()],
            },
            PodContainers {
                containers: vec!["nginx".to_string(), "sidecar".to_string()],
                init_containers: vec!["migrate".to_string()],
            },
        );
        list
    }

    #[test]
    fn namespaced_splits_on_last_slash() {
        assert_eq!(namespaced("demo/web-1"), ("demo", "web-1"));
        assert_eq!(namespaced("web-1"), ("", "web-1"));
        assert_eq!(namespaced(""), ("", ""));
    }

    #[test]
    fn init_containers_follow_regular_ones_when_requested() {
        let list = list();
        assert_eq!(
            list.containers("demo/web-1", true).unwrap(),
            vec!["nginx", "sidecar", "migrate"]
        );
        assert_eq!(
            list.containers("demo/web-1", false).unwrap(),
            vec!["nginx", "sidecar"]
        );
    }

    #[test]
    fn empty_path_has_no_containers() {
        assert!(list().containers("", true).unwrap().is_empty());
    }

    #[test]
    fn unknown_pod_fails_enumeration() {
        let error = list().containers("demo/gone", false).unwrap_err();
        assert!(matches!(
            error,
            ViewError::CandidateEnumerationFailed { ref path, .. } if path == "demo/gone"
        ));
    }

    #[test]
    fn row_path_includes_namespace() {
        let row = RowData {
            name: "node-1".to_string(),
            namespace: None,
            columns: Vec::new(),
        };
        assert_eq!(row.path(), "node-1");
        assert_eq!(list().rows()[0].path(), "demo/web-1");
    }
}
