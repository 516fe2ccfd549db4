use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RuntimeConfigSnapshot {
    pub source: Option<String>,
    pub kubectl: String,
    pub shell: String,
    pub flash_secs: u64,
}

impl Default for RuntimeConfigSnapshot {
    fn default() -> Self {
        Self::from_file(None, PodviewConfigFile::default())
    }
}

impl RuntimeConfigSnapshot {
    fn from_file(source: Option<String>, parsed: PodviewConfigFile) -> Self {
        Self {
            source,
            kubectl: parsed.kubectl,
            shell: parsed.shell,
            flash_secs: parsed.flash_secs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfigWatcher {
    path: Option<PathBuf>,
    modified: Option<SystemTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct PodviewConfigFile {
    kubectl: String,
    shell: String,
    #[serde(alias = "flash_timeout")]
    flash_secs: u64,
}

impl Default for PodviewConfigFile {
    fn default() -> Self {
        Self {
            kubectl: "kubectl".to_string(),
            shell: "sh".to_string(),
            flash_secs: 5,
        }
    }
}

impl RuntimeConfigWatcher {
    pub fn discover() -> Self {
        Self {
            path: discover_config_path(),
            modified: None,
        }
    }

    pub fn load_current(&mut self) -> Result<RuntimeConfigSnapshot> {
        let Some(path) = self.path.clone() else {
            return Ok(RuntimeConfigSnapshot::default());
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read runtime config {}", path.display()))?;
        let parsed = parse_config(&raw)
            .with_context(|| format!("failed to parse runtime config {}", path.display()))?;
        self.modified = fs::metadata(&path)
            .ok()
            .and_then(|meta| meta.modified().ok());

        Ok(RuntimeConfigSnapshot::from_file(
            Some(path.display().to_string()),
            parsed,
        ))
    }

    pub fn reload_if_changed(&mut self) -> Result<Option<RuntimeConfigSnapshot>> {
        let Some(current_path) = self.path.clone() else {
            self.path = discover_config_path();
            if self.path.is_some() {
                return self.load_current().map(Some);
            }
            return Ok(None);
        };

        if !current_path.exists() {
            self.path = discover_config_path();
            self.modified = None;
            if self.path.is_some() {
                return self.load_current().map(Some);
            }
            return Ok(Some(RuntimeConfigSnapshot::default()));
        }

        let modified = fs::metadata(&current_path)
            .ok()
            .and_then(|meta| meta.modified().ok());
        if modified != self.modified {
            return self.load_current().map(Some);
        }

        Ok(None)
    }
}

fn parse_config(raw: &str) -> Result<PodviewConfigFile> {
    if raw.trim().is_empty() {
        return Ok(PodviewConfigFile::default());
    }
    let mut parsed: PodviewConfigFile = serde_yaml::from_str(raw)?;
    if parsed.kubectl.trim().is_empty() {
        parsed.kubectl = PodviewConfigFile::default().kubectl;
    }
    if parsed.shell.trim().is_empty() {
        parsed.shell = PodviewConfigFile::default().shell;
    }
    parsed.flash_secs = parsed.flash_secs.clamp(1, 3_600);
    Ok(parsed)
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PODVIEW_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("podview.yaml"),
        PathBuf::from("podview.yml"),
        PathBuf::from(".podview.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/podview/config.yaml"),
            PathBuf::from(&home).join(".config/podview/config.yml"),
            PathBuf::from(&home).join(".podview.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}
