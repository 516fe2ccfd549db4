use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::ListParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, Config, ResourceExt};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::model::{NamespaceScope, PodContainers, PodList, ResourceList, RowData};

const POD_HEADERS: [&str; 10] = [
    "NAME", "READY", "STATUS", "RESTARTS", "CPU", "MEM", "IP", "NODE", "QOS", "AGE",
];

#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    context: String,
    default_namespace: String,
}

impl KubeGateway {
    pub async fn new(context: Option<String>) -> Result<Self> {
        let kubeconfig = Kubeconfig::read().ok();

        let config = if let Some(kubeconfig_value) = kubeconfig.clone() {
            let options = KubeConfigOptions {
                context: context.clone(),
                cluster: None,
                user: None,
            };
            Config::from_custom_kubeconfig(kubeconfig_value, &options)
                .await
                .context("failed to infer Kubernetes configuration")?
        } else {
            if context.is_some() {
                anyhow::bail!("kubeconfig not found; --context is unavailable in this environment");
            }
            Config::infer()
                .await
                .context("failed to infer Kubernetes configuration")?
        };

        let default_namespace = config.default_namespace.clone();
        let client = Client::try_from(config).context("failed to initialize Kubernetes client")?;
        let context = context
            .or_else(|| {
                kubeconfig
                    .as_ref()
                    .and_then(|cfg| cfg.current_context.clone())
            })
            .unwrap_or_else(|| "in-cluster".to_string());

        Ok(Self {
            client,
            context,
            default_namespace,
        })
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Lists pods in `scope` together with their containers. Missing metrics
    /// only blank the CPU and MEM columns.
    pub async fn fetch_pods(&self, scope: &NamespaceScope) -> Result<PodList> {
        let pods: Api<Pod> = match scope {
            NamespaceScope::All => Api::all(self.client.clone()),
            NamespaceScope::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };
        let list = pods
            .list(&list_params())
            .await
            .with_context(|| format!("failed to list pods in {scope}"))?;

        let usage = match self.fetch_pod_usage(scope).await {
            Ok(usage) => Some(usage),
            Err(error) => {
                warn!(error = %format!("{error:#}"), "pod metrics unavailable");
                None
            }
        };

        let (headers, name_col_index) = pod_headers(scope);
        let mut snapshot = PodList::new(headers, name_col_index);
        for pod in list {
            let path = format!("{}/{}", pod.namespace().unwrap_or_default(), pod.name_any());
            let pod_usage = usage
                .as_ref()
                .map(|usage| usage.get(&path).copied().unwrap_or((0, 0)));
            let (row, containers) = pod_row(&pod, scope, pod_usage);
            snapshot.push(row, containers);
        }
        debug!(scope = %scope, pods = snapshot.rows().len(), "pods refreshed");
        Ok(snapshot)
    }

    async fn fetch_pod_usage(&self, scope: &NamespaceScope) -> Result<HashMap<String, (u64, u64)>> {
        let pod_metrics_gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "PodMetrics");
        let pod_metrics_resource = ApiResource::from_gvk_with_plural(&pod_metrics_gvk, "pods");
        let pod_metrics_api: Api<DynamicObject> = match scope {
            NamespaceScope::All => Api::all_with(self.client.clone(), &pod_metrics_resource),
            NamespaceScope::Named(namespace) => {
                Api::namespaced_with(self.client.clone(), namespace, &pod_metrics_resource)
            }
        };

        let pod_metrics = pod_metrics_api.list(&list_params()).await?;
        Ok(pod_metrics
            .into_iter()
            .map(|pod_metric| {
                let namespace = pod_metric.namespace().unwrap_or_default();
                let name = pod_metric.name_any();
                (
                    format!("{namespace}/{name}"),
                    parse_pod_metrics_usage(&pod_metric.data),
                )
            })
            .collect())
    }
}

fn pod_headers(scope: &NamespaceScope) -> (Vec<String>, usize) {
    let mut headers = POD_HEADERS.map(String::from).to_vec();
    match scope {
        NamespaceScope::All => {
            headers.insert(0, "NAMESPACE".to_string());
            (headers, 1)
        }
        NamespaceScope::Named(_) => (headers, 0),
    }
}

fn pod_row(
    pod: &Pod,
    scope: &NamespaceScope,
    usage: Option<(u64, u64)>,
) -> (RowData, PodContainers) {
    let name = pod.name_any();
    let namespace = pod.namespace();
    let status = pod.status.as_ref();
    let (ready, total, restarts) = status.map(pod_readiness).unwrap_or((0, 0, 0));
    let (cpu, memory) = match usage {
        Some((cpu, memory)) => (format!("{cpu}m"), format!("{}Mi", memory / 1_048_576)),
        None => ("n/a".to_string(), "n/a".to_string()),
    };

    let mut columns = vec![
        name.clone(),
        format!("{ready}/{total}"),
        pod_phase(pod),
        restarts.to_string(),
        cpu,
        memory,
        status
            .and_then(|status| status.pod_ip.clone())
            .unwrap_or_else(|| "-".to_string()),
        pod.spec
            .as_ref()
            .and_then(|spec| spec.node_name.clone())
            .unwrap_or_else(|| "-".to_string()),
        status
            .and_then(|status| status.qos_class.clone())
            .unwrap_or_else(|| "-".to_string()),
        human_age(pod.metadata.creation_timestamp.as_ref()),
    ];
    if *scope == NamespaceScope::All {
        columns.insert(0, namespace.clone().unwrap_or_else(|| "-".to_string()));
    }

    let containers = pod
        .spec
        .as_ref()
        .map(|spec| PodContainers {
            containers: spec.containers.iter().map(|c| c.name.clone()).collect(),
            init_containers: spec
                .init_containers
                .iter()
                .flatten()
                .map(|c| c.name.clone())
                .collect(),
        })
        .unwrap_or_default();

    (
        RowData {
            name,
            namespace,
            columns,
        },
        containers,
    )
}

fn pod_phase(pod: &Pod) -> String {
    if pod.metadata.deletion_timestamp.is_some() {
        return "Terminating".to_string();
    }
    let status = pod.status.as_ref();
    let waiting = status
        .and_then(|status| status.container_statuses.as_ref())
        .into_iter()
        .flatten()
        .find_map(|container| {
            container
                .state
                .as_ref()
                .and_then(|state| state.waiting.as_ref())
                .and_then(|waiting| waiting.reason.clone())
        });
    waiting
        .or_else(|| status.and_then(|status| status.phase.clone()))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn parse_pod_metrics_usage(data: &Value) -> (u64, u64) {
    let Some(containers) = data.get("containers").and_then(Value::as_array) else {
        return (0, 0);
    };

    containers
        .iter()
        .fold((0u64, 0u64), |(cpu, memory), container| {
            let (container_cpu, container_memory) = container
                .get("usage")
                .map(parse_usage_from_value)
                .unwrap_or((0, 0));
            (
                cpu.saturating_add(container_cpu),
                memory.saturating_add(container_memory),
            )
        })
}

fn parse_usage_from_value(value: &Value) -> (u64, u64) {
    let cpu = value
        .get("cpu")
        .and_then(Value::as_str)
        .and_then(parse_cpu_millicores)
        .unwrap_or(0);
    let memory = value
        .get("memory")
        .and_then(Value::as_str)
        .and_then(parse_memory_bytes)
        .unwrap_or(0);
    (cpu, memory)
}

fn parse_cpu_millicores(value: &str) -> Option<u64> {
    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }

    let (number, multiplier) = if let Some(number) = raw.strip_suffix('m') {
        (number, 1.0)
    } else if let Some(number) = raw.strip_suffix('u') {
        (number, 0.001)
    } else if let Some(number) = raw.strip_suffix('n') {
        (number, 0.000001)
    } else {
        (raw, 1000.0)
    };

    scaled(number, multiplier)
}

fn parse_memory_bytes(value: &str) -> Option<u64> {
    const UNITS: [(&str, f64); 12] = [
        ("Ei", 1_152_921_504_606_846_976.0),
        ("Pi", 1_125_899_906_842_624.0),
        ("Ti", 1_099_511_627_776.0),
        ("Gi", 1_073_741_824.0),
        ("Mi", 1_048_576.0),
        ("Ki", 1_024.0),
        ("E", 1_000_000_000_000_000_000.0),
        ("P", 1_000_000_000_000_000.0),
        ("T", 1_000_000_000_000.0),
        ("G", 1_000_000_000.0),
        ("M", 1_000_000.0),
        ("k", 1_000.0),
    ];

    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }
    for (suffix, multiplier) in UNITS {
        if let Some(number) = raw.strip_suffix(suffix) {
            return scaled(number, multiplier);
        }
    }
    match raw.strip_suffix('m') {
        Some(number) => scaled(number, 0.001),
        None => scaled(raw, 1.0),
    }
}

fn scaled(number: &str, multiplier: f64) -> Option<u64> {
    let value = (number.parse::<f64>().ok()? * multiplier).round();
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value as u64)
}

fn list_params() -> ListParams {
    ListParams::default().limit(500)
}

fn pod_readiness(status: &PodStatus) -> (usize, usize, i32) {
    let container_statuses = status.container_statuses.as_deref().unwrap_or(&[]);
    let total = container_statuses.len();
    let ready = container_statuses
        .iter()
        .filter(|container| container.ready)
        .count();
    let restarts = container_statuses
        .iter()
        .map(|container| container.restart_count)
        .sum();

    (ready, total, restarts)
}

fn human_age(timestamp: Option<&Time>) -> String {
    let Some(timestamp) = timestamp else {
        return "-".to_string();
    };

    let now = k8s_openapi::jiff::Timestamp::now();
    format_elapsed_seconds((now.as_second() - timestamp.0.as_second()).max(0))
}

fn format_elapsed_seconds(seconds: i64) -> String {
    if seconds >= 86_400 {
        return format!("{}d", seconds / 86_400);
    }

    if seconds >= 3_600 {
        return format!("{}h", seconds / 3_600);
    }

    if seconds >= 60 {
        return format!("{}m", seconds / 60);
    }

    format!("{seconds}s")
}
