use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "podview",
    version,
    about = "Browse pods, tail their logs and shell into their containers."
)]
pub struct CliArgs {
    /// Refresh interval in milliseconds
    #[arg(long, default_value_t = 1_500)]
    pub refresh_ms: u64,

    /// Start in a specific namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// List pods across all namespaces
    #[arg(short = 'A', long, conflicts_with = "namespace")]
    pub all_namespaces: bool,

    /// kubeconfig context to use instead of the current one
    #[arg(long)]
    pub context: Option<String>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file; the terminal is taken by the UI
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn defaults_follow_current_context() {
        let args = CliArgs::parse_from(["podview"]);
        assert_eq!(args.refresh_ms, 1_500);
        assert_eq!(args.context, None);
        assert!(!args.all_namespaces);
        assert_eq!(args.log_filter, "info");
    }

    #[test]
    fn namespace_and_all_namespaces_conflict() {
        assert!(CliArgs::try_parse_from(["podview", "-n", "demo", "-A"]).is_err());
        let args = CliArgs::try_parse_from(["podview", "-A", "--context", "kind-dev"])
            .expect("valid args");
        assert!(args.all_namespaces);
        assert_eq!(args.context.as_deref(), Some("kind-dev"));
    }
}
