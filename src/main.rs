mod actions;
mod cli;
mod config;
mod error;
mod input;
mod k8s;
mod model;
mod pages;
mod picker;
mod pod;
mod session;
mod table;
mod ui;
mod view;

use anyhow::{Context, Result};
use chrono::{Local, TimeDelta};
use clap::Parser;
use cli::CliArgs;
use config::{RuntimeConfigSnapshot, RuntimeConfigWatcher};
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use error::ViewError;
use futures::{StreamExt, TryStreamExt};
use input::Key;
use k8s::KubeGateway;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher::{Config as WatchConfig, watcher};
use kube::{Api, Client};
use model::{FlashLevel, NamespaceScope, PodList};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Instant;
use tokio::process::Command as TokioCommand;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use view::{Dispatch, ResourceView, ViewCommand, ViewSettings};

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;
type PodView = ResourceView<PodList>;
const POD_REFRESH_TIMEOUT: Duration = Duration::from_secs(4);
const WATCH_MIN_INTERVAL: Duration = Duration::from_millis(350);

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let mut config_watcher = RuntimeConfigWatcher::discover();
    let config = config_watcher.load_current()?;
    if let Some(source) = &config.source {
        info!(source = %source, "loaded config");
    }

    let gateway = KubeGateway::new(args.context.clone()).await?;
    let settings = ViewSettings {
        context: gateway.context().to_string(),
        namespace_scope: resolve_namespace_scope(&args, &gateway),
        shell: config.shell.clone(),
        flash_ttl: flash_ttl(&config),
    };
    let mut view = pod::new_pod_view(PodList::default(), settings);

    run(
        &mut view,
        &gateway,
        config_watcher,
        config.kubectl,
        args.refresh_ms.max(500),
    )
    .await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    let _ = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::sink).try_init(),
    };

    Ok(())
}

fn resolve_namespace_scope(args: &CliArgs, gateway: &KubeGateway) -> NamespaceScope {
    if args.all_namespaces {
        NamespaceScope::All
    } else if let Some(namespace) = &args.namespace {
        NamespaceScope::Named(namespace.clone())
    } else {
        NamespaceScope::Named(gateway.default_namespace().to_string())
    }
}

fn flash_ttl(config: &RuntimeConfigSnapshot) -> TimeDelta {
    TimeDelta::seconds(i64::try_from(config.flash_secs).unwrap_or(5))
}

async fn run(
    view: &mut PodView,
    gateway: &KubeGateway,
    config_watcher: RuntimeConfigWatcher,
    kubectl: String,
    refresh_ms: u64,
) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(
        &mut terminal,
        view,
        gateway,
        config_watcher,
        kubectl,
        refresh_ms,
    )
    .await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    view: &mut PodView,
    gateway: &KubeGateway,
    mut config_watcher: RuntimeConfigWatcher,
    mut kubectl: String,
    refresh_ms: u64,
) -> Result<()> {
    view.flash(FlashLevel::Info, "Loading pods…");
    terminal
        .draw(|frame| ui::render(frame, view))
        .context("failed to render terminal frame")?;
    refresh_pods(view, gateway).await;

    let mut reader = EventStream::new();
    let mut ticker = interval(Duration::from_millis(refresh_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let (watch_tx, mut watch_rx) = mpsc::unbounded_channel::<()>();
    let watch_task = spawn_pod_watcher(
        gateway.client(),
        view.settings().namespace_scope.clone(),
        watch_tx,
    );
    let mut last_watch_refresh = None;

    loop {
        terminal
            .draw(|frame| ui::render(frame, view))
            .context("failed to render terminal frame")?;

        if !view.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(key) = Key::from_event(key)
                            && let Dispatch::Handled(command) = view.handle_key(key)
                        {
                            terminal
                                .draw(|frame| ui::render(frame, view))
                                .context("failed to render terminal frame")?;
                            execute_view_command(terminal, view, gateway, &kubectl, command).await;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        view.flash(FlashLevel::Error, format!("terminal event error: {error}"));
                    }
                    None => {
                        warn!("terminal event stream closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                reload_config(view, &mut config_watcher, &mut kubectl);
                refresh_pods(view, gateway).await;
                view.expire_flash(Local::now());
            }
            Some(()) = watch_rx.recv() => {
                if should_process_watch_event(&mut last_watch_refresh) {
                    refresh_pods(view, gateway).await;
                }
            }
        }
    }

    watch_task.abort();
    Ok(())
}

async fn execute_view_command(
    terminal: &mut TuiTerminal,
    view: &mut PodView,
    gateway: &KubeGateway,
    kubectl: &str,
    command: ViewCommand,
) {
    match command {
        ViewCommand::None => {}
        ViewCommand::Refresh => refresh_pods(view, gateway).await,
        ViewCommand::Launch(request) => {
            debug!(kubectl, args = ?request.args, "starting session");
            match run_kubectl_session(terminal, kubectl, &request.args).await {
                Ok(()) => {
                    info!(session = %request.summary, "session closed");
                    view.flash(FlashLevel::Info, format!("Closed {}", request.summary));
                }
                Err(error) => view.flash_error(&ViewError::SessionSpawnFailed {
                    target: request.summary,
                    reason: compact_error(&error),
                }),
            }
            refresh_pods(view, gateway).await;
        }
    }
}

async fn refresh_pods(view: &mut PodView, gateway: &KubeGateway) {
    let scope = view.settings().namespace_scope.clone();
    match timeout(POD_REFRESH_TIMEOUT, gateway.fetch_pods(&scope)).await {
        Ok(Ok(pods)) => view.set_list(pods),
        Ok(Err(error)) => view.flash(
            FlashLevel::Error,
            format!("Pod refresh failed: {}", compact_error(&error)),
        ),
        Err(_) => view.flash(
            FlashLevel::Warn,
            format!("Pod refresh timed out for {scope} (showing cached data)"),
        ),
    }
}

fn reload_config(
    view: &mut PodView,
    config_watcher: &mut RuntimeConfigWatcher,
    kubectl: &mut String,
) {
    match config_watcher.reload_if_changed() {
        Ok(Some(config)) => {
            view.set_shell(config.shell.clone());
            view.set_flash_ttl(flash_ttl(&config));
            *kubectl = config.kubectl.clone();
            let source = config.source.as_deref().unwrap_or("defaults");
            info!(source, "config reloaded");
            view.flash(FlashLevel::Info, format!("Config reloaded from {source}"));
        }
        Ok(None) => {}
        Err(error) => view.flash(
            FlashLevel::Warn,
            format!("Config reload failed: {}", compact_error(&error)),
        ),
    }
}

/// Runs kubectl in the foreground with the terminal handed over, then takes
/// the terminal back whatever the outcome.
async fn run_kubectl_session(
    terminal: &mut TuiTerminal,
    kubectl: &str,
    args: &[String],
) -> Result<()> {
    suspend_terminal_for_subprocess(terminal)?;
    let run_result = wait_for_session(kubectl, args).await;
    let restore_result = resume_terminal_after_subprocess(terminal);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal resume error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

async fn wait_for_session(kubectl: &str, args: &[String]) -> Result<()> {
    let mut child = TokioCommand::new(kubectl)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("failed to run {kubectl}"))?;

    // Ctrl-C reaches kubectl through the process group; it must not end us.
    let mut interrupted = false;
    let status = loop {
        tokio::select! {
            status = child.wait() => {
                break status.with_context(|| format!("failed to wait for {kubectl}"))?;
            }
            _ = tokio::signal::ctrl_c() => {
                interrupted = true;
            }
        }
    };

    if status.success() || interrupted {
        Ok(())
    } else {
        Err(anyhow::anyhow!("{kubectl} exited with {status}"))
    }
}

fn suspend_terminal_for_subprocess(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode for subprocess")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen for subprocess")?;
    terminal
        .show_cursor()
        .context("failed to show cursor for subprocess")?;
    Ok(())
}

fn resume_terminal_after_subprocess(terminal: &mut TuiTerminal) -> Result<()> {
    enable_raw_mode().context("failed to re-enable raw mode after subprocess")?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)
        .context("failed to re-enter alternate screen after subprocess")?;
    terminal
        .clear()
        .context("failed to clear terminal after subprocess")?;
    Ok(())
}

fn should_process_watch_event(last: &mut Option<Instant>) -> bool {
    let now = Instant::now();
    if last.is_some_and(|last| now.duration_since(last) < WATCH_MIN_INTERVAL) {
        return false;
    }
    *last = Some(now);
    true
}

fn spawn_pod_watcher(
    client: Client,
    scope: NamespaceScope,
    tx: mpsc::UnboundedSender<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let api: Api<Pod> = match &scope {
                NamespaceScope::All => Api::all(client.clone()),
                NamespaceScope::Named(namespace) => Api::namespaced(client.clone(), namespace),
            };
            let mut events = watcher(api, WatchConfig::default()).boxed();
            loop {
                match events.try_next().await {
                    Ok(Some(_)) => {
                        if tx.send(()).is_err() {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        warn!("pod watch stream error for {scope}: {error}");
                        break;
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(900)).await;
        }
    })
}

fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("; ")
}
