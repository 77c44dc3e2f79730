//! Foreground reminder daemon.
//!
//! One tokio task owns the loop and all calls into the shared service:
//! - sleep until the service's next wake-up, then fire timers and deliver due reminders
//! - poll the config file and feed changes through a debounce window
//! - read user actions from stdin (`snooze <id>`, `done <id>`, ...)
//! - on `quit` or Ctrl-C, clear everything and exit

use std::path::{Path, PathBuf};
use std::sync::MutexGuard;
use std::time::{Duration as StdDuration, SystemTime};

use chrono::{Local, Utc};
use clap::Args;
use exercise_snack_core::{
    clock_jumped, Action, Config, Event, MessagePool, NotificationRequest, ReminderService,
    SharedService, Status, Trigger,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::CliResult;
use crate::sink::TerminalSink;

const HELP: &str = "\
commands:
  snooze <id>    snooze a delivered reminder
  done <id>      acknowledge with \"Do it now\"
  dismiss <id>   dismiss without follow-up
  status         print the status line
  pending        list pending and unanswered reminders
  wake           recompute the schedule (after sleep or a clock change)
  quit           clear pending reminders and exit";

#[derive(Args)]
pub struct RunArgs {
    /// Stream events as JSON lines on stdout
    #[arg(long)]
    json: bool,
    /// Fix the message rotation seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DaemonCommand {
    Act { identifier: String, action: Action },
    Status,
    Pending,
    Wake,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<DaemonCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".into());
    };
    let verb = verb.to_ascii_lowercase();
    match (verb.as_str(), words.next()) {
        ("status", None) => Ok(DaemonCommand::Status),
        ("pending", None) => Ok(DaemonCommand::Pending),
        ("wake", None) => Ok(DaemonCommand::Wake),
        ("help" | "?", None) => Ok(DaemonCommand::Help),
        ("quit" | "exit", None) => Ok(DaemonCommand::Quit),
        (verb, Some(identifier)) => Ok(DaemonCommand::Act {
            identifier: identifier.to_string(),
            action: verb.parse::<Action>().map_err(|e| e.to_string())?,
        }),
        (verb, None) => Err(format!("unknown command: {verb}")),
    }
}

/// Coalesces a burst of values into the last one, released once `window`
/// has passed without a newer push.
struct Debounce<T> {
    window: StdDuration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    fn new(window: StdDuration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.window));
    }

    fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    fn take_ready(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(at) if at <= now => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }
}

pub fn run(config_path: &Path, args: RunArgs) -> CliResult {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(daemon(config_path.to_path_buf(), args));
    // A pending stdin read would otherwise hold the runtime open.
    runtime.shutdown_timeout(StdDuration::from_millis(200));
    result
}

async fn daemon(config_path: PathBuf, args: RunArgs) -> CliResult {
    let config = Config::load_from(&config_path)?;
    let debounce_window = StdDuration::from_millis(config.daemon.debounce_ms);
    let poll_every = StdDuration::from_secs(config.daemon.config_poll_secs.max(1));

    let service = ReminderService::new(
        config,
        MessagePool::with_default_catalog(args.seed),
        TerminalSink::new(args.json),
    )
    .into_shared();
    let out = Output { json: args.json };

    out.emit(lock(&service)?.start(&Local::now()));

    let (config_tx, mut config_rx) = mpsc::unbounded_channel();
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    tokio::spawn(watch_config(config_path.clone(), poll_every, config_tx));
    tokio::spawn(read_commands(command_tx));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut debounce = Debounce::new(debounce_window);
    let mut stdin_open = true;

    tracing::info!(config = %config_path.display(), "daemon running; type 'help' for commands");

    loop {
        let now = Utc::now();
        let wake_at = lock(&service)?
            .next_wakeup()
            .unwrap_or(now + chrono::Duration::minutes(1));
        let sleep_for = (wake_at - now).to_std().unwrap_or(StdDuration::ZERO);
        let expected = wake_at.max(now);
        let debounce_at = debounce
            .deadline()
            .unwrap_or_else(|| Instant::now() + StdDuration::from_secs(3600));

        tokio::select! {
            _ = tokio::time::sleep(sleep_for) => {
                let now = Local::now();
                let mut svc = lock(&service)?;
                if clock_jumped(expected, now.with_timezone(&Utc)) {
                    out.emit(svc.on_clock_jump(expected, &now));
                }
                out.emit(svc.fire_due_timers(&now));
                out.emit(svc.deliver_due(&now));
            }
            Some(config) = config_rx.recv() => {
                tracing::debug!("config change received");
                debounce.push(config, Instant::now());
            }
            _ = tokio::time::sleep_until(debounce_at), if debounce.deadline().is_some() => {
                if let Some(config) = debounce.take_ready(Instant::now()) {
                    tracing::info!("applying configuration change");
                    out.emit(lock(&service)?.on_config_changed(config, &Local::now()));
                }
            }
            command = command_rx.recv(), if stdin_open => match command {
                None => {
                    stdin_open = false;
                    tracing::debug!("stdin closed; actions disabled");
                }
                Some(DaemonCommand::Quit) => break,
                Some(command) => out.handle(&service, command)?,
            },
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    out.emit(lock(&service)?.shutdown(&Local::now()));
    Ok(())
}

fn lock(
    service: &SharedService<TerminalSink>,
) -> CliResult<MutexGuard<'_, ReminderService<TerminalSink>>> {
    service
        .lock()
        .map_err(|e| format!("reminder service lock poisoned: {e}").into())
}

/// Polls the config file's mtime and sends every successfully loaded change.
async fn watch_config(path: PathBuf, every: StdDuration, tx: mpsc::UnboundedSender<Config>) {
    let mut last = modified(&path).await;
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let current = modified(&path).await;
        if current.is_none() || current == last {
            continue;
        }
        last = current;
        match Config::load_from(&path) {
            Ok(config) => {
                if tx.send(config).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, "config file changed but could not be loaded"),
        }
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

async fn read_commands(tx: mpsc::UnboundedSender<DaemonCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match parse_command(&line) {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("{e}; type 'help' for commands"),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stdin");
                break;
            }
        }
    }
}

struct Output {
    json: bool,
}

impl Output {
    fn emit(&self, events: Vec<Event>) {
        for event in events {
            if self.json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "cannot serialize event"),
                }
                continue;
            }
            match &event {
                Event::StatusRefreshed { status, .. } => println!("[status] {status}"),
                Event::ReminderSnoozed {
                    identifier,
                    fire_at,
                    ..
                } => println!(
                    "snoozed until {} as {identifier}",
                    fire_at.with_timezone(&Local).format("%H:%M")
                ),
                Event::DeliveryFailed {
                    identifier, error, ..
                } => eprintln!("could not deliver {identifier}: {error}"),
                _ => tracing::debug!(?event, "event"),
            }
        }
    }

    fn handle(&self, service: &SharedService<TerminalSink>, command: DaemonCommand) -> CliResult {
        let now = Local::now();
        let mut svc = lock(service)?;
        match command {
            DaemonCommand::Act { identifier, action } => {
                self.emit(svc.handle_action(&identifier, action, &now));
            }
            DaemonCommand::Status => self.print_status(svc.status(&now))?,
            DaemonCommand::Pending => {
                self.print_pending(&svc.pending_requests(), &svc.awaiting_action())?;
            }
            DaemonCommand::Wake => self.emit(svc.on_wake(&now)),
            DaemonCommand::Help => println!("{HELP}"),
            DaemonCommand::Quit => {}
        }
        Ok(())
    }

    fn print_status(&self, status: Status) -> CliResult {
        if self.json {
            let value = serde_json::json!({ "type": "Status", "text": status.to_string() });
            println!("{}", serde_json::to_string(&value)?);
        } else {
            println!("{status}");
        }
        Ok(())
    }

    fn print_pending(&self, pending: &[NotificationRequest], awaiting: &[String]) -> CliResult {
        if self.json {
            let value = serde_json::json!({
                "type": "Pending",
                "pending": pending,
                "awaiting_action": awaiting,
            });
            println!("{}", serde_json::to_string(&value)?);
            return Ok(());
        }
        if pending.is_empty() {
            println!("nothing pending");
        }
        for request in pending {
            let when = match request.trigger {
                Trigger::At(at) => at.with_timezone(&Local).format("%H:%M").to_string(),
                Trigger::Immediate => "now".to_string(),
            };
            println!("{when}  {}  {}", request.identifier, request.body);
        }
        if !awaiting.is_empty() {
            println!("awaiting action: {}", awaiting.join(", "));
        }
        Ok(())
    }
}
