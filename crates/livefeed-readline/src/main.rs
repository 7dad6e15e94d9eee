mod command;
mod helper;
mod render;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::history::DefaultHistory;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use livefeed_application::{EventPipeline, StartOutcome};
use livefeed_core::session::normalize_handle;
use livefeed_infrastructure::scripted_source::available_handles;
use livefeed_infrastructure::{
    ConfigService, LiveFeedPaths, ScriptedSource, TomlRecentHandlesRepository,
};

use command::{Command, HELP, SearchCommand, parse_command};
use helper::CliHelper;
use render::{ViewState, render_event, render_mode, render_pins, render_signal};

/// Terminal monitor for live stream chat, gift and subscription events.
#[derive(Parser)]
#[command(name = "livefeed", version)]
struct Args {
    /// Config file to use instead of `<config_dir>/livefeed/config.toml`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding `<handle>.jsonl` replay scripts.
    #[arg(long)]
    script_dir: Option<PathBuf>,

    /// Allow several sessions at once.
    #[arg(long)]
    multi: bool,
}

/// Sends logs to a daily file under the logs directory so they never
/// interleave with the prompt. `RUST_LOG` overrides the `info` default.
fn init_logging(paths: &LiveFeedPaths) -> Result<WorkerGuard> {
    let logs_dir = paths.logs_dir()?;
    std::fs::create_dir_all(&logs_dir)?;

    let appender = tracing_appender::rolling::daily(&logs_dir, "livefeed.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

struct Repl {
    pipeline: Arc<EventPipeline>,
    view: Arc<Mutex<ViewState>>,
    script_dir: PathBuf,
    /// Completion candidates shared with the rustyline helper.
    handles: Arc<Mutex<Vec<String>>>,
}

impl Repl {
    fn view(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn focused(&self) -> Result<String> {
        match self.view().focus.clone() {
            Some(handle) => Ok(handle),
            None => bail!("No session. Use 'start <handle>' first."),
        }
    }

    async fn refresh_handles(&self) {
        let mut handles = available_handles(&self.script_dir);
        match self.pipeline.recent_handles().await {
            Ok(recent) => handles.extend(recent),
            Err(e) => tracing::warn!("[Repl] Failed to load recent handles: {}", e),
        }
        handles.sort();
        handles.dedup();
        *self.handles.lock().unwrap_or_else(PoisonError::into_inner) = handles;
    }

    /// Runs one command. Returns `false` when the REPL should exit.
    async fn execute(&self, command: Command) -> Result<bool> {
        match command {
            Command::Start(raw) => {
                match self.pipeline.start_session(&raw).await? {
                    StartOutcome::Started { handle, .. } => {
                        println!("{}", format!("Connecting to @{}...", handle).bright_black());
                        self.view().focus = Some(handle);
                    }
                    StartOutcome::AlreadyActive { handle } => {
                        println!("{}", format!("@{} is already running", handle).yellow());
                        self.view().focus = Some(handle);
                    }
                }
                self.refresh_handles().await;
            }
            Command::Stop(handle) => {
                let handle = match handle {
                    Some(handle) => handle,
                    None => self.focused()?,
                };
                if !self.pipeline.stop_session(&handle).await? {
                    println!("{}", format!("@{} is not running", handle).yellow());
                }
            }
            Command::Use(raw) => {
                let snapshot = self.pipeline.snapshot(&raw).await?;
                println!("Focused @{} ({})", snapshot.handle, render_mode(&snapshot.mode));
                self.view().focus = Some(snapshot.handle);
            }
            Command::Pause => {
                self.pipeline.set_paused(&self.focused()?, true).await?;
            }
            Command::Resume => {
                self.pipeline.set_paused(&self.focused()?, false).await?;
            }
            Command::Slow(None) => {
                self.pipeline.toggle_slow_mode(&self.focused()?).await?;
            }
            Command::Slow(Some(enabled)) => {
                self.pipeline
                    .set_slow_mode(&self.focused()?, enabled)
                    .await?;
            }
            Command::Pin(index) => {
                let toggle = self.pipeline.pin(&self.focused()?, index).await?;
                let verb = if toggle.pinned { "Pinned" } else { "Unpinned" };
                println!("{} [{}]", verb, index);
            }
            Command::Unpin(index) => {
                if !self.pipeline.unpin(&self.focused()?, index).await? {
                    println!("{}", format!("[{}] is not pinned", index).yellow());
                }
            }
            Command::Pins => {
                let snapshot = self.pipeline.snapshot(&self.focused()?).await?;
                let view = self.view();
                for line in render_pins(&snapshot.pins, &view.filter) {
                    println!("{}", line);
                }
            }
            Command::ClearPins => {
                if !self.pipeline.clear_pins(&self.focused()?).await? {
                    println!("{}", "Nothing pinned".bright_black());
                }
            }
            Command::Filter(kind) => {
                let mut view = self.view();
                if !view.filter.kinds.toggle(kind) {
                    println!("{}", "At least one kind must stay visible".yellow());
                }
                let kinds = view.filter.kinds;
                println!(
                    "comments: {}, gifts: {}, subscriptions: {}",
                    kinds.comment, kinds.gift, kinds.subscription
                );
            }
            Command::Search(search) => {
                let mut view = self.view();
                match search {
                    SearchCommand::User(query) => view.filter.user_query = query,
                    SearchCommand::Text(query) => view.filter.text_query = query,
                    SearchCommand::FilterOn => view.filter.filter_mode = true,
                    SearchCommand::FilterOff => view.filter.filter_mode = false,
                    SearchCommand::Clear => view.filter.clear_queries(),
                }
                let filter = &view.filter;
                println!(
                    "user: '{}', text: '{}', hide non-matching: {}",
                    filter.user_query, filter.text_query, filter.filter_mode
                );
            }
            Command::Show => {
                let snapshot = self.pipeline.snapshot(&self.focused()?).await?;
                let view = self.view();
                println!(
                    "@{} {} | {} held, {} queued",
                    snapshot.handle,
                    render_mode(&snapshot.mode),
                    snapshot.paused_pending,
                    snapshot.queued_pending
                );
                if view.filter.filter_mode && view.filter.has_queries() {
                    println!("{}", "(showing search matches only)".bright_black());
                }
                for (index, event) in snapshot.delivered.iter().enumerate() {
                    if view.filter.matches(event) {
                        println!("{}", render_event(index, event, &view.filter));
                    }
                }
            }
            Command::Sessions => {
                let focus = self.view().focus.clone();
                let handles = self.pipeline.active_handles().await;
                if handles.is_empty() {
                    println!("{}", "No running sessions".bright_black());
                }
                for handle in handles {
                    let marker = if focus.as_deref() == Some(handle.as_str()) { "*" } else { " " };
                    println!("{} @{}", marker, handle);
                }
            }
            Command::Recent => {
                for handle in self.pipeline.recent_handles().await? {
                    println!("@{}", handle);
                }
            }
            Command::Forget(raw) => {
                let handle = normalize_handle(&raw)?;
                self.pipeline.forget_handle(&handle).await?;
                println!("Forgot @{}", handle);
                self.refresh_handles().await;
            }
            Command::Scripts => {
                let handles = available_handles(&self.script_dir);
                if handles.is_empty() {
                    println!(
                        "{}",
                        format!("No scripts in {}", self.script_dir.display()).bright_black()
                    );
                }
                for handle in handles {
                    println!("@{}", handle);
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ===== Backend Initialization =====
    let paths = LiveFeedPaths::default();
    let _log_guard = init_logging(&paths)?;

    let config_service = match args.config {
        Some(path) => ConfigService::with_path(path, paths.clone()),
        None => ConfigService::new(paths.clone())?,
    };
    let mut config = config_service.get_config()?;
    if args.multi {
        config.allow_multiple_sessions = true;
    }
    let script_dir = match args.script_dir.or_else(|| config.script_dir.clone()) {
        Some(dir) => dir,
        None => paths.scripts_dir()?,
    };
    tracing::info!(
        "[Repl] Config {} (scripts: {})",
        config_service.config_path().display(),
        script_dir.display()
    );

    let recent = Arc::new(TomlRecentHandlesRepository::new(
        paths.recent_handles_file()?,
        config.recent_handles_limit,
    ));
    let source = Arc::new(ScriptedSource::new(script_dir.clone()));
    let pipeline = Arc::new(EventPipeline::new(source, config).with_recent_handles(recent));

    let view = Arc::new(Mutex::new(ViewState::default()));
    let mut signals = pipeline.subscribe();
    let printer_view = Arc::clone(&view);
    let printer = tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            let lines = {
                let mut view = printer_view.lock().unwrap_or_else(PoisonError::into_inner);
                render_signal(&signal, &mut view)
            };
            for line in lines {
                println!("{}", line);
            }
        }
    });

    let repl = Repl {
        pipeline: Arc::clone(&pipeline),
        view,
        script_dir,
        handles: Arc::new(Mutex::new(Vec::new())),
    };
    repl.refresh_handles().await;

    // ===== REPL Setup =====
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new(Arc::clone(&repl.handles))));

    println!("{}", "=== LiveFeed ===".bright_magenta().bold());
    println!(
        "{}",
        "Type 'start <handle>' to begin, 'help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();

    // ===== Main REPL Loop =====
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let command = match parse_command(trimmed) {
                    Ok(command) => command,
                    Err(usage) => {
                        println!("{}", usage.yellow());
                        continue;
                    }
                };
                match repl.execute(command).await {
                    Ok(true) => {}
                    Ok(false) => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    pipeline.shutdown().await;
    printer.abort();

    Ok(())
}
