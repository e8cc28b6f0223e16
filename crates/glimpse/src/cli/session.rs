//! The `glimpse session` command: an interactive loop over one session.
//!
//! Submissions run as background tasks, so a new `open` or `drop` can be
//! issued while the previous one is still classifying; only the latest is
//! shown. A subscriber task redraws the state whenever it settles.

use std::path::PathBuf;
use std::sync::Arc;

use console::Style;
use dialoguer::Input;
use glimpse_core::{Config, DroppedItem, Glimpse, PickedFile, SessionController, SessionState};
use indicatif::ProgressBar;
use tokio::sync::watch;

use super::{render, theme};

/// One-line command summary shown in the banner and by `help`.
pub const HELP: &str =
    "commands: open <path> · drop <path> · reset · retry · status · help · quit";

/// A parsed prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Open(PathBuf),
    Drop(PathBuf),
    Reset,
    Retry,
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl SessionCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let path = || PathBuf::from(shellexpand::tilde(unquote(rest)).into_owned());

        match head.to_ascii_lowercase().as_str() {
            "" => SessionCommand::Empty,
            "open" | "o" | "pick" if !rest.is_empty() => SessionCommand::Open(path()),
            "drop" | "d" if !rest.is_empty() => SessionCommand::Drop(path()),
            "reset" | "clear" => SessionCommand::Reset,
            "retry" => SessionCommand::Retry,
            "status" | "s" => SessionCommand::Status,
            "help" | "h" | "?" => SessionCommand::Help,
            "quit" | "q" | "exit" => SessionCommand::Quit,
            _ => SessionCommand::Unknown(line.to_string()),
        }
    }
}

/// Strip one layer of matching quotes (terminals quote dragged-in paths).
fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

/// Convert a dialoguer result into `Ok(Some(value))` on success and
/// `Ok(None)` on interrupt (Ctrl+C / terminal disconnect).
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Entry point for `glimpse session`.
pub async fn run(config: Config) -> anyhow::Result<()> {
    theme::print_banner();

    let glimpse = Glimpse::new(config);
    let limits = glimpse.config().limits.clone();
    let session = glimpse.session();

    let renderer = tokio::spawn(render_updates(session.subscribe()));

    let startup = Arc::clone(&session);
    tokio::spawn(async move {
        if let Err(e) = startup.startup().await {
            tracing::debug!("Startup failed: {e}");
        }
    });

    let warn = Style::new().for_stderr().yellow();

    loop {
        let Some(line) = prompt().await? else {
            break;
        };

        match SessionCommand::parse(&line) {
            SessionCommand::Open(path) => match PickedFile::from_path(&path, &limits) {
                Ok(file) => spawn_submit(&session, Submission::Pick(file)),
                Err(e) => eprintln!("  {}", warn.apply_to(e)),
            },
            SessionCommand::Drop(path) => match DroppedItem::from_path(&path, &limits) {
                Ok(item) => spawn_submit(&session, Submission::Drop(item)),
                Err(e) => eprintln!("  {}", warn.apply_to(e)),
            },
            SessionCommand::Reset => session.reset(),
            SessionCommand::Retry => {
                if session.snapshot().model.is_failed() {
                    let retry = Arc::clone(&session);
                    tokio::spawn(async move {
                        if let Err(e) = retry.retry_model().await {
                            tracing::debug!("Retry failed: {e}");
                        }
                    });
                } else {
                    eprintln!("  {}", warn.apply_to("Model has not failed; nothing to retry."));
                }
            }
            SessionCommand::Status => eprintln!("{}", render::render_state(&session.snapshot())),
            SessionCommand::Help => eprintln!("  {}", HELP),
            SessionCommand::Quit => break,
            SessionCommand::Empty => {}
            SessionCommand::Unknown(input) => {
                eprintln!("  {} {}", warn.apply_to("Unknown command:"), input);
                eprintln!("  {}", HELP);
            }
        }
    }

    renderer.abort();
    Ok(())
}

/// Read one line without blocking the runtime.
async fn prompt() -> anyhow::Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let theme = theme::glimpse_theme();
        handle_interrupt(
            Input::<String>::with_theme(&theme)
                .with_prompt("glimpse")
                .allow_empty(true)
                .interact_text(),
        )
    })
    .await?
}

enum Submission {
    Pick(PickedFile),
    Drop(DroppedItem),
}

fn spawn_submit(session: &Arc<SessionController>, submission: Submission) {
    let session = Arc::clone(session);
    tokio::spawn(async move {
        let outcome = match submission {
            Submission::Pick(file) => session.pick_file(Some(file)).await,
            Submission::Drop(item) => session.drop_items(vec![item]).await,
        };
        tracing::debug!("Submission outcome: {:?}", outcome);
    });
}

/// Redraw on every settled state; show a spinner while busy.
async fn render_updates(mut rx: watch::Receiver<SessionState>) {
    let mut spinner: Option<ProgressBar> = None;

    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();

        if state.busy {
            let message = busy_message(&state);
            match &spinner {
                Some(pb) => pb.set_message(message),
                None => spinner = Some(render::spinner(message)),
            }
            continue;
        }

        if let Some(pb) = spinner.take() {
            pb.finish_and_clear();
        }
        if state.is_clear() {
            eprintln!("  {}", render::model_line(&state.model));
        } else {
            eprintln!("{}", render::render_state(&state));
        }
    }
}

fn busy_message(state: &SessionState) -> String {
    match &state.image {
        Some(image) if state.submission.is_some() => format!("Classifying {}…", image.name),
        _ => "Loading model…".to_string(),
    }
}
