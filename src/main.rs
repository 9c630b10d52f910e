use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use notes_sync::{
    HttpNoteService, ListState, LogNotifier, Note, NoteEditor, NoteError, NoteListController,
    Notification, Notifier, Session, Settings,
};

#[derive(Debug, Parser)]
#[command(name = "notes", version, about = "Offline-first notes with remote sync")]
struct Cli {
    /// Settings file
    #[arg(long, global = true, value_name = "PATH", default_value = "notes.json")]
    config: PathBuf,

    /// User whose notes to work with (overrides the settings file)
    #[arg(long, global = true, value_name = "ID")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List notes, newest first, optionally filtered by a search query
    List { query: Option<String> },
    /// Create a note with the default title and content
    Add,
    /// Delete a note
    Rm { id: Uuid },
    /// Print a single note
    Show { id: Uuid },
    /// Save a note as a markdown file
    Export {
        id: Uuid,
        /// Directory to write into
        #[arg(long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
    },
    /// Edit a note's title and/or content
    Edit {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
}

// Logs notifications and remembers whether any of them was an error
#[derive(Clone, Default)]
struct CliNotifier {
    failed: Arc<AtomicBool>,
}

impl Notifier for CliNotifier {
    fn notify(&self, notification: Notification) {
        if notification.is_error() {
            self.failed.store(true, Ordering::SeqCst);
        }
        LogNotifier.notify(notification);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let mut settings = Settings::load(&cli.config).apply_env();
    if let Some(user) = cli.user {
        settings.user_id = Some(user);
    }
    if settings.user_id.is_none() {
        bail!("no user configured, pass --user or set NOTES_USER_ID");
    }
    info!(api = %settings.api_url, cache = %settings.resolved_cache_dir().display(), "using settings");

    let service = HttpNoteService::from_settings(&settings)
        .with_context(|| format!("invalid api url '{}'", settings.api_url))?;
    let notifier = CliNotifier::default();
    let failed = Arc::clone(&notifier.failed);
    let session = Session::new(settings, service, notifier);

    let succeeded = match cli.command {
        Command::List { query } => {
            let mut list = NoteListController::new(session);
            list.load().await;
            if let ListState::Error { message, .. } = list.state() {
                eprintln!("offline: {message}");
            }
            for note in list.visible(query.as_deref().unwrap_or("")) {
                println!("{}  {}  {}", note.id, format_time(note.last_update), note.title);
            }
            true
        }
        Command::Add => {
            let mut list = NoteListController::new(session);
            match list.add_note().await {
                Some(note) => {
                    println!("{}", note.id);
                    true
                }
                None => false,
            }
        }
        Command::Rm { id } => {
            let mut list = NoteListController::new(session);
            list.remove_note(id).await
        }
        Command::Show { id } => {
            let editor = NoteEditor::open(session, id).await;
            match editor.note() {
                Some(note) => {
                    print_note(note);
                    true
                }
                None => return Err(NoteError::NotFound(id).into()),
            }
        }
        Command::Export { id, out } => {
            let mut list = NoteListController::new(session);
            list.load().await;
            let path = list.export(id, &out).await?;
            println!("{}", path.display());
            true
        }
        Command::Edit { id, title, content } => {
            let mut editor = NoteEditor::open(session, id).await;
            if editor.note().is_none() {
                return Err(NoteError::NotFound(id).into());
            }
            if let Some(title) = title {
                editor.edit_title(title);
            }
            if let Some(content) = content {
                editor.edit_content(content);
            }
            editor.flush().await;

            if let Some(note) = editor.note() {
                print_note(note);
            }
            true
        }
    };

    Ok(succeeded && !failed.load(Ordering::SeqCst))
}

fn print_note(note: &Note) {
    println!("# {}", note.title);
    println!(
        "created {}, updated {}",
        format_time(note.created_at),
        format_time(note.last_update)
    );
    println!();
    println!("{}", note.content);
}

fn format_time(epoch_ms: i64) -> String {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}
