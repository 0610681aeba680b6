use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    request_content_suggestion, ClientError, HttpUpTeachApi, LessonSession, SlideDeck,
    UpTeachApi, UploadedFile, ValidationError,
};
use shared::{
    align::{slides_with_suggestions, suggestions_for},
    domain::{DocumentKind, SlideSuggestionGroup},
};
use storage::UploadStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Parser, Debug)]
#[command(name = "upteach", about = "Upload teaching material and review slide suggestions")]
struct Args {
    /// Overrides the conversion/suggestion service URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Overrides where the selected file is remembered.
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select a lesson plan or slide deck and render its pages.
    Select {
        path: PathBuf,
        #[arg(long)]
        subject: Option<String>,
    },
    /// Change the subject used for the selected file.
    Subject { subject: String },
    /// Generate suggestions for the selected file.
    Generate {
        /// Only show suggestions for this 1-based slide or page.
        #[arg(long)]
        slide: Option<u32>,
    },
    /// Upload a syllabus and print content suggestions for it.
    Syllabus {
        path: PathBuf,
        #[arg(long)]
        subject: String,
    },
    /// Show the selected file and subject.
    Status,
    /// Forget the selected file and subject.
    Remove,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "command failed");
            eprintln!("{}", failure_message(&err));
            ExitCode::FAILURE
        }
    }
}

/// Client errors carry their own wording; anything else prints its chain.
fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(client_error) => client_error.user_message(),
        None => format!("{err:#}"),
    }
}

async fn run(args: Args) -> Result<String> {
    let mut settings = load_settings();
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(database_url) = args.database_url {
        settings.database_url = database_url;
    }

    let database_url = prepare_database_url(&settings.database_url);
    let store = UploadStore::new(&database_url).await.map_err(|error| {
        error!(%database_url, %error, "failed to open client state database");
        error
    })?;
    let api: Arc<dyn UpTeachApi> = Arc::new(HttpUpTeachApi::new(&settings.base_url)?);
    info!(base_url = %settings.base_url, "using UpTeach service");

    run_command(args.command, &store, api).await
}

async fn run_command(
    command: Command,
    store: &UploadStore,
    api: Arc<dyn UpTeachApi>,
) -> Result<String> {
    match command {
        Command::Select { path, subject } => select(store, api, &path, subject).await,
        Command::Subject { subject } => {
            store.save_subject(&subject).await?;
            Ok(format!("Subject set to '{subject}'\n"))
        }
        Command::Generate { slide } => generate(store, api, slide).await,
        Command::Syllabus { path, subject } => {
            let file = UploadedFile::from_path(&path).await?;
            let markdown = request_content_suggestion(api.as_ref(), &file, &subject).await?;
            Ok(format!("{markdown}\n"))
        }
        Command::Status => status(store).await,
        Command::Remove => {
            store.clear().await?;
            Ok("Removed stored file\n".to_string())
        }
    }
}

async fn select(
    store: &UploadStore,
    api: Arc<dyn UpTeachApi>,
    path: &Path,
    subject: Option<String>,
) -> Result<String> {
    let file = UploadedFile::from_path(path).await?;
    let subject = match subject {
        Some(subject) => subject,
        None => store.subject().await?.unwrap_or_default(),
    };
    store
        .save_selection(&file.filename, &file.bytes, &subject)
        .await
        .context("failed to remember selected file")?;

    let mut session = LessonSession::new(api);
    session.set_subject(subject);
    session.open_file(file).await?;
    Ok(render_deck(session.deck()))
}

async fn generate(
    store: &UploadStore,
    api: Arc<dyn UpTeachApi>,
    slide: Option<u32>,
) -> Result<String> {
    let selection = store
        .load_selection()
        .await?
        .ok_or(ClientError::Validation(ValidationError::MissingFile))?;
    let file = UploadedFile::new(selection.filename.clone(), selection.file_bytes()?);
    let label = DocumentKind::from_filename(&file.filename).page_label();

    let mut session = LessonSession::new(api);
    session.restore(file, selection.subject.unwrap_or_default());
    session.generate().await?;
    Ok(render_suggestions(label, slide, session.suggestions()))
}

async fn status(store: &UploadStore) -> Result<String> {
    let Some(selection) = store.load_selection().await? else {
        return Ok("No file selected\n".to_string());
    };
    Ok(format!(
        "File: {}\nSize: {} bytes\nSubject: {}\nSelected at: {}\n",
        selection.filename,
        selection.file_bytes()?.len(),
        selection.subject.as_deref().unwrap_or("(not set)"),
        selection.updated_at.to_rfc3339()
    ))
}

fn render_deck(deck: &SlideDeck) -> String {
    if deck.is_empty() {
        return "No pages available\n".to_string();
    }
    deck.slides()
        .iter()
        .enumerate()
        .map(|(index, url)| format!("{} {}: {url}\n", deck.label(), index + 1))
        .collect()
}

fn render_suggestions(label: &str, slide: Option<u32>, all: &[SlideSuggestionGroup]) -> String {
    match slide {
        Some(slide) => render_groups(label, slide, &suggestions_for(slide, all)),
        None if all.is_empty() => "No suggestions were returned.\n".to_string(),
        None => slides_with_suggestions(all)
            .into_iter()
            .map(|slide| render_groups(label, slide, &suggestions_for(slide, all)))
            .collect(),
    }
}

fn render_groups(label: &str, slide: u32, groups: &[&SlideSuggestionGroup]) -> String {
    let mut out = format!("Suggestions for {label} {slide}:\n");
    let mut printed = 0;
    for suggestion in groups.iter().flat_map(|group| &group.suggestions) {
        out.push_str(&format!("  - {}\n", suggestion.content));
        if suggestion.has_link() {
            out.push_str(&format!("    Source Link: {}\n", suggestion.link));
        }
        printed += 1;
    }
    if printed == 0 {
        out.push_str(&format!(
            "  No suggestions available for this {}.\n",
            label.to_lowercase()
        ));
    }
    out
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
