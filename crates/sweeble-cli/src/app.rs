use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use sweeble_core::{DocumentSnapshot, EditorSession, Mutation, OpenAiAssistant, RecordingRenderer, Settings};

use crate::cli::Cli;
use crate::cursor::place_cursor;
use crate::report::describe;

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path).with_context(|| format!("loading {}", path.display()))?,
        None => Settings::load(),
    };
    if let Some(model) = &cli.model {
        settings.openai.completion_model = model.clone();
    }
    if cli.include_ignored {
        settings.filter.respect_gitignore = false;
    }
    Ok(settings)
}

/// Longest a single request can take before every stage has timed out.
fn overall_deadline(settings: &Settings) -> Duration {
    let timing = &settings.timing;
    timing.debounce()
        + timing.classification_timeout()
        + timing.completion_timeout().max(timing.proposal_timeout())
        + Duration::from_secs(1)
}

/// One request against one file: print the suggestion, optionally apply it.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    let assistant = OpenAiAssistant::from_settings(&settings);
    if !assistant.is_configured() {
        bail!(
            "No OpenAI API key: set {} or add openai.api_key to {}",
            settings.openai.api_key_env,
            Settings::config_path().display()
        );
    }

    let raw = std::fs::read_to_string(&cli.file).with_context(|| format!("reading {}", cli.file.display()))?;
    let (text, cursor) = place_cursor(&raw, cli.offset, cli.at)?;
    tracing::debug!("Cursor at offset {} of {}", cursor, cli.file.display());

    let snapshot = DocumentSnapshot::new(text, cursor).with_path(cli.file.clone());
    let mut session = EditorSession::new(
        Arc::new(assistant),
        &settings,
        RecordingRenderer::new(),
        Vec::<Mutation>::new(),
    );

    if session.on_input(&snapshot).is_none() {
        println!("{} is git-ignored; use --include-ignored to run anyway", cli.file.display());
        return Ok(());
    }

    let event = tokio::time::timeout(overall_deadline(&settings), session.next_event())
        .await
        .context("timed out waiting for a suggestion")?
        .context("suggestion worker stopped")?;

    let preview = session.preview()?;
    print!("{}", describe(&event, preview.as_ref()));

    if cli.apply && session.state().has_suggestion() {
        let report = session.accept()?;
        std::fs::write(&cli.file, session.buffer().text())
            .with_context(|| format!("writing {}", cli.file.display()))?;
        println!("Applied {} edit(s) to {}", report.applied, cli.file.display());
    }

    Ok(())
}
