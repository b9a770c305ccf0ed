//! `bbpilot` 바이너리 진입점.

use std::io::{self, Write};

use anyhow::{Context, Result};

use bbpilot::domain::policy::{entries_to_drafts, parse_review_entries, render_general, render_inline};
use bbpilot::domain::pr::{CommentDraft, to_posix_path};
use bbpilot::interface::AppComposition;
use bbpilot::interface::cli::{Cli, CliAction};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let action = Cli::parse_action();
    let composition = AppComposition::default();

    if let Err(err) = run(action, &composition).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(action: CliAction, composition: &AppComposition) -> Result<()> {
    match action {
        CliAction::InspectConfig => composition.inspect_config_usecase().execute(),
        CliAction::EnsurePr { yes } => composition.ensure_pr_usecase(yes).execute().await,
        CliAction::ShowDiff { pr } => composition.show_diff_usecase().execute(pr).await,
        CliAction::Comment {
            message,
            path,
            line,
            pr,
            yes,
        } => {
            let style = composition.comment_style()?;
            let draft = match (path, line) {
                (Some(path), Some(line)) => {
                    let path = to_posix_path(&path);
                    let body = render_inline(style, &path, line, &message);
                    CommentDraft::inline(path, line, body)
                }
                (Some(path), None) => {
                    let path = to_posix_path(&path);
                    CommentDraft {
                        body: render_general(style, &path, &message),
                        target_path: Some(path),
                        anchor_line: None,
                    }
                }
                (None, _) => CommentDraft::general(message),
            };
            composition
                .post_comments_usecase(yes)
                .execute(vec![draft], pr)
                .await?;
            Ok(())
        }
        CliAction::Review { file, pr, yes } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read review file at {}", file.display()))?;
            let entries = parse_review_entries(&text);
            if entries.is_empty() {
                anyhow::bail!("no review entries recognized in {}", file.display());
            }
            let drafts = entries_to_drafts(&entries, composition.comment_style()?);
            composition
                .post_comments_usecase(yes)
                .execute(drafts, pr)
                .await?;
            Ok(())
        }
        CliAction::Story { key } => composition.fetch_story_usecase().execute(&key).await,
        CliAction::Login => {
            let username = prompt("Bitbucket email/username: ")?;
            let secret = prompt("App password / token: ")?;
            if username.is_empty() || secret.is_empty() {
                anyhow::bail!("both username and secret are required");
            }
            composition.store_credential(&username, &secret)
        }
        CliAction::Logout => composition.clear_credential(),
    }
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{label}");
    io::stderr().flush().context("failed to flush prompt")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("failed to read input")?;
    Ok(input.trim().to_string())
}
