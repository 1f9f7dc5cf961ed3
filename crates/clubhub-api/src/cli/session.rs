//! Session management CLI commands: history and delete.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use clubhub_types::chat::MessageRole;

use crate::state::AppState;

fn parse_session_id(raw: &str) -> Result<Uuid> {
    raw.trim()
        .parse::<Uuid>()
        .with_context(|| format!("Invalid session ID: {raw}"))
}

/// Print the latest `limit` messages of a session as a table.
///
/// # Examples
///
/// ```bash
/// clubhub session history 0190b4c2-...
/// clubhub session history 0190b4c2-... --limit 10 --json
/// ```
pub async fn history(state: &AppState, id: &str, limit: u32, json: bool) -> Result<()> {
    let session_id = parse_session_id(id)?;
    let store = state.orchestrator.store();
    let session = store
        .get(&session_id)
        .await?
        .with_context(|| format!("Session '{session_id}' not found"))?;
    let messages = store.history(&session_id, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Time").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("Tokens").fg(Color::White),
        Cell::new("Content").fg(Color::White),
    ]);

    for message in &messages {
        let role_cell = match message.role {
            MessageRole::User => Cell::new("user").fg(Color::Green),
            MessageRole::Assistant => Cell::new("assistant").fg(Color::Cyan),
            other => Cell::new(other.to_string()).fg(Color::DarkGrey),
        };

        table.add_row(vec![
            Cell::new(message.created_at.format("%Y-%m-%d %H:%M:%S").to_string())
                .fg(Color::DarkGrey),
            role_cell,
            Cell::new(message.token_cost.to_string()).fg(Color::White),
            Cell::new(preview(&message.content, 80)),
        ]);
    }

    println!();
    println!(
        "  Session {} (user '{}', agent: {})",
        style(session.id).cyan().bold(),
        session.user_id,
        session.agent.name().unwrap_or("none")
    );
    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Delete a session after confirmation.
pub async fn delete(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let session_id = parse_session_id(id)?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete session '{}' and all its messages?",
                style(session_id).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let deleted = state.orchestrator.delete_session(&session_id).await?;
    if !deleted {
        anyhow::bail!("Session '{session_id}' not found");
    }

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "session_id": session_id.to_string()})
        );
    } else {
        println!(
            "  {} Session '{}' deleted.",
            style("x").red().bold(),
            session_id
        );
    }

    Ok(())
}

// --- Formatting helpers ---

/// First `max` characters on one line, with an ellipsis when cut.
fn preview(content: &str, max: usize) -> String {
    let flat = content.replace('\n', " ");
    if flat.chars().count() > max {
        let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 80), "short");
        assert_eq!(preview("line one\nline two", 80), "line one line two");
        let long = "клуб".repeat(30);
        let cut = preview(&long, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn bad_session_id_is_rejected() {
        assert!(parse_session_id("not-a-uuid").is_err());
        assert!(parse_session_id(" 0190b4c2-0000-7000-8000-000000000000 ").is_ok());
    }
}
