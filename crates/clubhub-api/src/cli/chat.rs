//! Interactive terminal chat.
//!
//! Reads lines from stdin and sends each one through the orchestrator
//! in-process, printing the agent's reply. `/new` starts a fresh session,
//! `/quit` (or EOF) leaves.

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use clubhub_core::orchestrator::ChatReply;

use crate::state::AppState;

/// What the REPL should do with one input line.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Message(&'a str),
    NewSession,
    Quit,
    Skip,
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Skip,
        "/quit" | "/exit" => Input::Quit,
        "/new" => Input::NewSession,
        text => Input::Message(text),
    }
}

pub async fn run_chat(
    state: &AppState,
    user_id: &str,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let mut session_id = match session {
        Some(raw) => Some(
            raw.parse::<Uuid>()
                .map_err(|_| anyhow::anyhow!("Invalid session ID: {raw}"))?,
        ),
        None => None,
    };

    if !json {
        println!();
        println!(
            "  {} ClubHub assistant. Type {} for a new session, {} to leave.",
            style("*").cyan().bold(),
            style("/new").yellow(),
            style("/quit").yellow()
        );
        println!();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        if !json {
            stdout.write_all(b"you> ").await?;
            stdout.flush().await?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match classify(&line) {
            Input::Skip => continue,
            Input::Quit => break,
            Input::NewSession => {
                session_id = None;
                if !json {
                    println!("  {}", style("Started a new session.").dim());
                }
            }
            Input::Message(text) => {
                let reply = state
                    .orchestrator
                    .handle_message(session_id, text, user_id)
                    .await;
                session_id = Some(reply.session_id);
                print_reply(&reply, json)?;
            }
        }
    }

    if let (Some(id), false) = (session_id, json) {
        println!();
        println!(
            "  Session saved. Resume with: {}",
            style(format!("clubhub chat --user {user_id} --session {id}")).yellow()
        );
    }

    Ok(())
}

fn print_reply(reply: &ChatReply, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(reply)?);
        return Ok(());
    }

    let agent = reply.assigned_agent.as_deref().unwrap_or("assistant");
    println!("{}> {}", style(agent).cyan().bold(), reply.response_text);
    println!(
        "  {}",
        style(format!("{} tokens", reply.tokens_used)).dim()
    );
    Ok(())
}
