//! Interactive chat commands

use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tokio::io::{AsyncBufReadExt, BufReader};

use commons_core::chat::{
    ChatMessage, ChatView, MessageComposer, SendOutcome, list_conversations, resolve_other_party,
    send_message, start_or_find_conversation,
};
use commons_core::profile::Profile;

use crate::output;

/// Print the conversation directory
pub async fn list(db: &Surreal<Any>, me: &Profile) -> Result<()> {
    let summaries = list_conversations(db, me.id).await?;
    if summaries.is_empty() {
        println!("{}", "No conversations yet.".dimmed());
        println!(
            "Start one with: {}",
            "commons-cli chat open --with <email>".bright_cyan()
        );
        return Ok(());
    }
    output::print_summaries(&summaries);
    Ok(())
}

/// Start or reopen a conversation and chat until /quit
pub async fn open(db: &Surreal<Any>, me: Profile, with_email: &str) -> Result<()> {
    let conversation = start_or_find_conversation(db, me.id, with_email).await?;
    let other = resolve_other_party(db, conversation, me.id).await?;

    println!("{} {}", "Chatting with".bold(), other.bright_cyan());
    println!("{}", "Loading conversation...".dimmed());

    let mut view = ChatView::new(me.id);
    view.open(db, conversation).await?;

    if let Some(feed) = view.feed() {
        if feed.messages().is_empty() {
            println!("{}", "No messages yet. Say hello.".dimmed());
        }
        for message in feed.messages() {
            print_message(message, &me);
        }
    }
    if !view.has_live() {
        println!(
            "{}",
            "Live updates are unavailable; showing history only.".yellow()
        );
    }
    // Terminal output scrolls on its own; just drain the request
    let _ = view.take_scroll_request();

    println!(
        "{}",
        "Type a message and press enter. /quit leaves the chat.".dimmed()
    );

    let mut composer = MessageComposer::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            delivered = view.recv_live() => {
                match delivered {
                    Some(message) => {
                        if view.apply_live(message.clone()) {
                            print_message(&message, &me);
                        }
                        let _ = view.take_scroll_request();
                    }
                    None => {
                        println!("{}", "Live updates ended; showing history only.".yellow());
                    }
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.into_diagnostic()? else {
                    break;
                };
                if line.trim() == "/quit" {
                    break;
                }
                composer.set_draft(line);
                match composer.send(db, conversation, me.id).await {
                    Ok(SendOutcome::Sent(message)) => {
                        // Local echo; the live delivery of the same row is
                        // deduplicated by id
                        if view.apply_live(message.clone()) {
                            print_message(&message, &me);
                        }
                        let _ = view.take_scroll_request();
                    }
                    Ok(SendOutcome::Skipped) => {}
                    Err(e) => {
                        // Draft is preserved; the next line replaces it
                        println!("{} {}", "Send failed:".red(), e);
                    }
                }
            }
        }
    }

    view.close();
    println!("{}", "Left the conversation.".dimmed());
    Ok(())
}

/// One-shot send without staying in the conversation
pub async fn send_once(db: &Surreal<Any>, me: &Profile, to: &str, message: &str) -> Result<()> {
    let conversation = start_or_find_conversation(db, me.id, to).await?;
    let sent = send_message(db, conversation, me.id, message.trim()).await?;
    println!(
        "{} {} {}",
        "Sent to".bold(),
        to.bright_cyan(),
        format!("({})", sent.id).dimmed()
    );
    Ok(())
}

fn print_message(message: &ChatMessage, me: &Profile) {
    let label = message.author_label(me.id);
    let time = output::format_time(&message.created_at);
    if message.sender_id == me.id {
        println!("{} {} {}", time.dimmed(), format!("{}:", label).bright_green(), message.body);
    } else {
        println!("{} {} {}", time.dimmed(), format!("{}:", label).bright_cyan(), message.body);
    }
}
