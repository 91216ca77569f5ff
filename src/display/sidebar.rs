//! Conversation list, grouped by creation date.

use chrono::{DateTime, Local, Utc};

use crate::session::{Conversation, SessionSnapshot};

use super::terminal::Painter;

const PREVIEW_CHARS: usize = 30;

/// Group label for a conversation created at `created`, seen at `now`.
#[must_use]
pub fn date_group(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match (now - created).num_days() {
        i64::MIN..=0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        days @ 2..=6 => format!("{days} days ago"),
        _ => created.with_timezone(&Local).format("%Y-%m-%d").to_string(),
    }
}

/// One-line preview of the latest message.
#[must_use]
pub fn preview(conversation: &Conversation) -> String {
    conversation.latest_message().map_or_else(
        || "No messages yet".to_string(),
        |message| {
            let head: String = message.content.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head.replace(['\n', '\r'], " "))
        },
    )
}

/// Render the list. Entries are numbered from 1 in store order; groups keep
/// the order in which they first appear.
#[must_use]
pub fn render_sidebar(snapshot: &SessionSnapshot, now: DateTime<Utc>, painter: Painter) -> String {
    if snapshot.conversations.is_empty() {
        return format!(
            "{}\n{}\n",
            painter.bold("No conversations yet"),
            painter.dim("Start a new chat to begin")
        );
    }

    let mut groups: Vec<(String, Vec<(usize, &Conversation)>)> = Vec::new();
    for (i, conversation) in snapshot.conversations.iter().enumerate() {
        let label = date_group(conversation.created_at, now);
        match groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, entries)) => entries.push((i + 1, conversation)),
            None => groups.push((label, vec![(i + 1, conversation)])),
        }
    }

    let active = snapshot.active_id.as_deref();
    let mut out = String::new();
    for (label, entries) in groups {
        out.push_str(&painter.dim(&label));
        out.push('\n');
        for (number, conversation) in entries {
            let marker = if active == Some(conversation.id.as_str()) {
                painter.accent(">")
            } else {
                " ".to_string()
            };
            out.push_str(&format!(
                "{marker} {number:>2}. {}\n      {}\n",
                painter.bold(conversation.display_title()),
                painter.dim(&preview(conversation)),
            ));
        }
    }
    out
}
