//! Transcript of the active conversation and its retrieved-context panel.

use std::collections::BTreeSet;
use std::fmt::Write;

use chrono::Local;

use crate::markup::{
    DisplayBlock, HeadingLevel, InlineRun, Rendered, context_runs, format_relevance,
    render_message,
};
use crate::session::{Message, RetrievedContext, SessionSnapshot};

use super::terminal::Painter;

/// Shown while a send is outstanding.
pub const TYPING_INDICATOR: &str = "Generating response...";

/// Starter questions offered for an empty conversation.
pub const SAMPLE_QUESTIONS: [&str; 4] = [
    "What are the uniform requirements?",
    "Explain the chain of command",
    "What are the leave policies?",
    "Describe conduct expectations",
];

const INDENT: &str = "  ";

/// Inline runs with their styles applied.
#[must_use]
pub fn render_runs(runs: &[InlineRun], painter: Painter) -> String {
    runs.iter()
        .map(|run| match run {
            InlineRun::Plain(s) => s.clone(),
            InlineRun::Bold(s) => painter.bold(s),
            InlineRun::Italic(s) => painter.italic(s),
            InlineRun::Math(s) => painter.math(s),
        })
        .collect()
}

/// Display blocks as terminal lines, one blank line between paragraphs.
#[must_use]
pub fn render_blocks(blocks: &[DisplayBlock], painter: Painter) -> String {
    let mut out = String::new();
    let mut previous_was_item = false;

    for block in blocks {
        let is_item = matches!(
            block,
            DisplayBlock::BulletItem(_) | DisplayBlock::NumberedItem { .. }
        );
        if !out.is_empty() && !(is_item && previous_was_item) {
            out.push('\n');
        }

        match block {
            DisplayBlock::Heading {
                level: HeadingLevel::One,
                text,
            } => out.push_str(&painter.title(text)),
            DisplayBlock::Heading {
                level: HeadingLevel::Two,
                text,
            } => out.push_str(&painter.subtitle(text)),
            DisplayBlock::Paragraph(runs) => out.push_str(&render_runs(runs, painter)),
            DisplayBlock::BulletItem(runs) => {
                let _ = write!(out, "{INDENT}\u{2022} {}", render_runs(runs, painter));
            }
            DisplayBlock::NumberedItem { number, runs } => {
                let _ = write!(out, "{INDENT}{number}. {}", render_runs(runs, painter));
            }
        }
        out.push('\n');
        previous_was_item = is_item;
    }
    out
}

/// One message: a role and time header line, then its body.
#[must_use]
pub fn render_message_view(message: &Message, painter: Painter) -> String {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    let mut out = format!(
        "{} {}\n",
        painter.accent(message.role.label()),
        painter.dim(&time.to_string())
    );
    match render_message(message) {
        Rendered::Verbatim(text) => {
            out.push_str(&text);
            out.push('\n');
        }
        Rendered::Blocks(blocks) => out.push_str(&render_blocks(&blocks, painter)),
    }
    if !message.contexts.is_empty() {
        let count = message.contexts.len();
        let noun = if count == 1 { "source" } else { "sources" };
        out.push_str(&painter.dim(&format!("[{count} {noun}; /context to view]")));
        out.push('\n');
    }
    out
}

/// Greeting for a conversation without messages.
#[must_use]
pub fn welcome(painter: Painter) -> String {
    let mut out = format!(
        "{}\n{}\n\n",
        painter.title("Regulations Assistant"),
        "Ask a question about the regulations. Try one of these:"
    );
    for (i, question) in SAMPLE_QUESTIONS.iter().enumerate() {
        let _ = writeln!(out, "{INDENT}/ask {}  {question}", i + 1);
    }
    out
}

/// Transcript of the active conversation, or a hint when none is active.
#[must_use]
pub fn render_transcript(snapshot: &SessionSnapshot, painter: Painter) -> String {
    let Some(conversation) = snapshot.active() else {
        return format!(
            "{}\n",
            painter.dim("No conversation selected. Use /new to start one.")
        );
    };

    let mut out = format!("{}\n\n", painter.bold(conversation.display_title()));
    if conversation.messages.is_empty() {
        out.push_str(&welcome(painter));
    } else {
        let views: Vec<String> = conversation
            .messages
            .iter()
            .map(|m| render_message_view(m, painter))
            .collect();
        out.push_str(&views.join("\n"));
    }
    if snapshot.busy {
        out.push('\n');
        out.push_str(&painter.dim(TYPING_INDICATOR));
        out.push('\n');
    }
    out
}

/// The retrieved-context panel. Entries listed in `expanded` (1-based) show
/// their passage text.
#[must_use]
pub fn render_contexts(
    contexts: &[RetrievedContext],
    expanded: &BTreeSet<usize>,
    painter: Painter,
) -> String {
    if contexts.is_empty() {
        return format!(
            "{}\n",
            painter.dim("No retrieved context for the latest message.")
        );
    }

    let mut out = format!("{}\n", painter.subtitle("Retrieved Context"));
    for (i, context) in contexts.iter().enumerate() {
        let number = i + 1;
        let open = expanded.contains(&number);
        let _ = writeln!(
            out,
            "{} [{number}] {} {}",
            if open { "v" } else { ">" },
            painter.bold(&context.source),
            painter.dim(&format_relevance(context.relevance_score)),
        );
        if open {
            let _ = writeln!(out, "{INDENT}{INDENT}{}", render_runs(&context_runs(context), painter));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::session::{Conversation, Role};

    fn message(role: Role, content: &str) -> Message {
        Message {
            id: "m".to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            contexts: Vec::new(),
        }
    }

    fn context(source: &str, score: f64, content: &str) -> RetrievedContext {
        RetrievedContext {
            id: source.to_string(),
            content: content.to_string(),
            relevance_score: score,
            source: source.to_string(),
        }
    }

    fn snapshot_with(messages: Vec<Message>, busy: bool) -> SessionSnapshot {
        let now = Utc::now();
        SessionSnapshot {
            conversations: vec![Conversation {
                id: "c".to_string(),
                title: "Leave".to_string(),
                messages,
                created_at: now,
                updated_at: now,
            }],
            active_id: Some("c".to_string()),
            busy,
            ..SessionSnapshot::default()
        }
    }

    #[test]
    fn test_blocks_layout() {
        let blocks = crate::markup::render_markup("# Leave\nIntro\n- a\n- b\n\nAfter");
        assert_eq!(
            render_blocks(&blocks, Painter::plain()),
            "Leave\n\nIntro\n\n  \u{2022} a\n  \u{2022} b\n\nAfter\n"
        );
    }

    #[test]
    fn test_numbered_items_keep_number() {
        let blocks = crate::markup::render_markup("Steps\n3. Third");
        assert!(render_blocks(&blocks, Painter::plain()).contains("  3. Third"));
    }

    #[test]
    fn test_user_message_shown_verbatim() {
        let view = render_message_view(&message(Role::User, "**raw**"), Painter::plain());
        assert!(view.starts_with("You "));
        assert!(view.contains("**raw**"));
    }

    #[test]
    fn test_assistant_markup_is_stripped() {
        let mut reply = message(Role::Assistant, "**Answer** with $x$");
        reply.contexts.push(context("Chapter 33", 0.9, "text"));
        let view = render_message_view(&reply, Painter::plain());
        assert!(view.starts_with("Assistant "));
        assert!(view.contains("Answer with x"));
        assert!(view.contains("[1 source; /context to view]"));
    }

    #[test]
    fn test_empty_conversation_shows_welcome() {
        let out = render_transcript(&snapshot_with(Vec::new(), false), Painter::plain());
        for question in SAMPLE_QUESTIONS {
            assert!(out.contains(question));
        }
        assert!(out.contains("/ask 4"));
    }

    #[test]
    fn test_busy_shows_indicator() {
        let messages = vec![message(Role::User, "hi")];
        let idle = render_transcript(&snapshot_with(messages.clone(), false), Painter::plain());
        assert!(!idle.contains(TYPING_INDICATOR));
        let busy = render_transcript(&snapshot_with(messages, true), Painter::plain());
        assert!(busy.trim_end().ends_with(TYPING_INDICATOR));
    }

    #[test]
    fn test_no_active_conversation() {
        let out = render_transcript(&SessionSnapshot::default(), Painter::plain());
        assert!(out.contains("No conversation selected"));
    }

    #[test]
    fn test_context_panel_expands_entries() {
        let contexts = vec![
            context("Chapter 22", 0.95, "Section 2201: clean uniforms"),
            context("Chapter 10", 1.37, "Rule $a+b$ applies"),
        ];
        let collapsed = render_contexts(&contexts, &BTreeSet::new(), Painter::plain());
        assert!(collapsed.contains("> [1] Chapter 22 95.0% match"));
        assert!(collapsed.contains("> [2] Chapter 10 137.0% match"));
        assert!(!collapsed.contains("Section 2201"));

        let expanded = render_contexts(&contexts, &BTreeSet::from([2]), Painter::plain());
        assert!(expanded.contains("v [2] Chapter 10"));
        assert!(expanded.contains("    Rule a+b applies"));
        assert!(!expanded.contains("Section 2201"));
    }

    #[test]
    fn test_empty_context_panel() {
        let out = render_contexts(&[], &BTreeSet::new(), Painter::plain());
        assert!(out.contains("No retrieved context"));
    }
}
