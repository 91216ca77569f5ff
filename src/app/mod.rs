//! Interactive terminal client.
//!
//! Reads lines from stdin, dispatches intents to the [`SessionStore`] and
//! prints what the display layer renders. Message sends run as background
//! tasks so the conversation list stays navigable while a reply is pending;
//! their outcomes come back over a channel and are reported when they land.

pub mod commands;
pub mod input;

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::display::{
    Painter, SAMPLE_QUESTIONS, TYPING_INDICATOR, render_contexts, render_message_view,
    render_sidebar, render_transcript,
};
use crate::error::{ChatError, ChatResult};
use crate::session::{HttpSessionApi, Intent, Message, Role, SessionStore};

use commands::{Command, HELP, parse};
use input::InputBuffer;

/// Result of a background send.
#[derive(Debug)]
pub struct SendOutcome {
    /// Conversation the message was addressed to.
    pub conversation_id: String,
    /// Appended messages, or the failure.
    pub result: ChatResult<Vec<Message>>,
}

/// Whether the loop should keep going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Leave the client.
    Quit,
}

/// Command handler state: the store, output sink and panel toggles.
pub struct App<W: Write> {
    store: SessionStore,
    painter: Painter,
    out: W,
    expanded: BTreeSet<usize>,
    done_tx: mpsc::UnboundedSender<SendOutcome>,
}

impl<W: Write> App<W> {
    /// Create the handler and the receiver for background send outcomes.
    pub fn new(
        store: SessionStore,
        painter: Painter,
        out: W,
    ) -> (Self, mpsc::UnboundedReceiver<SendOutcome>) {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        (
            Self {
                store,
                painter,
                out,
                expanded: BTreeSet::new(),
                done_tx,
            },
            done_rx,
        )
    }

    /// The output sink.
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Print the conversation list followed by the active transcript.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub async fn show_overview(&mut self) -> std::io::Result<()> {
        let snapshot = self.store.snapshot().await;
        write!(
            self.out,
            "{}\n{}",
            render_sidebar(&snapshot, Utc::now(), self.painter),
            render_transcript(&snapshot, self.painter)
        )?;
        self.out.flush()
    }

    /// Show a continuation marker while `buffer` holds an unfinished input.
    pub fn prompt_continuation(&mut self, buffer: &InputBuffer) -> std::io::Result<()> {
        if buffer.is_continuing() {
            write!(self.out, "{}", self.painter.dim("... "))?;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Parse and run one complete input.
    ///
    /// # Errors
    /// Returns an error only if writing output fails; store failures are
    /// reported to the user.
    pub async fn handle_input(&mut self, text: &str) -> std::io::Result<Flow> {
        match parse(text) {
            Ok(command) => self.handle(command).await,
            Err(e) => {
                writeln!(self.out, "{}", self.painter.error(&e.to_string()))?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Run a command.
    ///
    /// # Errors
    /// Returns an error only if writing output fails.
    pub async fn handle(&mut self, command: Command) -> std::io::Result<Flow> {
        debug!("Handling {:?}", command);
        match command {
            Command::Send(text) => self.send(text).await?,
            Command::Ask(n) => match n.checked_sub(1).and_then(|i| SAMPLE_QUESTIONS.get(i)) {
                Some(question) => {
                    writeln!(self.out, "{} {question}", self.painter.accent(Role::User.label()))?;
                    self.send((*question).to_string()).await?;
                }
                None => writeln!(
                    self.out,
                    "{}",
                    self.painter
                        .error(&format!("There are {} sample questions", SAMPLE_QUESTIONS.len()))
                )?,
            },
            Command::New => match self.store.create_conversation().await {
                Ok(_) => {
                    self.expanded.clear();
                    self.show_overview().await?;
                }
                Err(e) => self.report(&e)?,
            },
            Command::List => {
                let snapshot = self.store.snapshot().await;
                write!(self.out, "{}", render_sidebar(&snapshot, Utc::now(), self.painter))?;
            }
            Command::Switch(n) => match self.conversation_id(n).await {
                Some(id) => {
                    if let Err(e) = self.store.select_active(id).await {
                        self.report(&e)?;
                    } else {
                        self.expanded.clear();
                        let snapshot = self.store.snapshot().await;
                        write!(self.out, "{}", render_transcript(&snapshot, self.painter))?;
                    }
                }
                None => self.no_such_conversation(n)?,
            },
            Command::Delete(n) => match self.conversation_id(n).await {
                Some(id) => match self.store.delete_conversation(&id).await {
                    Ok(()) => {
                        self.expanded.clear();
                        self.show_overview().await?;
                    }
                    Err(e) => self.report(&e)?,
                },
                None => self.no_such_conversation(n)?,
            },
            Command::Context(toggle) => {
                if let Some(n) = toggle {
                    if !self.expanded.remove(&n) {
                        self.expanded.insert(n);
                    }
                }
                let snapshot = self.store.snapshot().await;
                write!(
                    self.out,
                    "{}",
                    render_contexts(snapshot.latest_contexts(), &self.expanded, self.painter)
                )?;
            }
            Command::Retry => self.retry().await?,
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    /// Report a finished background send.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub async fn on_send_complete(&mut self, outcome: SendOutcome) -> std::io::Result<()> {
        match outcome.result {
            Ok(messages) => {
                let snapshot = self.store.snapshot().await;
                if snapshot.active_id.as_deref() == Some(outcome.conversation_id.as_str()) {
                    self.expanded.clear();
                    for message in messages.iter().filter(|m| m.role == Role::Assistant) {
                        write!(self.out, "\n{}", render_message_view(message, self.painter))?;
                    }
                } else if let Some((i, conversation)) = snapshot
                    .conversations
                    .iter()
                    .enumerate()
                    .find(|(_, c)| c.id == outcome.conversation_id)
                {
                    writeln!(
                        self.out,
                        "{}",
                        self.painter.dim(&format!(
                            "Reply received in \"{}\" (/switch {})",
                            conversation.display_title(),
                            i + 1
                        ))
                    )?;
                }
            }
            Err(e) => self.report(&e)?,
        }
        self.out.flush()
    }

    async fn send(&mut self, text: String) -> std::io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if self.store.is_busy() {
            return self.report(&ChatError::SendInFlight);
        }
        let Some(conversation_id) = self.store.snapshot().await.active().map(|c| c.id.clone())
        else {
            return self.report(&ChatError::NoActiveConversation);
        };

        writeln!(self.out, "{}", self.painter.dim(TYPING_INDICATOR))?;
        self.spawn_send(conversation_id, text);
        Ok(())
    }

    fn spawn_send(&self, conversation_id: String, text: String) {
        let store = self.store.clone();
        let done_tx = self.done_tx.clone();
        tokio::spawn(async move {
            let result = store.send_to(&conversation_id, &text).await;
            let _ = done_tx.send(SendOutcome {
                conversation_id,
                result,
            });
        });
    }

    async fn retry(&mut self) -> std::io::Result<()> {
        let snapshot = self.store.snapshot().await;
        let Some(failure) = snapshot.last_failure else {
            return writeln!(self.out, "{}", self.painter.dim("Nothing to retry."));
        };

        // Sends go through the background path so the loop stays responsive.
        if let Intent::SendMessage {
            conversation_id,
            text,
        } = failure.intent
        {
            if self.store.is_busy() {
                return self.report(&ChatError::SendInFlight);
            }
            writeln!(self.out, "{}", self.painter.dim(TYPING_INDICATOR))?;
            self.spawn_send(conversation_id, text);
            return Ok(());
        }

        match self.store.retry_last_failure().await {
            Ok(_) => self.show_overview().await,
            Err(e) => self.report(&e),
        }
    }

    async fn conversation_id(&self, n: usize) -> Option<String> {
        let snapshot = self.store.snapshot().await;
        n.checked_sub(1)
            .and_then(|i| snapshot.conversations.get(i))
            .map(|c| c.id.clone())
    }

    fn no_such_conversation(&mut self, n: usize) -> std::io::Result<()> {
        writeln!(
            self.out,
            "{}",
            self.painter
                .error(&format!("No conversation {n}. Use /list to see them."))
        )
    }

    fn report(&mut self, err: &ChatError) -> std::io::Result<()> {
        writeln!(self.out, "{}", self.painter.error(&err.to_string()))?;
        match err {
            ChatError::NoActiveConversation => {
                writeln!(self.out, "{}", self.painter.dim("Use /new to start a conversation."))
            }
            ChatError::SendInFlight => writeln!(
                self.out,
                "{}",
                self.painter.dim("Wait for the current response to finish.")
            ),
            _ if err.is_retryable() => {
                writeln!(self.out, "{}", self.painter.dim("Use /retry to try again."))
            }
            _ => Ok(()),
        }
    }
}

/// Run the interactive client until `/quit` or end of input.
///
/// # Errors
/// Returns an error if the client cannot be built or the terminal fails.
pub async fn run(config: ClientConfig) -> anyhow::Result<()> {
    let api = HttpSessionApi::new(&config)?;
    info!("Session API: {}", api.base_url());

    let store = SessionStore::new(Arc::new(api));
    let (mut app, mut done_rx) = App::new(
        store.clone(),
        Painter::new(config.color),
        std::io::stdout(),
    );

    if let Err(e) = store.init().await {
        app.report(&e)?;
    }
    app.show_overview().await?;
    writeln!(app.out, "{}", app.painter.dim("Type /help for commands."))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut buffer = InputBuffer::default();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let Some(text) = buffer.push_line(&line) else {
                    app.prompt_continuation(&buffer)?;
                    continue;
                };
                if app.handle_input(&text).await? == Flow::Quit {
                    break;
                }
            }
            Some(outcome) = done_rx.recv() => app.on_send_complete(outcome).await?,
        }
    }

    store.dispose().await;
    Ok(())
}
