//! Terminal rendition of the chat: conversation list, transcript and
//! retrieved-context panel.
//!
//! Every function here is pure and returns text; the interactive loop decides
//! when to print it.

pub mod sidebar;
pub mod terminal;
pub mod transcript;

pub use sidebar::{date_group, preview, render_sidebar};
pub use terminal::Painter;
pub use transcript::{
    SAMPLE_QUESTIONS, TYPING_INDICATOR, render_blocks, render_contexts, render_message_view,
    render_transcript, welcome,
};
