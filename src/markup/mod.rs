//! Message renderer.
//!
//! Turns assistant text into [`DisplayBlock`]s using a small markup grammar:
//! `# ` / `## ` headings at line start, `**bold**`, `*italic*`, `$math$`,
//! and list lines introduced by `\n- `, `\n• ` or `\nN. `. User text is shown
//! verbatim. Rendering is pure and never fails.

pub mod blocks;
pub mod context;
pub mod lexer;
pub mod render;

pub use blocks::{DisplayBlock, HeadingLevel, InlineRun, to_markup};
pub use context::{context_runs, format_relevance};
pub use render::{Rendered, render_markup, render_message, split_math};
