//! ANSI styling through crossterm, switchable off for `NO_COLOR` and tests.

use crossterm::style::{Color, StyledContent, Stylize};

/// Applies terminal styles when colour is enabled, passes text through otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Painter {
    color: bool,
}

impl Painter {
    /// Create a painter.
    #[must_use]
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    /// A painter that never styles.
    #[must_use]
    pub const fn plain() -> Self {
        Self { color: false }
    }

    /// Whether styling is applied.
    #[must_use]
    pub const fn is_colored(self) -> bool {
        self.color
    }

    fn paint(self, text: &str, style: impl FnOnce(StyledContent<&str>) -> StyledContent<&str>) -> String {
        if self.color {
            style(text.stylize()).to_string()
        } else {
            text.to_string()
        }
    }

    /// Level 1 heading.
    #[must_use]
    pub fn title(self, text: &str) -> String {
        self.paint(text, |s| s.bold().underlined().with(Color::Cyan))
    }

    /// Level 2 heading.
    #[must_use]
    pub fn subtitle(self, text: &str) -> String {
        self.paint(text, |s| s.bold().with(Color::Cyan))
    }

    /// Strong emphasis.
    #[must_use]
    pub fn bold(self, text: &str) -> String {
        self.paint(text, |s| s.bold())
    }

    /// Emphasis.
    #[must_use]
    pub fn italic(self, text: &str) -> String {
        self.paint(text, |s| s.italic())
    }

    /// Inline math.
    #[must_use]
    pub fn math(self, text: &str) -> String {
        self.paint(text, |s| s.with(Color::Magenta))
    }

    /// De-emphasised metadata (timestamps, hints).
    #[must_use]
    pub fn dim(self, text: &str) -> String {
        self.paint(text, |s| s.dim())
    }

    /// Role labels and markers.
    #[must_use]
    pub fn accent(self, text: &str) -> String {
        self.paint(text, |s| s.bold().with(Color::Blue))
    }

    /// Failures.
    #[must_use]
    pub fn error(self, text: &str) -> String {
        self.paint(text, |s| s.with(Color::Red))
    }
}
