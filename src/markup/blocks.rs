//! Display blocks produced by the renderer, and their canonical text form.

use std::fmt::Write;

/// Heading depth. Only two levels exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
    /// `# `
    One,
    /// `## `
    Two,
}

impl HeadingLevel {
    /// Line prefix that introduces this level.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::One => "# ",
            Self::Two => "## ",
        }
    }
}

/// A typed fragment of text within a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineRun {
    /// Literal text.
    Plain(String),
    /// `**...**` with delimiters stripped.
    Bold(String),
    /// `*...*` with delimiters stripped.
    Italic(String),
    /// `$...$` with delimiters stripped.
    Math(String),
}

impl InlineRun {
    /// Text of the run without delimiters.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(s) | Self::Bold(s) | Self::Italic(s) | Self::Math(s) => s,
        }
    }

    /// Delimiter written on both sides of the run.
    #[must_use]
    pub const fn delimiter(&self) -> &'static str {
        match self {
            Self::Plain(_) => "",
            Self::Bold(_) => "**",
            Self::Italic(_) => "*",
            Self::Math(_) => "$",
        }
    }
}

/// One structural unit of a rendered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayBlock {
    /// Heading line.
    Heading {
        /// Level 1 or 2.
        level: HeadingLevel,
        /// Heading text with its marker removed.
        text: String,
    },
    /// Run of inline text.
    Paragraph(Vec<InlineRun>),
    /// `- ` or `• ` list line.
    BulletItem(Vec<InlineRun>),
    /// `N. ` list line; the number is kept as written.
    NumberedItem {
        /// Literal number from the marker.
        number: u64,
        /// Item text.
        runs: Vec<InlineRun>,
    },
}

/// Serialise blocks back to markup that renders to the same blocks.
#[must_use]
pub fn to_markup(blocks: &[DisplayBlock]) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        match block {
            DisplayBlock::Heading { level, text } => {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str(level.marker());
                out.push_str(text);
            }
            DisplayBlock::Paragraph(runs) => {
                if i > 0 {
                    out.push_str("\n\n");
                }
                write_runs(&mut out, runs);
            }
            // List markers only count after a newline, including the first one.
            DisplayBlock::BulletItem(runs) => {
                out.push_str("\n- ");
                write_runs(&mut out, runs);
            }
            DisplayBlock::NumberedItem { number, runs } => {
                let _ = write!(out, "\n{number}. ");
                write_runs(&mut out, runs);
            }
        }
    }
    out
}

fn write_runs(out: &mut String, runs: &[InlineRun]) {
    for run in runs {
        let delimiter = run.delimiter();
        out.push_str(delimiter);
        out.push_str(run.text());
        out.push_str(delimiter);
    }
}
