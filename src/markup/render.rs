//! Message rendering: block segmentation followed by inline grouping.

use crate::session::{Message, Role};

use super::blocks::{DisplayBlock, HeadingLevel, InlineRun};
use super::lexer::{Grammar, Lexer, Token};

/// A message prepared for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rendered {
    /// Shown exactly as typed.
    Verbatim(String),
    /// Structured assistant output.
    Blocks(Vec<DisplayBlock>),
}

/// Render one message. User messages are never interpreted.
#[must_use]
pub fn render_message(message: &Message) -> Rendered {
    match message.role {
        Role::User => Rendered::Verbatim(message.content.clone()),
        Role::Assistant => Rendered::Blocks(render_markup(&message.content)),
    }
}

/// Render markup text into display blocks.
///
/// Pure and total: any input produces a block sequence.
#[must_use]
pub fn render_markup(text: &str) -> Vec<DisplayBlock> {
    let mut blocks = Vec::new();
    for segment in segments(text) {
        match segment {
            Segment::Plain(body) => push_body(body, &mut blocks),
            Segment::Heading { level, title, body } => {
                blocks.push(DisplayBlock::Heading {
                    level,
                    text: title.trim().to_string(),
                });
                push_body(body, &mut blocks);
            }
        }
    }
    blocks
}

/// Split `content` into plain and math runs only. Nothing is trimmed.
#[must_use]
pub fn split_math(content: &str) -> Vec<InlineRun> {
    Lexer::new(content, Grammar::MATH_ONLY)
        .filter_map(|token| match token {
            Token::Math(s) => Some(InlineRun::Math(s.to_string())),
            Token::Text(s) => Some(InlineRun::Plain(s.to_string())),
            _ => None,
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Plain(&'a str),
    Heading {
        level: HeadingLevel,
        title: &'a str,
        /// Starts with the newline that ended the heading line, if any.
        body: &'a str,
    },
}

fn heading_level(line: &str) -> Option<HeadingLevel> {
    if line.starts_with(HeadingLevel::Two.marker()) {
        Some(HeadingLevel::Two)
    } else if line.starts_with(HeadingLevel::One.marker()) {
        Some(HeadingLevel::One)
    } else {
        None
    }
}

/// Cut `text` before every line that starts with a heading marker.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let line_starts = std::iter::once(0).chain(
        text.match_indices('\n')
            .map(|(i, _)| i + 1)
            .filter(|&i| i < text.len()),
    );
    let cuts: Vec<(usize, HeadingLevel)> = line_starts
        .filter_map(|start| heading_level(&text[start..]).map(|level| (start, level)))
        .collect();

    let mut segments = Vec::with_capacity(cuts.len() + 1);
    let leading_end = cuts.first().map_or(text.len(), |&(start, _)| start);
    if leading_end > 0 {
        segments.push(Segment::Plain(&text[..leading_end]));
    }

    for (i, &(start, level)) in cuts.iter().enumerate() {
        let end = cuts.get(i + 1).map_or(text.len(), |&(next, _)| next);
        let segment = &text[start + level.marker().len()..end];
        let (title, body) = segment
            .find('\n')
            .map_or((segment, ""), |nl| (&segment[..nl], &segment[nl..]));
        segments.push(Segment::Heading { level, title, body });
    }
    segments
}

/// Lex a block body and append its paragraphs and list items.
fn push_body(body: &str, blocks: &mut Vec<DisplayBlock>) {
    let mut paragraph: Vec<InlineRun> = Vec::new();

    for token in Lexer::new(body, Grammar::BODY) {
        match token {
            Token::Text(text) => {
                let mut pieces = text.split("\n\n");
                if let Some(first) = pieces.next() {
                    push_plain(&mut paragraph, first);
                }
                for piece in pieces {
                    flush_paragraph(&mut paragraph, blocks);
                    push_plain(&mut paragraph, piece);
                }
            }
            Token::Bold(s) => paragraph.push(InlineRun::Bold(s.to_string())),
            Token::Italic(s) => paragraph.push(InlineRun::Italic(s.to_string())),
            Token::Math(s) => paragraph.push(InlineRun::Math(s.to_string())),
            Token::Bullet(item) => {
                flush_paragraph(&mut paragraph, blocks);
                blocks.push(DisplayBlock::BulletItem(item_runs(item)));
            }
            Token::Numbered(number, item) => {
                flush_paragraph(&mut paragraph, blocks);
                blocks.push(DisplayBlock::NumberedItem {
                    number,
                    runs: item_runs(item),
                });
            }
        }
    }
    flush_paragraph(&mut paragraph, blocks);
}

fn push_plain(runs: &mut Vec<InlineRun>, text: &str) {
    if !text.is_empty() {
        runs.push(InlineRun::Plain(text.to_string()));
    }
}

fn item_runs(item: &str) -> Vec<InlineRun> {
    let mut runs = Lexer::new(item, Grammar::ITEM)
        .filter_map(|token| match token {
            Token::Text(s) => Some(InlineRun::Plain(s.to_string())),
            Token::Bold(s) => Some(InlineRun::Bold(s.to_string())),
            Token::Italic(s) => Some(InlineRun::Italic(s.to_string())),
            Token::Math(s) => Some(InlineRun::Math(s.to_string())),
            Token::Bullet(_) | Token::Numbered(..) => None,
        })
        .collect();
    trim_runs(&mut runs);
    runs
}

fn flush_paragraph(paragraph: &mut Vec<InlineRun>, blocks: &mut Vec<DisplayBlock>) {
    let mut runs = std::mem::take(paragraph);
    trim_runs(&mut runs);
    if !runs.is_empty() {
        blocks.push(DisplayBlock::Paragraph(runs));
    }
}

/// Trim outer whitespace of the edge plain runs and drop plain runs left empty.
fn trim_runs(runs: &mut Vec<InlineRun>) {
    if let Some(InlineRun::Plain(first)) = runs.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(InlineRun::Plain(last)) = runs.last_mut() {
        *last = last.trim_end().to_string();
    }
    runs.retain(|run| !matches!(run, InlineRun::Plain(s) if s.is_empty()));
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::markup::blocks::to_markup;

    fn plain(s: &str) -> InlineRun {
        InlineRun::Plain(s.to_string())
    }

    fn paragraph(s: &str) -> DisplayBlock {
        DisplayBlock::Paragraph(vec![plain(s)])
    }

    #[test]
    fn test_plain_text_is_one_paragraph() {
        for text in ["Just a sentence.", "  padded  ", "line one\nline two"] {
            assert_eq!(render_markup(text), vec![paragraph(text.trim())]);
        }
        assert!(render_markup("   \n\t").is_empty());
        assert!(render_markup("").is_empty());
    }

    #[test]
    fn test_heading_with_body() {
        assert_eq!(
            render_markup("# Title\nBody text"),
            vec![
                DisplayBlock::Heading {
                    level: HeadingLevel::One,
                    text: "Title".to_string(),
                },
                paragraph("Body text"),
            ]
        );
    }

    #[test]
    fn test_inline_runs() {
        assert_eq!(
            render_markup("**bold** and *italic* and $x^2$"),
            vec![DisplayBlock::Paragraph(vec![
                InlineRun::Bold("bold".to_string()),
                plain(" and "),
                InlineRun::Italic("italic".to_string()),
                plain(" and "),
                InlineRun::Math("x^2".to_string()),
            ])]
        );
    }

    #[test]
    fn test_bullets_follow_intro() {
        assert_eq!(
            render_markup("Intro\n- First\n- Second"),
            vec![
                paragraph("Intro"),
                DisplayBlock::BulletItem(vec![plain("First")]),
                DisplayBlock::BulletItem(vec![plain("Second")]),
            ]
        );
    }

    #[test]
    fn test_numbered_keeps_literal_number() {
        assert_eq!(
            render_markup("Step\n3. Third step"),
            vec![
                paragraph("Step"),
                DisplayBlock::NumberedItem {
                    number: 3,
                    runs: vec![plain("Third step")],
                },
            ]
        );
    }

    #[test]
    fn test_leading_bullet_is_plain() {
        assert_eq!(render_markup("- not a bullet"), vec![paragraph("- not a bullet")]);
    }

    #[test]
    fn test_double_newline_splits_paragraphs() {
        assert_eq!(
            render_markup("One.\n\nTwo.\n\n\n\nThree."),
            vec![paragraph("One."), paragraph("Two."), paragraph("Three.")]
        );
    }

    #[test]
    fn test_paragraph_spans_emphasis_across_lines() {
        assert_eq!(
            render_markup("See *a*\nthen **b**."),
            vec![DisplayBlock::Paragraph(vec![
                plain("See "),
                InlineRun::Italic("a".to_string()),
                plain("\nthen "),
                InlineRun::Bold("b".to_string()),
                plain("."),
            ])]
        );
    }

    #[test]
    fn test_list_items_are_inline_parsed() {
        assert_eq!(
            render_markup("Rules:\n- **Hair**: above the collar\n2. Wear $n=1$ badge "),
            vec![
                paragraph("Rules:"),
                DisplayBlock::BulletItem(vec![
                    InlineRun::Bold("Hair".to_string()),
                    plain(": above the collar"),
                ]),
                DisplayBlock::NumberedItem {
                    number: 2,
                    runs: vec![
                        plain("Wear "),
                        InlineRun::Math("n=1".to_string()),
                        plain(" badge"),
                    ],
                },
            ]
        );
    }

    #[test]
    fn test_headings_only_at_line_start() {
        let blocks = render_markup("Intro # not\n## Sub\nText\n### deep");
        assert_eq!(
            blocks,
            vec![
                paragraph("Intro # not"),
                DisplayBlock::Heading {
                    level: HeadingLevel::Two,
                    text: "Sub".to_string(),
                },
                paragraph("Text\n### deep"),
            ]
        );
    }

    #[test]
    fn test_bullet_directly_under_heading() {
        assert_eq!(
            render_markup("## Leave\n- Annual\n- Sick"),
            vec![
                DisplayBlock::Heading {
                    level: HeadingLevel::Two,
                    text: "Leave".to_string(),
                },
                DisplayBlock::BulletItem(vec![plain("Annual")]),
                DisplayBlock::BulletItem(vec![plain("Sick")]),
            ]
        );
    }

    #[test]
    fn test_empty_heading_body() {
        assert_eq!(
            render_markup("# A\n# B"),
            vec![
                DisplayBlock::Heading {
                    level: HeadingLevel::One,
                    text: "A".to_string(),
                },
                DisplayBlock::Heading {
                    level: HeadingLevel::One,
                    text: "B".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_unmatched_delimiters_never_fail() {
        for text in ["*", "**", "$", "a * b", "**open", "\n", "\n-", "\n1.", "#", "# "] {
            let blocks = render_markup(text);
            assert!(blocks.len() <= 1, "{text:?} -> {blocks:?}");
        }
        assert_eq!(render_markup("total *"), vec![paragraph("total *")]);
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let inputs = [
            "# Uniform Requirements\nAll personnel must wear **approved** attire.\n\n## Hair\n- Neat\n- *Above* the collar\n1. Inspect\n4. Report $n \\geq 2$ issues",
            "Intro paragraph.\n\nSecond paragraph with $x^2$.",
            "Plain only",
        ];
        for input in inputs {
            let first = render_markup(input);
            assert_eq!(first, render_markup(input));
            let again = render_markup(&to_markup(&first));
            assert_eq!(first, again, "markup: {:?}", to_markup(&first));
        }
    }

    #[test]
    fn test_user_messages_are_verbatim() {
        let message = Message {
            id: "m1".to_string(),
            role: Role::User,
            content: "**not bold**\n- nor a list".to_string(),
            timestamp: Utc::now(),
            contexts: Vec::new(),
        };
        assert_eq!(
            render_message(&message),
            Rendered::Verbatim("**not bold**\n- nor a list".to_string())
        );

        let reply = Message {
            role: Role::Assistant,
            ..message
        };
        assert!(matches!(render_message(&reply), Rendered::Blocks(_)));
    }

    #[test]
    fn test_split_math_keeps_whitespace() {
        assert_eq!(
            split_math(" a **b** $c$ "),
            vec![
                plain(" a **b** "),
                InlineRun::Math("c".to_string()),
                plain(" "),
            ]
        );
    }
}
