//! Multi-line input assembly.

/// Collects physical lines into one logical input. A line ending in `\`
/// continues on the next one.
#[derive(Debug, Default)]
pub struct InputBuffer {
    lines: Vec<String>,
}

impl InputBuffer {
    /// Whether a continued input is being collected.
    #[must_use]
    pub fn is_continuing(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Feed one line. Returns the complete input once a line does not end
    /// in `\`.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(head) = line.strip_suffix('\\') {
            self.lines.push(head.to_string());
            return None;
        }
        self.lines.push(line.to_string());
        let text = self.lines.join("\n");
        self.lines.clear();
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let mut buffer = InputBuffer::default();
        assert_eq!(buffer.push_line("hello\r\n"), Some("hello".to_string()));
        assert!(!buffer.is_continuing());
    }

    #[test]
    fn test_continuation() {
        let mut buffer = InputBuffer::default();
        assert_eq!(buffer.push_line("first\\"), None);
        assert!(buffer.is_continuing());
        assert_eq!(buffer.push_line("second\\"), None);
        assert_eq!(
            buffer.push_line("third"),
            Some("first\nsecond\nthird".to_string())
        );
        assert!(!buffer.is_continuing());
    }
}
