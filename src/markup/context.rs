//! Formatting of retrieved-context passages.

use crate::session::RetrievedContext;

use super::blocks::InlineRun;
use super::render::split_math;

/// Format a relevance score as a percentage with one decimal.
///
/// Scores are not clamped: `1.37` gives `"137.0% match"`.
#[must_use]
pub fn format_relevance(score: f64) -> String {
    format!("{:.1}% match", score * 100.0)
}

/// Passage text split into plain and math runs.
#[must_use]
pub fn context_runs(context: &RetrievedContext) -> Vec<InlineRun> {
    split_math(&context.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_relevance() {
        assert_eq!(format_relevance(0.95), "95.0% match");
        assert_eq!(format_relevance(0.876), "87.6% match");
        assert_eq!(format_relevance(0.0), "0.0% match");
    }

    #[test]
    fn test_relevance_is_not_clamped() {
        assert_eq!(format_relevance(1.37), "137.0% match");
        assert_eq!(format_relevance(-0.25), "-25.0% match");
    }

    #[test]
    fn test_context_runs_only_split_math() {
        let context = RetrievedContext {
            id: "c1".to_string(),
            content: "Limit is $x \\leq 3$ per **year**".to_string(),
            relevance_score: 0.9,
            source: "Regulation 12".to_string(),
        };
        assert_eq!(
            context_runs(&context),
            vec![
                InlineRun::Plain("Limit is ".to_string()),
                InlineRun::Math("x \\leq 3".to_string()),
                InlineRun::Plain(" per **year**".to_string()),
            ]
        );
    }
}
