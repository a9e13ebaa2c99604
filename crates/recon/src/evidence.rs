use crate::model::{MatchOutput, MatchSummary};

/// Compute summary counts from a match result.
pub fn compute_summary(output: &MatchOutput) -> MatchSummary {
    let matched = output.matched.len();
    MatchSummary {
        actual: matched + output.unexpected.len(),
        expected: matched + output.missing.len(),
        matched,
        unexpected: output.unexpected.len(),
        missing: output.missing.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MatchedPair;
    use mbgolden_core::Event;

    #[test]
    fn summary_counts() {
        let output = MatchOutput {
            matched: vec![
                MatchedPair { actual_index: 0, expected_index: 1 },
                MatchedPair { actual_index: 2, expected_index: 0 },
            ],
            unexpected: vec![Event::new()],
            missing: vec![Event::new(), Event::new(), Event::new()],
        };
        let summary = compute_summary(&output);
        assert_eq!(summary.actual, 3);
        assert_eq!(summary.expected, 5);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.unexpected, 1);
        assert_eq!(summary.missing, 3);
    }

    #[test]
    fn empty_output_is_clean() {
        let output = MatchOutput::default();
        assert!(output.is_clean());
        assert_eq!(compute_summary(&output), MatchSummary::default());
    }
}
