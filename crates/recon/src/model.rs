use serde::Serialize;

use mbgolden_core::Event;

// ---------------------------------------------------------------------------
// Pair matching
// ---------------------------------------------------------------------------

/// Positions of one actual event and the expected event it consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchedPair {
    pub actual_index: usize,
    pub expected_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MatchOutput {
    pub matched: Vec<MatchedPair>,
    /// Actual events with no expected counterpart, in actual order.
    pub unexpected: Vec<Event>,
    /// Expected events nothing consumed, in expected order.
    pub missing: Vec<Event>,
}

impl MatchOutput {
    pub fn is_clean(&self) -> bool {
        self.unexpected.is_empty() && self.missing.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MatchSummary {
    pub actual: usize,
    pub expected: usize,
    pub matched: usize,
    pub unexpected: usize,
    pub missing: usize,
}
