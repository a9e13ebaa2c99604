use std::collections::{BTreeMap, VecDeque};

use mbgolden_core::{Event, EventKey};

use crate::model::{MatchOutput, MatchedPair};

/// Match actual events against expected events as multisets.
///
/// Each actual event, in order, consumes the first still-unconsumed expected
/// event with the same [`EventKey`]. An expected event is consumed at most
/// once, so duplicates must appear the same number of times on both sides.
/// Expected positions are bucketed by key up front; popping the front of a
/// bucket is the same as scanning for the first remaining equal event.
pub fn match_events(actual: &[Event], expected: &[Event]) -> MatchOutput {
    let mut remaining: BTreeMap<EventKey, VecDeque<usize>> = BTreeMap::new();
    for (i, event) in expected.iter().enumerate() {
        remaining.entry(event.key()).or_default().push_back(i);
    }

    let mut consumed = vec![false; expected.len()];
    let mut matched = Vec::new();
    let mut unexpected = Vec::new();

    for (ai, event) in actual.iter().enumerate() {
        let slot = remaining
            .get_mut(&event.key())
            .and_then(|positions| positions.pop_front());

        match slot {
            Some(ei) => {
                consumed[ei] = true;
                matched.push(MatchedPair {
                    actual_index: ai,
                    expected_index: ei,
                });
            }
            None => unexpected.push(event.clone()),
        }
    }

    let missing: Vec<Event> = expected
        .iter()
        .zip(&consumed)
        .filter(|(_, used)| !**used)
        .map(|(event, _)| event.clone())
        .collect();

    log::debug!(
        "Matched {} of {} actual event(s); {} unexpected, {} missing",
        matched.len(),
        actual.len(),
        unexpected.len(),
        missing.len()
    );

    MatchOutput {
        matched,
        unexpected,
        missing,
    }
}
