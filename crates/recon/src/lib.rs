//! `mbgolden-recon`: reconciles the events a metric set produced against
//! the events a fixture expects.
//!
//! Pure engine crate: receives two event lists, returns the unmatched
//! leftovers on each side. No IO.

pub mod evidence;
pub mod matcher;
pub mod model;

pub use evidence::compute_summary;
pub use matcher::match_events;
pub use model::{MatchOutput, MatchSummary, MatchedPair};
