//! `mbgolden-core`: event model shared by every harness crate.
//!
//! An [`Event`] is one document emitted by a metric set during a single
//! collection cycle. Two events are considered the same document when their
//! three field groups encode to identical canonical strings; see
//! [`EventKey`].

pub mod canonical;
pub mod event;
pub mod fields;

pub use canonical::canonical_json;
pub use event::{Event, EventKey};
pub use fields::Fields;
