// Fixture I/O

pub mod error;
pub mod fixture;

pub use error::FixtureError;
pub use fixture::{decode_events, encode_events, FixtureStore};
