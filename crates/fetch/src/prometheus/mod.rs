//! Prometheus module: scrapes the text exposition format.

pub mod collector;
pub mod parse;

pub const MODULE: &str = "prometheus";
