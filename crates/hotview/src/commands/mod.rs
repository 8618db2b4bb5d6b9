//! Command implementations.
//!
//! hotview has a single command: serve the entry point until interrupted.

pub mod serve;

pub use serve::execute as serve_execute;
