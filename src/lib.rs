//! relcache - commit-keyed release notes cache
//!
//! Fetches an externally hosted release notes document at most once per
//! commit, stores it content-addressed and replays the recorded outcome on
//! every later build of the same commit.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod resolver;
pub mod retry;
pub mod ui;

pub use error::{RelcacheError, RelcacheResult};
