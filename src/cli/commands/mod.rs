//! CLI command implementations

pub mod artifact;
pub mod completions;
pub mod config;
pub mod list;
pub mod lookup;
pub mod resolve;

pub use artifact::execute as artifact;
pub use completions::execute as completions;
pub use config::execute as config;
pub use list::execute as list;
pub use lookup::execute as lookup;
pub use resolve::execute as resolve;
