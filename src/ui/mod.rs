//! UI helpers for consistent CLI output
//!
//! Falls back to plain `[OK]`/`[WARN]` tags in CI and other
//! non-interactive environments.

mod context;
mod output;

pub use context::UiContext;
pub use output::{
    key_value, key_value_status, remark, step_error_detail, step_info, step_ok, step_ok_detail,
    step_warn, step_warn_hint,
};
