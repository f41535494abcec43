//! Shared test utilities for the HIRS CTP monthly workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Temporary directory helpers
//! - Context and version fixtures
//! - A recording in-memory product catalog
//! - Fake executables standing in for the averaging and repack tools
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, RecordingCatalog};
//! ```

pub mod catalog;
pub mod fixtures;
pub mod paths;
pub mod scripts;

// Re-export commonly used items at the crate root
pub use catalog::*;
pub use fixtures::*;
pub use paths::*;
pub use scripts::*;

/// Assert that an expression matches a pattern, printing the value otherwise.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_matches;
///
/// assert_matches!(job.build_task(&ctx).await, Err(JobError::NotReady(_)));
/// ```
#[macro_export]
macro_rules! assert_matches {
    ($value:expr, $pattern:pat $(if $guard:expr)? $(,)?) => {{
        match $value {
            $pattern $(if $guard)? => {}
            ref other => panic!(
                "assertion failed: `{:?}` does not match `{}`",
                other,
                stringify!($pattern $(if $guard)?)
            ),
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_matches_passes() {
        let value: Result<u32, String> = Ok(3);
        assert_matches!(value, Ok(3));
        assert_matches!(value, Ok(n) if n > 2);
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_assert_matches_fails() {
        let value: Result<u32, String> = Err("boom".to_string());
        assert_matches!(value, Ok(_));
    }
}
