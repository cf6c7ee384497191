//! Shared types and helpers used across features.

pub mod constants;
#[cfg(test)]
pub mod test_helpers;
pub mod types;
