//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete.

/// Autocomplete handlers for student codes, rule names, class names and subject codes
pub mod autocomplete;
