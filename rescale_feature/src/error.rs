// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for rescale construction and property setters.

/// Message used when a factor is not a finite number.
pub(crate) const FACTOR_NOT_NUMERIC: &str = "factor must be a finite number";

/// Message used when an anchor is not a pair of finite numbers.
pub(crate) const ANCHOR_NOT_PAIR: &str = "anchor must be an array of two finite numbers";

/// Errors raised synchronously by constructors and setters.
///
/// Gesture callbacks never produce errors; degenerate runtime input there is
/// absorbed by numeric guards instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RescaleError {
    /// A constructor option or setter argument was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn invalid_argument_display_includes_reason() {
        let err = RescaleError::InvalidArgument(FACTOR_NOT_NUMERIC);
        assert_eq!(
            err.to_string(),
            "invalid argument: factor must be a finite number"
        );
    }
}
