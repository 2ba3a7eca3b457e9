// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rescale gesture state and the per-step drag ratio.

use kurbo::Point;

/// What the rescale interaction is currently dragging.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum GestureState {
    /// No drag in progress.
    #[default]
    Idle,
    /// Features are being rescaled; holds the previous pointer coordinate.
    DraggingFeatures {
        /// Map coordinate of the previous down/drag event.
        last_coordinate: Point,
    },
    /// The anchor marker is being moved.
    DraggingAnchor,
}

impl GestureState {
    /// Returns `true` when no drag is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Ratio of the anchor distances of `current` and `last`.
///
/// Returns `None` when `last` sits on the anchor or the ratio is not finite,
/// which callers treat as a zero-delta step.
#[must_use]
pub fn drag_ratio(anchor: Point, last: Point, current: Point) -> Option<f64> {
    let base = last.distance(anchor);
    if base <= 0.0 {
        return None;
    }
    let ratio = current.distance(anchor) / base;
    ratio.is_finite().then_some(ratio)
}
