// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observable properties with explicit change records and silent writes.
//!
//! [`Observable::set`] stores a value and hands back a [`PropertyChange`]
//! when the value actually changed. The owner reacts to the change first and
//! then calls [`Observable::notify`] so that external observers see the
//! owner's side effects already applied. [`Observable::set_silent`] stores a
//! value without producing a change at all.
//!
//! ```
//! use rescale_feature::Observable;
//!
//! let mut factor = Observable::new(1.0_f64);
//! let change = factor.set(2.0).unwrap();
//! assert_eq!((change.old, change.new), (1.0, 2.0));
//!
//! // Equal values are not changes.
//! assert!(factor.set(2.0).is_none());
//!
//! factor.set_silent(1.0);
//! assert_eq!(*factor.get(), 1.0);
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;

use crate::error::{ANCHOR_NOT_PAIR, FACTOR_NOT_NUMERIC, RescaleError};

/// Callback invoked after a property changed.
pub type PropertyObserver<T> = Box<dyn FnMut(&PropertyChange<T>)>;

/// A committed property change.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange<T> {
    /// Value before the write.
    pub old: T,
    /// Value after the write.
    pub new: T,
}

/// Handle returned by [`Observable::observe`] and
/// [`FeatureSet::observe`](crate::FeatureSet::observe), used to unregister.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserverKey(pub(crate) u64);

/// A typed value with an observer list.
pub struct Observable<T> {
    value: T,
    observers: Vec<(ObserverKey, PropertyObserver<T>)>,
    next_key: u64,
}

impl<T: Clone + PartialEq> Observable<T> {
    /// Creates a property holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            observers: Vec::new(),
            next_key: 0,
        }
    }

    /// Returns the current value.
    #[must_use]
    #[inline]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Stores `value`, returning the change if it differs from the current value.
    ///
    /// Observers are not called; pass the change to [`Observable::notify`].
    #[must_use = "pass the change to `notify` so observers run"]
    pub fn set(&mut self, value: T) -> Option<PropertyChange<T>> {
        if self.value == value {
            return None;
        }
        let old = core::mem::replace(&mut self.value, value);
        Some(PropertyChange {
            old,
            new: self.value.clone(),
        })
    }

    /// Stores `value` without producing a change.
    pub fn set_silent(&mut self, value: T) {
        self.value = value;
    }

    /// Runs every observer with `change`, in registration order.
    pub fn notify(&mut self, change: &PropertyChange<T>) {
        for (_, observer) in &mut self.observers {
            observer(change);
        }
    }

    /// Registers an observer.
    pub fn observe<F>(&mut self, observer: F) -> ObserverKey
    where
        F: FnMut(&PropertyChange<T>) + 'static,
    {
        let key = ObserverKey(self.next_key);
        self.next_key += 1;
        self.observers.push((key, Box::new(observer)));
        key
    }

    /// Unregisters an observer; returns `false` if `key` was unknown.
    pub fn unobserve(&mut self, key: ObserverKey) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(k, _)| *k != key);
        self.observers.len() != before
    }
}

// Manual Debug impl since observers aren't Debug
impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Checks that `value` is usable as a rescale factor.
pub fn validate_factor(value: f64) -> Result<f64, RescaleError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RescaleError::InvalidArgument(FACTOR_NOT_NUMERIC))
    }
}

/// Parses a textual factor such as `"2.5"`.
///
/// Surrounding whitespace is ignored; anything that does not parse to a
/// finite number is rejected.
pub fn parse_factor(input: &str) -> Result<f64, RescaleError> {
    input
        .trim()
        .parse::<f64>()
        .map_err(|_| RescaleError::InvalidArgument(FACTOR_NOT_NUMERIC))
        .and_then(validate_factor)
}

/// Checks that `anchor` has finite coordinates.
pub fn validate_anchor(anchor: Point) -> Result<Point, RescaleError> {
    if anchor.is_finite() {
        Ok(anchor)
    } else {
        Err(RescaleError::InvalidArgument(ANCHOR_NOT_PAIR))
    }
}

/// Builds an anchor from a coordinate slice, which must hold exactly two finite numbers.
pub fn anchor_from_slice(coords: &[f64]) -> Result<Point, RescaleError> {
    match coords {
        [x, y] => validate_anchor(Point::new(*x, *y)),
        _ => Err(RescaleError::InvalidArgument(ANCHOR_NOT_PAIR)),
    }
}
