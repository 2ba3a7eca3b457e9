// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rescale lifecycle events and their listener registry.
//!
//! A rescale gesture emits [`RescaleEventType::Start`], any number of
//! [`RescaleEventType::Rescaling`], then [`RescaleEventType::End`]. Events are
//! delivered synchronously, in listener registration order, on the call stack
//! of the pointer event that caused them. A listener may stop delivery to the
//! listeners after it with [`RescaleEvent::stop_propagation`].

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use kurbo::Point;

use crate::error::RescaleError;
use crate::feature::FeatureSet;

/// Kind of a rescale lifecycle event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RescaleEventType {
    /// A feature drag started.
    Start,
    /// The factor changed during a drag.
    Rescaling,
    /// The drag finished.
    End,
}

impl RescaleEventType {
    /// Returns the event name hosts subscribe to.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "rescalestart",
            Self::Rescaling => "rescaling",
            Self::End => "rescaleend",
        }
    }
}

impl fmt::Display for RescaleEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RescaleEventType {
    type Err = RescaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rescalestart" => Ok(Self::Start),
            "rescaling" => Ok(Self::Rescaling),
            "rescaleend" => Ok(Self::End),
            _ => Err(RescaleError::InvalidArgument("unknown rescale event type")),
        }
    }
}

/// Snapshot of the interaction state handed to listeners.
#[derive(Debug)]
pub struct RescaleEvent<'a> {
    kind: RescaleEventType,
    features: &'a FeatureSet,
    factor: f64,
    anchor: Option<Point>,
    propagation_stopped: bool,
}

impl<'a> RescaleEvent<'a> {
    /// Creates an event snapshot.
    #[must_use]
    pub fn new(
        kind: RescaleEventType,
        features: &'a FeatureSet,
        factor: f64,
        anchor: Option<Point>,
    ) -> Self {
        Self {
            kind,
            features,
            factor,
            anchor,
            propagation_stopped: false,
        }
    }

    /// Returns the event kind.
    #[must_use]
    pub fn kind(&self) -> RescaleEventType {
        self.kind
    }

    /// Returns the event name, e.g. `"rescaling"`.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Returns the live feature set being rescaled.
    #[must_use]
    pub fn features(&self) -> &'a FeatureSet {
        self.features
    }

    /// Returns the factor at dispatch time.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Returns the anchor at dispatch time.
    #[must_use]
    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    /// Returns `true` once a listener stopped propagation.
    #[must_use]
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Stops delivery to later listeners. Same effect as [`Self::stop_propagation`].
    pub fn prevent_default(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stops delivery to later listeners.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

/// Callback registered for rescale events.
pub type Listener = Box<dyn FnMut(&mut RescaleEvent<'_>)>;

/// Handle returned by [`Listeners::on`], used to unregister.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey(u64);

/// Listener registry keyed by event type.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<(ListenerKey, RescaleEventType, Listener)>,
    next_key: u64,
}

impl Listeners {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `kind`.
    pub fn on<F>(&mut self, kind: RescaleEventType, listener: F) -> ListenerKey
    where
        F: FnMut(&mut RescaleEvent<'_>) + 'static,
    {
        let key = ListenerKey(self.next_key);
        self.next_key += 1;
        self.entries.push((key, kind, Box::new(listener)));
        key
    }

    /// Unregisters a listener; returns `false` if `key` was unknown.
    pub fn off(&mut self, key: ListenerKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _, _)| *k != key);
        self.entries.len() != before
    }

    /// Delivers `event` to matching listeners until one stops propagation.
    ///
    /// Returns `false` if propagation was stopped.
    pub fn dispatch(&mut self, event: &mut RescaleEvent<'_>) -> bool {
        for (_, kind, listener) in &mut self.entries {
            if *kind != event.kind {
                continue;
            }
            listener(&mut *event);
            if event.propagation_stopped {
                return false;
            }
        }
        true
    }
}

// Manual Debug impl since listeners aren't Debug
impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|(key, kind, _)| (*key, *kind))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    #[test]
    fn event_names_round_trip_through_from_str() {
        for kind in [
            RescaleEventType::Start,
            RescaleEventType::Rescaling,
            RescaleEventType::End,
        ] {
            assert_eq!(kind.as_str().parse::<RescaleEventType>(), Ok(kind));
        }
        assert_eq!(RescaleEventType::Start.as_str(), "rescalestart");
        assert_eq!(RescaleEventType::Rescaling.as_str(), "rescaling");
        assert_eq!(RescaleEventType::End.as_str(), "rescaleend");
        assert!("rotatestart".parse::<RescaleEventType>().is_err());
    }

    #[test]
    fn dispatch_filters_by_kind() {
        let seen = Rc::new(RefCell::new(vec![]));
        let mut listeners = Listeners::new();
        for kind in [RescaleEventType::Start, RescaleEventType::End] {
            let sink = seen.clone();
            listeners.on(kind, move |event| sink.borrow_mut().push(event.event_type()));
        }

        let features = FeatureSet::new();
        let mut event = RescaleEvent::new(RescaleEventType::End, &features, 1.0, None);
        assert!(listeners.dispatch(&mut event));
        assert_eq!(*seen.borrow(), vec!["rescaleend"]);
    }

    #[test]
    fn stop_propagation_skips_later_listeners() {
        let hits = Rc::new(RefCell::new(0));
        let mut listeners = Listeners::new();
        listeners.on(RescaleEventType::Rescaling, |event| event.prevent_default());
        let sink = hits.clone();
        listeners.on(RescaleEventType::Rescaling, move |_| *sink.borrow_mut() += 1);

        let features = FeatureSet::new();
        let mut event = RescaleEvent::new(
            RescaleEventType::Rescaling,
            &features,
            2.0,
            Some(Point::new(1.0, 1.0)),
        );
        assert!(!listeners.dispatch(&mut event));
        assert!(event.propagation_stopped());
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn off_unregisters() {
        let mut listeners = Listeners::new();
        let key = listeners.on(RescaleEventType::Start, |event| event.stop_propagation());
        assert!(listeners.off(key));
        assert!(!listeners.off(key));

        let features = FeatureSet::new();
        let mut event = RescaleEvent::new(RescaleEventType::Start, &features, 1.0, None);
        assert!(listeners.dispatch(&mut event));
    }
}
