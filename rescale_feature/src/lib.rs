// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rescale Feature: interactive uniform rescaling of map features around an anchor.
//!
//! A [`RescaleInteraction`] sits between a host map and a set of shared
//! [`Feature`]s. The user grabs one of the features (or the arrow marker) and
//! drags away from or towards the anchor; every feature is rescaled about the
//! anchor as the pointer moves. The anchor itself is shown as a marker that
//! can be dragged to a new pivot.
//!
//! The [`FeatureSet`] is a shared handle as well. A host component such as a
//! selection can change its membership directly; the interaction observes the
//! set and resets the factor and anchor in response.
//!
//! The host map stays in charge of rendering, projection and hit testing. It
//! implements [`MapView`], resolves pointer input to [`MapPointerEvent`]s and
//! hands them to [`PointerInteraction::handle_event`]. The overlay markers are
//! exposed through [`RescaleInteraction::overlay`] for the host to draw.
//!
//! ## Lifecycle events
//!
//! A feature drag emits `rescalestart`, one `rescaling` per drag step, then
//! `rescaleend`. Listeners are registered with [`RescaleInteraction::on`] and
//! see the live feature set, factor and anchor.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Point;
//! use rescale_feature::{
//!     Cursor, Feature, FeatureId, MapId, MapPointerEvent, MapView, PointerEventKind,
//!     PointerInteraction, RescaleEventType, RescaleInteraction, RescaleOptions,
//! };
//!
//! // A map whose pixels are its coordinates.
//! struct Map(Vec<Feature>, Cursor);
//!
//! impl MapView for Map {
//!     fn pixel_from_coordinate(&self, coordinate: Point) -> Point {
//!         coordinate
//!     }
//!     fn feature_at_pixel(&self, pixel: Point) -> Option<FeatureId> {
//!         self.0
//!             .iter()
//!             .find(|f| f.geometry().point().is_some_and(|p| p.distance(pixel) < 5.0))
//!             .map(Feature::id)
//!     }
//!     fn cursor(&self) -> Cursor {
//!         self.1.clone()
//!     }
//!     fn set_cursor(&mut self, cursor: Cursor) {
//!         self.1 = cursor;
//!     }
//! }
//!
//! let a = Feature::new(Point::new(60.0, 0.0));
//! let b = Feature::new(Point::new(0.0, 0.0));
//! let mut map = Map(vec![a.clone(), b.clone()], Cursor::Default);
//!
//! let mut rescale = RescaleInteraction::new(RescaleOptions::new().features([a.clone(), b]))?;
//! rescale.set_map(Some(MapId(1)));
//! rescale.on(RescaleEventType::End, |event| {
//!     assert_eq!(event.factor(), 3.0);
//! });
//!
//! let at = |kind, x, y| MapPointerEvent::new(kind, Point::new(x, y), Point::new(x, y));
//! rescale.handle_event(&mut map, &at(PointerEventKind::Down, 60.0, 0.0));
//! rescale.handle_event(&mut map, &at(PointerEventKind::Drag, 90.0, 0.0));
//! rescale.handle_event(&mut map, &at(PointerEventKind::Up, 90.0, 0.0));
//!
//! // Twice as far from the anchor (30, 0): the factor gains 2.
//! assert_eq!(a.geometry().point(), Some(Point::new(90.0, 0.0)));
//! # Ok::<(), rescale_feature::RescaleError>(())
//! ```
//!
//! ## Features
//!
//! - `std` (default): use the standard library float backend.
//! - `libm`: use `libm` instead, for `no_std` targets.
//! - `serde`: enable [`RescaleConfig`] for loading plain-data options.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod condition;
mod error;
mod event;
mod feature;
mod geometry;
mod gesture;
mod interaction;
mod overlay;
mod pointer;
mod property;
pub mod style;

#[cfg(feature = "serde")]
mod config;

#[cfg(feature = "serde")]
pub use config::{FactorValue, RescaleConfig};
pub use error::RescaleError;
pub use event::{Listener, ListenerKey, Listeners, RescaleEvent, RescaleEventType};
pub use feature::{
    AttributeValue, Feature, FeatureId, FeatureSet, FeatureSetIter, MembershipChange, MembershipObserver,
};
pub use geometry::Geometry;
pub use gesture::{GestureState, drag_ratio};
pub use interaction::{IDENTITY_FACTOR, RescaleInteraction, RescaleOptions};
pub use overlay::{ANCHOR_KEY, ARROW_KEY, FACTOR_KEY, MarkerKind, Overlay};
pub use pointer::{Cursor, MapId, MapPointerEvent, MapView, PointerEventKind, PointerInteraction};
pub use property::{
    Observable, ObserverKey, PropertyChange, PropertyObserver, anchor_from_slice, parse_factor,
    validate_anchor, validate_factor,
};
