// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rescale interaction controller.
//!
//! [`RescaleInteraction`] owns the factor and anchor properties, the marker
//! overlay and the gesture state. It shares the target [`FeatureSet`] with its
//! caller and rescales the member geometries in place.
//!
//! ## Factor model
//!
//! The factor accumulates: each drag step adds the ratio of the pointer's
//! anchor distance to its previous anchor distance. Whenever the factor moves
//! from `old` to `new`, every target geometry is scaled by `new - old` about
//! the anchor. Membership changes, made through any handle to the set, reset
//! the factor to `1.0` and the anchor to the centroid of the set, without
//! touching any geometry.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, Ref, RefCell, RefMut};
use core::fmt;

use kurbo::Point;
use tracing::{debug, trace, warn};

use crate::condition::{self, Condition};
use crate::error::RescaleError;
use crate::event::{ListenerKey, Listeners, RescaleEvent, RescaleEventType};
use crate::feature::{Feature, FeatureSet};
use crate::gesture::{GestureState, drag_ratio};
use crate::overlay::{MarkerKind, Overlay};
use crate::pointer::{Cursor, MapId, MapPointerEvent, MapView, PointerInteraction};
use crate::property::{
    Observable, ObserverKey, PropertyChange, parse_factor, validate_anchor, validate_factor,
};
use crate::style::OverlayStyle;

/// Factor of an untouched feature set.
pub const IDENTITY_FACTOR: f64 = 1.0;

/// Construction options for [`RescaleInteraction`].
///
/// ```
/// use kurbo::Point;
/// use rescale_feature::{Feature, RescaleInteraction, RescaleOptions, condition};
///
/// let options = RescaleOptions::new()
///     .features([Feature::new(Point::new(5.0, 5.0))])
///     .factor(2.0)
///     .condition(condition::shift_key_only)
///     .allow_anchor_movement(false);
/// let rescale = RescaleInteraction::new(options)?;
/// assert_eq!(rescale.factor(), 2.0);
/// assert_eq!(rescale.anchor(), Some(Point::new(5.0, 5.0)));
/// # Ok::<(), rescale_feature::RescaleError>(())
/// ```
pub struct RescaleOptions {
    features: FeatureSet,
    style: Option<OverlayStyle>,
    factor: Option<f64>,
    anchor: Option<Point>,
    condition: Option<Condition>,
    allow_anchor_movement: bool,
}

impl RescaleOptions {
    /// Creates the default options: no features, identity factor, centroid anchor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target features, collected into a new set.
    #[must_use]
    pub fn features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features = features.into_iter().collect();
        self
    }

    /// Targets an existing set; the interaction follows its membership.
    #[must_use]
    pub fn feature_set(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Sets the marker style.
    #[must_use]
    pub fn style(mut self, style: impl Into<OverlayStyle>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Sets the initial factor.
    #[must_use]
    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = Some(factor);
        self
    }

    /// Sets the initial anchor instead of the feature centroid.
    #[must_use]
    pub fn anchor(mut self, anchor: Point) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Sets the predicate a pointer-down must pass to start a gesture.
    #[must_use]
    pub fn condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&MapPointerEvent) -> bool + 'static,
    {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Allows or forbids dragging the anchor marker.
    #[must_use]
    pub fn allow_anchor_movement(mut self, allow: bool) -> Self {
        self.allow_anchor_movement = allow;
        self
    }
}

impl Default for RescaleOptions {
    fn default() -> Self {
        Self {
            features: FeatureSet::new(),
            style: None,
            factor: None,
            anchor: None,
            condition: None,
            allow_anchor_movement: true,
        }
    }
}

// Manual Debug impl since conditions and style functions aren't Debug
impl fmt::Debug for RescaleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RescaleOptions")
            .field("features", &self.features.len())
            .field("style", &self.style)
            .field("factor", &self.factor)
            .field("anchor", &self.anchor)
            .field("condition", &self.condition.is_some())
            .field("allow_anchor_movement", &self.allow_anchor_movement)
            .finish()
    }
}

/// What the pointer is over.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Hit {
    Marker(MarkerKind),
    Member,
    Other,
}

/// Factor, anchor and markers: everything a membership change resets.
#[derive(Debug)]
struct RescaleState {
    factor: Observable<f64>,
    anchor: Observable<Option<Point>>,
    overlay: Overlay,
}

impl RescaleState {
    fn reset(&mut self, features: &FeatureSet) {
        let anchor = features.centroid();
        self.factor.set_silent(IDENTITY_FACTOR);
        self.anchor.set_silent(anchor);
        debug!(
            features = features.len(),
            ?anchor,
            "membership changed, factor and anchor reset"
        );
        match anchor {
            Some(anchor) => self.overlay.sync(anchor, IDENTITY_FACTOR),
            None => self.overlay.clear(),
        }
    }

    fn apply_factor_change(&mut self, features: &FeatureSet, change: &PropertyChange<f64>) {
        let delta = change.new - change.old;
        if let Some(anchor) = *self.anchor.get() {
            for feature in features {
                feature.update_geometry(|geometry| geometry.scale(delta, delta, Some(anchor)));
            }
        }
        trace!(old = change.old, new = change.new, delta, "factor changed");
        self.overlay.set_factor(change.new);
    }

    fn apply_anchor_change(&mut self, change: &PropertyChange<Option<Point>>) {
        trace!(old = ?change.old, new = ?change.new, "anchor changed");
        match change.new {
            Some(anchor) => self.overlay.sync(anchor, *self.factor.get()),
            None => self.overlay.clear(),
        }
    }
}

/// State reachable from the membership observer.
#[derive(Debug)]
struct Shared {
    state: RefCell<RescaleState>,
    reset_pending: Cell<bool>,
}

impl Shared {
    fn membership_changed(&self, features: &FeatureSet) {
        match self.state.try_borrow_mut() {
            Ok(mut state) => state.reset(features),
            // A property observer changed membership; the property setter
            // finishes the reset once it releases the state.
            Err(_) => self.reset_pending.set(true),
        }
    }
}

/// Interactive uniform rescaling of a feature set around an anchor.
///
/// ```
/// use kurbo::Point;
/// use rescale_feature::{Feature, RescaleInteraction, RescaleOptions};
///
/// let a = Feature::new(Point::new(20.0, 20.0));
/// let b = Feature::new(Point::new(0.0, 0.0));
/// let mut rescale = RescaleInteraction::new(RescaleOptions::new().features([a.clone(), b]))?;
/// assert_eq!(rescale.anchor(), Some(Point::new(10.0, 10.0)));
///
/// // 1.0 -> 3.0 scales the geometry by 2 about the anchor.
/// rescale.set_factor(3.0)?;
/// assert_eq!(a.geometry().point(), Some(Point::new(30.0, 30.0)));
///
/// // Any handle to the set can change membership; that resets factor and anchor.
/// rescale.features().pop();
/// assert_eq!(rescale.factor(), 1.0);
/// assert_eq!(rescale.anchor(), Some(Point::new(30.0, 30.0)));
/// # Ok::<(), rescale_feature::RescaleError>(())
/// ```
pub struct RescaleInteraction {
    features: FeatureSet,
    membership_key: ObserverKey,
    shared: Rc<Shared>,
    condition: Condition,
    allow_anchor_movement: bool,
    gesture: GestureState,
    previous_cursor: Option<Cursor>,
    listeners: Listeners,
    active: bool,
    map: Option<MapId>,
}

impl RescaleInteraction {
    /// Creates an active, unattached interaction.
    ///
    /// Initial values are stored without rescaling the features.
    ///
    /// # Errors
    ///
    /// [`RescaleError::InvalidArgument`] for a non-finite factor or anchor.
    pub fn new(options: RescaleOptions) -> Result<Self, RescaleError> {
        let factor = validate_factor(options.factor.unwrap_or(IDENTITY_FACTOR))?;
        let anchor = match options.anchor {
            Some(anchor) => Some(validate_anchor(anchor)?),
            None => options.features.centroid(),
        };
        Ok(Self::from_parts(options, factor, anchor))
    }

    fn from_parts(options: RescaleOptions, factor: f64, anchor: Option<Point>) -> Self {
        let condition: Condition = match options.condition {
            Some(condition) => condition,
            None => Box::new(condition::always),
        };
        let mut overlay = Overlay::new(options.style.unwrap_or_default());
        if let Some(anchor) = anchor {
            overlay.sync(anchor, factor);
        }
        let shared = Rc::new(Shared {
            state: RefCell::new(RescaleState {
                factor: Observable::new(factor),
                anchor: Observable::new(anchor),
                overlay,
            }),
            reset_pending: Cell::new(false),
        });
        let features = options.features;
        let weak = Rc::downgrade(&shared);
        let membership_key = features.observe(move |features, _change| {
            if let Some(shared) = weak.upgrade() {
                shared.membership_changed(features);
            }
        });
        debug!(
            features = features.len(),
            factor,
            ?anchor,
            "rescale interaction created"
        );
        Self {
            features,
            membership_key,
            shared,
            condition,
            allow_anchor_movement: options.allow_anchor_movement,
            gesture: GestureState::Idle,
            previous_cursor: None,
            listeners: Listeners::new(),
            active: true,
            map: None,
        }
    }

    fn state(&self) -> Ref<'_, RescaleState> {
        self.shared.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, RescaleState> {
        self.shared.state.borrow_mut()
    }

    /// Returns the target features.
    ///
    /// The set is shared: cloning the handle and changing its membership
    /// resets the factor and anchor of this interaction.
    #[must_use]
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Returns the current factor.
    #[must_use]
    pub fn factor(&self) -> f64 {
        *self.state().factor.get()
    }

    /// Sets the factor, rescaling every feature by the difference.
    ///
    /// # Errors
    ///
    /// [`RescaleError::InvalidArgument`] if `factor` is not finite.
    pub fn set_factor(&mut self, factor: f64) -> Result<(), RescaleError> {
        let factor = validate_factor(factor)?;
        {
            let mut state = self.state_mut();
            if let Some(change) = state.factor.set(factor) {
                state.apply_factor_change(&self.features, &change);
                state.factor.notify(&change);
            }
        }
        self.finish_pending_reset();
        Ok(())
    }

    /// Parses and sets a textual factor such as `"2.5"`.
    ///
    /// # Errors
    ///
    /// [`RescaleError::InvalidArgument`] if `input` is not a finite number.
    pub fn set_factor_str(&mut self, input: &str) -> Result<(), RescaleError> {
        self.set_factor(parse_factor(input)?)
    }

    /// Returns the current anchor; `None` while there is nothing to rescale.
    #[must_use]
    pub fn anchor(&self) -> Option<Point> {
        *self.state().anchor.get()
    }

    /// Sets the anchor and moves the markers there.
    ///
    /// `None` recomputes the centroid of the features. Features are not rescaled.
    ///
    /// # Errors
    ///
    /// [`RescaleError::InvalidArgument`] if `anchor` is not finite.
    pub fn set_anchor(&mut self, anchor: Option<Point>) -> Result<(), RescaleError> {
        let anchor = match anchor {
            Some(anchor) => Some(validate_anchor(anchor)?),
            None => self.features.centroid(),
        };
        {
            let mut state = self.state_mut();
            if let Some(change) = state.anchor.set(anchor) {
                state.apply_anchor_change(&change);
                state.anchor.notify(&change);
            }
        }
        self.finish_pending_reset();
        Ok(())
    }

    fn finish_pending_reset(&self) {
        if self.shared.reset_pending.replace(false) {
            self.state_mut().reset(&self.features);
        }
    }

    /// Registers a factor observer, called after the features were rescaled.
    pub fn observe_factor<F>(&mut self, observer: F) -> ObserverKey
    where
        F: FnMut(&PropertyChange<f64>) + 'static,
    {
        self.state_mut().factor.observe(observer)
    }

    /// Unregisters a factor observer.
    pub fn unobserve_factor(&mut self, key: ObserverKey) -> bool {
        self.state_mut().factor.unobserve(key)
    }

    /// Registers an anchor observer, called after the markers moved.
    pub fn observe_anchor<F>(&mut self, observer: F) -> ObserverKey
    where
        F: FnMut(&PropertyChange<Option<Point>>) + 'static,
    {
        self.state_mut().anchor.observe(observer)
    }

    /// Unregisters an anchor observer.
    pub fn unobserve_anchor(&mut self, key: ObserverKey) -> bool {
        self.state_mut().anchor.unobserve(key)
    }

    /// Registers a lifecycle listener.
    pub fn on<F>(&mut self, kind: RescaleEventType, listener: F) -> ListenerKey
    where
        F: FnMut(&mut RescaleEvent<'_>) + 'static,
    {
        self.listeners.on(kind, listener)
    }

    /// Unregisters a lifecycle listener.
    pub fn off(&mut self, key: ListenerKey) -> bool {
        self.listeners.off(key)
    }

    /// Enables or disables the interaction.
    ///
    /// Disabling closes a running feature drag with a `rescaleend` event and
    /// hides the overlay. A cursor the interaction put on the host is restored
    /// by the next event the host routes to it, active or not.
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        if !active
            && matches!(
                core::mem::take(&mut self.gesture),
                GestureState::DraggingFeatures { .. }
            )
        {
            debug!("interaction deactivated during a rescale");
            self.dispatch(RescaleEventType::End);
        }
        self.sync_attachment();
    }

    /// Returns the map the interaction is attached to.
    #[must_use]
    pub fn map(&self) -> Option<MapId> {
        self.map
    }

    /// Attaches to or detaches from a map.
    pub fn set_map(&mut self, map: Option<MapId>) {
        self.map = map;
        self.sync_attachment();
    }

    /// Returns the marker overlay.
    #[must_use]
    pub fn overlay(&self) -> Ref<'_, Overlay> {
        Ref::map(self.state(), |state| &state.overlay)
    }

    /// Replaces the marker style.
    pub fn set_style(&mut self, style: impl Into<OverlayStyle>) {
        self.state_mut().overlay.set_style(style.into());
    }

    /// Returns `true` if the anchor marker can be dragged.
    #[must_use]
    pub fn allow_anchor_movement(&self) -> bool {
        self.allow_anchor_movement
    }

    /// Allows or forbids dragging the anchor marker.
    pub fn set_allow_anchor_movement(&mut self, allow: bool) {
        self.allow_anchor_movement = allow;
    }

    /// Returns the current gesture state.
    #[must_use]
    pub fn gesture(&self) -> GestureState {
        self.gesture
    }

    fn sync_attachment(&mut self) {
        let attached = self.active && self.map.is_some();
        self.state_mut().overlay.set_attached(attached);
    }

    fn dispatch(&mut self, kind: RescaleEventType) -> bool {
        let (factor, anchor) = {
            let state = self.state();
            (*state.factor.get(), *state.anchor.get())
        };
        let mut event = RescaleEvent::new(kind, &self.features, factor, anchor);
        self.listeners.dispatch(&mut event)
    }

    fn hit(&self, map: &dyn MapView, pixel: Point) -> Option<Hit> {
        let state = self.state();
        if let Some(kind) = state.overlay.marker_at_pixel(map, pixel) {
            return Some(Hit::Marker(kind));
        }
        let id = map.feature_at_pixel(pixel)?;
        if let Some(kind) = state.overlay.kind_of(id) {
            Some(Hit::Marker(kind))
        } else if self.features.contains(id) {
            Some(Hit::Member)
        } else {
            Some(Hit::Other)
        }
    }

    fn update_cursor(&mut self, map: &mut dyn MapView, pixel: Point) {
        let cursor = match self.gesture {
            GestureState::DraggingFeatures { .. } => Some(Cursor::Grabbing),
            GestureState::DraggingAnchor => Some(Cursor::Crosshair),
            GestureState::Idle => match self.hit(map, pixel) {
                Some(Hit::Member | Hit::Marker(MarkerKind::Arrow)) => Some(Cursor::Grab),
                Some(Hit::Marker(MarkerKind::Anchor)) if self.allow_anchor_movement => {
                    Some(Cursor::Crosshair)
                }
                _ => None,
            },
        };
        match cursor {
            Some(cursor) => {
                if self.previous_cursor.is_none() {
                    self.previous_cursor = Some(map.cursor());
                }
                map.set_cursor(cursor);
            }
            None => self.restore_cursor(map),
        }
    }

    fn restore_cursor(&mut self, map: &mut dyn MapView) {
        if let Some(previous) = self.previous_cursor.take() {
            map.set_cursor(previous);
        }
    }
}

impl Default for RescaleInteraction {
    fn default() -> Self {
        Self::from_parts(RescaleOptions::default(), IDENTITY_FACTOR, None)
    }
}

impl Drop for RescaleInteraction {
    fn drop(&mut self) {
        self.features.unobserve(self.membership_key);
    }
}

impl PointerInteraction for RescaleInteraction {
    fn is_active(&self) -> bool {
        self.active
    }

    fn is_dragging(&self) -> bool {
        !self.gesture.is_idle()
    }

    fn handle_down_event(&mut self, map: &mut dyn MapView, event: &MapPointerEvent) -> bool {
        if !event.is_mouse() || !event.is_primary_button() || !(self.condition)(event) {
            return false;
        }
        if !self.gesture.is_idle() {
            return false;
        }
        if !event.coordinate.is_finite() {
            warn!(coordinate = ?event.coordinate, "ignoring pointer down at a non-finite coordinate");
            return false;
        }
        match self.hit(map, event.pixel) {
            Some(Hit::Member | Hit::Marker(MarkerKind::Arrow)) => {
                self.gesture = GestureState::DraggingFeatures {
                    last_coordinate: event.coordinate,
                };
                debug!(
                    x = event.coordinate.x,
                    y = event.coordinate.y,
                    "rescale started"
                );
                self.update_cursor(map, event.pixel);
                self.dispatch(RescaleEventType::Start);
                true
            }
            Some(Hit::Marker(MarkerKind::Anchor)) if self.allow_anchor_movement => {
                self.gesture = GestureState::DraggingAnchor;
                debug!("anchor drag started");
                self.update_cursor(map, event.pixel);
                true
            }
            _ => false,
        }
    }

    fn handle_drag_event(&mut self, _map: &mut dyn MapView, event: &MapPointerEvent) {
        let coordinate = event.coordinate;
        match self.gesture {
            GestureState::DraggingFeatures { last_coordinate } => {
                if !coordinate.is_finite() {
                    warn!(?coordinate, "ignoring drag to a non-finite coordinate");
                    return;
                }
                let (factor, anchor) = {
                    let state = self.state();
                    (*state.factor.get(), *state.anchor.get())
                };
                if let Some(ratio) =
                    anchor.and_then(|anchor| drag_ratio(anchor, last_coordinate, coordinate))
                {
                    let factor = factor + ratio;
                    trace!(ratio, factor, "rescale step");
                    if let Err(err) = self.set_factor(factor) {
                        warn!(%err, factor, "rejected rescale step");
                    }
                }
                self.dispatch(RescaleEventType::Rescaling);
                self.gesture = GestureState::DraggingFeatures {
                    last_coordinate: coordinate,
                };
            }
            GestureState::DraggingAnchor => {
                if let Err(err) = self.set_anchor(Some(coordinate)) {
                    warn!(%err, ?coordinate, "rejected anchor position");
                }
            }
            GestureState::Idle => {}
        }
    }

    fn handle_up_event(&mut self, map: &mut dyn MapView, event: &MapPointerEvent) {
        match core::mem::take(&mut self.gesture) {
            GestureState::DraggingFeatures { .. } => {
                self.update_cursor(map, event.pixel);
                self.dispatch(RescaleEventType::End);
                debug!(factor = self.factor(), "rescale finished");
            }
            GestureState::DraggingAnchor => {
                self.update_cursor(map, event.pixel);
                debug!(anchor = ?self.anchor(), "anchor drag finished");
            }
            GestureState::Idle => {}
        }
    }

    fn handle_move_event(&mut self, map: &mut dyn MapView, event: &MapPointerEvent) {
        self.update_cursor(map, event.pixel);
    }

    fn handle_click_event(&mut self, map: &mut dyn MapView, event: &MapPointerEvent) -> bool {
        matches!(self.hit(map, event.pixel), Some(Hit::Marker(_)))
    }

    fn handle_inactive_event(&mut self, map: &mut dyn MapView, _event: &MapPointerEvent) {
        self.restore_cursor(map);
    }
}

// Manual Debug impl since conditions and listeners aren't Debug
impl fmt::Debug for RescaleInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RescaleInteraction")
            .field("features", &self.features)
            .field("state", &self.shared.state)
            .field("allow_anchor_movement", &self.allow_anchor_movement)
            .field("gesture", &self.gesture)
            .field("previous_cursor", &self.previous_cursor)
            .field("listeners", &self.listeners)
            .field("active", &self.active)
            .field("map", &self.map)
            .finish_non_exhaustive()
    }
}
