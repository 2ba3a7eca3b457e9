// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer events as delivered by a host map, and the interaction protocol.
//!
//! The host map owns rendering, hit testing and projection. It hands each
//! pointer event, already resolved to a pixel and a map coordinate, to its
//! interactions through [`PointerInteraction::handle_event`], passing itself
//! as a [`MapView`] for queries. An interaction returns `false` to stop the
//! event from reaching the interactions after it.

use alloc::string::String;

use kurbo::Point;
use ui_events::keyboard::Modifiers;
use ui_events::pointer::{PointerButton, PointerType};

use crate::feature::FeatureId;

/// Kind of a map pointer event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// A button was pressed.
    Down,
    /// The pointer moved with a button held.
    Drag,
    /// A button was released.
    Up,
    /// The pointer moved with no button held.
    Move,
    /// Any click.
    Click,
    /// A click that was not followed by a second one.
    SingleClick,
    /// A double click.
    DoubleClick,
}

impl PointerEventKind {
    /// Returns `true` for the click family of events.
    #[must_use]
    pub fn is_click(self) -> bool {
        matches!(self, Self::Click | Self::SingleClick | Self::DoubleClick)
    }
}

/// A pointer event resolved against the map view.
#[derive(Clone, Debug)]
pub struct MapPointerEvent {
    /// Event kind.
    pub kind: PointerEventKind,
    /// Position in view pixels.
    pub pixel: Point,
    /// Position in map coordinates.
    pub coordinate: Point,
    /// Device that produced the event.
    pub pointer_type: PointerType,
    /// Button that changed state, for down/up/click events.
    pub button: Option<PointerButton>,
    /// Keyboard modifiers held during the event.
    pub modifiers: Modifiers,
}

impl MapPointerEvent {
    /// Creates a primary-button mouse event without modifiers.
    #[must_use]
    pub fn new(kind: PointerEventKind, pixel: Point, coordinate: Point) -> Self {
        Self {
            kind,
            pixel,
            coordinate,
            pointer_type: PointerType::Mouse,
            button: Some(PointerButton::Primary),
            modifiers: Modifiers::empty(),
        }
    }

    /// Sets the device type.
    #[must_use]
    pub fn with_pointer_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = pointer_type;
        self
    }

    /// Sets the button.
    #[must_use]
    pub fn with_button(mut self, button: Option<PointerButton>) -> Self {
        self.button = button;
        self
    }

    /// Sets the modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Returns `true` if the event came from a mouse.
    #[must_use]
    pub fn is_mouse(&self) -> bool {
        matches!(self.pointer_type, PointerType::Mouse)
    }

    /// Returns `true` if the changed button is the primary one.
    #[must_use]
    pub fn is_primary_button(&self) -> bool {
        matches!(self.button, Some(PointerButton::Primary))
    }
}

/// Cursor shown over the map viewport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    /// Platform default.
    #[default]
    Default,
    /// Open hand.
    Grab,
    /// Closed hand.
    Grabbing,
    /// Crosshair.
    Crosshair,
    /// Pointing hand.
    Pointer,
    /// Any other named cursor.
    Named(String),
}

/// Identity of a host map an interaction is attached to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MapId(pub u64);

/// Queries an interaction may issue against its host map.
pub trait MapView {
    /// Projects a map coordinate into view pixels.
    fn pixel_from_coordinate(&self, coordinate: Point) -> Point;

    /// Returns the topmost host feature rendered under `pixel`.
    fn feature_at_pixel(&self, pixel: Point) -> Option<FeatureId>;

    /// Returns the cursor currently shown over the viewport.
    fn cursor(&self) -> Cursor;

    /// Changes the viewport cursor.
    fn set_cursor(&mut self, cursor: Cursor);
}

/// Pointer-driven map interaction.
///
/// Implementors supply the callbacks; [`PointerInteraction::handle_event`]
/// routes host events to them. Drag and up events only reach
/// [`PointerInteraction::handle_drag_event`] and
/// [`PointerInteraction::handle_up_event`] while
/// [`PointerInteraction::is_dragging`] reports a claimed sequence.
pub trait PointerInteraction {
    /// Returns `true` if the interaction currently handles events.
    fn is_active(&self) -> bool;

    /// Returns `true` between a claimed down and the up that closes it.
    fn is_dragging(&self) -> bool;

    /// Handles a down event. Returning `true` claims the down/up sequence
    /// and stops the down from propagating.
    fn handle_down_event(&mut self, map: &mut dyn MapView, event: &MapPointerEvent) -> bool;

    /// Handles a drag event inside a claimed sequence.
    fn handle_drag_event(&mut self, map: &mut dyn MapView, event: &MapPointerEvent);

    /// Handles the up event that closes a claimed sequence.
    ///
    /// [`PointerInteraction::is_dragging`] must report `false` afterwards.
    fn handle_up_event(&mut self, map: &mut dyn MapView, event: &MapPointerEvent);

    /// Handles a move event without buttons held.
    fn handle_move_event(&mut self, map: &mut dyn MapView, event: &MapPointerEvent);

    /// Handles a click-family event. Returning `true` stops propagation.
    fn handle_click_event(&mut self, _map: &mut dyn MapView, _event: &MapPointerEvent) -> bool {
        false
    }

    /// Sees events routed while the interaction is inactive.
    ///
    /// Such events always propagate; the default does nothing.
    fn handle_inactive_event(&mut self, _map: &mut dyn MapView, _event: &MapPointerEvent) {}

    /// Routes a host event to the callbacks.
    ///
    /// Returns `false` when the event must not propagate to later interactions.
    fn handle_event(&mut self, map: &mut dyn MapView, event: &MapPointerEvent) -> bool {
        if !self.is_active() {
            self.handle_inactive_event(map, event);
            return true;
        }
        let stop = match event.kind {
            PointerEventKind::Down => self.handle_down_event(map, event),
            PointerEventKind::Drag => {
                if self.is_dragging() {
                    self.handle_drag_event(map, event);
                }
                false
            }
            PointerEventKind::Up => {
                if self.is_dragging() {
                    self.handle_up_event(map, event);
                }
                false
            }
            PointerEventKind::Move => {
                self.handle_move_event(map, event);
                false
            }
            PointerEventKind::Click | PointerEventKind::SingleClick | PointerEventKind::DoubleClick => {
                self.handle_click_event(map, event)
            }
        };
        !stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct NullMap {
        cursor: Cursor,
    }

    impl MapView for NullMap {
        fn pixel_from_coordinate(&self, coordinate: Point) -> Point {
            coordinate
        }

        fn feature_at_pixel(&self, _pixel: Point) -> Option<FeatureId> {
            None
        }

        fn cursor(&self) -> Cursor {
            self.cursor.clone()
        }

        fn set_cursor(&mut self, cursor: Cursor) {
            self.cursor = cursor;
        }
    }

    /// Records callbacks; claims downs when `claim` is set.
    #[derive(Default)]
    struct Recorder {
        active: bool,
        claim: bool,
        dragging: bool,
        calls: Vec<PointerEventKind>,
        inactive_calls: usize,
    }

    impl PointerInteraction for Recorder {
        fn is_active(&self) -> bool {
            self.active
        }

        fn is_dragging(&self) -> bool {
            self.dragging
        }

        fn handle_down_event(&mut self, _map: &mut dyn MapView, event: &MapPointerEvent) -> bool {
            self.calls.push(event.kind);
            self.dragging = self.claim;
            self.claim
        }

        fn handle_drag_event(&mut self, _map: &mut dyn MapView, event: &MapPointerEvent) {
            self.calls.push(event.kind);
        }

        fn handle_up_event(&mut self, _map: &mut dyn MapView, event: &MapPointerEvent) {
            self.calls.push(event.kind);
            self.dragging = false;
        }

        fn handle_move_event(&mut self, _map: &mut dyn MapView, event: &MapPointerEvent) {
            self.calls.push(event.kind);
        }

        fn handle_inactive_event(&mut self, _map: &mut dyn MapView, _event: &MapPointerEvent) {
            self.inactive_calls += 1;
        }
    }

    fn event(kind: PointerEventKind) -> MapPointerEvent {
        MapPointerEvent::new(kind, Point::ZERO, Point::ZERO)
    }

    #[test]
    fn claimed_down_stops_propagation_and_opens_sequence() {
        let mut map = NullMap::default();
        let mut rec = Recorder {
            active: true,
            claim: true,
            ..Default::default()
        };

        assert!(!rec.handle_event(&mut map, &event(PointerEventKind::Down)));
        assert!(rec.is_dragging());
        assert!(rec.handle_event(&mut map, &event(PointerEventKind::Drag)));
        assert!(rec.handle_event(&mut map, &event(PointerEventKind::Up)));
        assert!(!rec.is_dragging());
        assert_eq!(
            rec.calls,
            [
                PointerEventKind::Down,
                PointerEventKind::Drag,
                PointerEventKind::Up
            ]
        );
    }

    #[test]
    fn drag_and_up_without_claimed_down_are_not_forwarded() {
        let mut map = NullMap::default();
        let mut rec = Recorder {
            active: true,
            ..Default::default()
        };

        assert!(rec.handle_event(&mut map, &event(PointerEventKind::Down)));
        assert!(rec.handle_event(&mut map, &event(PointerEventKind::Drag)));
        assert!(rec.handle_event(&mut map, &event(PointerEventKind::Up)));
        assert!(rec.handle_event(&mut map, &event(PointerEventKind::Move)));
        assert_eq!(
            rec.calls,
            [PointerEventKind::Down, PointerEventKind::Move]
        );
    }

    #[test]
    fn inactive_interaction_ignores_events() {
        let mut map = NullMap::default();
        let mut rec = Recorder {
            claim: true,
            ..Default::default()
        };

        assert!(rec.handle_event(&mut map, &event(PointerEventKind::Down)));
        assert!(rec.handle_event(&mut map, &event(PointerEventKind::Move)));
        assert!(rec.calls.is_empty());
        assert_eq!(rec.inactive_calls, 2);
    }

    #[test]
    fn click_family() {
        assert!(PointerEventKind::Click.is_click());
        assert!(PointerEventKind::SingleClick.is_click());
        assert!(PointerEventKind::DoubleClick.is_click());
        assert!(!PointerEventKind::Down.is_click());
    }

    #[test]
    fn default_event_is_primary_mouse() {
        let ev = event(PointerEventKind::Down);
        assert!(ev.is_mouse());
        assert!(ev.is_primary_button());
        let touch = ev
            .with_pointer_type(PointerType::Touch)
            .with_button(None);
        assert!(!touch.is_mouse());
        assert!(!touch.is_primary_button());
    }
}
