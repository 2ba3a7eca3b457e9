// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Predicates gating when a pointer-down may start a gesture.
//!
//! Any `Fn(&MapPointerEvent) -> bool` works as a condition; the functions
//! here cover the common device and modifier checks.
//!
//! ```
//! use kurbo::Point;
//! use rescale_feature::condition;
//! use rescale_feature::{MapPointerEvent, PointerEventKind};
//! use ui_events::keyboard::Modifiers;
//!
//! let down = MapPointerEvent::new(PointerEventKind::Down, Point::ZERO, Point::ZERO);
//! assert!(condition::no_modifier_keys(&down));
//!
//! let shifted = down.with_modifiers(Modifiers::SHIFT);
//! assert!(condition::shift_key_only(&shifted));
//! ```

use alloc::boxed::Box;

use ui_events::keyboard::Modifiers;
use ui_events::pointer::PointerType;

use crate::pointer::MapPointerEvent;

/// Boxed gesture gate.
pub type Condition = Box<dyn Fn(&MapPointerEvent) -> bool>;

const ALL_KEYS: Modifiers = Modifiers::SHIFT
    .union(Modifiers::CONTROL)
    .union(Modifiers::ALT)
    .union(Modifiers::META);

/// Always passes.
pub fn always(_event: &MapPointerEvent) -> bool {
    true
}

/// Never passes.
pub fn never(_event: &MapPointerEvent) -> bool {
    false
}

/// Passes for mouse events.
pub fn mouse_only(event: &MapPointerEvent) -> bool {
    event.is_mouse()
}

/// Passes for touch events.
pub fn touch_only(event: &MapPointerEvent) -> bool {
    matches!(event.pointer_type, PointerType::Touch)
}

/// Passes for pen events.
pub fn pen_only(event: &MapPointerEvent) -> bool {
    matches!(event.pointer_type, PointerType::Pen)
}

/// Passes for the primary button of a mouse, or any non-mouse contact.
pub fn primary_action(event: &MapPointerEvent) -> bool {
    !event.is_mouse() || event.is_primary_button()
}

/// Passes when no modifier key is held.
pub fn no_modifier_keys(event: &MapPointerEvent) -> bool {
    !event.modifiers.intersects(ALL_KEYS)
}

/// Passes when Shift is the only modifier held.
pub fn shift_key_only(event: &MapPointerEvent) -> bool {
    only(event.modifiers, Modifiers::SHIFT)
}

/// Passes when Alt is the only modifier held.
pub fn alt_key_only(event: &MapPointerEvent) -> bool {
    only(event.modifiers, Modifiers::ALT)
}

/// Passes when Control or Meta, and nothing else, is held.
pub fn platform_modifier_key_only(event: &MapPointerEvent) -> bool {
    only(event.modifiers, Modifiers::CONTROL) || only(event.modifiers, Modifiers::META)
}

fn only(held: Modifiers, key: Modifiers) -> bool {
    held.intersection(ALL_KEYS) == key
}
