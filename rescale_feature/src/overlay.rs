// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The controller-owned overlay holding the anchor and arrow markers.
//!
//! Both markers are point features positioned at the anchor. They carry the
//! current factor as an attribute so style functions can label it. The host
//! renders [`Overlay::features`] with [`Overlay::styles_for`] above every other
//! layer while [`Overlay::is_attached`] is `true`.

use alloc::vec::Vec;

use kurbo::Point;
use smallvec::SmallVec;
use tracing::trace;

use crate::feature::{AttributeValue, Feature, FeatureId};
use crate::geometry::Geometry;
use crate::pointer::MapView;
use crate::style::{MarkerStyle, OverlayStyle};

/// Attribute flagging the anchor marker.
pub const ANCHOR_KEY: &str = "rescale-anchor";

/// Attribute flagging the arrow marker.
pub const ARROW_KEY: &str = "rescale-arrow";

/// Attribute holding the current factor on both markers.
pub const FACTOR_KEY: &str = "factor";

/// Which overlay marker a feature is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// The pivot handle.
    Anchor,
    /// The rescale handle labelled with the factor.
    Arrow,
}

/// Overlay layer with lazily created markers.
#[derive(Debug, Default)]
pub struct Overlay {
    anchor_marker: Option<Feature>,
    arrow_marker: Option<Feature>,
    style: OverlayStyle,
    attached: bool,
}

impl Overlay {
    /// Creates an empty, detached overlay.
    #[must_use]
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            anchor_marker: None,
            arrow_marker: None,
            style,
            attached: false,
        }
    }

    /// Returns the anchor marker, if created.
    #[must_use]
    pub fn anchor_marker(&self) -> Option<&Feature> {
        self.anchor_marker.as_ref()
    }

    /// Returns the arrow marker, if created.
    #[must_use]
    pub fn arrow_marker(&self) -> Option<&Feature> {
        self.arrow_marker.as_ref()
    }

    /// Returns the markers in render order.
    #[must_use]
    pub fn features(&self) -> SmallVec<[Feature; 2]> {
        self.anchor_marker
            .iter()
            .chain(self.arrow_marker.iter())
            .cloned()
            .collect()
    }

    /// Returns `true` while the overlay is shown on a map.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    /// Returns the marker style.
    #[must_use]
    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Replaces the marker style.
    pub fn set_style(&mut self, style: OverlayStyle) {
        self.style = style;
    }

    /// Resolves the styles of one marker.
    #[must_use]
    pub fn styles_for(&self, feature: &Feature) -> Vec<MarkerStyle> {
        self.style.styles_for(feature)
    }

    /// Creates both markers at `anchor`, or moves existing ones there.
    pub fn sync(&mut self, anchor: Point, factor: f64) {
        match (&self.anchor_marker, &self.arrow_marker) {
            (Some(_), Some(_)) => {
                self.set_position(anchor);
                self.set_factor(factor);
            }
            _ => {
                trace!(x = anchor.x, y = anchor.y, factor, "creating rescale markers");
                self.anchor_marker = Some(marker(ANCHOR_KEY, anchor, factor));
                self.arrow_marker = Some(marker(ARROW_KEY, anchor, factor));
            }
        }
    }

    /// Moves both markers to `anchor`; markers already there are left untouched.
    pub fn set_position(&mut self, anchor: Point) {
        for feature in self.anchor_marker.iter().chain(self.arrow_marker.iter()) {
            let current = feature.geometry().point();
            if current != Some(anchor) {
                feature.update_geometry(|geometry| geometry.set_point(anchor));
            }
        }
    }

    /// Stores `factor` on both markers.
    pub fn set_factor(&mut self, factor: f64) {
        for feature in self.anchor_marker.iter().chain(self.arrow_marker.iter()) {
            feature.set(FACTOR_KEY, factor);
        }
    }

    /// Destroys both markers.
    pub fn clear(&mut self) {
        if self.anchor_marker.is_some() || self.arrow_marker.is_some() {
            trace!("clearing rescale markers");
        }
        self.anchor_marker = None;
        self.arrow_marker = None;
    }

    /// Returns the kind of marker `id` identifies.
    #[must_use]
    pub fn kind_of(&self, id: FeatureId) -> Option<MarkerKind> {
        if self.anchor_marker.as_ref().is_some_and(|f| f.id() == id) {
            Some(MarkerKind::Anchor)
        } else if self.arrow_marker.as_ref().is_some_and(|f| f.id() == id) {
            Some(MarkerKind::Arrow)
        } else {
            None
        }
    }

    /// Returns the topmost marker rendered under `pixel`.
    ///
    /// Detached overlays are never hit. The arrow is drawn after the anchor,
    /// so it wins when both are under the pointer.
    #[must_use]
    pub fn marker_at_pixel(&self, map: &dyn MapView, pixel: Point) -> Option<MarkerKind> {
        if !self.attached {
            return None;
        }
        let candidates = [
            (MarkerKind::Arrow, &self.arrow_marker),
            (MarkerKind::Anchor, &self.anchor_marker),
        ];
        candidates.into_iter().find_map(|(kind, feature)| {
            let feature = feature.as_ref()?;
            let position = feature.geometry().point()?;
            let marker_pixel = map.pixel_from_coordinate(position);
            self.styles_for(feature)
                .iter()
                .any(|style| style.hit_test(marker_pixel, pixel))
                .then_some(kind)
        })
    }
}

fn marker(flag: &str, anchor: Point, factor: f64) -> Feature {
    Feature::with_attributes(
        Geometry::Point(anchor),
        [
            (flag, AttributeValue::Bool(true)),
            (FACTOR_KEY, AttributeValue::Number(factor)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::Cursor;
    use crate::style::default_style;

    struct Identity;

    impl MapView for Identity {
        fn pixel_from_coordinate(&self, coordinate: Point) -> Point {
            coordinate
        }

        fn feature_at_pixel(&self, _pixel: Point) -> Option<FeatureId> {
            None
        }

        fn cursor(&self) -> Cursor {
            Cursor::Default
        }

        fn set_cursor(&mut self, _cursor: Cursor) {}
    }

    #[test]
    fn sync_creates_then_updates() {
        let mut overlay = Overlay::new(default_style());
        assert!(overlay.features().is_empty());

        overlay.sync(Point::new(1.0, 2.0), 1.0);
        let anchor = overlay.anchor_marker().cloned().unwrap();
        assert!(anchor.flag(ANCHOR_KEY));
        assert!(overlay.arrow_marker().unwrap().flag(ARROW_KEY));
        assert_eq!(overlay.features().len(), 2);

        overlay.sync(Point::new(3.0, 4.0), 2.0);
        assert_eq!(overlay.anchor_marker(), Some(&anchor));
        assert_eq!(anchor.geometry().point(), Some(Point::new(3.0, 4.0)));
        assert_eq!(anchor.get(FACTOR_KEY), Some(AttributeValue::Number(2.0)));
    }

    #[test]
    fn set_position_to_same_point_is_a_no_op() {
        let mut overlay = Overlay::default();
        overlay.sync(Point::new(1.0, 1.0), 1.0);
        let anchor = overlay.anchor_marker().cloned().unwrap();
        let revision = anchor.revision();
        overlay.set_position(Point::new(1.0, 1.0));
        assert_eq!(anchor.revision(), revision);
    }

    #[test]
    fn clear_destroys_markers() {
        let mut overlay = Overlay::default();
        overlay.sync(Point::ZERO, 1.0);
        overlay.clear();
        assert!(overlay.anchor_marker().is_none());
        assert!(overlay.arrow_marker().is_none());
    }

    #[test]
    fn kind_of_identifies_markers() {
        let mut overlay = Overlay::default();
        overlay.sync(Point::ZERO, 1.0);
        let anchor = overlay.anchor_marker().unwrap().id();
        let arrow = overlay.arrow_marker().unwrap().id();
        assert_eq!(overlay.kind_of(anchor), Some(MarkerKind::Anchor));
        assert_eq!(overlay.kind_of(arrow), Some(MarkerKind::Arrow));
        assert_eq!(overlay.kind_of(Feature::new(Point::ZERO).id()), None);
    }

    #[test]
    fn hit_testing_requires_attachment() {
        let mut overlay = Overlay::default();
        overlay.sync(Point::new(100.0, 100.0), 1.0);
        assert_eq!(overlay.marker_at_pixel(&Identity, Point::new(100.0, 100.0)), None);

        overlay.set_attached(true);
        assert_eq!(
            overlay.marker_at_pixel(&Identity, Point::new(100.0, 100.0)),
            Some(MarkerKind::Anchor)
        );
        assert_eq!(
            overlay.marker_at_pixel(&Identity, Point::new(120.0, 80.0)),
            Some(MarkerKind::Arrow)
        );
        assert_eq!(overlay.marker_at_pixel(&Identity, Point::new(150.0, 150.0)), None);
    }
}
