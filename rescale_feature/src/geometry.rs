// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal vector geometry model used for rescale targets and markers.
//!
//! Geometries are plain coordinate containers in map units. Scaling is
//! expressed as an [`Affine`] applied to each vertex.
//!
//! ```
//! use kurbo::Point;
//! use rescale_feature::Geometry;
//!
//! let mut line = Geometry::LineString(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
//! line.scale(2.0, 2.0, Some(Point::new(5.0, 0.0)));
//! assert_eq!(
//!     line,
//!     Geometry::LineString(vec![Point::new(-5.0, 0.0), Point::new(15.0, 0.0)])
//! );
//! ```

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect};

/// A vector geometry in map coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// A single position.
    Point(Point),
    /// An unconnected set of positions.
    MultiPoint(Vec<Point>),
    /// A connected polyline.
    LineString(Vec<Point>),
    /// A polygon as a list of rings; the first ring is the exterior.
    Polygon(Vec<Vec<Point>>),
    /// A heterogeneous collection of geometries.
    Collection(Vec<Self>),
}

impl Geometry {
    /// Returns the position of a [`Geometry::Point`].
    #[must_use]
    pub fn point(&self) -> Option<Point> {
        match self {
            Self::Point(pt) => Some(*pt),
            _ => None,
        }
    }

    /// Moves a [`Geometry::Point`] to `pt`.
    ///
    /// Returns `false` and leaves the geometry untouched for other variants.
    pub fn set_point(&mut self, pt: Point) -> bool {
        match self {
            Self::Point(current) => {
                *current = pt;
                true
            }
            _ => false,
        }
    }

    /// Returns the bounding extent, or `None` for an empty geometry.
    #[must_use]
    pub fn extent(&self) -> Option<Rect> {
        let mut extent: Option<Rect> = None;
        self.for_each_point(&mut |pt| {
            extent = Some(match extent {
                Some(rect) => rect.union_pt(pt),
                None => Rect::from_points(pt, pt),
            });
        });
        extent
    }

    /// Scales the geometry by `sx`/`sy` about `anchor`.
    ///
    /// Without an anchor the geometry pivots on the center of its own extent.
    pub fn scale(&mut self, sx: f64, sy: f64, anchor: Option<Point>) {
        let Some(pivot) = anchor.or_else(|| self.extent().map(|rect| rect.center())) else {
            return;
        };
        let pivot = pivot.to_vec2();
        let transform =
            Affine::translate(pivot) * Affine::scale_non_uniform(sx, sy) * Affine::translate(-pivot);
        self.apply_affine(transform);
    }

    /// Applies `transform` to every vertex.
    pub fn apply_affine(&mut self, transform: Affine) {
        self.for_each_point_mut(&mut |pt| *pt = transform * *pt);
    }

    fn for_each_point(&self, f: &mut impl FnMut(Point)) {
        match self {
            Self::Point(pt) => f(*pt),
            Self::MultiPoint(points) | Self::LineString(points) => {
                points.iter().copied().for_each(f);
            }
            Self::Polygon(rings) => {
                for ring in rings {
                    ring.iter().copied().for_each(&mut *f);
                }
            }
            Self::Collection(children) => {
                for child in children {
                    child.for_each_point(&mut *f);
                }
            }
        }
    }

    fn for_each_point_mut(&mut self, f: &mut impl FnMut(&mut Point)) {
        match self {
            Self::Point(pt) => f(pt),
            Self::MultiPoint(points) | Self::LineString(points) => {
                points.iter_mut().for_each(f);
            }
            Self::Polygon(rings) => {
                for ring in rings {
                    ring.iter_mut().for_each(&mut *f);
                }
            }
            Self::Collection(children) => {
                for child in children {
                    child.for_each_point_mut(&mut *f);
                }
            }
        }
    }
}

impl From<Point> for Geometry {
    fn from(pt: Point) -> Self {
        Self::Point(pt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn point_extent_is_degenerate_rect() {
        let geom = Geometry::Point(Point::new(3.0, 4.0));
        assert_eq!(geom.extent(), Some(Rect::new(3.0, 4.0, 3.0, 4.0)));
    }

    #[test]
    fn empty_geometry_has_no_extent() {
        assert_eq!(Geometry::LineString(vec![]).extent(), None);
        assert_eq!(Geometry::Collection(vec![]).extent(), None);
    }

    #[test]
    fn collection_extent_covers_children() {
        let geom = Geometry::Collection(vec![
            Geometry::Point(Point::new(-5.0, 2.0)),
            Geometry::Polygon(vec![vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(4.0, 8.0),
                Point::new(0.0, 0.0),
            ]]),
        ]);
        assert_eq!(geom.extent(), Some(Rect::new(-5.0, 0.0, 4.0, 8.0)));
    }

    #[test]
    fn scale_about_anchor() {
        let mut geom = Geometry::Point(Point::new(10.0, 10.0));
        geom.scale(2.0, 2.0, Some(Point::ZERO));
        assert_eq!(geom.point(), Some(Point::new(20.0, 20.0)));
    }

    #[test]
    fn scale_without_anchor_uses_extent_center() {
        let mut geom = Geometry::MultiPoint(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        geom.scale(3.0, 1.0, None);
        assert_eq!(
            geom,
            Geometry::MultiPoint(vec![Point::new(-10.0, 0.0), Point::new(20.0, 0.0)])
        );
    }

    #[test]
    fn negative_scale_mirrors_through_anchor() {
        let mut geom = Geometry::Point(Point::new(12.0, 7.0));
        geom.scale(-1.0, -1.0, Some(Point::new(10.0, 5.0)));
        assert_eq!(geom.point(), Some(Point::new(8.0, 3.0)));
    }

    #[test]
    fn set_point_only_applies_to_points() {
        let mut pt = Geometry::Point(Point::ZERO);
        assert!(pt.set_point(Point::new(1.0, 2.0)));
        assert_eq!(pt.point(), Some(Point::new(1.0, 2.0)));

        let mut line = Geometry::LineString(vec![Point::ZERO]);
        assert!(!line.set_point(Point::new(1.0, 2.0)));
        assert_eq!(line, Geometry::LineString(vec![Point::ZERO]));
    }
}
