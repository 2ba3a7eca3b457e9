// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render styles for the overlay markers.
//!
//! Styles are plain data for the host renderer. They also define where a
//! marker can be grabbed: [`MarkerStyle::hit_test`] checks a pixel against the
//! marker symbol and its text label.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Vec2};
use peniko::Color;

use crate::feature::Feature;
use crate::overlay::{ANCHOR_KEY, ARROW_KEY, FACTOR_KEY};

/// Extra pixels accepted around a marker symbol.
pub const HIT_TOLERANCE: f64 = 1.0;

/// Radius, in pixels, of the grab area around a text label's anchor point.
pub const TEXT_HIT_RADIUS: f64 = 8.0;

/// A stroke color and width in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f64,
}

/// A regular polygon (or circle when `points` is zero) drawn at the marker position.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeStyle {
    /// Number of vertices; `0` draws a circle.
    pub points: u32,
    /// Circumradius in pixels.
    pub radius: f64,
    /// Fill color.
    pub fill: Option<Color>,
    /// Outline.
    pub stroke: Option<StrokeStyle>,
}

/// A text label drawn next to the marker.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Label content; nothing is drawn when `None`.
    pub text: Option<String>,
    /// CSS-like font description.
    pub font: String,
    /// Offset from the marker position, in pixels.
    pub offset: Vec2,
    /// Glyph fill.
    pub fill: Option<Color>,
    /// Glyph halo.
    pub stroke: Option<StrokeStyle>,
}

/// One render layer of a marker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerStyle {
    /// Symbol at the marker position.
    pub image: Option<ShapeStyle>,
    /// Label next to the marker.
    pub text: Option<TextStyle>,
    /// Stacking order; `i32::MAX` keeps the marker above everything.
    pub z_index: Option<i32>,
}

impl MarkerStyle {
    /// Returns `true` if `pixel` falls on this style rendered at `marker_pixel`.
    #[must_use]
    pub fn hit_test(&self, marker_pixel: Point, pixel: Point) -> bool {
        if let Some(image) = &self.image {
            let half_stroke = image.stroke.as_ref().map_or(0.0, |s| s.width / 2.0);
            if marker_pixel.distance(pixel) <= image.radius + half_stroke + HIT_TOLERANCE {
                return true;
            }
        }
        if let Some(text) = &self.text {
            if text.text.as_deref().is_some_and(|t| !t.is_empty())
                && (marker_pixel + text.offset).distance(pixel) <= TEXT_HIT_RADIUS
            {
                return true;
            }
        }
        false
    }
}

/// Feature → styles callback.
pub type StyleFunction = Box<dyn Fn(&Feature) -> Vec<MarkerStyle>>;

/// Styles applied to the overlay markers.
pub enum OverlayStyle {
    /// The same styles for every marker.
    Static(Vec<MarkerStyle>),
    /// Styles computed per marker.
    Function(StyleFunction),
}

impl OverlayStyle {
    /// Wraps a style callback.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Feature) -> Vec<MarkerStyle> + 'static,
    {
        Self::Function(Box::new(f))
    }

    /// Resolves the styles for `feature`.
    #[must_use]
    pub fn styles_for(&self, feature: &Feature) -> Vec<MarkerStyle> {
        match self {
            Self::Static(styles) => styles.clone(),
            Self::Function(f) => f(feature),
        }
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        default_style()
    }
}

impl From<MarkerStyle> for OverlayStyle {
    fn from(style: MarkerStyle) -> Self {
        Self::Static(vec![style])
    }
}

impl From<Vec<MarkerStyle>> for OverlayStyle {
    fn from(styles: Vec<MarkerStyle>) -> Self {
        Self::Static(styles)
    }
}

// Manual Debug impl since style functions aren't Debug
impl fmt::Debug for OverlayStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(styles) => f.debug_tuple("Static").field(styles).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

fn blue() -> Color {
    Color::from_rgba8(0, 153, 255, 204)
}

fn white() -> Color {
    Color::from_rgba8(255, 255, 255, 204)
}

/// Style of the anchor marker: a small blue hexagon.
#[must_use]
pub fn anchor_style() -> MarkerStyle {
    MarkerStyle {
        image: Some(ShapeStyle {
            points: 6,
            radius: 4.0,
            fill: Some(blue()),
            stroke: Some(StrokeStyle {
                color: blue(),
                width: 1.0,
            }),
        }),
        text: None,
        z_index: Some(i32::MAX),
    }
}

/// Style of the arrow marker: a label showing `factor`, offset up and right.
#[must_use]
pub fn arrow_style(factor: f64) -> MarkerStyle {
    MarkerStyle {
        image: None,
        text: Some(TextStyle {
            text: Some(format!("{factor:.2}x")),
            font: "12px sans-serif".into(),
            offset: Vec2::new(20.0, -20.0),
            fill: Some(Color::from_rgba8(0, 0, 255, 255)),
            stroke: Some(StrokeStyle {
                color: white(),
                width: 3.0,
            }),
        }),
        z_index: Some(i32::MAX),
    }
}

/// The style function used when no override is configured.
#[must_use]
pub fn default_style() -> OverlayStyle {
    OverlayStyle::function(|feature| {
        if feature.flag(ANCHOR_KEY) {
            vec![anchor_style()]
        } else if feature.flag(ARROW_KEY) {
            let factor = feature
                .get(FACTOR_KEY)
                .and_then(|value| value.as_number())
                .unwrap_or(1.0);
            vec![arrow_style(factor)]
        } else {
            Vec::new()
        }
    })
}
