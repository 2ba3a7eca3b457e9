// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted rescale gesture.
//!
//! Drives a `RescaleInteraction` through an in-memory map: a hover, a feature
//! drag, an anchor drag, then a host-side deselection through a shared
//! handle to the feature set. Lifecycle events and geometry are printed;
//! library logs go through `tracing`.
//!
//! Run:
//! - `RUST_LOG=rescale_feature=trace cargo run -p rescale_demos`

use kurbo::{Affine, Point};
use rescale_feature::{
    Cursor, Feature, FeatureId, Geometry, MapId, MapPointerEvent, MapView, PointerEventKind,
    PointerInteraction, RescaleConfig, RescaleEventType, RescaleInteraction,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// An 800×600 px view, 2 map units per pixel, centered on the origin.
struct DemoMap {
    layer: Vec<Feature>,
    cursor: Cursor,
    world_to_view: Affine,
}

impl DemoMap {
    fn new(layer: Vec<Feature>) -> Self {
        Self {
            layer,
            cursor: Cursor::Default,
            world_to_view: Affine::new([0.5, 0.0, 0.0, -0.5, 400.0, 300.0]),
        }
    }

    fn event(&self, kind: PointerEventKind, coordinate: Point) -> MapPointerEvent {
        MapPointerEvent::new(kind, self.pixel_from_coordinate(coordinate), coordinate)
    }
}

impl MapView for DemoMap {
    fn pixel_from_coordinate(&self, coordinate: Point) -> Point {
        self.world_to_view * coordinate
    }

    fn feature_at_pixel(&self, pixel: Point) -> Option<FeatureId> {
        self.layer
            .iter()
            .rev()
            .find(|feature| match &*feature.geometry() {
                Geometry::Point(p) => self.pixel_from_coordinate(*p).distance(pixel) <= 6.0,
                other => other
                    .extent()
                    .is_some_and(|rect| rect.contains(self.world_to_view.inverse() * pixel)),
            })
            .map(Feature::id)
    }

    fn cursor(&self) -> Cursor {
        self.cursor.clone()
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        if cursor != self.cursor {
            info!(?cursor, "cursor");
        }
        self.cursor = cursor;
    }
}

fn describe(feature: &Feature) -> String {
    match feature.extent() {
        Some(rect) => format!(
            "#{} ({:.1}, {:.1})..({:.1}, {:.1})",
            feature.id().get(),
            rect.x0,
            rect.y0,
            rect.x1,
            rect.y1
        ),
        None => format!("#{} (empty)", feature.id().get()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let marker = Feature::new(Point::new(100.0, 100.0));
    let parcel = Feature::new(Geometry::Polygon(vec![vec![
        Point::new(-100.0, -100.0),
        Point::new(0.0, -100.0),
        Point::new(0.0, 0.0),
        Point::new(-100.0, 0.0),
        Point::new(-100.0, -100.0),
    ]]));
    let mut map = DemoMap::new(vec![marker.clone(), parcel.clone()]);

    let config: RescaleConfig =
        serde_json::from_str(r#"{ "factor": "1", "allowAnchorMovement": true }"#)?;
    let options = config
        .into_options()?
        .features([marker.clone(), parcel.clone()]);
    let mut rescale = RescaleInteraction::new(options)?;
    rescale.set_map(Some(MapId(1)));

    for kind in [
        RescaleEventType::Start,
        RescaleEventType::Rescaling,
        RescaleEventType::End,
    ] {
        rescale.on(kind, |event| {
            let members: Vec<_> = event.features().iter().map(|f| describe(&f)).collect();
            println!(
                "{:>12}  factor={:.3}  anchor={:?}  {}",
                event.event_type(),
                event.factor(),
                event.anchor(),
                members.join("  ")
            );
        });
    }

    let anchor = rescale.anchor().unwrap_or(Point::ZERO);
    println!("anchor starts at {anchor:?}");

    let script = [
        // Hover the marker, then pull it away from the anchor.
        (PointerEventKind::Move, Point::new(100.0, 100.0)),
        (PointerEventKind::Down, Point::new(100.0, 100.0)),
        (PointerEventKind::Drag, Point::new(130.0, 130.0)),
        (PointerEventKind::Drag, Point::new(150.0, 150.0)),
        (PointerEventKind::Up, Point::new(150.0, 150.0)),
    ];
    for (kind, coordinate) in script {
        let event = map.event(kind, coordinate);
        rescale.handle_event(&mut map, &event);
    }

    // Move the pivot by dragging the anchor marker.
    let pivot = rescale.anchor().unwrap_or(Point::ZERO);
    for (kind, coordinate) in [
        (PointerEventKind::Down, pivot),
        (PointerEventKind::Drag, Point::new(-100.0, -100.0)),
        (PointerEventKind::Up, Point::new(-100.0, -100.0)),
    ] {
        let event = map.event(kind, coordinate);
        rescale.handle_event(&mut map, &event);
    }
    println!("anchor moved to {:?}", rescale.anchor());

    for feature in rescale.features() {
        println!("final {}", describe(&feature));
    }

    // A host selection shares the set; deselecting resets factor and anchor.
    let selection = rescale.features().clone();
    selection.remove(parcel.id());
    println!(
        "after deselect: factor={:.3} anchor={:?}",
        rescale.factor(),
        rescale.anchor()
    );
    for marker in rescale.overlay().features() {
        let styles = rescale.overlay().styles_for(&marker);
        let label = styles
            .iter()
            .find_map(|style| style.text.as_ref().and_then(|text| text.text.clone()));
        println!("overlay {} label={label:?}", describe(&marker));
    }
    Ok(())
}
