//! Measurement toolbox controller.
//!
//! The controller owns the measuring state of one map: whether a distance or
//! area measurement is active, the shape currently being drawn, the two
//! floating tooltips, and the measurements committed so far. Drawing itself
//! is done by the host's mapping library, reached through [`DrawSurface`];
//! the library reports the draw lifecycle back by calling the `on_*`
//! methods.

use crate::format::{format_area, format_length, help_text};
use crate::geodesic::{line_length_projected, polygon_area_projected};
use chrono::{DateTime, Utc};
use flume::{Receiver, Sender};
use gisview_core::config::MeasurementOptions;
use gisview_core::types::{LonLat, MapCoord, Projection};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

/// Offset of the live measure tooltip, in pixels.
pub const MEASURE_TOOLTIP_OFFSET: (i32, i32) = (0, -15);

/// Offset of a measure tooltip once its shape is finished.
pub const STATIC_TOOLTIP_OFFSET: (i32, i32) = (0, -7);

/// Offset of the help tooltip from the pointer.
pub const HELP_TOOLTIP_OFFSET: (i32, i32) = (15, 0);

/// What is being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    Distance,
    Area,
}

impl MeasureKind {
    /// Geometry the draw interaction must produce for this kind.
    pub fn geometry(&self) -> GeometryKind {
        match self {
            MeasureKind::Distance => GeometryKind::LineString,
            MeasureKind::Area => GeometryKind::Polygon,
        }
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureKind::Distance => write!(f, "distance"),
            MeasureKind::Area => write!(f, "area"),
        }
    }
}

/// Geometry type of a draw interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    LineString,
    Polygon,
}

/// The two live overlays managed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayId {
    Help,
    Measure,
}

/// Anchor of a tooltip relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Positioning {
    BottomCenter,
    CenterLeft,
}

/// Visual style of a tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TooltipStyle {
    /// Pointer hint
    Help,
    /// Live value of the shape being drawn
    Measure,
    /// Frozen value of a finished shape
    Static,
}

/// Floating label attached to a map position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub text: String,
    pub position: Option<MapCoord>,
    pub offset: (i32, i32),
    pub positioning: Positioning,
    pub style: TooltipStyle,
    pub visible: bool,
}

impl Tooltip {
    fn measure() -> Self {
        Self {
            text: String::new(),
            position: None,
            offset: MEASURE_TOOLTIP_OFFSET,
            positioning: Positioning::BottomCenter,
            style: TooltipStyle::Measure,
            visible: true,
        }
    }

    fn help() -> Self {
        Self {
            text: String::new(),
            position: None,
            offset: HELP_TOOLTIP_OFFSET,
            positioning: Positioning::CenterLeft,
            style: TooltipStyle::Help,
            visible: false,
        }
    }
}

/// Host mapping library as seen by the controller.
///
/// Implementations translate these calls into the library's draw
/// interaction, overlay and vector source APIs.
pub trait DrawSurface {
    /// Projection of the map view; drawn coordinates are in this system.
    fn projection(&self) -> Projection;

    /// Adds a draw interaction producing `geometry` shapes.
    fn add_draw_interaction(&mut self, geometry: GeometryKind);

    /// Removes the draw interaction added last, if any.
    fn remove_draw_interaction(&mut self);

    /// Creates or updates one of the live overlays.
    fn show_overlay(&mut self, overlay: OverlayId, tooltip: &Tooltip);

    /// Removes one of the live overlays.
    fn hide_overlay(&mut self, overlay: OverlayId);

    /// Leaves a frozen label for a finished measurement on the map.
    fn pin_overlay(&mut self, measurement: Uuid, tooltip: &Tooltip);

    /// Removes every drawn measurement shape and pinned label.
    fn clear_measurements(&mut self);
}

/// Pointer movement over the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub coordinate: MapCoord,
    pub dragging: bool,
}

/// Shape being drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    pub geometry: GeometryKind,
    pub coords: Vec<MapCoord>,
}

/// Value of the shape currently being drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureResult {
    pub kind: MeasureKind,
    /// Meters for distances, square meters for areas
    pub value: f64,
    pub label: String,
}

/// A finished measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: Uuid,
    pub kind: MeasureKind,
    pub points: Vec<LonLat>,
    /// Meters for distances, square meters for areas
    pub value: f64,
    pub label: String,
    /// Where the frozen label is pinned
    pub anchor: Option<MapCoord>,
    pub completed_at: DateTime<Utc>,
}

/// Notification sent to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementEvent {
    Started { kind: MeasureKind },
    Updated(MeasureResult),
    Completed(Measurement),
    Stopped,
    Cleared,
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    Active {
        kind: MeasureKind,
        sketch: Option<Sketch>,
    },
}

/// Controller of the distance and area measurement tools.
pub struct MeasurementController<S: DrawSurface> {
    surface: S,
    options: MeasurementOptions,
    phase: Phase,
    measure_tooltip: Option<Tooltip>,
    help_tooltip: Option<Tooltip>,
    measurements: Vec<Measurement>,
    subscribers: Vec<Sender<MeasurementEvent>>,
}

impl<S: DrawSurface> MeasurementController<S> {
    /// Creates an idle controller drawing on `surface`.
    pub fn new(surface: S, options: MeasurementOptions) -> Self {
        Self {
            surface,
            options,
            phase: Phase::Idle,
            measure_tooltip: None,
            help_tooltip: None,
            measurements: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    /// Starts measuring distances, discarding previous measurements.
    pub fn start_measure_distance(&mut self) {
        self.start(MeasureKind::Distance);
    }

    /// Starts measuring areas, discarding previous measurements.
    pub fn start_measure_area(&mut self) {
        self.start(MeasureKind::Area);
    }

    fn start(&mut self, kind: MeasureKind) {
        self.reset();

        self.phase = Phase::Active { kind, sketch: None };
        self.surface.add_draw_interaction(kind.geometry());
        self.create_help_tooltip();
        self.create_measure_tooltip();

        info!(%kind, "Measurement started");
        self.broadcast(MeasurementEvent::Started { kind });
    }

    /// Leaves measuring mode. Finished measurements stay on the map.
    pub fn stop_measure(&mut self) {
        if self.halt() {
            info!("Measurement stopped");
            self.broadcast(MeasurementEvent::Stopped);
        }
    }

    /// Leaves measuring mode and removes every finished measurement.
    pub fn clear_measurements(&mut self) {
        self.stop_measure();
        self.surface.clear_measurements();
        self.measurements.clear();
        debug!("Measurements cleared");
        self.broadcast(MeasurementEvent::Cleared);
    }

    /// Stop and clear without notifying subscribers.
    fn reset(&mut self) {
        self.halt();
        self.surface.clear_measurements();
        self.measurements.clear();
    }

    /// Returns true if measuring mode was active.
    fn halt(&mut self) -> bool {
        let was_active = matches!(self.phase, Phase::Active { .. });
        if was_active {
            self.surface.remove_draw_interaction();
        }
        self.phase = Phase::Idle;
        self.remove_help_tooltip();
        self.remove_measure_tooltip();
        was_active
    }

    /// The draw interaction began a new shape.
    pub fn on_draw_start(&mut self, coords: Vec<MapCoord>) {
        let Phase::Active { kind, sketch } = &mut self.phase else {
            debug!("Draw start ignored while idle");
            return;
        };
        *sketch = Some(Sketch {
            geometry: kind.geometry(),
            coords,
        });
    }

    /// The shape being drawn changed.
    ///
    /// Geometries that do not match the active tool are ignored.
    pub fn on_geometry_change(&mut self, geometry: GeometryKind, coords: Vec<MapCoord>) {
        let projection = self.surface.projection();
        let Phase::Active {
            kind,
            sketch: Some(sketch),
        } = &mut self.phase
        else {
            debug!("Geometry change ignored without a sketch");
            return;
        };
        if geometry != kind.geometry() {
            debug!(?geometry, "Geometry change ignored for mismatched geometry");
            return;
        }

        sketch.coords = coords;
        let result = evaluate(*kind, &sketch.coords, projection, &self.options);

        if let Some(tooltip) = self.measure_tooltip.as_mut() {
            tooltip.text = result.label.clone();
            self.surface.show_overlay(OverlayId::Measure, tooltip);
        }

        self.broadcast(MeasurementEvent::Updated(result));
    }

    /// The draw interaction finished the current shape.
    pub fn on_draw_end(&mut self) {
        let projection = self.surface.projection();
        let Phase::Active { kind, sketch } = &mut self.phase else {
            debug!("Draw end ignored while idle");
            return;
        };
        let kind = *kind;
        let Some(finished) = sketch.take() else {
            debug!("Draw end ignored without a sketch");
            return;
        };

        let result = evaluate(kind, &finished.coords, projection, &self.options);
        let anchor = self
            .measure_tooltip
            .as_ref()
            .and_then(|t| t.position)
            .or_else(|| tooltip_anchor(&finished));

        let measurement = Measurement {
            id: Uuid::new_v4(),
            kind,
            points: finished
                .coords
                .iter()
                .map(|c| projection.unproject(*c))
                .collect(),
            value: result.value,
            label: result.label,
            anchor,
            completed_at: Utc::now(),
        };

        if let Some(mut tooltip) = self.measure_tooltip.take() {
            tooltip.text = measurement.label.clone();
            tooltip.position = anchor;
            tooltip.style = TooltipStyle::Static;
            tooltip.offset = STATIC_TOOLTIP_OFFSET;
            self.surface.pin_overlay(measurement.id, &tooltip);
        }
        self.create_measure_tooltip();

        info!(
            id = %measurement.id,
            kind = %kind,
            value = measurement.value,
            label = %measurement.label,
            "Measurement completed"
        );
        self.measurements.push(measurement.clone());
        self.broadcast(MeasurementEvent::Completed(measurement));
    }

    /// The pointer moved over the map.
    pub fn on_pointer_move(&mut self, event: PointerEvent) {
        if event.dragging {
            return;
        }
        let Phase::Active { kind, sketch } = &self.phase else {
            return;
        };
        let kind = *kind;

        if let Some(anchor) = sketch.as_ref().and_then(tooltip_anchor) {
            if let Some(tooltip) = self.measure_tooltip.as_mut() {
                tooltip.position = Some(anchor);
                self.surface.show_overlay(OverlayId::Measure, tooltip);
            }
        }

        if let Some(tooltip) = self.help_tooltip.as_mut() {
            tooltip.position = Some(event.coordinate);
            tooltip.visible = true;
            tooltip.text = help_text(kind == MeasureKind::Area, self.options.language).to_string();
            self.surface.show_overlay(OverlayId::Help, tooltip);
        }
    }

    fn create_measure_tooltip(&mut self) {
        let tooltip = Tooltip::measure();
        self.surface.show_overlay(OverlayId::Measure, &tooltip);
        self.measure_tooltip = Some(tooltip);
    }

    fn create_help_tooltip(&mut self) {
        let tooltip = Tooltip::help();
        self.surface.show_overlay(OverlayId::Help, &tooltip);
        self.help_tooltip = Some(tooltip);
    }

    fn remove_measure_tooltip(&mut self) {
        if self.measure_tooltip.take().is_some() {
            self.surface.hide_overlay(OverlayId::Measure);
        }
    }

    fn remove_help_tooltip(&mut self) {
        if self.help_tooltip.take().is_some() {
            self.surface.hide_overlay(OverlayId::Help);
        }
    }

    /// Registers a new listener for measurement events.
    pub fn subscribe(&mut self) -> Receiver<MeasurementEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn broadcast(&mut self, event: MeasurementEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns true while a measuring tool is active.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active { .. })
    }

    /// Returns the active tool, if any.
    pub fn kind(&self) -> Option<MeasureKind> {
        match self.phase {
            Phase::Active { kind, .. } => Some(kind),
            Phase::Idle => None,
        }
    }

    /// Returns the shape being drawn, if any.
    pub fn sketch(&self) -> Option<&Sketch> {
        match &self.phase {
            Phase::Active { sketch, .. } => sketch.as_ref(),
            Phase::Idle => None,
        }
    }

    /// Returns the value of the shape being drawn, if any.
    pub fn current_result(&self) -> Option<MeasureResult> {
        match &self.phase {
            Phase::Active {
                kind,
                sketch: Some(sketch),
            } => Some(evaluate(
                *kind,
                &sketch.coords,
                self.surface.projection(),
                &self.options,
            )),
            _ => None,
        }
    }

    /// Returns the finished measurements, oldest first.
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Returns the labels of the finished measurements, oldest first.
    pub fn formatted_results(&self) -> Vec<String> {
        self.measurements.iter().map(|m| m.label.clone()).collect()
    }

    pub fn measure_tooltip(&self) -> Option<&Tooltip> {
        self.measure_tooltip.as_ref()
    }

    pub fn help_tooltip(&self) -> Option<&Tooltip> {
        self.help_tooltip.as_ref()
    }

    pub fn options(&self) -> &MeasurementOptions {
        &self.options
    }

    /// Replaces the presentation options; applies to values computed afterwards.
    pub fn set_options(&mut self, options: MeasurementOptions) {
        self.options = options;
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

fn evaluate(
    kind: MeasureKind,
    coords: &[MapCoord],
    projection: Projection,
    options: &MeasurementOptions,
) -> MeasureResult {
    let (value, label) = match kind {
        MeasureKind::Distance => {
            let meters = line_length_projected(coords, projection);
            (meters, format_length(meters, options))
        }
        MeasureKind::Area => {
            let square_meters = polygon_area_projected(coords, projection);
            (square_meters, format_area(square_meters, options))
        }
    };
    MeasureResult { kind, value, label }
}

/// Tooltip position for a sketch: end of a line, inside a polygon.
fn tooltip_anchor(sketch: &Sketch) -> Option<MapCoord> {
    match sketch.geometry {
        GeometryKind::LineString => sketch.coords.last().copied(),
        GeometryKind::Polygon => interior_point(&sketch.coords),
    }
}

/// A point inside a ring: the middle of the widest span cut by the
/// horizontal line through the ring's vertical midpoint. Falls back to the
/// vertex average for degenerate rings.
fn interior_point(ring: &[MapCoord]) -> Option<MapCoord> {
    let first = ring.first()?;
    let (min_y, max_y) = ring
        .iter()
        .fold((first.y, first.y), |(lo, hi), c| (lo.min(c.y), hi.max(c.y)));
    let y = (min_y + max_y) / 2.0;

    let mut crossings: Vec<f64> = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .filter(|(a, b)| (a.y <= y) != (b.y <= y))
        .map(|(a, b)| a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y))
        .collect();
    crossings.sort_by(f64::total_cmp);

    let widest = crossings
        .chunks_exact(2)
        .max_by(|l, r| (l[1] - l[0]).total_cmp(&(r[1] - r[0])));

    match widest {
        Some(span) if span[1] > span[0] => Some(MapCoord::new((span[0] + span[1]) / 2.0, y)),
        _ => {
            let n = ring.len() as f64;
            let (sx, sy) = ring.iter().fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
            Some(MapCoord::new(sx / n, sy / n))
        }
    }
}
