//! Reaction throw trajectories.
//!
//! Presentation-only data: clients animate a thrown reaction from an origin
//! just outside the viewport towards the target. Coordinates are percentages
//! of the viewport, so `(0, 0)` is the top-left corner and `(100, 100)` the
//! bottom-right one.

use rand::Rng;
use serde::Serialize;

/// Distance outside the viewport at which reactions spawn (percent)
const OFFSCREEN_MARGIN: f64 = 10.0;

const MIN_SPEED: f64 = 0.8;
const MAX_SPEED: f64 = 1.6;

/// Viewport edge a reaction enters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trajectory {
    pub edge: Edge,
    pub origin: Point,
    /// Spin angle in degrees, `[0, 360)`
    pub angle: f64,
    /// Relative animation speed
    pub speed: f64,
}

impl Trajectory {
    /// Uniformly pick an edge, then a uniform position along it.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let edge = Edge::ALL[rng.gen_range(0..Edge::ALL.len())];
        let along = rng.gen_range(0.0..=100.0);
        let origin = match edge {
            Edge::Top => Point {
                x: along,
                y: -OFFSCREEN_MARGIN,
            },
            Edge::Bottom => Point {
                x: along,
                y: 100.0 + OFFSCREEN_MARGIN,
            },
            Edge::Left => Point {
                x: -OFFSCREEN_MARGIN,
                y: along,
            },
            Edge::Right => Point {
                x: 100.0 + OFFSCREEN_MARGIN,
                y: along,
            },
        };
        Self {
            edge,
            origin,
            angle: rng.gen_range(0.0..360.0),
            speed: rng.gen_range(MIN_SPEED..=MAX_SPEED),
        }
    }

    /// Whether the origin lies outside the visible viewport.
    pub fn is_offscreen(&self) -> bool {
        let Point { x, y } = self.origin;
        !(0.0..=100.0).contains(&x) || !(0.0..=100.0).contains(&y)
    }
}
