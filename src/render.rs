//! Smoothed rendering of captured strokes.
//!
//! Every stroke is converted back to the current view-space and drawn as a chain of quadratic
//! curves: each sample is the control point of a curve that ends halfway to the next sample.

use crate::{
    capture::{Snapshot, Stroke},
    math::{lerp, midpoint, Vec2f},
    path::PathBuilder,
    viewport::CoordinateTransform,
};

/// Upper bound on the number of line segments a single quadratic is flattened into.
const MAX_SUBDIVISIONS: u32 = 64;

/// Upper bound on the number of impressions [`stamp`] places along one polyline.
const MAX_STAMPS: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadSegment {
    pub ctrl: Vec2f,
    pub end: Vec2f,
}

/// A view-space curve produced from one stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub start: Vec2f,
    pub segments: Vec<QuadSegment>,
}

impl Curve {
    pub fn apply_to<B: PathBuilder + ?Sized>(&self, builder: &mut B) {
        builder.move_to(self.start);
        for seg in &self.segments {
            builder.quad_to(seg.ctrl, seg.end);
        }
    }

    /// Approximates the curve with a polyline that deviates from it by at most `tolerance`.
    pub fn flatten(&self, tolerance: f32) -> Vec<Vec2f> {
        let tolerance = tolerance.max(1e-3);
        let mut points = vec![self.start];
        let mut from = self.start;
        for seg in &self.segments {
            // The chord error of a quadratic split into `n` pieces is |p0 - 2c + p1| / (4n²).
            let dd = (from - seg.ctrl * 2.0 + seg.end).length();
            let n = ((dd / (4.0 * tolerance)).sqrt().ceil() as u32).clamp(1, MAX_SUBDIVISIONS);
            for i in 1..n {
                let t = i as f32 / n as f32;
                points.push(lerp(lerp(from..=seg.ctrl, t)..=lerp(seg.ctrl..=seg.end, t), t));
            }
            points.push(seg.end);
            from = seg.end;
        }
        points
    }
}

/// Renders every stroke in `snapshot` with at least two points, in paint order.
///
/// Returns nothing while `transform` is not ready, or if any of its lookups fail.
pub fn render<T>(transform: &T, snapshot: &Snapshot) -> Vec<Curve>
where
    T: CoordinateTransform + ?Sized,
{
    if !transform.is_ready() {
        return Vec::new();
    }
    let curves: Option<Vec<Curve>> = snapshot
        .iter()
        .filter(|stroke| stroke.len() >= 2)
        .map(|stroke| render_stroke(transform, stroke))
        .collect();
    curves.unwrap_or_default()
}

fn render_stroke<T>(transform: &T, stroke: &Stroke) -> Option<Curve>
where
    T: CoordinateTransform + ?Sized,
{
    let (first, rest) = stroke.points().split_first()?;
    let mut prev = transform.source_to_view(*first)?;
    let mut curve = Curve {
        start: prev,
        segments: Vec::with_capacity(rest.len()),
    };
    for &point in rest {
        let curr = transform.source_to_view(point)?;
        curve.segments.push(QuadSegment {
            ctrl: prev,
            end: midpoint(prev, curr),
        });
        prev = curr;
    }
    Some(curve)
}

/// Places brush impressions along a polyline, `spacing` apart, starting at its first point.
pub fn stamp(points: &[Vec2f], spacing: f32) -> Vec<Vec2f> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };
    let mut stamps = vec![first];
    if spacing.is_nan() || spacing <= 0.0 {
        return stamps;
    }

    let mut last = first;
    for &point in rest {
        // Step towards `point` until it is closer than `spacing` to the last impression.
        loop {
            let dist = (point - last).length();
            if dist < spacing || stamps.len() >= MAX_STAMPS {
                break;
            }
            last = lerp(last..=point, spacing / dist);
            stamps.push(last);
        }
    }
    stamps
}
