// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor-plan projection
//!
//! Floor geometry is collected in 3D world space (Y-up). The plan keeps
//! world X as its first axis and world Z as its second, dropping height.
//! Outlines are a convex hull when the floor was sampled densely enough,
//! otherwise the bounding quadrilateral of the samples.

use crate::bounds::Aabb;
use nalgebra::Point3;
use roomscan_core::{FloorPlan, FloorPlanPoint, PlanOpening, RecognizedObject, WallSegment};
use rustc_hash::FxHashSet;

/// Project world-space points onto the floor plane: `(x, y, z) -> (x, z)`.
///
/// Input order is preserved.
pub fn project_to_plan(points: &[Point3<f32>]) -> Vec<FloorPlanPoint> {
    points
        .iter()
        .map(|p| FloorPlanPoint::new(p.x, p.z))
        .collect()
}

/// Axis-aligned quadrilateral around `points`, counter-clockwise from
/// `(minX, minY)`. `None` for an empty input.
pub fn bounding_quad(points: &[FloorPlanPoint]) -> Option<Vec<FloorPlanPoint>> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(vec![
        FloorPlanPoint::new(min_x, min_y),
        FloorPlanPoint::new(max_x, min_y),
        FloorPlanPoint::new(max_x, max_y),
        FloorPlanPoint::new(min_x, max_y),
    ])
}

#[inline]
fn cross(o: &FloorPlanPoint, a: &FloorPlanPoint, b: &FloorPlanPoint) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull (Andrew's monotone chain), counter-clockwise, without
/// collinear points. Returns fewer than 3 points for degenerate input.
pub fn convex_hull(points: &[FloorPlanPoint]) -> Vec<FloorPlanPoint> {
    let mut sorted: Vec<FloorPlanPoint> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<FloorPlanPoint> = Vec::with_capacity(sorted.len() * 2);

    // Lower hull
    for p in &sorted {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }

    // Upper hull
    let lower_len = hull.len() + 1;
    for p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }

    // Last point repeats the first
    hull.pop();
    hull
}

/// Number of distinct plan points (bitwise comparison)
fn distinct_count(points: &[FloorPlanPoint]) -> usize {
    points
        .iter()
        .map(|p| (p.x.to_bits(), p.y.to_bits()))
        .collect::<FxHashSet<_>>()
        .len()
}

/// Room outline from floor samples.
///
/// Uses the convex hull once at least `min_outline_points` distinct samples
/// exist and the hull is not degenerate; the bounding quadrilateral
/// otherwise. Empty input yields an empty outline.
pub fn outline(points: &[FloorPlanPoint], min_outline_points: usize) -> Vec<FloorPlanPoint> {
    if points.is_empty() {
        return Vec::new();
    }
    if distinct_count(points) >= min_outline_points.max(3) {
        let hull = convex_hull(points);
        if hull.len() >= 3 {
            return hull;
        }
    }
    bounding_quad(points).unwrap_or_default()
}

fn extent(points: &[FloorPlanPoint]) -> (f32, f32) {
    match bounding_quad(points) {
        Some(quad) => (quad[2].x - quad[0].x, quad[2].y - quad[0].y),
        None => (0.0, 0.0),
    }
}

/// Assemble a floor plan.
///
/// `fallback` (usually the merged mesh bounds) provides the footprint when
/// no floor samples were collected. Doors and windows among `objects` are
/// placed on the plan at their centroid.
pub fn build_floor_plan(
    points: &[FloorPlanPoint],
    objects: &[RecognizedObject],
    fallback: Option<&Aabb>,
    min_outline_points: usize,
) -> FloorPlan {
    let mut outline_points = outline(points, min_outline_points);

    if outline_points.is_empty() {
        if let Some(bounds) = fallback.filter(|b| b.is_valid()) {
            let corners = [
                FloorPlanPoint::new(bounds.min.x, bounds.min.z),
                FloorPlanPoint::new(bounds.max.x, bounds.max.z),
            ];
            outline_points = bounding_quad(&corners).unwrap_or_default();
        }
    }

    let walls = if outline_points.len() >= 2 {
        (0..outline_points.len())
            .map(|i| WallSegment {
                start: outline_points[i],
                end: outline_points[(i + 1) % outline_points.len()],
            })
            .collect()
    } else {
        Vec::new()
    };

    let openings = objects
        .iter()
        .filter(|o| o.label.is_opening())
        .map(|o| {
            let size = o.bounds.size();
            PlanOpening {
                label: o.label,
                position: FloorPlanPoint::new(o.centroid[0], o.centroid[2]),
                width: size[0].max(size[2]),
            }
        })
        .collect();

    let (width, length) = extent(&outline_points);

    FloorPlan {
        outline: outline_points,
        walls,
        openings,
        width,
        length,
    }
}
