//! Cubic Bezier evaluation and arc-length resampling.
//!
//! Roads are chains of cubic segments laid out as
//! `anchor, out-handle, in-handle, anchor, ...`. This module provides the
//! per-segment primitives ([`CubicSegment`]) and the resampler that turns a
//! whole chain into evenly spaced [`OrientedPoint`]s.
//!
//! # Orientation
//!
//! Every anchor carries an authored up vector. Between anchors the up vector
//! is carried along by repeatedly projecting it onto the plane perpendicular
//! to the local tangent. Once a segment is sampled, the remaining twist
//! between the carried vector and the next anchor's authored vector is spread
//! across that segment's samples in proportion to the arc length travelled,
//! so each anchor is met exactly without a visible snap.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Up direction used when nothing better is known.
pub const WORLD_UP: DVec3 = DVec3::Y;

/// Forward direction used for degenerate curves.
pub const WORLD_FORWARD: DVec3 = DVec3::Z;

/// Newton iterations used by [`CubicSegment::invert`].
const INVERT_ITERATIONS: usize = 100;

/// Samples closer than this are treated as the same point.
pub const DUPLICATE_EPSILON: f64 = 1e-6;

/// Single cubic Bezier segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub p0: DVec3,
    pub p1: DVec3,
    pub p2: DVec3,
    pub p3: DVec3,
}

impl CubicSegment {
    pub fn new(p0: DVec3, p1: DVec3, p2: DVec3, p3: DVec3) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Position at `t`. `t` is not clamped, so callers may extrapolate.
    pub fn evaluate(&self, t: f64) -> DVec3 {
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let t2 = t * t;
        self.p0 * (mt2 * mt) + self.p1 * (3.0 * mt2 * t) + self.p2 * (3.0 * mt * t2)
            + self.p3 * (t2 * t)
    }

    /// First derivative (unnormalised tangent) at `t`.
    pub fn derivative(&self, t: f64) -> DVec3 {
        let mt = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * mt * mt)
            + (self.p2 - self.p1) * (6.0 * mt * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    /// Second derivative at `t`.
    pub fn second_derivative(&self, t: f64) -> DVec3 {
        (self.p2 - self.p1 * 2.0 + self.p0) * (6.0 * (1.0 - t))
            + (self.p3 - self.p2 * 2.0 + self.p1) * (6.0 * t)
    }

    /// Approximate the parameter of the point on the curve closest to `point`.
    ///
    /// Newton-Raphson on `dot(evaluate(t) - point, derivative(t)) = 0`, seeded
    /// at `t = 0.5`. The result is neither clamped nor guaranteed to be the
    /// global minimum: on gently curved segments it converges to well within
    /// `1e-4`, but sharply folded control polygons can settle on a local
    /// extremum. Callers that need a point on the segment should clamp the
    /// result and compare against the endpoints.
    pub fn invert(&self, point: DVec3) -> f64 {
        let mut t = 0.5;
        for _ in 0..INVERT_ITERATIONS {
            let offset = self.evaluate(t) - point;
            let tangent = self.derivative(t);
            let gradient = offset.dot(tangent);
            if gradient == 0.0 {
                break;
            }
            let slope = tangent.length_squared() + offset.dot(self.second_derivative(t));
            if slope == 0.0 {
                break;
            }
            let next = t - gradient / slope;
            if !next.is_finite() {
                break;
            }
            t = next;
        }
        t
    }

    /// De Casteljau split at `t`.
    ///
    /// Returns seven points: the left segment is `[0..4]`, the right segment
    /// is `[3..7]`, and index 3 is the shared point `evaluate(t)`.
    pub fn subdivide(&self, t: f64) -> [DVec3; 7] {
        let q0 = self.p0.lerp(self.p1, t);
        let q1 = self.p1.lerp(self.p2, t);
        let q2 = self.p2.lerp(self.p3, t);
        let r0 = q0.lerp(q1, t);
        let r1 = q1.lerp(q2, t);
        let split = r0.lerp(r1, t);
        [self.p0, q0, r0, split, r1, q2, self.p3]
    }

    /// Split into the two sub-segments produced by [`Self::subdivide`].
    pub fn split(&self, t: f64) -> (CubicSegment, CubicSegment) {
        let [a, b, c, d, e, f, g] = self.subdivide(t);
        (CubicSegment::new(a, b, c, d), CubicSegment::new(d, e, f, g))
    }

    /// Sum of the three control polygon edges.
    pub fn control_polygon_length(&self) -> f64 {
        self.p0.distance(self.p1) + self.p1.distance(self.p2) + self.p2.distance(self.p3)
    }

    /// Cheap length estimate: chord plus half the control polygon.
    pub fn estimated_length(&self) -> f64 {
        self.p0.distance(self.p3) + 0.5 * self.control_polygon_length()
    }

    /// Number of sub-steps walked when sampling at `resolution`.
    pub fn subdivisions(&self, resolution: f64) -> usize {
        let steps = (self.estimated_length() * resolution * 10.0).ceil();
        if steps.is_finite() && steps >= 1.0 {
            steps as usize
        } else {
            1
        }
    }

    /// Polyline arc length from `t = 0` to `t`, walking the same sub-steps the
    /// resampler uses so the result agrees with sampled distances.
    pub fn arc_length_to(&self, t: f64, resolution: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let divisions = self.subdivisions(resolution);
        let mut previous = self.p0;
        let mut length = 0.0;
        for i in 1..=divisions {
            let ti = i as f64 / divisions as f64;
            if ti >= t {
                return length + previous.distance(self.evaluate(t));
            }
            let point = self.evaluate(ti);
            length += previous.distance(point);
            previous = point;
        }
        length
    }

    /// Polyline arc length of the whole segment at `resolution`.
    pub fn arc_length(&self, resolution: f64) -> f64 {
        self.arc_length_to(1.0, resolution)
    }

    /// Exact axis-aligned bounds, including interior extrema.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::from_point(self.p0);
        bounds.include(self.p3);

        let p0 = self.p0.to_array();
        let p1 = self.p1.to_array();
        let p2 = self.p2.to_array();
        let p3 = self.p3.to_array();
        for axis in 0..3 {
            // derivative / 3 = a t^2 + b t + c
            let a = -p0[axis] + 3.0 * p1[axis] - 3.0 * p2[axis] + p3[axis];
            let b = 2.0 * (p0[axis] - 2.0 * p1[axis] + p2[axis]);
            let c = p1[axis] - p0[axis];
            for t in quadratic_roots(a, b, c).into_iter().flatten() {
                if t > 0.0 && t < 1.0 {
                    bounds.include(self.evaluate(t));
                }
            }
        }
        bounds
    }

    /// Unit direction at the start, tolerating coincident leading points.
    fn start_direction(&self) -> DVec3 {
        self.derivative(0.0)
            .try_normalize()
            .or_else(|| (self.p2 - self.p0).try_normalize())
            .or_else(|| (self.p3 - self.p0).try_normalize())
            .unwrap_or(WORLD_FORWARD)
    }
}

fn quadratic_roots(a: f64, b: f64, c: f64) -> [Option<f64>; 2] {
    const EPS: f64 = 1e-12;
    if a.abs() < EPS {
        if b.abs() < EPS {
            return [None, None];
        }
        return [Some(-c / b), None];
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return [None, None];
    }
    let root = discriminant.sqrt();
    [
        Some((-b + root) / (2.0 * a)),
        Some((-b - root) / (2.0 * a)),
    ]
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn from_point(point: DVec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn include(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min - DVec3::splat(DUPLICATE_EPSILON)).all()
            && point.cmple(self.max + DVec3::splat(DUPLICATE_EPSILON)).all()
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

/// Sample carrying position plus an orthogonal forward/up frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedPoint {
    pub position: DVec3,
    pub forward: DVec3,
    pub up: DVec3,
}

impl OrientedPoint {
    pub fn new(position: DVec3, forward: DVec3, up: DVec3) -> Self {
        Self {
            position,
            forward,
            up,
        }
    }

    /// Same sample travelled in the opposite direction.
    pub fn reversed(self) -> Self {
        Self {
            forward: -self.forward,
            ..self
        }
    }
}

/// Evenly spaced resampling of a cubic chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampledCurve {
    points: Vec<OrientedPoint>,
    distances: Vec<f64>,
    segment_lengths: Vec<f64>,
    segment_bounds: Vec<Aabb>,
    bounds: Aabb,
}

impl SampledCurve {
    pub fn points(&self) -> &[OrientedPoint] {
        &self.points
    }

    /// Arc length from the start of the curve to each sample.
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Polyline length of each cubic segment.
    pub fn segment_lengths(&self) -> &[f64] {
        &self.segment_lengths
    }

    pub fn segment_bounds(&self) -> &[Aabb] {
        &self.segment_bounds
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&OrientedPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&OrientedPoint> {
        self.points.last()
    }

    /// Interpolated sample at arc length `distance`, clamped to the curve.
    pub fn point_at_distance(&self, distance: f64) -> OrientedPoint {
        let distance = distance.clamp(0.0, self.length());
        let upper = self.distances.partition_point(|d| *d < distance);
        if upper == 0 {
            return self.points[0];
        }
        if upper >= self.points.len() {
            return self.points[self.points.len() - 1];
        }

        let a = &self.points[upper - 1];
        let b = &self.points[upper];
        let span = self.distances[upper] - self.distances[upper - 1];
        let fraction = if span > 0.0 {
            (distance - self.distances[upper - 1]) / span
        } else {
            0.0
        };

        OrientedPoint {
            position: a.position.lerp(b.position, fraction),
            forward: a.forward.lerp(b.forward, fraction).try_normalize().unwrap_or(a.forward),
            up: a.up.lerp(b.up, fraction).try_normalize().unwrap_or(a.up),
        }
    }

    /// Indices of samples strictly between `low` and `high` arc length.
    pub fn indices_between(&self, low: f64, high: f64) -> std::ops::Range<usize> {
        let start = self.distances.partition_point(|d| *d <= low);
        let end = self.distances.partition_point(|d| *d < high);
        start..end.max(start)
    }
}

/// Resample a cubic chain every `spacing` units of arc length.
///
/// `control_points` holds `3n + 1` points and `normals` one up vector per
/// anchor (`n + 1`). `resolution` scales the sub-steps walked per segment.
/// The first and last samples are always the authored first and last anchor
/// position and normal. A single control point yields a single sample.
pub fn evenly_spaced_points(
    control_points: &[DVec3],
    normals: &[DVec3],
    spacing: f64,
    resolution: f64,
) -> Result<SampledCurve> {
    if control_points.is_empty() || control_points.len() % 3 != 1 {
        return Err(Error::InvalidControlPointCount {
            count: control_points.len(),
        });
    }
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(Error::InvalidSpacing { spacing });
    }
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(Error::InvalidResolution { resolution });
    }
    let segment_count = (control_points.len() - 1) / 3;
    if normals.len() != segment_count + 1 {
        return Err(Error::CurveNormalCount {
            expected: segment_count + 1,
            actual: normals.len(),
        });
    }

    let first_position = control_points[0];
    if segment_count == 0 {
        return Ok(SampledCurve {
            points: vec![OrientedPoint::new(first_position, WORLD_FORWARD, normals[0])],
            distances: vec![0.0],
            segment_lengths: Vec::new(),
            segment_bounds: Vec::new(),
            bounds: Aabb::from_point(first_position),
        });
    }

    let segment = |index: usize| {
        let base = index * 3;
        CubicSegment::new(
            control_points[base],
            control_points[base + 1],
            control_points[base + 2],
            control_points[base + 3],
        )
    };

    let mut forward = segment(0).start_direction();
    let mut points = vec![OrientedPoint::new(first_position, forward, normals[0])];
    let mut distances = vec![0.0];
    let mut segment_lengths = Vec::with_capacity(segment_count);
    let mut segment_bounds = Vec::with_capacity(segment_count);
    let mut bounds = Aabb::from_point(first_position);

    let mut previous = first_position;
    let mut since_last = 0.0;
    let mut travelled = 0.0;

    for index in 0..segment_count {
        let cubic = segment(index);
        let cubic_bounds = cubic.bounds();
        bounds = bounds.union(&cubic_bounds);
        segment_bounds.push(cubic_bounds);

        let segment_start = travelled;
        let first_sample = points.len();
        let mut up = normals[index];
        let divisions = cubic.subdivisions(resolution);

        for step in 1..=divisions {
            let t = step as f64 / divisions as f64;
            let position = cubic.evaluate(t);
            forward = cubic.derivative(t).try_normalize().unwrap_or(forward);
            up = perpendicular_to(up, forward);

            let travelled_step = previous.distance(position);
            travelled += travelled_step;
            since_last += travelled_step;

            while since_last >= spacing {
                let overshoot = since_last - spacing;
                let back = (previous - position).try_normalize().unwrap_or(DVec3::ZERO);
                points.push(OrientedPoint::new(position + back * overshoot, forward, up));
                distances.push(travelled - overshoot);
                since_last = overshoot;
            }
            previous = position;
        }

        let segment_length = travelled - segment_start;
        segment_lengths.push(segment_length);

        let twist = signed_angle(up, normals[index + 1], forward);
        if twist != 0.0 && segment_length > 0.0 {
            for sample in first_sample..points.len() {
                let fraction = ((distances[sample] - segment_start) / segment_length).clamp(0.0, 1.0);
                let point = &mut points[sample];
                point.up = DQuat::from_axis_angle(point.forward, twist * fraction) * point.up;
            }
        }
    }

    let last_position = control_points[control_points.len() - 1];
    let last_up = normals[normals.len() - 1];
    let last_forward = segment(segment_count - 1)
        .derivative(1.0)
        .try_normalize()
        .unwrap_or(forward);

    if points.len() == 1 || since_last > DUPLICATE_EPSILON {
        points.push(OrientedPoint::new(last_position, last_forward, last_up));
        distances.push(travelled);
    } else if let (Some(point), Some(distance)) = (points.last_mut(), distances.last_mut()) {
        *point = OrientedPoint::new(last_position, last_forward, last_up);
        *distance = travelled;
    }

    Ok(SampledCurve {
        points,
        distances,
        segment_lengths,
        segment_bounds,
        bounds,
    })
}

/// Remove the component of `vector` along `axis` and renormalise.
fn perpendicular_to(vector: DVec3, axis: DVec3) -> DVec3 {
    (vector - axis * vector.dot(axis))
        .try_normalize()
        .unwrap_or(vector)
}

/// Angle rotating `from` onto `to` about `axis`, both projected onto the
/// plane perpendicular to `axis`.
fn signed_angle(from: DVec3, to: DVec3, axis: DVec3) -> f64 {
    let from = from - axis * from.dot(axis);
    let to = to - axis * to.dot(axis);
    if from.length_squared() == 0.0 || to.length_squared() == 0.0 {
        return 0.0;
    }
    axis.dot(from.cross(to)).atan2(from.dot(to))
}
