//! Piecewise cubic Bezier splines
//!
//! A spline is a list of points, each with a control offset and a time
//! weight. Segment `i` runs from point `i` to point `i + 1` over a time span
//! of `point[i + 1].point_time`; the first point's time is unused.
//! [`Spline3D::resampling`] bakes the curve into equally time-spaced
//! positions that particles and camera paths read back with
//! [`Spline3D::get_resampling_position`].

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Vec3, Vec4};

/// Default number of baked samples
pub const DEFAULT_RESAMPLE_COUNT: usize = 128;

/// One control point of a spline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplinePoint {
    /// Point on the curve
    pub position: Vec3,
    /// Tangent handle; the outgoing handle is `position + control_point`,
    /// the incoming one `position - control_point`
    pub control_point: Vec3,
    /// Duration of the segment that ends at this point
    pub point_time: f32,
}

impl SplinePoint {
    /// Create a point with a unit segment time
    pub fn new(position: Vec3, control_point: Vec3) -> Self {
        Self {
            position,
            control_point,
            point_time: 1.0,
        }
    }

    /// Set the segment time
    pub fn with_time(mut self, point_time: f32) -> Self {
        self.point_time = point_time;
        self
    }
}

/// Spline with baked resampled positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spline3D {
    /// Control points in order
    pub spline_points: Vec<SplinePoint>,
    /// Debug draw colour
    pub color: Vec4,
    /// Debug draw line width
    pub width: f32,
    #[serde(skip)]
    resampling_positions: Vec<Vec3>,
}

impl Spline3D {
    /// Create a spline and bake it with the default sample count
    pub fn new(spline_points: Vec<SplinePoint>) -> Self {
        let mut spline = Self {
            spline_points,
            color: Vec4::repeat(1.0),
            width: 1.0,
            resampling_positions: Vec::new(),
        };
        spline.resampling(DEFAULT_RESAMPLE_COUNT);
        spline
    }

    /// Baked positions from the last [`Self::resampling`] call
    pub fn resampling_positions(&self) -> &[Vec3] {
        &self.resampling_positions
    }

    /// Bake `resample_count` positions spaced evenly in time along the curve
    pub fn resampling(&mut self, resample_count: usize) {
        self.resampling_positions.clear();

        let point_count = self.spline_points.len();
        if point_count == 0 || resample_count == 0 {
            return;
        }

        if point_count == 1 {
            let position = self.spline_points[0].position;
            self.resampling_positions.resize(resample_count, position);
            return;
        }

        let cumulative = self.cumulative_times();
        let total_time = cumulative[point_count - 1];

        #[allow(clippy::cast_precision_loss)]
        let last_index = (resample_count.max(2) - 1) as f32;

        for i in 0..resample_count {
            #[allow(clippy::cast_precision_loss)]
            let resample_time = total_time * (i as f32 / last_index);
            self.resampling_positions
                .push(self.position_at(&cumulative, resample_time));
        }
    }

    /// Segment start times; the last entry is the total time.
    ///
    /// Negative segment times count as zero. When every segment is zero the
    /// segments share the time evenly.
    fn cumulative_times(&self) -> Vec<f32> {
        let widths: Vec<f32> = self.spline_points[1..]
            .iter()
            .map(|point| point.point_time.max(0.0))
            .collect();
        let uniform = widths.iter().sum::<f32>() <= 0.0;

        let mut cumulative = Vec::with_capacity(self.spline_points.len());
        let mut time = 0.0;
        cumulative.push(time);
        for width in widths {
            time += if uniform { 1.0 } else { width };
            cumulative.push(time);
        }
        cumulative
    }

    fn position_at(&self, cumulative: &[f32], time: f32) -> Vec3 {
        let segment_count = cumulative.len() - 1;
        let segment = (0..segment_count)
            .find(|&i| time <= cumulative[i + 1])
            .unwrap_or(segment_count - 1);

        let start = cumulative[segment];
        let width = cumulative[segment + 1] - start;
        let t = if width > 0.0 {
            ((time - start) / width).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let from = &self.spline_points[segment];
        let to = &self.spline_points[segment + 1];
        cubic_bezier_point(
            from.position,
            from.position + from.control_point,
            to.position - to.control_point,
            to.position,
            t,
        )
    }

    /// Position at `ratio` in `[0, 1]` interpolated between baked samples
    pub fn get_resampling_position(&self, ratio: f32) -> Option<Vec3> {
        let count = self.resampling_positions.len();
        match count {
            0 => None,
            1 => Some(self.resampling_positions[0]),
            _ => {
                #[allow(clippy::cast_precision_loss)]
                let scaled = ratio.clamp(0.0, 1.0) * (count - 1) as f32;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let index = (scaled.floor() as usize).min(count - 2);
                #[allow(clippy::cast_precision_loss)]
                let frac = scaled - index as f32;
                let a = self.resampling_positions[index];
                let b = self.resampling_positions[index + 1];
                Some(a.lerp(&b, frac))
            }
        }
    }
}

/// Hermite interpolation between `y1` and `y2` with neighbours `y0` and `y3`
pub fn hermite_interpolate<T>(y0: T, y1: T, y2: T, y3: T, mu: f32, tension: f32) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    let mu2 = mu * mu;
    let mu3 = mu2 * mu;
    let m0 = (y1 - y0) * tension + (y2 - y1) * tension;
    let m1 = (y2 - y1) * tension + (y3 - y2) * tension;
    let a0 = 2.0 * mu3 - 3.0 * mu2 + 1.0;
    let a1 = mu3 - 2.0 * mu2 + mu;
    let a2 = mu3 - mu2;
    let a3 = -2.0 * mu3 + 3.0 * mu2;

    y1 * a0 + m0 * a1 + m1 * a2 + y2 * a3
}

/// Smoothly sample a sorted `(time, value)` curve with Hermite segments.
///
/// Times outside `[0, 1)` clamp to the end values.
pub fn spline_smooth_value(points: &[(f32, f32)], time: f32) -> f32 {
    let size = points.len();
    match size {
        0 => return 0.0,
        1 => return points[0].1,
        _ => {}
    }

    if time <= 0.0 {
        return points[0].1;
    }
    if time >= points[size - 1].0 {
        return points[size - 1].1;
    }

    let i = (1..size).find(|&i| time < points[i].0).unwrap_or(size - 1);
    let (t0, v1) = points[i - 1];
    let (t1, v2) = points[i];
    let v0 = if i < 2 { v1 } else { points[i - 2].1 };
    let v3 = if i + 1 >= size { v2 } else { points[i + 1].1 };

    let t = if t1 > t0 { (time - t0) / (t1 - t0) } else { 0.0 };
    hermite_interpolate(v0, v1, v2, v3, t, 0.5)
}

/// Catmull-Rom interpolation between `v1` and `v2`
pub fn catmull_rom<T>(v0: T, v1: T, v2: T, v3: T, t: f32) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let t2 = t * t;
    let t3 = t2 * t;

    let p0 = -t3 + 2.0 * t2 - t;
    let p1 = 3.0 * t3 - 5.0 * t2 + 2.0;
    let p2 = -3.0 * t3 + 4.0 * t2 + t;
    let p3 = t3 - t2;
    (v0 * p0 + v1 * p1 + v2 * p2 + v3 * p3) * 0.5
}

/// Point on a quadratic Bezier curve
pub fn quadratic_bezier_point<T>(p0: T, c0: T, p1: T, t: f32) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let inv_t = 1.0 - t;
    p0 * (inv_t * inv_t) + c0 * (2.0 * t * inv_t) + p1 * (t * t)
}

/// Point on a cubic Bezier curve
pub fn cubic_bezier_point<T>(p0: T, c0: T, c1: T, p1: T, t: f32) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let t2 = t * t;
    let inv_t = 1.0 - t;
    p0 * (inv_t * inv_t * inv_t) + c0 * (3.0 * t * inv_t * inv_t) + c1 * (3.0 * inv_t * t2) + p1 * (t2 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_point_spline() -> Spline3D {
        Spline3D::new(vec![
            SplinePoint::new(Vec3::zeros(), Vec3::x()).with_time(0.0),
            SplinePoint::new(Vec3::new(4.0, 2.0, 0.0), Vec3::x()).with_time(1.0),
        ])
    }

    #[test]
    fn test_endpoints_with_two_samples() {
        let mut spline = two_point_spline();
        spline.resampling(2);
        let samples = spline.resampling_positions();
        assert_eq!(samples.len(), 2);
        assert_relative_eq!(samples[0], Vec3::zeros());
        assert_relative_eq!(samples[1], Vec3::new(4.0, 2.0, 0.0));
    }

    #[test]
    fn test_midpoint_lies_on_bezier() {
        let mut spline = two_point_spline();
        spline.resampling(3);
        let expected = cubic_bezier_point(
            Vec3::zeros(),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(3.0, 2.0, 0.0),
            Vec3::new(4.0, 2.0, 0.0),
            0.5,
        );
        assert_relative_eq!(spline.resampling_positions()[1], expected, epsilon = 1e-6);
        assert_relative_eq!(expected, Vec3::new(2.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_point_counts() {
        let mut empty = Spline3D::new(Vec::new());
        empty.resampling(8);
        assert!(empty.resampling_positions().is_empty());
        assert!(empty.get_resampling_position(0.5).is_none());

        let single = Spline3D::new(vec![SplinePoint::new(Vec3::new(1.0, 2.0, 3.0), Vec3::zeros())]);
        assert_eq!(single.resampling_positions().len(), DEFAULT_RESAMPLE_COUNT);
        assert!(single
            .resampling_positions()
            .iter()
            .all(|p| *p == Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_ratio_lookup_matches_samples() {
        let mut spline = Spline3D::new(vec![
            SplinePoint::new(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0)),
            SplinePoint::new(Vec3::new(3.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0)),
            SplinePoint::new(Vec3::new(5.0, 4.0, 2.0), Vec3::new(0.0, 0.0, 1.0)),
        ]);
        let count = 17;
        spline.resampling(count);
        for i in 0..count {
            let ratio = i as f32 / (count - 1) as f32;
            let position = spline.get_resampling_position(ratio).unwrap();
            assert_relative_eq!(position, spline.resampling_positions()[i], epsilon = 1e-5);
        }
        assert_relative_eq!(
            spline.get_resampling_position(2.0).unwrap(),
            Vec3::new(5.0, 4.0, 2.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_time_weights_shift_samples() {
        // the first segment takes three times as long as the second
        let mut spline = Spline3D::new(vec![
            SplinePoint::new(Vec3::zeros(), Vec3::zeros()),
            SplinePoint::new(Vec3::new(3.0, 0.0, 0.0), Vec3::zeros()).with_time(3.0),
            SplinePoint::new(Vec3::new(4.0, 0.0, 0.0), Vec3::zeros()).with_time(1.0),
        ]);
        spline.resampling(5);
        assert_relative_eq!(spline.resampling_positions()[3], Vec3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_smooth_value_clamps() {
        let curve = [(0.0, 1.0), (0.5, 2.0), (1.0, 0.0)];
        assert_relative_eq!(spline_smooth_value(&curve, -1.0), 1.0);
        assert_relative_eq!(spline_smooth_value(&curve, 0.5), 2.0, epsilon = 1e-6);
        assert_relative_eq!(spline_smooth_value(&curve, 2.0), 0.0);
    }

    #[test]
    fn test_catmull_rom_passes_through_inner_points() {
        assert_relative_eq!(catmull_rom(0.0, 1.0, 2.0, 3.0, 0.0), 1.0);
        assert_relative_eq!(catmull_rom(0.0, 1.0, 2.0, 3.0, 1.0), 2.0);
        assert_relative_eq!(quadratic_bezier_point(0.0, 1.0, 2.0, 0.5), 1.0);
    }
}
