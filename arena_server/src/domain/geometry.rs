// Small 2D helpers shared by the systems. Positions are plain `(x, y)` pairs
// in arena units, matching how entities store them.

/// Milliseconds in one frame of the 60fps baseline that speeds are tuned for.
pub const BASELINE_FRAME_MS: f32 = 1000.0 / 60.0;

pub fn distance_sq(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    dx * dx + dy * dy
}

pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    distance_sq(ax, ay, bx, by).sqrt()
}

/// Circle-circle overlap test (touching counts as overlap).
pub fn circles_overlap(ax: f32, ay: f32, ar: f32, bx: f32, by: f32, br: f32) -> bool {
    let reach = ar + br;
    distance_sq(ax, ay, bx, by) <= reach * reach
}

/// Unit vector from `a` to `b`, or zero when they coincide.
pub fn direction(ax: f32, ay: f32, bx: f32, by: f32) -> (f32, f32) {
    normalize(bx - ax, by - ay)
}

pub fn normalize(x: f32, y: f32) -> (f32, f32) {
    let len = (x * x + y * y).sqrt();
    if len <= f32::EPSILON {
        (0.0, 0.0)
    } else {
        (x / len, y / len)
    }
}

/// Rotate a vector by `angle` radians.
pub fn rotate(x: f32, y: f32, angle: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_circles_touch_then_they_overlap() {
        assert!(circles_overlap(0.0, 0.0, 5.0, 10.0, 0.0, 5.0));
        assert!(!circles_overlap(0.0, 0.0, 5.0, 10.1, 0.0, 5.0));
    }

    #[test]
    fn when_points_coincide_then_direction_is_zero() {
        assert_eq!(direction(3.0, 3.0, 3.0, 3.0), (0.0, 0.0));
    }

    #[test]
    fn rotate_quarter_turn() {
        let (x, y) = rotate(1.0, 0.0, std::f32::consts::FRAC_PI_2);
        assert!(x.abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
    }
}
