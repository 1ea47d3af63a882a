use crate::geometry::{Point, Size};

/// Output port center, relative to the node's top-left.
pub fn output_port_offset(size: Size) -> Point {
    Point::new(size.width, size.height / 2.0)
}

/// Input port center, relative to the node's top-left.
pub fn input_port_offset(size: Size) -> Point {
    Point::new(0.0, size.height / 2.0)
}

/// Cubic bezier from an output port to an input port. Both handles are
/// horizontal so edges leave and enter ports head-on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgePath {
    pub from: Point,
    pub c1: Point,
    pub c2: Point,
    pub to: Point,
}

impl EdgePath {
    pub fn between(from: Point, to: Point, curvature: f32, min_handle: f32) -> Self {
        let handle = ((to.x - from.x).abs() * curvature).max(min_handle);
        Self {
            from,
            c1: Point::new(from.x + handle, from.y),
            c2: Point::new(to.x - handle, to.y),
            to,
        }
    }

    pub fn point_at(&self, t: f32) -> Point {
        let u = 1.0 - t;
        let a = u * u * u;
        let b = 3.0 * u * u * t;
        let c = 3.0 * u * t * t;
        let d = t * t * t;
        Point::new(
            a * self.from.x + b * self.c1.x + c * self.c2.x + d * self.to.x,
            a * self.from.y + b * self.c1.y + c * self.c2.y + d * self.to.y,
        )
    }

    /// Polyline approximation with `segments` segments (`segments + 1` points).
    pub fn sample(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f32 / segments as f32))
            .collect()
    }

    /// Applies `f` to every control point, e.g. a canvas-to-screen transform.
    pub fn map(&self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            from: f(self.from),
            c1: f(self.c1),
            c2: f(self.c2),
            to: f(self.to),
        }
    }
}
