use gpui::{Path, Pixels, Point, point};

/// Segments used to flatten one bezier edge.
pub const EDGE_SEGMENTS: usize = 24;

/// How an edge relates to the current selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeEmphasis {
    None,
    /// Leaves the selected node.
    Outgoing,
    /// Enters the selected node.
    Incoming,
    /// The in-progress connection.
    Draft,
}

/// A flattened edge in container-local screen coordinates.
#[derive(Clone, Debug)]
pub struct EdgeStroke {
    pub points: Vec<Point<Pixels>>,
    pub emphasis: EdgeEmphasis,
}

/// Appends a thick line segment as two triangles.
pub fn push_segment(path: &mut Path<Pixels>, p1: Point<Pixels>, p2: Point<Pixels>, half_thickness: f32) {
    let dir = point(p2.x - p1.x, p2.y - p1.y);
    let len = dir.magnitude() as f32;
    if len <= 0.0001 {
        return;
    }
    let normal = point(-dir.y, dir.x) * (half_thickness / len);

    let p1a = point(p1.x + normal.x, p1.y + normal.y);
    let p1b = point(p1.x - normal.x, p1.y - normal.y);
    let p2a = point(p2.x + normal.x, p2.y + normal.y);
    let p2b = point(p2.x - normal.x, p2.y - normal.y);

    let st = (point(0., 1.), point(0., 1.), point(0., 1.));
    path.push_triangle((p1a, p1b, p2a), st);
    path.push_triangle((p2a, p1b, p2b), st);
}

/// Appends a whole polyline, shifted by `origin`.
pub fn push_polyline(
    path: &mut Path<Pixels>,
    origin: Point<Pixels>,
    points: &[Point<Pixels>],
    half_thickness: f32,
) {
    for pair in points.windows(2) {
        push_segment(
            path,
            point(origin.x + pair[0].x, origin.y + pair[0].y),
            point(origin.x + pair[1].x, origin.y + pair[1].y),
            half_thickness,
        );
    }
}
