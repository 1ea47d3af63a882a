use crate::config::ZoomLimits;
use crate::geometry::{Point, Rect, Size};

/// Wheel step direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    /// Wheel up / toward the user.
    In,
    /// Wheel down / away from the user.
    Out,
}

/// Pan/zoom transform between canvas space and screen space:
/// `screen = canvas * scale + offset`.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    scale: f32,
    offset: Point,
    limits: ZoomLimits,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}

impl Viewport {
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            scale: 1.0,
            offset: Point::ZERO,
            limits,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.offset = Point::ZERO;
    }

    /// Sets the scale, clamped to the configured bounds.
    pub fn set_scale(&mut self, scale: f32) {
        // max/min instead of clamp: unvalidated limits must not panic.
        self.scale = scale.max(self.limits.min_scale).min(self.limits.max_scale);
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    /// Applies one wheel step. Returns false when already at the bound.
    pub fn zoom(&mut self, direction: ZoomDirection) -> bool {
        let factor = match direction {
            ZoomDirection::In => self.limits.zoom_in_factor,
            ZoomDirection::Out => self.limits.zoom_out_factor,
        };
        let before = self.scale;
        self.set_scale(self.scale * factor);
        (self.scale - before).abs() > f32::EPSILON
    }

    pub fn pan_by(&mut self, delta: Point) {
        self.offset = self.offset + delta;
    }

    pub fn to_screen(&self, canvas: Point) -> Point {
        canvas * self.scale + self.offset
    }

    pub fn to_canvas(&self, screen: Point) -> Point {
        (screen - self.offset) / self.scale
    }

    /// Scales and centers so `content` fits inside `container` with `padding`
    /// screen pixels on each side.
    pub fn fit(&mut self, content: Rect, container: Size, padding: f32) {
        if content.size.width <= 0.0 || content.size.height <= 0.0 {
            return;
        }
        let available_width = container.width - padding * 2.0;
        let available_height = container.height - padding * 2.0;
        if available_width <= 0.0 || available_height <= 0.0 {
            return;
        }

        let zoom_x = available_width / content.size.width;
        let zoom_y = available_height / content.size.height;
        self.set_scale(zoom_x.min(zoom_y));

        let center = content.center();
        self.offset = Point::new(
            container.width / 2.0 - center.x * self.scale,
            container.height / 2.0 - center.y * self.scale,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_out_never_below_min() {
        let mut v = Viewport::default();
        for _ in 0..50 {
            v.zoom(ZoomDirection::Out);
        }
        assert_eq!(v.scale(), 0.5);
        assert!(!v.zoom(ZoomDirection::Out));
    }

    #[test]
    fn zoom_in_never_above_max() {
        let mut v = Viewport::default();
        for _ in 0..50 {
            v.zoom(ZoomDirection::In);
        }
        assert_eq!(v.scale(), 2.0);
    }

    #[test]
    fn inverted_limits_do_not_panic() {
        let mut v = Viewport::new(ZoomLimits {
            min_scale: 2.0,
            max_scale: 0.5,
            ..ZoomLimits::default()
        });
        v.zoom(ZoomDirection::In);
        assert!(v.scale().is_finite());
    }

    #[test]
    fn single_steps_use_factors() {
        let mut v = Viewport::default();
        v.zoom(ZoomDirection::In);
        assert!((v.scale() - 1.1).abs() < 1e-6);
        v.reset();
        v.zoom(ZoomDirection::Out);
        assert!((v.scale() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn reset_restores_identity() {
        let mut v = Viewport::default();
        v.set_scale(1.7);
        v.pan_by(Point::new(-40.0, 12.0));
        v.reset();
        assert_eq!(v.scale(), 1.0);
        assert_eq!(v.offset(), Point::ZERO);
    }

    #[test]
    fn transforms_are_inverse() {
        let mut v = Viewport::default();
        v.set_scale(1.5);
        v.set_offset(Point::new(30.0, -10.0));
        let p = Point::new(100.0, 40.0);
        assert_eq!(v.to_screen(p), Point::new(180.0, 50.0));
        assert_eq!(v.to_canvas(v.to_screen(p)), p);
    }

    #[test]
    fn fit_centers_content_within_bounds() {
        let mut v = Viewport::default();
        let content = Rect::new(Point::new(0.0, 0.0), Size::new(400.0, 200.0));
        v.fit(content, Size::new(880.0, 480.0), 40.0);
        assert_eq!(v.scale(), 2.0);
        // Content center lands on the container center.
        assert_eq!(v.to_screen(content.center()), Point::new(440.0, 240.0));
    }

    #[test]
    fn fit_respects_min_scale() {
        let mut v = Viewport::default();
        let content = Rect::new(Point::ZERO, Size::new(10_000.0, 10_000.0));
        v.fit(content, Size::new(800.0, 600.0), 40.0);
        assert_eq!(v.scale(), 0.5);
    }
}
