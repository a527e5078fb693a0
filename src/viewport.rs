//! Mapping between view-space (on-screen pixels) and source-space (image pixels).

use crate::math::{vec2, Vec2f, Vec2u};

/// Largest zoom factor, in view pixels per source pixel.
pub const MAX_SCALE: f32 = 16.0;

/// Converts points between view-space and source-space.
///
/// Lookups return `None` while the transform is unavailable (eg. before the image has been laid
/// out). The mapping changes whenever the view is zoomed or panned, so results must not be cached
/// across frames.
pub trait CoordinateTransform {
    fn is_ready(&self) -> bool;

    fn source_to_view(&self, source: Vec2f) -> Option<Vec2f>;

    fn view_to_source(&self, view: Vec2f) -> Option<Vec2f>;
}

/// A pan/zoom view onto an image of fixed size.
///
/// `offset` is the view-space position of the image's top left corner.
#[derive(Debug, Clone)]
pub struct Viewport {
    source_size: Vec2u,
    view_size: Vec2u,
    scale: f32,
    offset: Vec2f,
    fitted: bool,
}

impl Viewport {
    pub fn new(source_size: Vec2u) -> Self {
        Self {
            source_size,
            view_size: vec2(0, 0),
            scale: 1.0,
            offset: vec2(0.0, 0.0),
            fitted: false,
        }
    }

    pub fn source_size(&self) -> Vec2u {
        self.source_size
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Updates the size of the on-screen area. The first non-empty size fits the image into view.
    pub fn resize(&mut self, view_size: Vec2u) {
        self.view_size = view_size;
        if !self.fitted {
            self.fit();
        }
    }

    /// Scales and centers the image so that all of it is visible.
    pub fn fit(&mut self) {
        let Some(scale) = self.fit_scale() else {
            return;
        };
        self.scale = scale;
        self.offset = (self.view_size.as_f32() - self.source_size.as_f32() * scale) / 2.0;
        self.fitted = true;
        log::debug!("fit {:?} into {:?} at scale {scale}", self.source_size, self.view_size);
    }

    /// Scales by `factor` about `view_center`, keeping that point stationary on screen.
    pub fn scale_about(&mut self, view_center: Vec2f, factor: f32) {
        if !self.is_ready() || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let min_scale = self.fit_scale().map_or(self.scale, |s| s / 2.0);
        let scale = (self.scale * factor).clamp(min_scale.min(MAX_SCALE), MAX_SCALE);
        let factor = scale / self.scale;

        // vec from the center to the image's top left corner, scaled by the same factor.
        let local_center = view_center - self.offset;
        self.scale = scale;
        self.offset = view_center - local_center * factor;
    }

    /// Pans by this displacement in view-space.
    pub fn pan(&mut self, delta: Vec2f) {
        if delta.is_finite() {
            self.offset += delta;
        }
    }

    fn fit_scale(&self) -> Option<f32> {
        if self.view_size.x() == 0 || self.view_size.y() == 0 {
            return None;
        }
        if self.source_size.x() == 0 || self.source_size.y() == 0 {
            return None;
        }
        let view = self.view_size.as_f32();
        let source = self.source_size.as_f32();
        Some((view.x() / source.x()).min(view.y() / source.y()))
    }
}

impl CoordinateTransform for Viewport {
    fn is_ready(&self) -> bool {
        self.fitted && self.scale > 0.0
    }

    fn source_to_view(&self, source: Vec2f) -> Option<Vec2f> {
        self.is_ready().then(|| source * self.scale + self.offset)
    }

    fn view_to_source(&self, view: Vec2f) -> Option<Vec2f> {
        self.is_ready().then(|| (view - self.offset) / self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> Viewport {
        let mut viewport = Viewport::new(vec2(200, 100));
        viewport.resize(vec2(400, 400));
        viewport
    }

    #[test]
    fn not_ready_before_layout() {
        let viewport = Viewport::new(vec2(200, 100));
        assert!(!viewport.is_ready());
        assert_eq!(viewport.source_to_view(vec2(1.0, 1.0)), None);
        assert_eq!(viewport.view_to_source(vec2(1.0, 1.0)), None);
    }

    #[test]
    fn empty_image_never_becomes_ready() {
        let mut viewport = Viewport::new(vec2(0, 100));
        viewport.resize(vec2(400, 400));
        assert!(!viewport.is_ready());
    }

    #[test]
    fn fit_centers_image() {
        let viewport = fitted();
        assert_eq!(viewport.scale(), 2.0);
        // 200x100 at 2x is 400x200, centered vertically in 400x400.
        assert_eq!(viewport.source_to_view(vec2(0.0, 0.0)), Some(vec2(0.0, 100.0)));
        assert_eq!(
            viewport.source_to_view(vec2(200.0, 100.0)),
            Some(vec2(400.0, 300.0))
        );
    }

    #[test]
    fn conversions_are_inverse() {
        let mut viewport = fitted();
        viewport.pan(vec2(13.0, -7.0));
        viewport.scale_about(vec2(50.0, 60.0), 1.5);
        let source = vec2(37.0, 81.0);
        let view = viewport.source_to_view(source).unwrap();
        let back = viewport.view_to_source(view).unwrap();
        assert!(back.max_axis_delta(source) < 1e-3);
    }

    #[test]
    fn scale_about_keeps_center_fixed() {
        let mut viewport = fitted();
        let center = vec2(120.0, 150.0);
        let before = viewport.view_to_source(center).unwrap();
        viewport.scale_about(center, 3.0);
        let after = viewport.view_to_source(center).unwrap();
        assert_eq!(viewport.scale(), 6.0);
        assert!(before.max_axis_delta(after) < 1e-4);
    }

    #[test]
    fn scale_is_clamped() {
        let mut viewport = fitted();
        viewport.scale_about(vec2(0.0, 0.0), 1000.0);
        assert_eq!(viewport.scale(), MAX_SCALE);
        viewport.scale_about(vec2(0.0, 0.0), 0.0001);
        assert_eq!(viewport.scale(), 1.0);
    }

    #[test]
    fn pan_moves_view_not_source() {
        let mut viewport = fitted();
        viewport.pan(vec2(10.0, 20.0));
        assert_eq!(viewport.source_to_view(vec2(0.0, 0.0)), Some(vec2(10.0, 120.0)));
    }

    #[test]
    fn resize_after_fit_keeps_transform() {
        let mut viewport = fitted();
        viewport.pan(vec2(5.0, 5.0));
        viewport.resize(vec2(800, 600));
        assert_eq!(viewport.scale(), 2.0);
        assert_eq!(viewport.source_to_view(vec2(0.0, 0.0)), Some(vec2(5.0, 105.0)));
    }
}
