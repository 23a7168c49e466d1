//! Perspective camera for 2D scenes drawn on the z = 0 plane.
//!
//! At zoom 1 one world unit covers one pixel of the logical screen, so scenes
//! authored in pixel coordinates look the same with or without the camera.
//! Screen axes match pixel space: +X right, +Y down.

use glam::{Mat4, Vec2, Vec3};

use crate::coords::{Rect, Viewport};

/// Visible world-space region around the camera position.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraExtents {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl CameraExtents {
    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.right, self.bottom)
    }

    #[inline]
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.right - self.left, self.bottom - self.top)
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec2,
    base_z: f32,
    z: f32,
    zoom: f32,
    aspect_ratio: f32,
    field_of_view: f32,
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    pub const MIN_Z: f32 = 1.0;
    pub const MAX_Z: f32 = 2048.0;

    pub const MIN_ZOOM: f32 = 2.0 / 3.0;
    pub const MAX_ZOOM: f32 = 2.0;
    pub const ZOOM_STEP: f32 = 1.0 / 3.0;

    /// Creates a camera centered on a logical screen of `screen` pixels.
    pub fn new(screen: Viewport) -> Self {
        let width = screen.width.max(1.0);
        let height = screen.height.max(1.0);

        let mut camera = Self {
            position: Vec2::new(width * 0.5, height * 0.5),
            base_z: 0.0,
            z: 0.0,
            zoom: 1.0,
            aspect_ratio: width / height,
            field_of_view: std::f32::consts::FRAC_PI_2,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.base_z = camera.z_from_height(height);
        camera.z = camera.base_z;
        camera.update_matrices();
        camera
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Distance from the camera to the z = 0 plane.
    #[inline]
    pub fn z(&self) -> f32 {
        self.z
    }

    #[inline]
    pub fn base_z(&self) -> f32 {
        self.base_z
    }

    #[inline]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    #[inline]
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    /// View matrix as of the last [`update_matrices`](Self::update_matrices).
    #[inline]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Projection matrix as of the last [`update_matrices`](Self::update_matrices).
    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    // ── matrices ──────────────────────────────────────────────────────────

    /// Rebuilds view and projection from the current position and z.
    pub fn update_matrices(&mut self) {
        let eye = Vec3::new(self.position.x, self.position.y, -self.z);
        let target = Vec3::new(self.position.x, self.position.y, 0.0);
        // Looking down +Z with -Y as up keeps +Y pointing down the screen.
        self.view = Mat4::look_at_rh(eye, target, Vec3::NEG_Y);
        self.projection =
            Mat4::perspective_rh(self.field_of_view, self.aspect_ratio, Self::MIN_Z, Self::MAX_Z);
    }

    // ── height / z conversion ─────────────────────────────────────────────

    /// Distance at which exactly `height` world units fill the view vertically.
    #[inline]
    pub fn z_from_height(&self, height: f32) -> f32 {
        (0.5 * height) / (0.5 * self.field_of_view).tan()
    }

    /// World-space height visible at the current z.
    #[inline]
    pub fn height_from_z(&self) -> f32 {
        self.z * (0.5 * self.field_of_view).tan() * 2.0
    }

    // ── movement ──────────────────────────────────────────────────────────

    pub fn move_by(&mut self, amount: Vec2) {
        self.position += amount;
    }

    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Moves along the view axis, clamped to `MIN_Z..=MAX_Z`.
    pub fn move_z(&mut self, amount: f32) {
        self.z = (self.z + amount).clamp(Self::MIN_Z, Self::MAX_Z);
    }

    /// Returns to the distance where one unit is one pixel. Zoom goes back to 1.
    pub fn reset_z(&mut self) {
        self.z = self.base_z;
        self.zoom = 1.0;
    }

    // ── zoom ──────────────────────────────────────────────────────────────

    pub fn inc_zoom(&mut self) {
        self.set_zoom(self.zoom + Self::ZOOM_STEP);
    }

    pub fn dec_zoom(&mut self) {
        self.set_zoom(self.zoom - Self::ZOOM_STEP);
    }

    /// Sets the zoom factor (clamped) and snaps z to a whole distance for it.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        self.z = (self.base_z / self.zoom).round();
    }

    // ── extents ───────────────────────────────────────────────────────────

    /// Visible (width, height) in world units.
    pub fn size(&self) -> Vec2 {
        let height = self.height_from_z();
        Vec2::new(height * self.aspect_ratio, height)
    }

    pub fn extents(&self) -> CameraExtents {
        let size = self.size();
        let left = self.position.x - size.x * 0.5;
        let top = self.position.y - size.y * 0.5;
        CameraExtents {
            left,
            right: left + size.x,
            top,
            bottom: top + size.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn camera() -> Camera {
        Camera::new(Viewport::new(800.0, 600.0))
    }

    fn ndc(camera: &Camera, p: Vec2) -> Vec3 {
        (camera.projection() * camera.view()).project_point3(p.extend(0.0))
    }

    #[test]
    fn starts_centered_at_pixel_scale() {
        let c = camera();
        assert_eq!(c.position(), Vec2::new(400.0, 300.0));
        assert_abs_diff_eq!(c.z(), 300.0, epsilon = 1e-3);
        assert_abs_diff_eq!(c.height_from_z(), 600.0, epsilon = 1e-2);
        assert_eq!(c.zoom(), 1.0);
    }

    #[test]
    fn screen_corners_map_to_ndc_corners() {
        let c = camera();

        let center = ndc(&c, Vec2::new(400.0, 300.0));
        assert_abs_diff_eq!(center.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(center.y, 0.0, epsilon = 1e-5);

        // +Y is down on screen, so the top-left pixel lands at (-1, +1).
        let tl = ndc(&c, Vec2::ZERO);
        assert_abs_diff_eq!(tl.x, -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(tl.y, 1.0, epsilon = 1e-4);

        let br = ndc(&c, Vec2::new(800.0, 600.0));
        assert_abs_diff_eq!(br.x, 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(br.y, -1.0, epsilon = 1e-4);

        assert!(center.z > 0.0 && center.z < 1.0);
    }

    #[test]
    fn view_follows_position_after_update() {
        let mut c = camera();
        c.move_to(Vec2::new(1000.0, -50.0));
        // Matrices are stale until refreshed.
        assert_abs_diff_eq!(ndc(&c, Vec2::new(400.0, 300.0)).x, 0.0, epsilon = 1e-5);

        c.update_matrices();
        let p = ndc(&c, Vec2::new(1000.0, -50.0));
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn zoom_is_clamped_and_snaps_z() {
        let mut c = camera();
        c.inc_zoom();
        assert_abs_diff_eq!(c.zoom(), 4.0 / 3.0, epsilon = 1e-6);
        assert_eq!(c.z(), 225.0);

        for _ in 0..10 {
            c.inc_zoom();
        }
        assert_eq!(c.zoom(), Camera::MAX_ZOOM);
        assert_eq!(c.z(), 150.0);

        for _ in 0..10 {
            c.dec_zoom();
        }
        assert_eq!(c.zoom(), Camera::MIN_ZOOM);
        assert_eq!(c.z(), 450.0);

        c.set_zoom(100.0);
        assert_eq!(c.zoom(), Camera::MAX_ZOOM);

        c.reset_z();
        assert_abs_diff_eq!(c.z(), c.base_z(), epsilon = 1e-6);
        assert_eq!(c.zoom(), 1.0);
    }

    #[test]
    fn move_z_stays_in_range() {
        let mut c = camera();
        c.move_z(-10_000.0);
        assert_eq!(c.z(), Camera::MIN_Z);
        c.move_z(1e9);
        assert_eq!(c.z(), Camera::MAX_Z);
    }

    #[test]
    fn extents_surround_position() {
        let mut c = camera();
        let e = c.extents();
        assert_abs_diff_eq!(e.left, 0.0, epsilon = 1e-2);
        assert_abs_diff_eq!(e.right, 800.0, epsilon = 1e-2);
        assert_abs_diff_eq!(e.top, 0.0, epsilon = 1e-2);
        assert_abs_diff_eq!(e.bottom, 600.0, epsilon = 1e-2);

        c.set_zoom(2.0);
        c.move_by(Vec2::new(100.0, 100.0));
        let e = c.extents();
        assert_abs_diff_eq!(e.right - e.left, 400.0, epsilon = 1e-2);
        assert_abs_diff_eq!(e.bottom - e.top, 300.0, epsilon = 1e-2);
        assert_abs_diff_eq!((e.min() + e.max()).x * 0.5, 500.0, epsilon = 1e-3);
        assert_eq!(e.to_rect().size, e.max() - e.min());
    }
}
