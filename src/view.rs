// SPDX: CC0-1.0

use crate::{layout, Axis, Number, Vec3};
use core::fmt;

/// A perspective camera looking down the z axis at the `z = 0` plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov: Number,
    /// Canvas size in pixels.
    pub pixels: [u32; 2],
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 25.0),
            fov: 45.0,
            pixels: [1280, 720],
        }
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("position", &self.position.0)
            .field("fov", &self.fov)
            .field("pixels", &self.pixels)
            .finish()
    }
}

impl Camera {
    pub fn aspect(&self) -> Number {
        let [w, h] = self.pixels;
        Number::from(w.max(1)) / Number::from(h.max(1))
    }

    /// Half of the height visible on the `z = 0` plane.
    pub fn visible_half_height(&self) -> Number {
        (self.fov.to_radians() / 2.0).tan() * self.position.z().abs()
    }

    pub fn viewport(&self) -> Viewport {
        let half_height = self.visible_half_height();
        Viewport::new(
            [half_height * self.aspect(), half_height],
            self.position,
            self.pixels,
        )
    }
}

/// What the camera currently shows, in world units.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Half-extent of the visible area along x and y.
    pub visible: [Number; 2],
    pub camera: Vec3,
    pub grid_size: Number,
    pub pixels: [u32; 2],
}

impl Viewport {
    pub fn new(visible: [Number; 2], camera: Vec3, pixels: [u32; 2]) -> Self {
        Self {
            visible,
            camera,
            grid_size: layout::grid_size(visible),
            pixels,
        }
    }

    /// Camera distance from the plot plane, which acts as zoom in 2D.
    pub const fn depth(&self) -> Number {
        self.camera.z()
    }

    pub fn extent(&self, axis: Axis) -> Number {
        self.visible.get(axis.index()).copied().unwrap_or(0.0)
    }

    pub fn pixels_along(&self, axis: Axis) -> u32 {
        self.pixels.get(axis.index()).copied().unwrap_or(1).max(1)
    }

    /// The visible interval along `axis`.
    pub fn span(&self, axis: Axis) -> (Number, Number) {
        let center = self.camera[axis];
        let half = self.extent(axis);
        (center - half, center + half)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_camera_sees_about_ten_units() {
        let viewport = Camera::default().viewport();
        let [w, h] = viewport.visible;
        assert!((h - 10.355).abs() < 1e-3, "{h}");
        assert!((w / h - 1280.0 / 720.0).abs() < 1e-12);
        assert_eq!(viewport.depth(), 25.0);
    }

    #[test]
    fn span_follows_camera() {
        let viewport = Viewport::new([5.0, 4.0], Vec3::new(1.0, -2.0, 10.0), [100, 100]);
        assert_eq!(viewport.span(Axis::X), (-4.0, 6.0));
        assert_eq!(viewport.span(Axis::Y), (-6.0, 2.0));
        assert_eq!(viewport.extent(Axis::Z), 0.0);
    }
}
