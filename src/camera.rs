use nalgebra::{Matrix4, Orthographic3, Point3};

// maps OpenGL clip depth (-1..1) onto wgpu's (0..1)
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Pixel-space camera for screen text: origin at the bottom-left corner of
/// the viewport, Y up, one unit per pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenCamera {
    pub width: f32,
    pub height: f32,
}

impl ScreenCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    pub fn projection(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * Orthographic3::new(0.0, self.width, 0.0, self.height, -1.0, 1.0).into_inner()
    }

    /// Column-major, as WGSL's `mat4x4<f32>` expects.
    pub fn uniform(&self) -> [[f32; 4]; 4] {
        self.projection().into()
    }

    /// Converts viewport fractions (0..1 on both axes) into pixels.
    pub fn to_pixels(&self, x: f32, y: f32) -> (f32, f32) {
        ((x * self.width).floor(), (y * self.height).floor())
    }

    pub fn clip(&self, x: f32, y: f32) -> Point3<f32> {
        self.projection().transform_point(&Point3::new(x, y, 0.0))
    }
}
