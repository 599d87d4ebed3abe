use nalgebra::{Matrix4, Orthographic3, Point3, Vector4};

use crate::plain::Plain;

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

unsafe impl Plain for CameraUniform {}

/// Orthographic camera in window pixels: (0, 0) is the top left corner and y grows downwards.
pub struct Camera {
    width: f32,
    height: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    pub fn projection(&self) -> Matrix4<f32> {
        // bottom and top swapped to flip y
        Orthographic3::new(0.0, self.width, self.height, 0.0, -1.0, 1.0).into_inner()
    }

    pub fn to_clip(&self, point: Point3<f32>) -> Vector4<f32> {
        self.projection() * point.to_homogeneous()
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.projection().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;

    #[test]
    fn corners_map_to_clip_corners() {
        let camera = Camera::new(640, 480);

        let top_left = camera.to_clip(point![0.0, 0.0, 0.0]);
        assert!((top_left.x + 1.0).abs() < 1e-6);
        assert!((top_left.y - 1.0).abs() < 1e-6);

        let bottom_right = camera.to_clip(point![640.0, 480.0, 0.0]);
        assert!((bottom_right.x - 1.0).abs() < 1e-6);
        assert!((bottom_right.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn glyph_depth_lands_inside_wgpu_clip_range() {
        let clip = Camera::new(640, 480).to_clip(point![32.0, 64.0, 0.0]);
        assert!((0.0..=1.0).contains(&clip.z));
        assert_eq!(clip.w, 1.0);
    }
}
