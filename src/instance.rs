use std::fmt::Debug;

use crate::plain::Plain;

pub trait InstanceData: Debug {
    fn data(&self) -> &[u8];
}

/// One glyph quad: where it goes on screen and which part of the atlas it samples.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphInstance {
    /// x, y, width, height in window pixels.
    pub rect: [f32; 4],
    /// x0, y0, x1, y1 as atlas fractions.
    pub atlas_coords: [f32; 4],
}

unsafe impl Plain for GlyphInstance {}

impl InstanceData for GlyphInstance {
    fn data(&self) -> &[u8] {
        self.as_bytes()
    }
}
