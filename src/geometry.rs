use std::fmt::Debug;

use crate::plain::Plain;

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct QuadVertex {
    pub pos: [f32; 2],
}

unsafe impl Plain for QuadVertex {}

pub trait Geometry: Debug {
    fn contents(&self) -> &[u8];

    fn length(&self) -> u32;

    fn indices(&self) -> Option<&[u8]>;
}

impl Geometry for Box<dyn Geometry> {
    fn contents(&self) -> &[u8] {
        self.as_ref().contents()
    }

    fn length(&self) -> u32 {
        self.as_ref().length()
    }

    fn indices(&self) -> Option<&[u8]> {
        self.as_ref().indices()
    }
}

/// Unit square spanning (0, 0) to (1, 1); instances scale it to the glyph rect.
#[derive(Debug)]
pub struct QuadGeometry {
    pub vertices: [QuadVertex; 4],
    pub indices: [u16; 6],
}

impl Geometry for QuadGeometry {
    fn contents(&self) -> &[u8] {
        self.vertices.as_bytes()
    }

    fn length(&self) -> u32 {
        self.vertices.len() as u32
    }

    fn indices(&self) -> Option<&[u8]> {
        Some(self.indices.as_bytes())
    }
}

pub const fn quad_geometry() -> QuadGeometry {
    QuadGeometry {
        vertices: [
            QuadVertex { pos: [0.0, 0.0] },
            QuadVertex { pos: [1.0, 0.0] },
            QuadVertex { pos: [0.0, 1.0] },
            QuadVertex { pos: [1.0, 1.0] },
        ],
        indices: [0, 2, 1, 1, 2, 3],
    }
}
