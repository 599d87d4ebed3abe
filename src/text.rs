// text drawing:
// - glyph images are pre-rasterized, one png per character
// - they get stitched into the renderer's atlas
// - each placement from the layout becomes one instanced textured quad

use anyhow::Result;
use wgpu::{
    vertex_attr_array, BufferUsages, Extent3d, FilterMode, SamplerBindingType, ShaderStages,
    TextureFormat, TextureSampleType, TextureUsages, TextureViewDimension, VertexStepMode,
};

use crate::{
    bind::{BindEntry, BindEntryType, BindHandle},
    camera::{Camera, CameraUniform},
    font::BitmapFont,
    geometry::{quad_geometry, QuadVertex},
    glyph::IntVec2,
    instance::GlyphInstance,
    layout::Placement,
    pipeline::{PipelineBuilder, PipelineHandle},
    plain::Plain,
    render::{MeshHandle, Render},
};

const ATLAS_BINDING: u32 = 1;

pub struct TextPipeline {
    pipeline_handle: PipelineHandle,
    mesh_handle: MeshHandle,
    bind: BindHandle,
}

impl TextPipeline {
    pub fn new(render: &mut Render) -> Result<Self> {
        let bind = render.build_bind(&[
            // camera
            BindEntry {
                visibility: ShaderStages::VERTEX,
                ty: BindEntryType::BufferUniform {
                    size: std::mem::size_of::<CameraUniform>() as u64,
                    usages: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                },
                count: None,
            },
            // glyph atlas
            BindEntry {
                visibility: ShaderStages::FRAGMENT,
                ty: BindEntryType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    format: TextureFormat::Rgba8UnormSrgb,
                    size: Extent3d {
                        width: 1,
                        height: 1,
                        depth_or_array_layers: 1,
                    },
                    usage: TextureUsages::COPY_DST | TextureUsages::TEXTURE_BINDING,
                },
                count: None,
            },
            // sampler, nearest so pixel art stays crisp
            BindEntry {
                visibility: ShaderStages::FRAGMENT,
                ty: BindEntryType::Sampler {
                    binding_type: SamplerBindingType::Filtering,
                    filter: FilterMode::Nearest,
                },
                count: None,
            },
        ])?;
        render.set_atlas(bind, ATLAS_BINDING);

        let pipeline = PipelineBuilder::new()
            .with_format(render.surface_format())
            .with_cull_mode(None)
            .with_bind(bind)
            .with_shader(include_str!("shaders/glyph.wgsl"))
            .with_vb::<QuadVertex>(
                VertexStepMode::Vertex,
                &vertex_attr_array![
                    // position
                    0 => Float32x2,
                ],
            )
            .with_vb::<GlyphInstance>(
                VertexStepMode::Instance,
                &vertex_attr_array![
                    // rect
                    1 => Float32x4,
                    // atlas coords
                    2 => Float32x4,
                ],
            )
            .build(render)?;
        let pipeline_handle = render.add_pipeline(pipeline);
        let mesh_handle = render.add_mesh(quad_geometry());

        Ok(Self {
            pipeline_handle,
            mesh_handle,
            bind,
        })
    }

    pub fn update_camera(&self, render: &mut Render, camera: &Camera) -> Result<()> {
        render.write_buffer(camera.uniform().as_bytes(), self.bind, 0)
    }

    /// Queues one quad per placement. Glyphs without a texture keep their
    /// place in the layout but draw nothing.
    pub fn queue(
        &self,
        render: &mut Render,
        font: &BitmapFont,
        placements: &[Placement],
    ) -> Result<()> {
        let mut instances = Vec::with_capacity(placements.len());
        for placement in placements {
            let Some(texture) = font.texture(placement.glyph) else {
                continue;
            };
            let uv = render.get_atlas_coords_for_texture(texture)?;
            instances.push(glyph_instance(
                placement.position,
                font.glyphs().size(placement.glyph),
                uv,
            ));
        }
        render.add_instances(self.pipeline_handle, self.mesh_handle, &instances);
        Ok(())
    }
}

pub fn glyph_instance(position: IntVec2, size: IntVec2, atlas_coords: [f32; 4]) -> GlyphInstance {
    GlyphInstance {
        rect: [
            position.x as f32,
            position.y as f32,
            size.x as f32,
            size.y as f32,
        ],
        atlas_coords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceData;

    #[test]
    fn instance_is_pixel_rect_plus_uv() {
        let instance = glyph_instance(
            IntVec2::new(44, 64),
            IntVec2::new(10, 16),
            [0.5, 0.0, 1.0, 0.25],
        );
        assert_eq!(instance.rect, [44.0, 64.0, 10.0, 16.0]);
        assert_eq!(instance.atlas_coords, [0.5, 0.0, 1.0, 0.25]);
        // matches the two Float32x4 attributes
        assert_eq!(instance.data().len(), 32);
    }
}
