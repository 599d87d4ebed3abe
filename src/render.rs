use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Result};
use generational_arena::{Arena, Index};
use log::{debug, info, warn};
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    Buffer, BufferDescriptor, BufferUsages, Color, CommandEncoderDescriptor, Device,
    DeviceDescriptor, Extent3d, ImageDataLayout, Instance, LoadOp, Operations, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RequestAdapterOptions, StoreOp, Surface,
    SurfaceConfiguration, SurfaceError, TextureFormat, TextureViewDescriptor, TextureViewDimension,
};
pub use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    atlas::{Atlas, RectHandle},
    bind::{self, Bind, BindEntry, BindEntryResource, BindHandle},
    geometry::Geometry,
    instance::InstanceData,
    pipeline::{Pipeline, PipelineHandle},
    texture::{Texture, BYTES_PER_PIXEL},
};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
struct MeshAndPipelineHandleComposite(MeshHandle, PipelineHandle);

/// Instances queued for one mesh + pipeline pair during the current frame.
struct Batch {
    key: MeshAndPipelineHandleComposite,
    data: Vec<u8>,
    count: u32,
}

type MeshEntry = (
    Box<dyn Geometry>,
    Buffer,         // vertex
    Option<Buffer>, // index
);

// renderer draws instanced meshes, all textures live in a single atlas
pub struct Render {
    device: Device,
    queue: Queue,
    surface: Surface<'static>,
    config: SurfaceConfiguration,
    pipelines: Arena<Pipeline>,
    binds: Arena<Bind>,
    meshes: Arena<MeshEntry>,
    textures: Arena<Texture>,
    atlas_bind: Option<(BindHandle, u32)>,
    atlas: Atlas,
    rect_to_tex: HashMap<RectHandle, TextureHandle>,
    batches: Vec<Batch>,
    instance_buffer: Option<Buffer>,
    clear_color: Color,
}

impl Render {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let instance = Instance::default();
        let size = window.inner_size();

        let surface = instance.create_surface(window)?;

        let (adapter, device, queue) = pollster::block_on(async {
            let adapter = instance
                .request_adapter(&RequestAdapterOptions {
                    compatible_surface: Some(&surface),
                    ..Default::default()
                })
                .await
                .ok_or(anyhow!("No suitable adapter found."))?;

            let (device, queue) = adapter
                .request_device(&DeviceDescriptor::default(), None)
                .await?;

            Ok::<(wgpu::Adapter, Device, Queue), anyhow::Error>((
                adapter, device, queue,
            ))
        })?;
        info!("using adapter {:?}", adapter.get_info().name);

        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or(anyhow!("Surface isn't supported by the adapter."))?;
        // vsync
        config.present_mode = wgpu::PresentMode::Fifo;
        surface.configure(&device, &config);
        info!("surface format {:?}", config.format);

        Ok(Self {
            device,
            queue,
            surface,
            config,
            binds: Arena::new(),
            pipelines: Arena::new(),
            meshes: Arena::new(),
            textures: Arena::new(),
            atlas_bind: None,
            atlas: Atlas::new(),
            rect_to_tex: HashMap::new(),
            batches: Vec::new(),
            instance_buffer: None,
            clear_color: Color::BLACK,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.config.format
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    pub fn add_pipeline(&mut self, pipeline: Pipeline) -> PipelineHandle {
        PipelineHandle(self.pipelines.insert(pipeline))
    }

    pub fn get_pipeline(&self, handle: PipelineHandle) -> Result<&Pipeline> {
        self.pipelines
            .get(handle.0)
            .ok_or(anyhow!("No pipeline found at index {:?}.", handle))
    }

    pub fn build_bind(&mut self, bind_entries: &[BindEntry]) -> Result<BindHandle> {
        let bind = Bind::new(bind_entries.to_vec(), &self.device)?;
        Ok(BindHandle(self.binds.insert(bind)))
    }

    pub fn get_bind(&self, handle: BindHandle) -> Result<&Bind> {
        self.binds
            .get(handle.0)
            .ok_or(anyhow!("No Bind for handle {:?}.", handle))
    }

    pub fn write_buffer(&mut self, data: &[u8], handle: BindHandle, binding: u32) -> Result<()> {
        let buffer = self
            .get_bind(handle)?
            .resource(binding)?
            .buffer()
            .ok_or(anyhow!("Binding {} isn't a buffer.", binding))?;
        self.queue.write_buffer(buffer, 0, data);
        Ok(())
    }

    /// Uploads `texture` into the texture at `binding`, recreating the gpu
    /// texture first if the sizes differ.
    pub fn write_texture(
        &mut self,
        texture: &Texture,
        handle: BindHandle,
        binding: u32,
    ) -> Result<()> {
        let size = Extent3d {
            width: texture.width,
            height: texture.height,
            depth_or_array_layers: 1,
        };

        let (current, _) = self
            .get_bind(handle)?
            .resource(binding)?
            .texture_view()
            .ok_or(anyhow!("Binding {} isn't a texture.", binding))?;

        if current.width() != size.width || current.height() != size.height {
            debug!(
                "resizing texture at binding {} to {}x{}",
                binding, size.width, size.height
            );
            let (new_texture, view) = bind::texture(
                &self.device,
                size,
                TextureViewDimension::D2,
                current.format(),
                current.usage(),
            );
            self.binds
                .get_mut(handle.0)
                .ok_or(anyhow!("No Bind for handle {:?}.", handle))?
                .replace_resource(
                    BindEntryResource::Texture(new_texture, view),
                    binding,
                    &self.device,
                )?;
        }

        let (target, _) = self
            .get_bind(handle)?
            .resource(binding)?
            .texture_view()
            .ok_or(anyhow!("Binding {} isn't a texture.", binding))?;

        self.queue.write_texture(
            target.as_image_copy(),
            &texture.data,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(BYTES_PER_PIXEL * texture.width),
                rows_per_image: None,
            },
            size,
        );
        Ok(())
    }

    /// Points the atlas at a texture binding; the atlas is uploaded there whenever it changes.
    pub fn set_atlas(&mut self, handle: BindHandle, binding: u32) {
        self.atlas_bind = Some((handle, binding));
        self.atlas.changed = true;
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureHandle {
        // stitch the texture into the atlas straight away so its coords are known
        let rect_handle = self.atlas.add(texture.width(), texture.height());
        let texture_handle = TextureHandle(self.textures.insert(texture));
        self.rect_to_tex.insert(rect_handle, texture_handle);
        self.atlas.pack();
        texture_handle
    }

    /// Returns [x0, y0, x1, y1] for the top left and bottom right corners.
    /// These values are fractional and represent where this texture is contained on the atlas
    /// texture.
    pub fn get_atlas_coords_for_texture(&self, texture_handle: TextureHandle) -> Result<[f32; 4]> {
        let rect_handle = self
            .rect_to_tex
            .iter()
            .find_map(|(rect, tex)| (*tex == texture_handle).then_some(*rect))
            .ok_or(anyhow!("Texture {:?} isn't in the atlas.", texture_handle))?;
        self.atlas
            .uv(rect_handle)
            .ok_or(anyhow!("Atlas has no rect {:?}.", rect_handle))
    }

    pub fn add_mesh<G: Geometry + 'static>(&mut self, geometry: G) -> MeshHandle {
        let buffer = self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Vertex buffer"),
            contents: geometry.contents(),
            usage: BufferUsages::VERTEX,
        });
        let index_buffer = geometry.indices().map(|indices| {
            self.device.create_buffer_init(&BufferInitDescriptor {
                label: Some("Index buffer"),
                contents: indices,
                usage: BufferUsages::INDEX,
            })
        });
        MeshHandle(self.meshes.insert((Box::new(geometry), buffer, index_buffer)))
    }

    fn get_mesh(&self, handle: MeshHandle) -> Result<&MeshEntry> {
        self.meshes
            .get(handle.0)
            .ok_or(anyhow!("Mesh not found for handle id {:?}", handle.0))
    }

    /// Queues instances of a mesh for the next [Render::draw]. Batches are drawn in the order they
    /// were first queued.
    pub fn add_instances<I: InstanceData>(
        &mut self,
        pipeline_handle: PipelineHandle,
        mesh_handle: MeshHandle,
        instances: &[I],
    ) {
        let key = MeshAndPipelineHandleComposite(mesh_handle, pipeline_handle);
        let position = match self.batches.iter().position(|batch| batch.key == key) {
            Some(position) => position,
            None => {
                self.batches.push(Batch {
                    key,
                    data: Vec::new(),
                    count: 0,
                });
                self.batches.len() - 1
            }
        };
        let batch = &mut self.batches[position];
        for instance in instances {
            batch.data.extend_from_slice(instance.data());
            batch.count += 1;
        }
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
    }

    fn upload_atlas(&mut self) -> Result<()> {
        let Some((atlas_bind, binding)) = self.atlas_bind else {
            return Ok(());
        };
        if !self.atlas.changed {
            return Ok(());
        }
        self.atlas.changed = false;
        if self.atlas.is_empty() {
            debug!("atlas is empty, keeping the placeholder texture");
            return Ok(());
        }
        let atlas_texture = Texture::from_atlas(&self.atlas, &self.rect_to_tex, &self.textures)?;
        self.write_texture(&atlas_texture, atlas_bind, binding)
    }

    fn write_instances(&mut self) {
        let bytes: Vec<u8> = self
            .batches
            .iter()
            .flat_map(|batch| batch.data.iter().copied())
            .collect();
        if bytes.is_empty() {
            return;
        }

        let too_small = self
            .instance_buffer
            .as_ref()
            .map_or(true, |buffer| buffer.size() < bytes.len() as u64);
        if too_small {
            self.instance_buffer = Some(self.device.create_buffer(&BufferDescriptor {
                label: Some("Instance buffer"),
                size: (bytes.len() as u64).next_power_of_two(),
                usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
        if let Some(buffer) = &self.instance_buffer {
            self.queue.write_buffer(buffer, 0, &bytes);
        }
    }

    pub fn draw(&mut self) -> Result<()> {
        self.upload_atlas()?;

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                self.batches.clear();
                return Ok(());
            }
            Err(SurfaceError::Timeout) => {
                warn!("timed out waiting for a frame");
                self.batches.clear();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        self.write_instances();

        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor::default());

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut offset = 0u64;
            for batch in &self.batches {
                let len = batch.data.len() as u64;
                let Some(instance_buffer) = self.instance_buffer.as_ref() else {
                    break;
                };
                if batch.count == 0 {
                    continue;
                }

                let pipeline = self.get_pipeline(batch.key.1)?;
                rpass.set_pipeline(&pipeline.pipeline);
                for (idx, handle) in pipeline.binds.iter().enumerate() {
                    rpass.set_bind_group(idx as u32, &self.get_bind(*handle)?.bg, &[]);
                }

                let (geometry, vertex_buffer, index_buffer) = self.get_mesh(batch.key.0)?;
                rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
                rpass.set_vertex_buffer(1, instance_buffer.slice(offset..offset + len));
                if let Some(index_buffer) = index_buffer {
                    rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                    rpass.draw_indexed(
                        0..(index_buffer.size() as u32 / std::mem::size_of::<u16>() as u32),
                        0,
                        0..batch.count,
                    );
                } else {
                    rpass.draw(0..geometry.length(), 0..batch.count);
                }
                offset += len;
            }
        }

        self.queue.submit([encoder.finish()]);

        frame.present();

        self.batches.clear();
        Ok(())
    }
}

#[derive(Debug, Eq, Hash, PartialEq, Clone, Copy)]
pub struct MeshHandle(pub Index);

#[derive(Debug, Eq, Hash, PartialEq, Clone, Copy)]
pub struct TextureHandle(pub Index);
