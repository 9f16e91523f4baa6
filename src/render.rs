use std::{path::Path, sync::Arc};

use generational_arena::Arena;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindingResource, Buffer,
    BufferAddress, BufferDescriptor, BufferUsages, CommandEncoderDescriptor, Device, ErrorFilter,
    Extent3d, ImageDataLayout, LoadOp, Operations, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, Sampler, SamplerDescriptor, StoreOp, TextureDescriptor,
    TextureDimension, TextureUsages, TextureView, TextureViewDescriptor, VertexStepMode,
};

use crate::{
    bind::{build_layout, GLYPH_TEXTURE_ENTRIES, TEXT_UNIFORM_ENTRIES},
    camera::ScreenCamera,
    config::TextConfig,
    error::{Result, TextError},
    pipeline::PipelineBuilder,
    plain::{Plain, PlainSlice},
    text::{
        anchor::TextAnchor,
        batch::batch,
        font::FontContext,
        glyph_cache::{CacheStats, GlyphCache},
        layout::{
            layout_segmented, measure, BoundingBox, PositionedQuad, TextVertex, VERTICES_PER_GLYPH,
        },
    },
    texture::{GlyphTextures, Texture, TextureFormat, TextureHandle},
};

const TEXT_SHADER: &str = include_str!("shaders/text.wgsl");

fn pop_gpu_error(device: &Device, what: &str) -> Result<()> {
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(TextError::GpuResource(format!("{what}: {err}"))),
        None => Ok(()),
    }
}

struct GpuGlyph {
    texture: wgpu::Texture,
    bind_group: BindGroup,
}

/// Glyph textures living on the GPU, one texture and bind group each.
pub struct GpuTextures {
    device: Arc<Device>,
    queue: Arc<Queue>,
    layout: BindGroupLayout,
    sampler: Sampler,
    glyphs: Arena<GpuGlyph>,
}

impl GpuTextures {
    pub fn new(device: Arc<Device>, queue: Arc<Queue>) -> Self {
        let layout = build_layout(&device, "glyph texture layout", &GLYPH_TEXTURE_ENTRIES);
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("glyph sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            device,
            queue,
            layout,
            sampler,
            glyphs: Arena::new(),
        }
    }

    pub fn layout(&self) -> &BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self, handle: TextureHandle) -> Option<&BindGroup> {
        self.glyphs.get(handle.0).map(|glyph| &glyph.bind_group)
    }

    /// Live textures.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl GlyphTextures for GpuTextures {
    fn upload(&mut self, texture: &Texture) -> Result<TextureHandle> {
        let max = self.device.limits().max_texture_dimension_2d;
        if texture.width() > max || texture.height() > max {
            return Err(TextError::GpuResource(format!(
                "glyph bitmap {}x{} exceeds the device limit of {}",
                texture.width(),
                texture.height(),
                max
            )));
        }

        let size = Extent3d {
            width: texture.width(),
            height: texture.height(),
            depth_or_array_layers: 1,
        };

        self.device.push_error_scope(ErrorFilter::OutOfMemory);
        self.device.push_error_scope(ErrorFilter::Validation);

        let gpu_texture = self.device.create_texture(&TextureDescriptor {
            label: Some("glyph texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: texture.format.wgpu_format(),
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // rows are tightly packed, so no alignment padding
        self.queue.write_texture(
            gpu_texture.as_image_copy(),
            &texture.data,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(texture.bytes_per_row()),
                rows_per_image: Some(texture.height()),
            },
            size,
        );

        let view = gpu_texture.create_view(&TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&BindGroupDescriptor {
            label: Some("glyph bind group"),
            layout: &self.layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let validation = pop_gpu_error(&self.device, "glyph texture upload");
        let out_of_memory = pop_gpu_error(&self.device, "glyph texture allocation");
        if let Err(err) = validation.and(out_of_memory) {
            gpu_texture.destroy();
            return Err(err);
        }

        Ok(TextureHandle(self.glyphs.insert(GpuGlyph {
            texture: gpu_texture,
            bind_group,
        })))
    }

    fn release(&mut self, handle: TextureHandle) {
        match self.glyphs.remove(handle.0) {
            Some(glyph) => glyph.texture.destroy(),
            None => log::warn!("Released unknown glyph texture {:?}", handle),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextUniform {
    pub projection: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub shadow_offset: [f32; 2],
    pub shadow: u32,
    _padding: u32,
}

unsafe impl Plain for TextUniform {}

impl TextUniform {
    pub fn new(camera: &ScreenCamera, color: [f32; 3], config: &TextConfig) -> Self {
        Self {
            projection: camera.uniform(),
            color: [color[0], color[1], color[2], 1.0],
            shadow_offset: config.shadow_offset,
            shadow: config.shadow as u32,
            _padding: 0,
        }
    }
}

pub type TextCache = GlyphCache<FontContext, GpuTextures>;

/// Glyph count the vertex buffer must grow to for `glyphs`, or `None` when
/// `current` already fits them.
pub fn grown_capacity(current: usize, glyphs: usize) -> Option<usize> {
    (glyphs > current).then(|| glyphs.next_power_of_two())
}

/// GPU state for recording text draws: pipeline, uniforms and the shared
/// vertex buffer.
struct TextPass {
    device: Arc<Device>,
    queue: Arc<Queue>,
    pipeline: RenderPipeline,
    uniform_buffer: Buffer,
    uniform_bind_group: BindGroup,
    vertex_buffer: Buffer,
    /// In glyphs.
    vertex_capacity: usize,
}

impl TextPass {
    /// Uploads `quads` once, draws one run per texture and submits.
    fn draw(
        &mut self,
        view: &TextureView,
        textures: &GpuTextures,
        quads: &[PositionedQuad],
        uniform: &TextUniform,
    ) -> Result<()> {
        let batch = batch(quads);
        if batch.is_empty() {
            return Ok(());
        }

        self.reserve(batch.glyph_count())?;
        self.queue
            .write_buffer(&self.vertex_buffer, 0, batch.vertices.as_slice().as_bytes());
        self.queue
            .write_buffer(&self.uniform_buffer, 0, uniform.as_bytes());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("text encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("text pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

            for run in &batch.runs {
                let bind_group = textures.bind_group(run.texture).ok_or_else(|| {
                    TextError::GpuResource(format!("glyph texture {:?} is gone", run.texture))
                })?;
                pass.set_bind_group(1, bind_group, &[]);
                pass.draw(run.start..run.start + run.count, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn reserve(&mut self, glyphs: usize) -> Result<()> {
        let Some(capacity) = grown_capacity(self.vertex_capacity, glyphs) else {
            return Ok(());
        };
        log::debug!(
            "Growing text vertex buffer from {} to {} glyphs",
            self.vertex_capacity,
            capacity
        );

        self.device.push_error_scope(ErrorFilter::OutOfMemory);
        let buffer = create_vertex_buffer(&self.device, capacity);
        pop_gpu_error(&self.device, "text vertex buffer")?;

        self.vertex_buffer.destroy();
        self.vertex_buffer = buffer;
        self.vertex_capacity = capacity;
        Ok(())
    }
}

/// Draws strings onto a caller-provided target view.
///
/// [TextRenderer::render_text] uploads a string's vertices once and issues
/// one draw per run of glyphs sharing a texture, in a submission of its own.
/// Strings with more distinct characters than the glyph cache holds are
/// drawn in several submissions so no glyph is evicted before it is drawn.
/// Whatever the target already holds is kept.
pub struct TextRenderer {
    pass: TextPass,
    cache: TextCache,
    camera: ScreenCamera,
    config: TextConfig,
}

impl TextRenderer {
    /// Loads `font_path` (plus the configured fallback) and sets up the text
    /// pipeline for targets of `target_format`.
    pub fn new<P: AsRef<Path>>(
        device: Arc<Device>,
        queue: Arc<Queue>,
        target_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        font_path: P,
        config: TextConfig,
    ) -> Result<Self> {
        let font = FontContext::load(font_path, &config.fallback_font, config.font_size)?;
        let textures = GpuTextures::new(device.clone(), queue.clone());

        let uniform_layout = build_layout(&device, "text uniform layout", &TEXT_UNIFORM_ENTRIES);
        let fragment_entry = match config.texture_format {
            TextureFormat::Alpha8 => "fragment_alpha",
            TextureFormat::Rgba8 => "fragment_rgba",
        };
        let pipeline = PipelineBuilder::new()
            .with_format(target_format)
            .with_shader(TEXT_SHADER)
            .with_entry_points("vertex", fragment_entry)
            .with_cull_mode(None)
            .with_bind_layout(&uniform_layout)
            .with_bind_layout(textures.layout())
            .with_vb::<TextVertex>(
                VertexStepMode::Vertex,
                &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
            )
            .build(&device)?;

        device.push_error_scope(ErrorFilter::Validation);
        let uniform_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("text uniform buffer"),
            size: std::mem::size_of::<TextUniform>() as BufferAddress,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("text uniform bind group"),
            layout: &uniform_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let vertex_buffer = create_vertex_buffer(&device, config.max_glyphs_per_call);
        pop_gpu_error(&device, "text renderer setup")?;

        let cache = GlyphCache::new(font, textures, config.cache_capacity, config.texture_format);

        Ok(Self {
            pass: TextPass {
                device,
                queue,
                pipeline,
                uniform_buffer,
                uniform_bind_group,
                vertex_buffer,
                vertex_capacity: config.max_glyphs_per_call,
            },
            cache,
            camera: ScreenCamera::new(width, height),
            config,
        })
    }

    /// Draws `text` with its pen starting at pixel `(x, y)` on the baseline,
    /// bottom-left origin.
    pub fn render_text(
        &mut self,
        view: &TextureView,
        text: &str,
        x: f32,
        y: f32,
        scale: f32,
        color: [f32; 3],
    ) -> Result<BoundingBox> {
        let uniform = TextUniform::new(&self.camera, color, &self.config);
        let max_distinct = self.cache.capacity();
        let pass = &mut self.pass;
        layout_segmented(
            &mut self.cache,
            text,
            x,
            y,
            scale,
            max_distinct,
            |cache, quads| pass.draw(view, cache.textures(), quads, &uniform),
        )
    }

    /// Draws `text` at a viewport-relative position (0..1 on both axes), with
    /// `anchor` choosing which point of the text lands there.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        view: &TextureView,
        text: &str,
        x: f32,
        y: f32,
        scale: f32,
        anchor: TextAnchor,
        color: [f32; 3],
    ) -> Result<BoundingBox> {
        let bounds = self.bounding_box(text, scale)?;
        let (px, py) = self.camera.to_pixels(x, y);
        let (pen_x, pen_y) = anchor.origin(px, py, bounds);
        self.render_text(view, text, pen_x, pen_y, scale, color)
    }

    /// Measures `text` without drawing. Glyphs not yet cached get rasterized.
    pub fn bounding_box(&mut self, text: &str, scale: f32) -> Result<BoundingBox> {
        measure(&mut self.cache, text, scale)
    }

    /// Distance between baselines of consecutive lines at `scale`, from the
    /// primary font's metrics.
    pub fn line_height(&self, scale: f32) -> Option<f32> {
        self.cache
            .font()
            .line_metrics()
            .map(|metrics| metrics.new_line_size.ceil() * scale)
    }

    /// Replaces the primary font, keeping the configured fallback. All cached
    /// glyphs are dropped.
    pub fn load_font<P: AsRef<Path>>(&mut self, path: P, px: u32) -> Result<()> {
        let font = FontContext::load(path, &self.config.fallback_font, px)?;
        self.cache.set_font(font);
        self.config.font_size = px;
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera = ScreenCamera::new(width, height);
    }

    pub fn set_shadow(&mut self, shadow: bool) {
        self.config.shadow = shadow;
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &TextCache {
        &self.cache
    }

    pub fn camera(&self) -> &ScreenCamera {
        &self.camera
    }

    pub fn config(&self) -> &TextConfig {
        &self.config
    }
}

fn create_vertex_buffer(device: &Device, glyphs: usize) -> Buffer {
    device.create_buffer(&BufferDescriptor {
        label: Some("text vertex buffer"),
        size: vertex_buffer_size(glyphs),
        usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn vertex_buffer_size(glyphs: usize) -> BufferAddress {
    (glyphs * VERTICES_PER_GLYPH * std::mem::size_of::<TextVertex>()) as BufferAddress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_matches_the_wgsl_block() {
        // mat4x4 + vec4 + vec2 + u32 + padding
        assert_eq!(std::mem::size_of::<TextUniform>(), 96);
        assert_eq!(std::mem::size_of::<TextVertex>(), 16);
    }

    #[test]
    fn uniform_carries_colour_and_shadow() {
        let camera = ScreenCamera::new(640, 480);
        let config = TextConfig::default()
            .with_shadow(true)
            .with_shadow_offset([0.1, 0.2]);
        let uniform = TextUniform::new(&camera, [0.25, 0.5, 1.0], &config);

        assert_eq!(uniform.color, [0.25, 0.5, 1.0, 1.0]);
        assert_eq!(uniform.shadow, 1);
        assert_eq!(uniform.shadow_offset, [0.1, 0.2]);
        assert_eq!(uniform.projection, camera.uniform());
        assert_eq!(uniform.as_bytes().len(), 96);
    }

    #[test]
    fn vertex_buffer_grows_to_next_power_of_two() {
        assert_eq!(grown_capacity(100, 100), None);
        assert_eq!(grown_capacity(100, 101), Some(128));
        assert_eq!(grown_capacity(100, 1000), Some(1024));
        assert_eq!(grown_capacity(128, 64), None);
        assert_eq!(grown_capacity(128, 129), Some(256));
    }

    #[test]
    fn vertex_buffer_holds_six_vertices_per_glyph() {
        assert_eq!(vertex_buffer_size(100), 100 * 6 * 16);
        assert_eq!(vertex_buffer_size(1), 96);
    }
}
