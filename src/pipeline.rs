use wgpu::{
    BindGroupLayout, BlendState, ColorTargetState, ColorWrites, Device, Face, FragmentState,
    MultisampleState, PipelineCompilationOptions, PipelineLayoutDescriptor, PrimitiveState,
    RenderPipeline, RenderPipelineDescriptor, ShaderModuleDescriptor, TextureFormat,
    VertexAttribute, VertexState, VertexStepMode,
};

use crate::{
    bind::VertexBufferEntry,
    error::{Result, TextError},
};

/// Collects what a wgpu render pipeline needs and builds it in one go.
///
/// ```ignore
/// let pipeline = PipelineBuilder::new()
///     .with_format(surface_format)
///     .with_shader(include_str!("shaders/text.wgsl"))
///     .with_bind_layout(&uniform_layout)
///     .with_vb::<TextVertex>(VertexStepMode::Vertex, &vertex_attr_array![0 => Float32x2, 1 => Float32x2])
///     .build(&device)?;
/// ```
pub struct PipelineBuilder<'a> {
    bind_layouts: Vec<&'a BindGroupLayout>,
    shader_src: Option<String>,
    vertex_entry: &'a str,
    fragment_entry: &'a str,
    primitive_state: PrimitiveState,
    format: TextureFormat,
    blend: Option<BlendState>,
    vertex_entries: Vec<VertexBufferEntry>,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new() -> Self {
        Self {
            bind_layouts: Vec::new(),
            shader_src: None,
            vertex_entry: "vertex",
            fragment_entry: "fragment",
            primitive_state: PrimitiveState::default(),
            format: TextureFormat::Bgra8UnormSrgb,
            blend: Some(BlendState::ALPHA_BLENDING),
            vertex_entries: Vec::new(),
        }
    }

    pub fn with_cull_mode(mut self, cull_mode: Option<Face>) -> Self {
        self.primitive_state.cull_mode = cull_mode;
        self
    }

    pub fn with_shader(mut self, shader_src: &str) -> Self {
        self.shader_src = Some(shader_src.into());
        self
    }

    pub fn with_entry_points(mut self, vertex: &'a str, fragment: &'a str) -> Self {
        self.vertex_entry = vertex;
        self.fragment_entry = fragment;
        self
    }

    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    /// Layouts are bound to groups in the order they're added.
    pub fn with_bind_layout(mut self, layout: &'a BindGroupLayout) -> Self {
        self.bind_layouts.push(layout);
        self
    }

    pub fn with_vb<T>(mut self, step_mode: VertexStepMode, attributes: &[VertexAttribute]) -> Self {
        self.vertex_entries.push(VertexBufferEntry {
            array_stride: std::mem::size_of::<T>() as u64,
            step_mode,
            attributes: attributes.into(),
        });
        self
    }

    /// Compiles the shader and creates the pipeline. Validation failures,
    /// including WGSL errors, come back as [TextError::ShaderCompile].
    pub fn build(&self, device: &Device) -> Result<RenderPipeline> {
        let shader_src = self
            .shader_src
            .as_deref()
            .ok_or_else(|| TextError::ShaderCompile("no shader source set".into()))?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("text shader"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("text pipeline layout"),
            bind_group_layouts: self.bind_layouts.as_slice(),
            push_constant_ranges: &[],
        });

        let vbs = self
            .vertex_entries
            .iter()
            .map(|ent| ent.layout())
            .collect::<Vec<_>>();

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("text pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &module,
                entry_point: self.vertex_entry,
                buffers: vbs.as_slice(),
                compilation_options: PipelineCompilationOptions::default(),
            },
            primitive: self.primitive_state,
            depth_stencil: None,
            multisample: MultisampleState::default(),
            fragment: Some(FragmentState {
                module: &module,
                entry_point: self.fragment_entry,
                targets: &[Some(ColorTargetState {
                    format: self.format,
                    blend: self.blend,
                    write_mask: ColorWrites::all(),
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            multiview: None,
        });

        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(TextError::ShaderCompile(err.to_string())),
            None => Ok(pipeline),
        }
    }
}

impl Default for PipelineBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
