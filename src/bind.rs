use std::num::NonZeroU32;

use wgpu::{
    BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BufferAddress,
    SamplerBindingType, ShaderStages, TextureSampleType, TextureViewDimension, VertexAttribute,
    VertexBufferLayout, VertexStepMode,
};

#[derive(Clone, Copy, Debug)]
pub enum BindEntryType {
    BufferUniform,
    Texture {
        sample_type: TextureSampleType,
        view_dimension: TextureViewDimension,
    },
    Sampler(SamplerBindingType),
}

#[derive(Clone, Copy, Debug)]
pub struct BindEntry {
    pub visibility: ShaderStages,
    pub ty: BindEntryType,
    pub count: Option<NonZeroU32>,
}

impl BindEntry {
    pub fn layout_entry(&self, binding: u32) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility: self.visibility,
            ty: match self.ty {
                BindEntryType::BufferUniform => wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                BindEntryType::Texture {
                    sample_type,
                    view_dimension,
                } => wgpu::BindingType::Texture {
                    sample_type,
                    view_dimension,
                    multisampled: false,
                },
                BindEntryType::Sampler(binding_type) => wgpu::BindingType::Sampler(binding_type),
            },
            count: self.count,
        }
    }
}

/// Builds a layout whose bindings are numbered in the order of `entries`.
pub fn build_layout(device: &wgpu::Device, label: &str, entries: &[BindEntry]) -> BindGroupLayout {
    let layout_entries = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| entry.layout_entry(idx as u32))
        .collect::<Vec<_>>();

    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &layout_entries,
    })
}

/// Group 0: projection, colour and shadow settings.
pub const TEXT_UNIFORM_ENTRIES: [BindEntry; 1] = [BindEntry {
    visibility: ShaderStages::VERTEX_FRAGMENT,
    ty: BindEntryType::BufferUniform,
    count: None,
}];

/// Group 1: one glyph texture and its sampler.
pub const GLYPH_TEXTURE_ENTRIES: [BindEntry; 2] = [
    BindEntry {
        visibility: ShaderStages::FRAGMENT,
        ty: BindEntryType::Texture {
            sample_type: TextureSampleType::Float { filterable: true },
            view_dimension: TextureViewDimension::D2,
        },
        count: None,
    },
    BindEntry {
        visibility: ShaderStages::FRAGMENT,
        ty: BindEntryType::Sampler(SamplerBindingType::Filtering),
        count: None,
    },
];

pub struct VertexBufferEntry {
    pub array_stride: BufferAddress,
    pub step_mode: VertexStepMode,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexBufferEntry {
    pub fn layout(&self) -> VertexBufferLayout {
        VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: self.step_mode,
            attributes: self.attributes.as_slice(),
        }
    }
}
