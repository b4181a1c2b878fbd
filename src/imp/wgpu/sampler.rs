use crate::bindings::sampler::FilterMode;
use wgpu::{AddressMode, SamplerDescriptor};

fn wgpu_filter(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

/// A clamp-to-edge sampler.  Stream textures have a single mip level.
pub(crate) fn create_sampler(
    device: &wgpu::Device,
    debug_name: &str,
    min_filter: FilterMode,
    mag_filter: FilterMode,
) -> wgpu::Sampler {
    let s = SamplerDescriptor {
        label: Some(debug_name),
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToEdge,
        address_mode_w: AddressMode::ClampToEdge,
        mag_filter: wgpu_filter(mag_filter),
        min_filter: wgpu_filter(min_filter),
        mipmap_filter: wgpu::FilterMode::Nearest,
        lod_min_clamp: 0.0,
        lod_max_clamp: 0.0,
        compare: None,
        anisotropy_clamp: 1,
        border_color: None,
    };
    device.create_sampler(&s)
}
