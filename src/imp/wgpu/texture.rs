// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::bindings::coordinates::Extent;
use crate::bindings::visible_to::StagingUsage;
use crate::imp::TexelCopy;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use wgpu::{Extent3d, TexelCopyBufferLayout, TexelCopyTextureInfo};

/// A slot texture with the view and sampler a renderer binds.
#[derive(Debug, Clone)]
pub struct WgpuTexture {
    pub(super) texture: wgpu::Texture,
    pub(super) view: wgpu::TextureView,
    pub(super) sampler: wgpu::Sampler,
    pub(super) extent: Extent,
}

impl WgpuTexture {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
    pub fn extent(&self) -> Extent {
        self.extent
    }
}

/**
CPU-side staging storage.

`queue.write_texture` takes a data slice directly, so staging is host memory rather than a
mapped buffer.
*/
pub struct WgpuStaging {
    pub(super) buffer: Box<[u8]>,
    pub(super) usage: StagingUsage,
    pub(super) debug_name: String,
}

impl std::fmt::Debug for WgpuStaging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuStaging")
            .field("debug_name", &self.debug_name)
            .field("usage", &self.usage)
            .field("buffer_len", &self.buffer.len())
            .finish()
    }
}

/// Set by `on_submitted_work_done` once the queue reaches the fence.
#[derive(Debug)]
pub struct WgpuFence {
    pub(super) done: Arc<AtomicBool>,
}

impl WgpuFence {
    pub(super) fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

pub(super) fn texture_descriptor(
    debug_name: &str,
    extent: Extent,
    format: wgpu::TextureFormat,
) -> wgpu::TextureDescriptor<'_> {
    wgpu::TextureDescriptor {
        label: Some(debug_name),
        size: Extent3d {
            width: extent.width.into(),
            height: extent.height.into(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        //COPY_SRC lets renderers and tests read a slot back
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    }
}

/// Queues `copy` on `queue`.  Submission happens separately.
pub(super) fn write_texture(
    queue: &wgpu::Queue,
    staging: &WgpuStaging,
    texture: &WgpuTexture,
    copy: TexelCopy,
) {
    let rows = copy.extent.height as usize;
    // the last row only needs its copied bytes
    let data_len = copy.bytes_per_row * (rows - 1) + copy.row_bytes();
    logwise::trace_sync!(
        "write_texture: {name} {w}x{h}, {bytes} bytes",
        name = logwise::privacy::LogIt(&staging.debug_name),
        w = copy.extent.width,
        h = copy.extent.height,
        bytes = data_len
    );
    queue.write_texture(
        TexelCopyTextureInfo {
            texture: &texture.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &staging.buffer[..data_len],
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(copy.bytes_per_row as u32),
            rows_per_image: Some(copy.extent.height.into()),
        },
        Extent3d {
            width: copy.extent.width.into(),
            height: copy.extent.height.into(),
            depth_or_array_layers: 1,
        },
    );
}
