// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The device seam.

A [Device] is whatever graphics context the application already has.  Streams only need a small
capability set from it: textures, staging buffers that can be copied into textures, and fences
that report when submitted work has finished.

Two devices ship with the crate:

* [software::SoftwareDevice] runs everything on the CPU.  Its fences are controllable, and it
  can read back whatever is bound, so it doubles as the test device.
* `wgpu::WgpuDevice` (feature `backend_wgpu`) drives a real GPU.
*/

use crate::bindings::bind_style::TextureUnit;
use crate::bindings::coordinates::Extent;
use crate::bindings::sampler::FilterMode;
use crate::bindings::visible_to::StagingUsage;
use crate::error::Error;
use crate::fence::WaitStatus;
use crate::pixel_formats::TexelLayout;
use crate::sys::time::Duration;
use std::fmt::Debug;

pub mod software;

#[cfg(feature = "backend_wgpu")]
pub mod wgpu;

/// Everything a device needs to allocate one slot texture.
#[derive(Debug, Clone, Copy)]
pub struct TextureDescriptor<'a> {
    pub debug_name: &'a str,
    pub extent: Extent,
    pub layout: TexelLayout,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
}

/**
A copy from a staging buffer into a texture.

The copy reads `extent.height` rows starting at byte 0 of the staging buffer, `bytes_per_row`
apart, and writes them at texel (0,0) of the destination.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexelCopy {
    pub extent: Extent,
    pub bytes_per_row: usize,
    pub bytes_per_texel: usize,
}

impl TexelCopy {
    /// Bytes of each row that are actually copied.
    pub const fn row_bytes(&self) -> usize {
        self.extent.width as usize * self.bytes_per_texel
    }
}

/**
The capabilities a texture stream requires from a graphics context.

All calls are made from the thread that owns the context.  Methods take `&self` so that the
device can be shared between streams as `Arc<D>`; implementations that need mutation use
interior mutability.
*/
pub trait Device: Debug {
    type Texture: Debug;
    type StagingBuffer: Debug;
    type Fence: Debug;

    /// Whether textures of this layout can be created.
    fn supports_layout(&self, layout: TexelLayout) -> bool;

    /// Capability probe for fences.  When false, [Device::insert_fence] is never called.
    fn supports_fences(&self) -> bool;

    /// Allocates a texture.  Contents are zero.
    fn create_texture(&self, descriptor: &TextureDescriptor<'_>) -> Result<Self::Texture, Error>;

    /// Allocates a zero-filled staging buffer of `byte_len` bytes.
    fn create_staging_buffer(
        &self,
        byte_len: usize,
        usage: StagingUsage,
        debug_name: &str,
    ) -> Result<Self::StagingBuffer, Error>;

    /// Host-side write into the staging buffer.
    fn write_staging(&self, staging: &mut Self::StagingBuffer, offset: usize, bytes: &[u8]);

    /// Zero-fills the entire staging buffer.
    fn clear_staging(&self, staging: &mut Self::StagingBuffer);

    /// Issues an asynchronous device-side copy.  Does not wait for it.
    fn copy_staging_to_texture(
        &self,
        staging: &Self::StagingBuffer,
        texture: &Self::Texture,
        copy: TexelCopy,
    );

    /// Inserts a fence covering all work issued so far.
    fn insert_fence(&self) -> Self::Fence;

    /// Non-blocking check.
    fn fence_signalled(&self, fence: &Self::Fence) -> bool;

    /// Blocks until the fence signals or `timeout` elapses.
    fn wait_fence(&self, fence: &Self::Fence, timeout: Duration) -> WaitStatus;

    /// Releases the fence handle.
    fn delete_fence(&self, fence: Self::Fence);

    /// Makes `texture` the active texture on `unit`, or clears the unit when `None`.
    fn bind_texture(&self, unit: TextureUnit, texture: Option<&Self::Texture>);
}
