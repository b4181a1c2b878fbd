// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
wgpu implementation of [Device](crate::imp::Device).

Streams drive wgpu through the queue only:

* staging buffers are CPU memory handed to `queue.write_texture`, so rows need no 256-byte
  alignment;
* each copy is followed by an empty submit, which gives `on_submitted_work_done` something to
  track;
* fences are flags flipped by that callback and driven by `device.poll`.

The browser's WebGPU/WebGL event loop cannot be polled synchronously, so on wasm32 the device
reports no fence support and streams fall back to single-ahead uploads.
*/

mod bound_device;
mod error;
mod pixel_format;
mod sampler;
mod texture;

pub use bound_device::WgpuDevice;
pub use texture::{WgpuFence, WgpuStaging, WgpuTexture};
