/*! texture_streams moves CPU-produced images onto the GPU continuously without stalling either
side.

A [TextureStream] looks like one texture to the renderer and like an upload sink to the producer.
Underneath it is a small ring of slots, each a GPU texture with its own staging memory and
completion fence.  The producer writes into one slot while the renderer samples another;
fences decide when a slot may change hands.

| Concern          | Behavior                                                              |
|------------------|-----------------------------------------------------------------------|
| Producer stalls  | Never.  When every writable slot is busy the upload is dropped.       |
| Torn frames      | Never.  A slot is only bound after its copy is observed complete.     |
| Latency          | Bind always selects the freshest completed slot.                      |
| Partial uploads  | A region at (0,0); optionally the rest of the texture is cleared.     |
| No fences        | Detected once; uploads proceed as if every copy finished at once.     |

# Devices

Streams are generic over [Device], the small capability set they need from a graphics context.
[SoftwareDevice] runs on the CPU with scriptable fences.  With the `backend_wgpu` feature (on by
default), [WgpuDevice] drives a real GPU.

# Example

```
use std::sync::Arc;
use texture_streams::{SoftwareDevice, StreamConfig, TextureStream, Upload};
use texture_streams::pixel_formats::{TexelLayout, Unorm4};

let device = Arc::new(SoftwareDevice::new());
let mut stream = TextureStream::new(&device, StreamConfig::new(2, 2, TexelLayout::rgba8()))?;
match stream.upload_region(&[Unorm4::RED; 4], 2, 2)? {
    Upload::Submitted { slot } => assert_eq!(slot, 1),
    Upload::Dropped => unreachable!("nothing is being read yet"),
}
let bound = stream.bound();
assert_eq!(device.read_bound(bound.texture_unit()).unwrap(), [255_u8, 0, 0, 255].repeat(4));
# Ok::<(), texture_streams::Error>(())
```
*/

pub mod bindings;
pub mod pixel_formats;
pub mod imp;
pub mod fence;
mod multibuffer;
mod sys;
mod error;

pub use bindings::forward::dynamic::texture_stream::{BoundStream, StreamConfig, TextureStream, Upload};
pub use error::Error;
pub use fence::{FenceStrategy, SyncFence, WaitStatus};
pub use imp::Device;
pub use imp::software::SoftwareDevice;
#[cfg(feature = "backend_wgpu")]
pub use imp::wgpu::WgpuDevice;
pub use sys::time::Duration;
