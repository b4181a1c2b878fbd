// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use super::error::BackendError;
use super::pixel_format::wgpu_format;
use super::sampler::create_sampler;
use super::texture::{WgpuFence, WgpuStaging, WgpuTexture, texture_descriptor, write_texture};
use crate::bindings::bind_style::TextureUnit;
use crate::bindings::visible_to::StagingUsage;
use crate::error::Error;
use crate::fence::WaitStatus;
use crate::imp::{Device, TexelCopy, TextureDescriptor};
use crate::pixel_formats::TexelLayout;
use crate::sys::time::{Duration, Instant};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use wgpu::{Limits, PollType, Trace};

/**
A wgpu device and queue, as a stream [Device].

Streams share the device through `Arc<WgpuDevice>`.  Whatever a stream binds on a unit can be
fetched with [WgpuDevice::bound] when building bind groups.

```
# if cfg!(not(feature = "testing")) { return; }
use std::sync::Arc;
use texture_streams::imp::wgpu::WgpuDevice;
# test_executors::sleep_on(async {
let device = Arc::new(WgpuDevice::headless().await.expect("no GPU"));
assert!(device.device().limits().max_texture_dimension_2d >= 4096);
# });
```
*/
#[derive(Debug)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    fences_supported: bool,
    bound: Mutex<HashMap<TextureUnit, WgpuTexture>>,
}

impl WgpuDevice {
    /// Wraps a device and queue the application already created.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        WgpuDevice {
            device,
            queue,
            //browser queues only progress between event loop turns
            fences_supported: !cfg!(target_arch = "wasm32"),
            bound: Mutex::new(HashMap::new()),
        }
    }

    /// Requests a device on the default adapter with no surface.
    pub async fn headless() -> Result<Self, Error> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let options = wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: None,
        };
        let adapter = instance
            .request_adapter(&options)
            .await
            .map_err(|_| BackendError::NoSuchAdapter)?;
        let mut limits = Limits::downlevel_webgl2_defaults();
        //webGL is quite serious about enforcing these, which
        //by default are rather small
        limits.max_texture_dimension_1d = 4096;
        limits.max_texture_dimension_2d = 4096;
        let descriptor = wgpu::DeviceDescriptor {
            label: Some("texture_streams headless device"),
            required_features: Default::default(),
            required_limits: limits,
            memory_hints: Default::default(),
            trace: Trace::Off,
        };
        let (device, queue) = adapter
            .request_device(&descriptor)
            .await
            .map_err(BackendError::from)?;
        Ok(Self::from_parts(device, queue))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The texture, view and sampler bound on `unit`.
    pub fn bound(&self, unit: TextureUnit) -> Option<WgpuTexture> {
        self.lock_bound().get(&unit).cloned()
    }

    fn lock_bound(&self) -> std::sync::MutexGuard<'_, HashMap<TextureUnit, WgpuTexture>> {
        //the map holds no invariants a panic could break
        self.bound
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn poll(&self) -> bool {
        match self.device.poll(PollType::Poll) {
            Ok(_) => true,
            Err(e) => {
                logwise::error_sync!(
                    "WgpuDevice poll failed: {e}",
                    e = logwise::privacy::LogIt(&e)
                );
                false
            }
        }
    }
}

impl Device for WgpuDevice {
    type Texture = WgpuTexture;
    type StagingBuffer = WgpuStaging;
    type Fence = WgpuFence;

    fn supports_layout(&self, layout: TexelLayout) -> bool {
        //16-bit normalized formats need an optional feature
        wgpu_format(layout)
            .is_some_and(|format| self.device.features().contains(format.required_features()))
    }

    fn supports_fences(&self) -> bool {
        self.fences_supported
    }

    fn create_texture(&self, descriptor: &TextureDescriptor<'_>) -> Result<WgpuTexture, Error> {
        let format = wgpu_format(descriptor.layout).ok_or_else(|| descriptor.layout.unsupported())?;
        let max = self.device.limits().max_texture_dimension_2d;
        if u32::from(descriptor.extent.width) > max || u32::from(descriptor.extent.height) > max {
            return Err(Error::Device {
                operation: "create a texture",
                reason: format!(
                    "{}x{} exceeds the device limit of {}",
                    descriptor.extent.width, descriptor.extent.height, max
                ),
            });
        }
        let texture = self.device.create_texture(&texture_descriptor(
            descriptor.debug_name,
            descriptor.extent,
            format,
        ));
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sampler(
            &self.device,
            descriptor.debug_name,
            descriptor.min_filter,
            descriptor.mag_filter,
        );
        Ok(WgpuTexture {
            texture,
            view,
            sampler,
            extent: descriptor.extent,
        })
    }

    fn create_staging_buffer(
        &self,
        byte_len: usize,
        usage: StagingUsage,
        debug_name: &str,
    ) -> Result<WgpuStaging, Error> {
        Ok(WgpuStaging {
            buffer: vec![0; byte_len].into_boxed_slice(),
            usage,
            debug_name: debug_name.to_string(),
        })
    }

    fn write_staging(&self, staging: &mut WgpuStaging, offset: usize, bytes: &[u8]) {
        staging.buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn clear_staging(&self, staging: &mut WgpuStaging) {
        staging.buffer.fill(0);
    }

    fn copy_staging_to_texture(&self, staging: &WgpuStaging, texture: &WgpuTexture, copy: TexelCopy) {
        write_texture(&self.queue, staging, texture, copy);
        self.queue.submit(std::iter::empty());
    }

    fn insert_fence(&self) -> WgpuFence {
        let done = Arc::new(AtomicBool::new(false));
        let move_done = done.clone();
        self.queue.on_submitted_work_done(move || {
            move_done.store(true, Ordering::Release);
        });
        WgpuFence { done }
    }

    fn fence_signalled(&self, fence: &WgpuFence) -> bool {
        if fence.is_done() {
            return true;
        }
        self.poll();
        fence.is_done()
    }

    fn wait_fence(&self, fence: &WgpuFence, timeout: Duration) -> WaitStatus {
        if fence.is_done() {
            return WaitStatus::AlreadySignalled;
        }
        let deadline = Instant::now() + timeout;
        loop {
            if !self.poll() {
                return WaitStatus::WaitFailed;
            }
            if fence.is_done() {
                return WaitStatus::ConditionSatisfied;
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitStatus::TimeoutExpired;
            }
            std::thread::sleep((deadline - now).min(Duration::from_millis(1)));
        }
    }

    fn delete_fence(&self, _fence: WgpuFence) {
        //the callback holds its own reference to the flag
    }

    fn bind_texture(&self, unit: TextureUnit, texture: Option<&WgpuTexture>) {
        let mut bound = self.lock_bound();
        match texture {
            Some(texture) => {
                bound.insert(unit, texture.clone());
            }
            None => {
                bound.remove(&unit);
            }
        }
    }
}
