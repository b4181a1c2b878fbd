// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Cross-platform texture stream.

A texture stream is a texture whose contents are replaced repeatedly by a producer while a
renderer keeps drawing from it.  Behind the single logical texture are N slots, each a
(texture, staging buffer, fence) triple:

```text
            upload_region                              bind
 producer ─────────────▶ [ slot w ] ──copy──▶ GPU ──fence──▶ [ slot r ] ─────▶ renderer
                          staging              texture                  texture unit
```

* Uploads go round-robin into the slot after the current write slot.
* Binds pick the freshest slot whose copy the device has finished, and never move back to a slot
  older than the one already being read.
* An upload that would overwrite the slot being read is dropped.  The producer never waits and
  the renderer never sees a half-written texture; the price is that some frames are never shown.

All calls happen on the thread that owns the device.  Nothing here locks.

# Example

```
use std::sync::Arc;
use texture_streams::bindings::forward::dynamic::texture_stream::{StreamConfig, TextureStream, Upload};
use texture_streams::imp::software::SoftwareDevice;
use texture_streams::pixel_formats::{TexelLayout, Unorm4};

let device = Arc::new(SoftwareDevice::new());
let config = StreamConfig::new(4, 4, TexelLayout::rgba8()).with_debug_name("example");
let mut stream = TextureStream::new(&device, config).expect("stream");

let frame = [Unorm4::RED; 16];
assert!(matches!(stream.upload_region(&frame, 4, 4), Ok(Upload::Submitted { .. })));
assert!(stream.is_ready());

let bound = stream.bound();
// ... draw with whatever the device has on bound.texture_unit() ...
drop(bound);
```
*/

use crate::bindings::bind_style::TextureUnit;
use crate::bindings::coordinates::Extent;
use crate::bindings::sampler::FilterMode;
use crate::bindings::visible_to::StagingUsage;
use crate::error::Error;
use crate::fence::{FenceStrategy, SyncFence, WaitStatus};
use crate::imp::{Device, TexelCopy, TextureDescriptor};
use crate::multibuffer::SlotRing;
use crate::pixel_formats::{pixel_as_bytes, Texel, TexelLayout};
use crate::sys::time::{Duration, Instant};
use std::ops::Deref;
use std::sync::Arc;

/// Configuration for [TextureStream::new].
#[derive(Debug, Clone)]
pub struct StreamConfig<'a> {
    pub width: u16,
    pub height: u16,
    pub layout: TexelLayout,
    /// Number of slots.  One slot disables multibuffering.
    pub slots: usize,
    pub staging_usage: StagingUsage,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub texture_unit: TextureUnit,
    /// Bound on the blocking wait for initialization uploads.
    pub init_timeout: Duration,
    pub debug_name: &'a str,
}

impl<'a> StreamConfig<'a> {
    pub const DEFAULT_SLOTS: usize = 2;
    pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(2);

    pub fn new(width: u16, height: u16, layout: TexelLayout) -> Self {
        StreamConfig {
            width,
            height,
            layout,
            slots: Self::DEFAULT_SLOTS,
            staging_usage: StagingUsage::default(),
            min_filter: FilterMode::default(),
            mag_filter: FilterMode::default(),
            texture_unit: TextureUnit::default(),
            init_timeout: Self::DEFAULT_INIT_TIMEOUT,
            debug_name: "texture_stream",
        }
    }

    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_staging_usage(mut self, usage: StagingUsage) -> Self {
        self.staging_usage = usage;
        self
    }

    pub fn with_filters(mut self, min_filter: FilterMode, mag_filter: FilterMode) -> Self {
        self.min_filter = min_filter;
        self.mag_filter = mag_filter;
        self
    }

    pub fn with_texture_unit(mut self, unit: TextureUnit) -> Self {
        self.texture_unit = unit;
        self
    }

    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    pub fn with_debug_name(mut self, debug_name: &'a str) -> Self {
        self.debug_name = debug_name;
        self
    }
}

/// Result of an upload.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upload {
    /// The data was copied into `slot`.
    Submitted { slot: usize },
    /// Every writable slot was busy; the data was discarded.
    Dropped,
}

impl Upload {
    pub fn is_dropped(&self) -> bool {
        matches!(self, Upload::Dropped)
    }

    pub fn slot(&self) -> Option<usize> {
        match self {
            Upload::Submitted { slot } => Some(*slot),
            Upload::Dropped => None,
        }
    }
}

#[derive(Debug)]
struct Slot<D: Device> {
    texture: D::Texture,
    staging: D::StagingBuffer,
    //None once the upload has been observed complete
    fence: Option<SyncFence<D>>,
    //content written since the slot was last cleared
    written: Extent,
}

impl<D: Device> Slot<D> {
    fn retire_if_signalled(&mut self) -> bool {
        let signalled = self
            .fence
            .as_mut()
            .is_some_and(|fence| fence.poll_and_delete());
        if signalled {
            self.fence = None;
        }
        signalled
    }
}

/**
A multibuffered texture fed from the CPU.

See the [module documentation](self) for the overall protocol.
*/
#[derive(Debug)]
pub struct TextureStream<D: Device> {
    device: Arc<D>,
    slots: Vec<Slot<D>>,
    ring: SlotRing,
    extent: Extent,
    layout: TexelLayout,
    staging_capacity: usize,
    texture_unit: TextureUnit,
    strategy: FenceStrategy,
    last_uploaded_shape: Extent,
    ever_completed: bool,
    //false until the init uploads are confirmed
    constructed: bool,
    debug_name: String,
}

impl<D: Device> TextureStream<D> {
    /**
    Allocates every slot and waits for each one to hold defined contents.

    Each slot receives one zero filler texel through the normal copy path, and construction blocks
    until all of those copies are observed complete or `config.init_timeout` elapses.

    # Errors
    * [Error::InvalidConfiguration] for a zero extent or zero slots.
    * [Error::InvalidFormat] when the device cannot represent `config.layout`.
    * [Error::InitializationTimeout] / [Error::InitializationFailed] when the initialization copies
      cannot be confirmed.  The device is likely broken or badly overloaded.
    */
    pub fn new(device: &Arc<D>, config: StreamConfig<'_>) -> Result<Self, Error> {
        if config.width == 0 || config.height == 0 {
            return Err(Error::InvalidConfiguration("texture extent must be non-zero"));
        }
        if config.slots == 0 {
            return Err(Error::InvalidConfiguration("a stream needs at least one slot"));
        }
        if !device.supports_layout(config.layout) {
            return Err(config.layout.unsupported());
        }
        let strategy = FenceStrategy::probe(device.as_ref());
        if strategy == FenceStrategy::AlwaysSignalled {
            logwise::warn_sync!(
                "TextureStream {name}: device has no fences; uploads will not overlap rendering",
                name = logwise::privacy::LogIt(config.debug_name)
            );
        }

        let extent = Extent::new(config.width, config.height);
        let staging_capacity = extent.texel_count() * config.layout.bytes_per_texel();
        let mut slots = Vec::with_capacity(config.slots);
        for index in 0..config.slots {
            let texture_name = format!("{}[{}]", config.debug_name, index);
            let texture = device.create_texture(&TextureDescriptor {
                debug_name: &texture_name,
                extent,
                layout: config.layout,
                min_filter: config.min_filter,
                mag_filter: config.mag_filter,
            })?;
            let staging = device.create_staging_buffer(
                staging_capacity,
                config.staging_usage,
                &format!("{}_staging", texture_name),
            )?;
            slots.push(Slot {
                texture,
                staging,
                fence: None,
                written: Extent::default(),
            });
        }

        let mut stream = TextureStream {
            device: device.clone(),
            slots,
            ring: SlotRing::new(config.slots),
            extent,
            layout: config.layout,
            staging_capacity,
            texture_unit: config.texture_unit,
            strategy,
            last_uploaded_shape: Extent::default(),
            ever_completed: false,
            constructed: false,
            debug_name: config.debug_name.to_string(),
        };
        stream.clear_all_slots();
        stream.drain_init_fences(config.init_timeout)?;
        stream.ring.reset();
        stream.constructed = true;
        logwise::info_sync!(
            "TextureStream {name} created: {width}x{height}, {slots} slots",
            name = logwise::privacy::LogIt(&stream.debug_name),
            width = extent.width,
            height = extent.height,
            slots = config.slots
        );
        Ok(stream)
    }

    fn clear_all_slots(&mut self) {
        let bytes_per_texel = self.layout.bytes_per_texel();
        let filler = vec![0_u8; bytes_per_texel];
        let filler_extent = Extent::new(1, 1);
        for slot in &mut self.slots {
            self.device.clear_staging(&mut slot.staging);
            self.device.write_staging(&mut slot.staging, 0, &filler);
            self.device.copy_staging_to_texture(
                &slot.staging,
                &slot.texture,
                TexelCopy {
                    extent: filler_extent,
                    bytes_per_row: bytes_per_texel,
                    bytes_per_texel,
                },
            );
            slot.fence = Some(SyncFence::submitted(&self.device, self.strategy));
            slot.written = filler_extent;
        }
    }

    fn drain_init_fences(&mut self, timeout: Duration) -> Result<(), Error> {
        let wait = logwise::perfwarn_begin!("TextureStream initialization wait");
        let deadline = Instant::now() + timeout;
        for slot in &mut self.slots {
            let Some(fence) = slot.fence.take() else {
                continue;
            };
            let remaining = deadline.saturating_duration_since(Instant::now());
            match fence.block_until_signalled(remaining) {
                WaitStatus::AlreadySignalled | WaitStatus::ConditionSatisfied => {}
                WaitStatus::TimeoutExpired => {
                    logwise::error_sync!(
                        "TextureStream {name}: initialization uploads did not complete in time",
                        name = logwise::privacy::LogIt(&self.debug_name)
                    );
                    return Err(Error::InitializationTimeout(timeout));
                }
                WaitStatus::WaitFailed => {
                    logwise::error_sync!(
                        "TextureStream {name}: waiting on an initialization fence failed",
                        name = logwise::privacy::LogIt(&self.debug_name)
                    );
                    return Err(Error::InitializationFailed);
                }
            }
        }
        drop(wait);
        Ok(())
    }

    /**
    Writes `data` at texel (0,0).  Texels outside the `width × height` region keep whatever the
    target slot held before.

    `data` holds `width × height` texels, rows tightly packed.  The size of `T` must equal the
    stream's bytes per texel.

    Returns [Upload::Dropped] without doing anything when the only writable slot is the one being
    read.
    */
    pub fn upload_region<T: Texel>(
        &mut self,
        data: &[T],
        width: u16,
        height: u16,
    ) -> Result<Upload, Error> {
        self.upload(
            pixel_as_bytes(data),
            std::mem::size_of::<T>(),
            Extent::new(width, height),
            false,
        )
    }

    /// Like [TextureStream::upload_region], for data already in bytes.
    pub fn upload_region_bytes(
        &mut self,
        data: &[u8],
        bytes_per_texel: usize,
        width: u16,
        height: u16,
    ) -> Result<Upload, Error> {
        self.upload(data, bytes_per_texel, Extent::new(width, height), false)
    }

    /**
    Like [TextureStream::upload_region], but clears the target texture first when the region is
    smaller in either dimension than the largest region written so far, or than what the target
    slot currently holds.  Nothing from a previous, larger upload survives outside the region.

    The assumption is that region sizes change rarely; a clear costs a full-texture copy.
    */
    pub fn upload_region_with_clear<T: Texel>(
        &mut self,
        data: &[T],
        width: u16,
        height: u16,
    ) -> Result<Upload, Error> {
        self.upload(
            pixel_as_bytes(data),
            std::mem::size_of::<T>(),
            Extent::new(width, height),
            true,
        )
    }

    /// Like [TextureStream::upload_region_with_clear], for data already in bytes.
    pub fn upload_region_bytes_with_clear(
        &mut self,
        data: &[u8],
        bytes_per_texel: usize,
        width: u16,
        height: u16,
    ) -> Result<Upload, Error> {
        self.upload(data, bytes_per_texel, Extent::new(width, height), true)
    }

    fn validate(&self, byte_len: usize, bytes_per_texel: usize, region: Extent) -> Result<(), Error> {
        let expected = self.layout.bytes_per_texel();
        if bytes_per_texel != expected {
            return Err(Error::TexelSizeMismatch {
                expected,
                found: bytes_per_texel,
            });
        }
        let bytes = region.texel_count() * bytes_per_texel;
        if !region.fits_within(self.extent) || bytes > self.staging_capacity {
            return Err(Error::DataTooLarge {
                width: region.width,
                height: region.height,
                bytes,
                texture_width: self.extent.width,
                texture_height: self.extent.height,
                capacity: self.staging_capacity,
            });
        }
        if region.is_empty() || byte_len != bytes {
            return Err(Error::RegionMismatch {
                width: region.width,
                height: region.height,
                expected: bytes,
                found: byte_len,
            });
        }
        Ok(())
    }

    fn upload(
        &mut self,
        data: &[u8],
        bytes_per_texel: usize,
        region: Extent,
        clear: bool,
    ) -> Result<Upload, Error> {
        self.validate(data.len(), bytes_per_texel, region)?;
        let Some(index) = self.advance_write() else {
            logwise::trace_sync!(
                "TextureStream {name}: upload dropped, slot {slot} is being read",
                name = logwise::privacy::LogIt(&self.debug_name),
                slot = self.ring.read_index()
            );
            return Ok(Upload::Dropped);
        };

        let slot = &mut self.slots[index];
        let needs_clear = clear
            && (region.smaller_in_either(self.last_uploaded_shape)
                || region.smaller_in_either(slot.written));
        let copy = if needs_clear {
            let pitch = self.extent.width as usize * bytes_per_texel;
            let row_bytes = region.width as usize * bytes_per_texel;
            self.device.clear_staging(&mut slot.staging);
            for (row, texels) in data.chunks_exact(row_bytes).enumerate() {
                self.device.write_staging(&mut slot.staging, row * pitch, texels);
            }
            slot.written = region;
            self.last_uploaded_shape = region;
            TexelCopy {
                extent: self.extent,
                bytes_per_row: pitch,
                bytes_per_texel,
            }
        } else {
            self.device.write_staging(&mut slot.staging, 0, data);
            slot.written = slot.written.union(region);
            self.last_uploaded_shape = self.last_uploaded_shape.union(region);
            TexelCopy {
                extent: region,
                bytes_per_row: region.width as usize * bytes_per_texel,
                bytes_per_texel,
            }
        };
        self.device
            .copy_staging_to_texture(&slot.staging, &slot.texture, copy);
        let fence = SyncFence::submitted(&self.device, self.strategy);
        let superseded_pending = slot
            .fence
            .replace(fence)
            .is_some_and(|old| !old.poll_signalled());
        if superseded_pending {
            logwise::trace_sync!(
                "TextureStream {name}: slot {slot} rewritten before its previous upload was observed",
                name = logwise::privacy::LogIt(&self.debug_name),
                slot = index
            );
        }
        logwise::trace_sync!(
            "TextureStream {name}: {width}x{height} into slot {slot}, cleared {cleared}",
            name = logwise::privacy::LogIt(&self.debug_name),
            width = region.width,
            height = region.height,
            slot = index,
            cleared = logwise::privacy::LogIt(&needs_clear)
        );
        Ok(Upload::Submitted { slot: index })
    }

    fn advance_write(&mut self) -> Option<usize> {
        let slots = &mut self.slots;
        let ever_completed = &mut self.ever_completed;
        self.ring.advance_write(|index| {
            let finished = slots[index].retire_if_signalled();
            *ever_completed |= finished;
            finished
        })
    }

    fn refresh_read_index(&mut self) -> bool {
        let slots = &mut self.slots;
        let found = self
            .ring
            .refresh_read(|index| slots[index].retire_if_signalled());
        self.ever_completed |= found;
        found
    }

    /**
    Binds the freshest completed upload on the stream's texture unit.

    Before any upload completes this binds the zero-initialized texture of the current read slot,
    which is valid to sample but has no content.
    */
    pub fn bind(&mut self) {
        self.refresh_read_index();
        let read = self.ring.read_index();
        self.device
            .bind_texture(self.texture_unit, Some(&self.slots[read].texture));
        logwise::trace_sync!(
            "TextureStream {name}: bound slot {slot}",
            name = logwise::privacy::LogIt(&self.debug_name),
            slot = read
        );
    }

    /// Leaves the stream's texture unit with no texture.  Idempotent.
    pub fn unbind(&self) {
        self.device.bind_texture(self.texture_unit, None);
    }

    /// Binds now and unbinds when the returned guard is dropped.
    pub fn bound(&mut self) -> BoundStream<'_, D> {
        self.bind();
        BoundStream { stream: self }
    }

    /**
    Whether any upload has ever been observed complete.

    Once true, stays true without touching fences again.
    */
    pub fn is_ready(&mut self) -> bool {
        if !self.ever_completed {
            self.refresh_read_index();
        }
        self.ever_completed
    }

    pub fn width(&self) -> u16 {
        self.extent.width
    }

    pub fn height(&self) -> u16 {
        self.extent.height
    }

    pub fn layout(&self) -> TexelLayout {
        self.layout
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn read_index(&self) -> usize {
        self.ring.read_index()
    }

    pub fn write_index(&self) -> usize {
        self.ring.write_index()
    }

    /// The largest region written so far, reduced by clearing uploads.
    pub fn last_uploaded_shape(&self) -> Extent {
        self.last_uploaded_shape
    }

    pub fn texture_unit(&self) -> TextureUnit {
        self.texture_unit
    }

    /// False when the device has no fences and completion is assumed.
    pub fn fences_available(&self) -> bool {
        self.strategy == FenceStrategy::Device
    }

    /// The texture held by `slot`.
    pub fn slot_texture(&self, slot: usize) -> &D::Texture {
        &self.slots[slot].texture
    }

    /// The staging buffer held by `slot`.
    pub fn slot_staging(&self, slot: usize) -> &D::StagingBuffer {
        &self.slots[slot].staging
    }
}

impl<D: Device> Drop for TextureStream<D> {
    fn drop(&mut self) {
        if self.constructed {
            logwise::info_sync!(
                "TextureStream {name} released",
                name = logwise::privacy::LogIt(&self.debug_name)
            );
        }
    }
}

/**
A stream bound for rendering.

Created by [TextureStream::bound].  Unbinds on drop, including during unwinding, so a failed
render block cannot leave the texture unit bound.
*/
#[derive(Debug)]
pub struct BoundStream<'a, D: Device> {
    stream: &'a mut TextureStream<D>,
}

impl<'a, D: Device> BoundStream<'a, D> {
    /// The slot that was bound.
    pub fn slot(&self) -> usize {
        self.stream.read_index()
    }
}

impl<'a, D: Device> Deref for BoundStream<'a, D> {
    type Target = TextureStream<D>;

    fn deref(&self) -> &Self::Target {
        self.stream
    }
}

impl<'a, D: Device> Drop for BoundStream<'a, D> {
    fn drop(&mut self) {
        self.stream.unbind();
    }
}
