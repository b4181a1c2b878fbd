// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A device that runs entirely on the CPU.

Copies execute immediately into host memory.  Fences are decoupled from the copies and follow a
[FenceMode], which lets callers reproduce any GPU timing they need: work that finishes at once,
work that finishes only when told to, or work that never finishes.  Fences signal in submission
order, like a real queue.

Whatever is bound on a texture unit can be read back with [SoftwareDevice::read_bound].
*/

use crate::bindings::bind_style::TextureUnit;
use crate::bindings::coordinates::Extent;
use crate::bindings::sampler::FilterMode;
use crate::bindings::visible_to::StagingUsage;
use crate::error::Error;
use crate::fence::WaitStatus;
use crate::imp::{Device, TexelCopy, TextureDescriptor};
use crate::pixel_formats::TexelLayout;
use crate::sys::time::{Duration, Instant};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// When fences inserted on a [SoftwareDevice] signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FenceMode {
    /// Fences signal as soon as they are inserted.
    #[default]
    Immediate,
    /// Fences signal when [SoftwareDevice::complete_submitted_work] is called.
    Manual,
    /// Fences never signal, not even through [SoftwareDevice::complete_submitted_work].
    Never,
    /// Fences never signal, and waiting on one reports [WaitStatus::WaitFailed].
    Fail,
}

#[derive(Debug)]
struct TextureStorage {
    id: u64,
    debug_name: String,
    extent: Extent,
    bytes_per_texel: usize,
    min_filter: FilterMode,
    mag_filter: FilterMode,
    texels: Mutex<Box<[u8]>>,
}

/// A texture in host memory.
#[derive(Debug, Clone)]
pub struct SoftwareTexture(Arc<TextureStorage>);

impl SoftwareTexture {
    /// Unique per device.
    pub fn id(&self) -> u64 {
        self.0.id
    }
    pub fn extent(&self) -> Extent {
        self.0.extent
    }
    pub fn debug_name(&self) -> &str {
        &self.0.debug_name
    }
    pub fn filters(&self) -> (FilterMode, FilterMode) {
        (self.0.min_filter, self.0.mag_filter)
    }
    /// A copy of the current contents, rows tightly packed.
    pub fn contents(&self) -> Vec<u8> {
        self.0.texels.lock().unwrap().to_vec()
    }
}

/// Staging memory in host memory.
#[derive(Debug)]
pub struct SoftwareStaging {
    bytes: Box<[u8]>,
    usage: StagingUsage,
}

impl SoftwareStaging {
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
    pub fn usage(&self) -> StagingUsage {
        self.usage
    }
}

/// A fence on a [SoftwareDevice], identified by submission order.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SoftwareFence {
    serial: u64,
}

#[derive(Debug)]
struct State {
    mode: FenceMode,
    next_serial: u64,
    signalled_through: u64,
    live_fences: HashSet<u64>,
    next_texture_id: u64,
    copies: usize,
    bound: HashMap<TextureUnit, SoftwareTexture>,
}

/// A CPU device.  See the module documentation.
#[derive(Debug)]
pub struct SoftwareDevice {
    fences_supported: bool,
    state: Mutex<State>,
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDevice {
    /// A device whose fences signal immediately.
    pub fn new() -> Self {
        Self::with_fence_mode(FenceMode::Immediate)
    }

    pub fn with_fence_mode(mode: FenceMode) -> Self {
        SoftwareDevice {
            fences_supported: true,
            state: Mutex::new(State {
                mode,
                next_serial: 1,
                signalled_through: 0,
                live_fences: HashSet::new(),
                next_texture_id: 1,
                copies: 0,
                bound: HashMap::new(),
            }),
        }
    }

    /// A device with no fence capability.
    pub fn without_fences() -> Self {
        SoftwareDevice {
            fences_supported: false,
            ..Self::new()
        }
    }

    /// Affects fences inserted from now on.
    pub fn set_fence_mode(&self, mode: FenceMode) {
        self.state.lock().unwrap().mode = mode;
    }

    /// Signals every fence inserted so far.  Does nothing in [FenceMode::Never] and
    /// [FenceMode::Fail].
    pub fn complete_submitted_work(&self) {
        let mut state = self.state.lock().unwrap();
        if matches!(state.mode, FenceMode::Never | FenceMode::Fail) {
            return;
        }
        state.signalled_through = state.next_serial - 1;
    }

    /// Fence handles that have been inserted and not yet deleted.
    pub fn live_fences(&self) -> usize {
        self.state.lock().unwrap().live_fences.len()
    }

    /// Staging-to-texture copies issued so far.
    pub fn copies_issued(&self) -> usize {
        self.state.lock().unwrap().copies
    }

    /// The texture currently bound on `unit`.
    pub fn bound_texture(&self, unit: TextureUnit) -> Option<SoftwareTexture> {
        self.state.lock().unwrap().bound.get(&unit).cloned()
    }

    /// Contents of the texture bound on `unit`.
    pub fn read_bound(&self, unit: TextureUnit) -> Option<Vec<u8>> {
        self.bound_texture(unit).map(|texture| texture.contents())
    }

    fn is_signalled(&self, fence: &SoftwareFence) -> bool {
        fence.serial <= self.state.lock().unwrap().signalled_through
    }
}

impl Device for SoftwareDevice {
    type Texture = SoftwareTexture;
    type StagingBuffer = SoftwareStaging;
    type Fence = SoftwareFence;

    fn supports_layout(&self, _layout: TexelLayout) -> bool {
        true
    }

    fn supports_fences(&self) -> bool {
        self.fences_supported
    }

    fn create_texture(&self, descriptor: &TextureDescriptor<'_>) -> Result<SoftwareTexture, Error> {
        let byte_len = descriptor.extent.texel_count() * descriptor.layout.bytes_per_texel();
        let mut state = self.state.lock().unwrap();
        let id = state.next_texture_id;
        state.next_texture_id += 1;
        Ok(SoftwareTexture(Arc::new(TextureStorage {
            id,
            debug_name: descriptor.debug_name.to_string(),
            extent: descriptor.extent,
            bytes_per_texel: descriptor.layout.bytes_per_texel(),
            min_filter: descriptor.min_filter,
            mag_filter: descriptor.mag_filter,
            texels: Mutex::new(vec![0; byte_len].into_boxed_slice()),
        })))
    }

    fn create_staging_buffer(
        &self,
        byte_len: usize,
        usage: StagingUsage,
        _debug_name: &str,
    ) -> Result<SoftwareStaging, Error> {
        Ok(SoftwareStaging {
            bytes: vec![0; byte_len].into_boxed_slice(),
            usage,
        })
    }

    fn write_staging(&self, staging: &mut SoftwareStaging, offset: usize, bytes: &[u8]) {
        staging.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn clear_staging(&self, staging: &mut SoftwareStaging) {
        staging.bytes.fill(0);
    }

    fn copy_staging_to_texture(
        &self,
        staging: &SoftwareStaging,
        texture: &SoftwareTexture,
        copy: TexelCopy,
    ) {
        let storage = &texture.0;
        assert_eq!(
            copy.bytes_per_texel, storage.bytes_per_texel,
            "copy texel size does not match texture"
        );
        assert!(
            copy.extent.fits_within(storage.extent),
            "copy extent {:?} exceeds texture extent {:?}",
            copy.extent,
            storage.extent
        );
        let row_bytes = copy.row_bytes();
        let texture_pitch = storage.extent.width as usize * storage.bytes_per_texel;
        let mut texels = storage.texels.lock().unwrap();
        for row in 0..copy.extent.height as usize {
            let src = row * copy.bytes_per_row;
            let dst = row * texture_pitch;
            texels[dst..dst + row_bytes].copy_from_slice(&staging.bytes[src..src + row_bytes]);
        }
        drop(texels);
        self.state.lock().unwrap().copies += 1;
    }

    fn insert_fence(&self) -> SoftwareFence {
        let mut state = self.state.lock().unwrap();
        let serial = state.next_serial;
        state.next_serial += 1;
        state.live_fences.insert(serial);
        if state.mode == FenceMode::Immediate {
            state.signalled_through = serial;
        }
        SoftwareFence { serial }
    }

    fn fence_signalled(&self, fence: &SoftwareFence) -> bool {
        self.is_signalled(fence)
    }

    fn wait_fence(&self, fence: &SoftwareFence, timeout: Duration) -> WaitStatus {
        if !self.state.lock().unwrap().live_fences.contains(&fence.serial) {
            return WaitStatus::WaitFailed;
        }
        if self.is_signalled(fence) {
            return WaitStatus::AlreadySignalled;
        }
        if self.state.lock().unwrap().mode == FenceMode::Fail {
            return WaitStatus::WaitFailed;
        }
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return WaitStatus::TimeoutExpired;
            }
            std::thread::sleep((deadline - now).min(Duration::from_millis(1)));
            if self.is_signalled(fence) {
                return WaitStatus::ConditionSatisfied;
            }
        }
    }

    fn delete_fence(&self, fence: SoftwareFence) {
        self.state.lock().unwrap().live_fences.remove(&fence.serial);
    }

    fn bind_texture(&self, unit: TextureUnit, texture: Option<&SoftwareTexture>) {
        let mut state = self.state.lock().unwrap();
        match texture {
            Some(texture) => {
                state.bound.insert(unit, texture.clone());
            }
            None => {
                state.bound.remove(&unit);
            }
        }
    }
}
