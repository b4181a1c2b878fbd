// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
GPU completion fences.

A [SyncFence] marks one point in a device's submitted work.  It signals once everything submitted
before it has finished executing.  Streams attach one to every copy they issue and poll them to
decide which slot is safe to read.

```text
 Unsubmitted ──submit──▶ Pending ──(device finishes)──▶ Signalled
      │                     │                              │
      └──────────────────delete / drop─────────────────────┴──▶ Deleted
```

Some devices cannot create fences at all.  For those, [FenceStrategy::AlwaysSignalled] produces
fences that report signalled from the moment they are submitted.  Callers behave identically
either way; they just lose the ability to overlap uploads with rendering.
*/

use crate::imp::Device;
use crate::sys::time::Duration;
use std::sync::Arc;

/// Outcome of [SyncFence::block_until_signalled].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitStatus {
    /// The fence was already signalled when the wait began.
    AlreadySignalled,
    /// The fence signalled during the wait.
    ConditionSatisfied,
    /// The timeout elapsed first.
    TimeoutExpired,
    /// The wait could not be performed.
    WaitFailed,
}

impl WaitStatus {
    pub const fn is_signalled(self) -> bool {
        matches!(
            self,
            WaitStatus::AlreadySignalled | WaitStatus::ConditionSatisfied
        )
    }
}

/// How fences are produced for a device.  Chosen once, from [Device::supports_fences].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FenceStrategy {
    /// Real device fences.
    Device,
    /// The device has no fence capability; every fence reports signalled.
    AlwaysSignalled,
}

impl FenceStrategy {
    pub fn probe<D: Device>(device: &D) -> Self {
        if device.supports_fences() {
            FenceStrategy::Device
        } else {
            FenceStrategy::AlwaysSignalled
        }
    }
}

/// Observable state of a [SyncFence].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FenceStatus {
    Unsubmitted,
    Pending,
    Signalled,
    Deleted,
}

#[derive(Debug)]
enum Handle<F> {
    Unsubmitted,
    Live(F),
    AlwaysSignalled,
    Deleted,
}

/**
A single completion marker.

The handle is released by [SyncFence::delete], by a successful [SyncFence::poll_and_delete], by
[SyncFence::block_until_signalled], or when the fence is dropped.

Querying a deleted fence is a contract violation and panics.
*/
#[derive(Debug)]
pub struct SyncFence<D: Device> {
    device: Arc<D>,
    handle: Handle<D::Fence>,
}

impl<D: Device> SyncFence<D> {
    pub fn new(device: &Arc<D>) -> Self {
        SyncFence {
            device: device.clone(),
            handle: Handle::Unsubmitted,
        }
    }

    /// Creates and submits in one step.
    pub fn submitted(device: &Arc<D>, strategy: FenceStrategy) -> Self {
        let mut fence = Self::new(device);
        fence.submit(strategy);
        fence
    }

    /// Covers all work issued to the device so far.
    ///
    /// # Panics
    /// If the fence was already submitted or deleted.
    pub fn submit(&mut self, strategy: FenceStrategy) {
        assert!(
            matches!(self.handle, Handle::Unsubmitted),
            "SyncFence submitted twice"
        );
        self.handle = match strategy {
            FenceStrategy::Device => Handle::Live(self.device.insert_fence()),
            FenceStrategy::AlwaysSignalled => Handle::AlwaysSignalled,
        };
    }

    /// Non-blocking.  Unsubmitted fences report false.
    ///
    /// # Panics
    /// If the fence was deleted.
    pub fn poll_signalled(&self) -> bool {
        match &self.handle {
            Handle::Unsubmitted => false,
            Handle::Live(fence) => self.device.fence_signalled(fence),
            Handle::AlwaysSignalled => true,
            Handle::Deleted => panic!("SyncFence queried after deletion"),
        }
    }

    /// Deletes the fence if it has signalled.  Returns whether it did.
    ///
    /// # Panics
    /// If the fence was deleted.
    pub fn poll_and_delete(&mut self) -> bool {
        let signalled = self.poll_signalled();
        if signalled {
            self.delete();
        }
        signalled
    }

    /**
    Blocks the calling thread until the fence signals or `timeout` elapses.

    The handle is always released before returning.  Unsubmitted fences report
    [WaitStatus::WaitFailed]; fences from [FenceStrategy::AlwaysSignalled] report
    [WaitStatus::ConditionSatisfied].

    # Panics
    If the fence was deleted.
    */
    pub fn block_until_signalled(mut self, timeout: Duration) -> WaitStatus {
        match std::mem::replace(&mut self.handle, Handle::Deleted) {
            Handle::Unsubmitted => WaitStatus::WaitFailed,
            Handle::Live(fence) => {
                let status = self.device.wait_fence(&fence, timeout);
                self.device.delete_fence(fence);
                status
            }
            Handle::AlwaysSignalled => WaitStatus::ConditionSatisfied,
            Handle::Deleted => panic!("SyncFence waited on after deletion"),
        }
    }

    /// Releases the handle.  Idempotent.
    pub fn delete(&mut self) {
        if let Handle::Live(fence) = std::mem::replace(&mut self.handle, Handle::Deleted) {
            self.device.delete_fence(fence);
        }
    }

    pub fn status(&self) -> FenceStatus {
        match &self.handle {
            Handle::Unsubmitted => FenceStatus::Unsubmitted,
            Handle::Live(fence) => {
                if self.device.fence_signalled(fence) {
                    FenceStatus::Signalled
                } else {
                    FenceStatus::Pending
                }
            }
            Handle::AlwaysSignalled => FenceStatus::Signalled,
            Handle::Deleted => FenceStatus::Deleted,
        }
    }

    /// True for fences created without device fence support.
    pub fn is_degraded(&self) -> bool {
        matches!(self.handle, Handle::AlwaysSignalled)
    }
}

impl<D: Device> Drop for SyncFence<D> {
    fn drop(&mut self) {
        self.delete();
    }
}
