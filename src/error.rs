// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Errors reported by texture streams and their devices.

use crate::pixel_formats::{TexelFormat, TexelType};
use crate::sys::time::Duration;

/// The error type for stream construction and uploads.
///
/// Configuration errors (`InvalidFormat`, `TexelSizeMismatch`, `DataTooLarge`,
/// `RegionMismatch`, `InvalidConfiguration`) are reported before the stream changes any state,
/// so the stream remains usable afterwards.
///
/// Initialization errors (`InitializationTimeout`, `InitializationFailed`) are fatal; no stream
/// is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("texel format {format:?} with type {ty:?} is not a valid texel layout")]
    InvalidFormat { format: TexelFormat, ty: TexelType },
    #[error("data has {found} bytes per texel but the stream expects {expected}")]
    TexelSizeMismatch { expected: usize, found: usize },
    #[error(
        "a {width}x{height} region ({bytes} bytes) does not fit a {texture_width}x{texture_height} texture with {capacity} bytes of staging"
    )]
    DataTooLarge {
        width: u16,
        height: u16,
        bytes: usize,
        texture_width: u16,
        texture_height: u16,
        capacity: usize,
    },
    #[error("a {width}x{height} region needs {expected} bytes but {found} were supplied")]
    RegionMismatch {
        width: u16,
        height: u16,
        expected: usize,
        found: usize,
    },
    #[error("invalid stream configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("initialization uploads were not signalled within {0:?}")]
    InitializationTimeout(Duration),
    #[error("waiting on an initialization fence failed")]
    InitializationFailed,
    #[error("device could not {operation}: {reason}")]
    Device {
        operation: &'static str,
        reason: String,
    },
}
