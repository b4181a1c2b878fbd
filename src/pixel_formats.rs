// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Texel layout definitions for streamed textures.
//!
//! A streamed texture is described by two closed enums:
//!
//! - [`TexelFormat`] - which components a texel carries and in which order (R, RG, RGBA, BGRA, ...)
//! - [`TexelType`] - how those components are stored (8-bit unsigned, 32-bit float, packed 5-6-5, ...)
//!
//! Together they form a [`TexelLayout`], which resolves to the number of bytes each texel occupies.
//! Most types store one value per component, so the size is `type bytes × components`.  Packed types
//! store the entire texel in a single value, so the size is the type size alone.
//!
//! # Examples
//!
//! ```
//! use texture_streams::pixel_formats::{TexelFormat, TexelLayout, TexelType};
//!
//! let rgba8 = TexelLayout::new(TexelFormat::Rgba, TexelType::U8).unwrap();
//! assert_eq!(rgba8.bytes_per_texel(), 4);
//!
//! let packed = TexelLayout::new(TexelFormat::Rgb, TexelType::U16_565).unwrap();
//! assert_eq!(packed.bytes_per_texel(), 2);
//!
//! // a 5-6-5 texel has three components, so it cannot describe RGBA data
//! assert!(TexelLayout::new(TexelFormat::Rgba, TexelType::U16_565).is_err());
//! ```

/*
Quick note on type design.  Typed formats (one zero-sized type per format) give us
compile-time checks, but a stream's layout is usually chosen at runtime from whatever the producer
emits (camera frames, decoded video, simulation output).  So layouts here are plain values that
are validated once at construction.  The typed side lives in [Texel], which only has to agree with
the layout on the byte size of one texel.
 */

use crate::error::Error;
use std::fmt::Debug;

pub use half::f16;

/// The components of a texel and the order they are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelFormat {
    Red,
    Green,
    Blue,
    Alpha,
    Rg,
    Rgb,
    Bgr,
    Rgba,
    Bgra,
    Luminance,
    LuminanceAlpha,
    DepthComponent,
}

impl TexelFormat {
    /// Number of components stored per texel.
    pub const fn components(self) -> u8 {
        match self {
            TexelFormat::Red
            | TexelFormat::Green
            | TexelFormat::Blue
            | TexelFormat::Alpha
            | TexelFormat::Luminance
            | TexelFormat::DepthComponent => 1,
            TexelFormat::Rg | TexelFormat::LuminanceAlpha => 2,
            TexelFormat::Rgb | TexelFormat::Bgr => 3,
            TexelFormat::Rgba | TexelFormat::Bgra => 4,
        }
    }
}

/// The storage type of a texel.
///
/// Variants with a bit pattern in their name are packed: the whole texel fits in one value of the
/// named width.  `Rev` variants store components in reverse order within that value.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F16,
    F32,
    U8_332,
    U8_233Rev,
    U16_565,
    U16_565Rev,
    U16_4444,
    U16_4444Rev,
    U16_5551,
    U16_1555Rev,
    U32_8888,
    U32_8888Rev,
    U32_1010102,
    U32_2101010Rev,
}

impl TexelType {
    /// Returns `(bytes, includes_format_in_size)`.
    ///
    /// When the flag is set, the texel size is `bytes × components`; otherwise `bytes` is the
    /// size of the entire texel.
    pub const fn size_descriptor(self) -> (u8, bool) {
        match self {
            TexelType::U8 | TexelType::I8 => (1, true),
            TexelType::U16 | TexelType::I16 | TexelType::F16 => (2, true),
            TexelType::U32 | TexelType::I32 | TexelType::F32 => (4, true),
            TexelType::U8_332 | TexelType::U8_233Rev => (1, false),
            TexelType::U16_565
            | TexelType::U16_565Rev
            | TexelType::U16_4444
            | TexelType::U16_4444Rev
            | TexelType::U16_5551
            | TexelType::U16_1555Rev => (2, false),
            TexelType::U32_8888
            | TexelType::U32_8888Rev
            | TexelType::U32_1010102
            | TexelType::U32_2101010Rev => (4, false),
        }
    }

    /// For packed types, the number of components the packed value holds.
    const fn packed_components(self) -> Option<u8> {
        match self {
            TexelType::U8_332
            | TexelType::U8_233Rev
            | TexelType::U16_565
            | TexelType::U16_565Rev => Some(3),
            TexelType::U16_4444
            | TexelType::U16_4444Rev
            | TexelType::U16_5551
            | TexelType::U16_1555Rev
            | TexelType::U32_8888
            | TexelType::U32_8888Rev
            | TexelType::U32_1010102
            | TexelType::U32_2101010Rev => Some(4),
            _ => None,
        }
    }
}

/// A validated pairing of [`TexelFormat`] and [`TexelType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TexelLayout {
    format: TexelFormat,
    ty: TexelType,
    bytes_per_texel: u8,
}

impl TexelLayout {
    /// Validates the pairing.
    ///
    /// Fails with [`Error::InvalidFormat`] when a packed type is paired with a format whose
    /// component count differs from the packed value's.
    pub fn new(format: TexelFormat, ty: TexelType) -> Result<Self, Error> {
        let (bytes, includes_format) = ty.size_descriptor();
        if let Some(packed) = ty.packed_components() {
            if packed != format.components() {
                return Err(Error::InvalidFormat { format, ty });
            }
        }
        let bytes_per_texel = if includes_format {
            bytes * format.components()
        } else {
            bytes
        };
        Ok(TexelLayout {
            format,
            ty,
            bytes_per_texel,
        })
    }

    /// The common 8-bit RGBA layout.
    pub const fn rgba8() -> Self {
        TexelLayout {
            format: TexelFormat::Rgba,
            ty: TexelType::U8,
            bytes_per_texel: 4,
        }
    }

    pub const fn format(&self) -> TexelFormat {
        self.format
    }

    pub const fn texel_type(&self) -> TexelType {
        self.ty
    }

    pub const fn bytes_per_texel(&self) -> usize {
        self.bytes_per_texel as usize
    }

    /// The `InvalidFormat` error for this layout, used by devices that cannot represent it.
    pub(crate) fn unsupported(&self) -> Error {
        Error::InvalidFormat {
            format: self.format,
            ty: self.ty,
        }
    }
}

/// Sealed traits for texel type safety.
pub(crate) mod sealed {
    /// Marker trait indicating C-compatible memory layout.
    ///
    /// Types implementing this trait have predictable memory layout with:
    /// - No padding between fields
    /// - No uninitialized bytes
    /// - Stable field ordering
    ///
    /// # Safety
    ///
    /// This trait is unsafe to implement because incorrect implementation
    /// could lead to undefined behavior when casting to/from byte slices.
    pub unsafe trait ReprC {}
}

use sealed::ReprC;

/// A CPU-side texel value that can be uploaded to a stream.
///
/// The stream checks `size_of::<Self>()` against its layout's bytes per texel, so a `[u8; 4]`,
/// a `u32` and a [`Unorm4`] are all acceptable for an RGBA8 stream.
pub trait Texel: Copy + Debug + ReprC + 'static {}
impl<T: Copy + Debug + ReprC + 'static> Texel for T {}

/// Convert a slice of C-compatible texels to raw bytes.
///
/// # Safety
///
/// This function is safe because it requires `T: ReprC`, which guarantees
/// C-compatible memory layout with no padding or uninitialized bytes.
pub(crate) fn pixel_as_bytes<T: ReprC>(t: &[T]) -> &[u8] {
    //safe because we know that T is repr(C)
    //(we offloaded the safety check to the ReprC trait)
    unsafe { std::slice::from_raw_parts(t.as_ptr() as *const u8, std::mem::size_of_val(t)) }
}

macro_rules! repr_c_scalars {
    ($($t:ty),*) => {
        $(
            unsafe impl ReprC for $t {}
            unsafe impl<const N: usize> ReprC for [$t; N] {}
        )*
    };
}

repr_c_scalars!(u8, i8, u16, i16, u32, i32, f32, f16);

/// An 8-bit normalized RGBA texel.
///
/// # Examples
///
/// ```
/// use texture_streams::pixel_formats::Unorm4;
///
/// let opaque_red = Unorm4 { r: 255, g: 0, b: 0, a: 255 };
/// assert_eq!(opaque_red, Unorm4::RED);
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unorm4 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}
unsafe impl ReprC for Unorm4 {}

impl Unorm4 {
    pub const RED: Unorm4 = Unorm4 { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Unorm4 = Unorm4 { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Unorm4 = Unorm4 { r: 0, g: 0, b: 255, a: 255 };
    pub const TRANSPARENT: Unorm4 = Unorm4 { r: 0, g: 0, b: 0, a: 0 };

    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
