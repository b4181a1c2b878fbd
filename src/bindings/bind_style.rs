// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Texture units that streams bind onto.
//!
//! A device exposes numbered texture units.  Binding a stream makes its freshest completed
//! texture the one a renderer finds on that unit; unbinding leaves the unit empty.

use std::fmt::Display;

/// A numbered texture unit.
///
/// Each stream binds onto exactly one unit, chosen at construction.  Two streams may share a
/// unit, in which case the most recent bind wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextureUnit(u32);

impl TextureUnit {
    pub const fn new(unit: u32) -> Self {
        TextureUnit(unit)
    }

    pub const fn index(&self) -> u32 {
        self.0
    }
}

impl Display for TextureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit {}", self.0)
    }
}
