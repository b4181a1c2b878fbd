use crate::pixel_formats::{TexelFormat, TexelLayout, TexelType};
use wgpu::TextureFormat;

/// The wgpu format holding `layout` texel-for-texel, if one exists.
///
/// Three-component and luminance formats have no wgpu counterpart.
pub(crate) fn wgpu_format(layout: TexelLayout) -> Option<TextureFormat> {
    use TexelFormat::*;
    use TexelType::*;
    let format = match (layout.format(), layout.texel_type()) {
        (Red, U8) => TextureFormat::R8Unorm,
        (Rg, U8) => TextureFormat::Rg8Unorm,
        (Rgba, U8) | (Rgba, U32_8888Rev) => TextureFormat::Rgba8Unorm,
        (Bgra, U8) | (Bgra, U32_8888Rev) => TextureFormat::Bgra8Unorm,
        (Red, I8) => TextureFormat::R8Snorm,
        (Rg, I8) => TextureFormat::Rg8Snorm,
        (Rgba, I8) => TextureFormat::Rgba8Snorm,
        (Red, U16) => TextureFormat::R16Unorm,
        (Rg, U16) => TextureFormat::Rg16Unorm,
        (Rgba, U16) => TextureFormat::Rgba16Unorm,
        (Red, F16) => TextureFormat::R16Float,
        (Rg, F16) => TextureFormat::Rg16Float,
        (Rgba, F16) => TextureFormat::Rgba16Float,
        (Red, F32) | (DepthComponent, F32) => TextureFormat::R32Float,
        (Rg, F32) => TextureFormat::Rg32Float,
        (Rgba, F32) => TextureFormat::Rgba32Float,
        (Red, U32) => TextureFormat::R32Uint,
        (Rgba, U32) => TextureFormat::Rgba32Uint,
        (Red, I32) => TextureFormat::R32Sint,
        (Rgba, I32) => TextureFormat::Rgba32Sint,
        (Rgba, U32_2101010Rev) => TextureFormat::Rgb10a2Unorm,
        _ => return None,
    };
    Some(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_layouts_map() {
        assert_eq!(
            wgpu_format(TexelLayout::rgba8()),
            Some(TextureFormat::Rgba8Unorm)
        );
        let half = TexelLayout::new(TexelFormat::Rgba, TexelType::F16).unwrap();
        assert_eq!(wgpu_format(half), Some(TextureFormat::Rgba16Float));
    }

    #[test]
    fn block_sizes_agree() {
        for (format, ty) in [
            (TexelFormat::Red, TexelType::U8),
            (TexelFormat::Rg, TexelType::F32),
            (TexelFormat::Bgra, TexelType::U8),
            (TexelFormat::Rgba, TexelType::U16),
            (TexelFormat::Rgba, TexelType::U32_2101010Rev),
        ] {
            let layout = TexelLayout::new(format, ty).unwrap();
            let wgpu = wgpu_format(layout).unwrap();
            assert_eq!(
                wgpu.block_copy_size(None),
                Some(layout.bytes_per_texel() as u32),
                "{format:?} {ty:?}"
            );
        }
    }

    #[test]
    fn rgb_is_unsupported() {
        let rgb = TexelLayout::new(TexelFormat::Rgb, TexelType::U8).unwrap();
        assert_eq!(wgpu_format(rgb), None);
    }
}
