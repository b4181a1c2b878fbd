/// Filtering applied when a streamed texture is sampled.
///
/// Texture coordinates are always clamped to the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    ///The nearest texel is used.  Exact texel values, no interpolation.
    #[default]
    Nearest,
    ///Neighboring texels are interpolated.
    Linear,
}
