/*! Defines binding types */

pub mod sampler;
pub mod bind_style;
pub mod forward;

pub use bind_style::TextureUnit;
pub mod visible_to;
pub mod coordinates;
