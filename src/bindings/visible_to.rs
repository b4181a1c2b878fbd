//! Usage declarations for staging memory.
//!
//! When creating GPU resources, it's important to declare how they will be used so the graphics
//! driver can make good decisions about memory placement.  For texture streams the interesting
//! declaration is how often the staging buffers are rewritten.
//!
//! # Examples
//!
//! ```
//! use texture_streams::bindings::visible_to::StagingUsage;
//!
//! // Video frames: written once, copied once, then rewritten
//! let usage = StagingUsage::Stream;
//! assert_eq!(usage, StagingUsage::default());
//! ```

/// Describes how often a stream's staging buffers are rewritten.
///
/// This is a hint.  Backends may place memory differently based on it, or ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StagingUsage {
    /// The contents are written once per upload and read by a single copy.
    ///
    /// This is the common case for streaming.
    #[default]
    Stream,

    /// The contents are rewritten repeatedly and read by many copies.
    Dynamic,

    /// The contents are written rarely and read by many copies.
    Static,
}
