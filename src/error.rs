//! Error taxonomy shared by views, pixels, and engines.

use crate::buffer::BufferError;

/// Everything that can fail when reading, writing, or copying pixels.
///
/// Views and pixel handles never recover locally: an error returned by the
/// engine reaches the caller unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A coordinate or rectangle lies outside the addressable buffer.
    #[error("({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    /// More channel values than the pixel format reports, or two pixels
    /// with different channel counts.
    #[error("expected {expected} channels, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },
    /// Opaque engine failure.
    #[error("pixel engine failure: {0}")]
    Engine(#[from] BufferError),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
