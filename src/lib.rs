//! Nested image views and per-pixel channel transforms.
//!
//! This crate sits between callers and pixel storage:
//!
//! - [`View`] — a whole buffer or a rectangle of one; translates local
//!   coordinates to buffer coordinates and forwards region copies
//! - [`Pixel`] — a positional handle with channel transforms
//!   ([`apply`](Pixel::apply), [`apply2`](Pixel::apply2),
//!   [`invert`](Pixel::invert), [`blend`](Pixel::blend), ...)
//! - [`PixelEngine`] — the storage interface both delegate to
//! - [`PixelBuffer`] — owned, format-tagged storage implementing it
//! - [`composite`] — the source-over blend behind
//!   [`PixelEngine::blend_pixel`]
//!
//! Views and pixels borrow their buffer through a `RefCell`, so several
//! handles into the same buffer can coexist:
//!
//! ```
//! use core::cell::RefCell;
//! use subimage::{Bounds, PixelBuffer, PixelDescriptor, Position, View};
//!
//! let buffer = RefCell::new(PixelBuffer::filled(8, 8, PixelDescriptor::RGB8, &[10, 20, 30]));
//! let view = View::new(&buffer).sub_view(Bounds::new(2, 2, 4, 4));
//!
//! for pixel in view.pixels() {
//!     pixel.invert()?;
//! }
//! let corner = view.get_pixel(Position::new(0, 0));
//! assert_eq!(corner.position(), Position::new(2, 2));
//! assert_eq!(corner.get_channels()?, [245, 235, 225, 255]);
//! # Ok::<(), subimage::Error>(())
//! ```

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

mod blend;
mod buffer;
mod channels;
mod engine;
mod error;
mod geometry;
mod pixel;
mod view;

pub use blend::composite;
pub use buffer::{BufferError, ChannelLayout, ChannelType, PixelBuffer, PixelDescriptor};
pub use channels::{Channels, MAX_CHANNELS};
pub use engine::PixelEngine;
pub use error::{Error, Result};
pub use geometry::{Bounds, Dimensions, Position};
pub use pixel::Pixel;
pub use view::{Pixels, View};

// Re-exports for building buffers from typed pixels.
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb;
pub use rgb::alt::BGRA as Bgra;
pub use rgb::{Gray, Rgb, Rgba};
