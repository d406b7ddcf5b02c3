//! Owned, format-tagged pixel storage.
//!
//! [`PixelBuffer`] is the in-crate [`PixelEngine`](crate::PixelEngine): it
//! carries its own [`PixelDescriptor`] so channel reads and writes know the
//! storage type and whether the last channel is a real alpha.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use imgref::ImgRef;
use rgb::alt::BGRA;
use rgb::{Gray, Rgb, Rgba};

use crate::channels::Channels;

// ---------------------------------------------------------------------------
// Descriptor enums
// ---------------------------------------------------------------------------

/// Channel storage type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum ChannelType {
    /// 8-bit unsigned integer (1 byte per channel).
    U8 = 1,
    /// 16-bit unsigned integer (2 bytes per channel, native endian).
    U16 = 2,
}

impl ChannelType {
    /// Byte size of a single channel value.
    #[inline]
    pub const fn byte_size(self) -> usize {
        self as usize
    }

    /// Largest value a channel can hold.
    #[inline]
    pub const fn max_value(self) -> u16 {
        match self {
            Self::U8 => u8::MAX as u16,
            Self::U16 => u16::MAX,
        }
    }
}

/// Channel layout (number and meaning of channels).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum ChannelLayout {
    /// Single luminance channel.
    Gray = 1,
    /// Luminance + alpha.
    GrayAlpha = 2,
    /// Red, green, blue.
    Rgb = 3,
    /// Red, green, blue, alpha.
    Rgba = 4,
    /// Blue, green, red, alpha (Windows/DirectX byte order).
    Bgra = 5,
}

impl ChannelLayout {
    /// Number of stored channels in this layout.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba | Self::Bgra => 4,
        }
    }

    /// Whether this layout includes an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::GrayAlpha | Self::Rgba | Self::Bgra)
    }
}

// ---------------------------------------------------------------------------
// PixelDescriptor
// ---------------------------------------------------------------------------

/// Compact pixel format descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[non_exhaustive]
pub struct PixelDescriptor {
    /// Channel storage type (u8, u16).
    pub channel_type: ChannelType,
    /// Channel layout (gray, RGB, RGBA, etc.).
    pub layout: ChannelLayout,
}

impl PixelDescriptor {
    pub const fn new(channel_type: ChannelType, layout: ChannelLayout) -> Self {
        Self {
            channel_type,
            layout,
        }
    }

    // Named constants ---------------------------------------------------------

    pub const GRAY8: Self = Self::new(ChannelType::U8, ChannelLayout::Gray);
    pub const GRAYA8: Self = Self::new(ChannelType::U8, ChannelLayout::GrayAlpha);
    pub const RGB8: Self = Self::new(ChannelType::U8, ChannelLayout::Rgb);
    pub const RGBA8: Self = Self::new(ChannelType::U8, ChannelLayout::Rgba);
    pub const BGRA8: Self = Self::new(ChannelType::U8, ChannelLayout::Bgra);
    pub const GRAY16: Self = Self::new(ChannelType::U16, ChannelLayout::Gray);
    pub const GRAYA16: Self = Self::new(ChannelType::U16, ChannelLayout::GrayAlpha);
    pub const RGB16: Self = Self::new(ChannelType::U16, ChannelLayout::Rgb);
    pub const RGBA16: Self = Self::new(ChannelType::U16, ChannelLayout::Rgba);

    // Methods -----------------------------------------------------------------

    /// Same channel count, order, and storage type.
    #[inline]
    pub const fn layout_compatible(&self, other: &PixelDescriptor) -> bool {
        self.channel_type as u8 == other.channel_type as u8
            && self.layout as u8 == other.layout as u8
    }

    /// Bytes per pixel.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        self.channel_type.byte_size() * self.layout.channels()
    }

    /// Number of stored channels.
    #[inline]
    pub const fn channels(self) -> usize {
        self.layout.channels()
    }

    /// Length of the [`Channels`] sequence this format reports.
    ///
    /// Layouts without alpha report one extra, read-only sentinel slot.
    #[inline]
    pub const fn reported_channels(self) -> usize {
        if self.has_alpha() {
            self.channels()
        } else {
            self.channels() + 1
        }
    }

    /// Whether this format has an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        self.layout.has_alpha()
    }

    /// Per-channel ceiling; also the alpha sentinel for opaque layouts.
    #[inline]
    pub const fn max_value(self) -> u16 {
        self.channel_type.max_value()
    }

    /// Tightly packed row length in bytes.
    #[inline]
    pub const fn stride(self, width: u32) -> usize {
        width as usize * self.bytes_per_pixel()
    }
}

// ---------------------------------------------------------------------------
// BufferError
// ---------------------------------------------------------------------------

/// Failures raised by a pixel engine itself, independent of coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BufferError {
    /// Data vec is too small for the given dimensions.
    #[error("data is too small for the given dimensions")]
    InsufficientData,
    /// Width or height causes overflow.
    #[error("width or height causes overflow")]
    InvalidDimensions,
    /// Source and destination pixel formats cannot be copied byte-for-byte.
    #[error("pixel formats are not layout-compatible")]
    FormatMismatch,
    /// The buffer is already borrowed by another in-flight operation.
    #[error("buffer is already borrowed")]
    Busy,
}

// ---------------------------------------------------------------------------
// PixelBuffer
// ---------------------------------------------------------------------------

/// Owned pixel buffer with format metadata.
///
/// Rows are tightly packed; 16-bit channels are stored native-endian.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
    descriptor: PixelDescriptor,
}

impl PixelBuffer {
    /// Allocate a zero-filled buffer for the given dimensions and format.
    pub fn new(width: u32, height: u32, descriptor: PixelDescriptor) -> Self {
        let stride = descriptor.stride(width);
        let total = stride * height as usize;
        Self {
            data: vec![0u8; total],
            width,
            height,
            stride,
            descriptor,
        }
    }

    /// Allocate a buffer with every pixel set to `fill`.
    ///
    /// `fill` is written the same way [`set_pixel`](crate::PixelEngine::set_pixel)
    /// writes it: missing trailing values leave zeros, the alpha sentinel of
    /// an opaque layout is ignored.
    pub fn filled(width: u32, height: u32, descriptor: PixelDescriptor, fill: &[u16]) -> Self {
        let mut buf = Self::new(width, height, descriptor);
        let bpp = descriptor.bytes_per_pixel();
        let mut first = vec![0u8; bpp];
        encode_pixel(descriptor, fill, &mut first);
        for chunk in buf.data.chunks_exact_mut(bpp) {
            chunk.copy_from_slice(&first);
        }
        buf
    }

    /// Wrap an existing `Vec<u8>` as a tightly packed pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InsufficientData`] if the vec is too small.
    pub fn from_vec(
        data: Vec<u8>,
        width: u32,
        height: u32,
        descriptor: PixelDescriptor,
    ) -> Result<Self, BufferError> {
        let stride = descriptor.stride(width);
        let total = stride
            .checked_mul(height as usize)
            .ok_or(BufferError::InvalidDimensions)?;
        if data.len() < total {
            return Err(BufferError::InsufficientData);
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            descriptor,
        })
    }

    /// Consume the buffer and return the backing `Vec<u8>`.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte stride between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format descriptor.
    #[inline]
    pub fn descriptor(&self) -> PixelDescriptor {
        self.descriptor
    }

    /// Pixel bytes for row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    /// Mutable pixel bytes for row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.stride]
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Byte range of the pixel at `(x, y)`. Caller guarantees bounds.
    #[inline]
    pub(crate) fn pixel_range(&self, x: u32, y: u32) -> core::ops::Range<usize> {
        let bpp = self.descriptor.bytes_per_pixel();
        let start = y as usize * self.stride + x as usize * bpp;
        start..start + bpp
    }

    /// Decode the pixel at `(x, y)`. Caller guarantees bounds.
    pub(crate) fn read(&self, x: u32, y: u32) -> Channels {
        let range = self.pixel_range(x, y);
        decode_pixel(self.descriptor, &self.data[range])
    }

    /// Encode `values` into the pixel at `(x, y)`. Caller guarantees bounds
    /// and that `values` is no longer than the reported channel count.
    pub(crate) fn write(&mut self, x: u32, y: u32, values: &[u16]) {
        let range = self.pixel_range(x, y);
        encode_pixel(self.descriptor, values, &mut self.data[range]);
    }

    /// Copy a sub-region into a new, tightly packed [`PixelBuffer`].
    ///
    /// # Panics
    ///
    /// Panics if the crop region is out of bounds.
    pub fn crop_copy(&self, x: u32, y: u32, w: u32, h: u32) -> PixelBuffer {
        assert!(
            x.checked_add(w).is_some_and(|end| end <= self.width),
            "crop x={x} w={w} exceeds width {}",
            self.width
        );
        assert!(
            y.checked_add(h).is_some_and(|end| end <= self.height),
            "crop y={y} h={h} exceeds height {}",
            self.height
        );
        let mut dst = PixelBuffer::new(w, h, self.descriptor);
        let bpp = self.descriptor.bytes_per_pixel();
        let start = x as usize * bpp;
        let row_bytes = w as usize * bpp;
        for row_y in 0..h {
            let src = &self.row(y + row_y)[start..start + row_bytes];
            dst.row_mut(row_y).copy_from_slice(src);
        }
        dst
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelBuffer({}x{}, {:?} {:?})",
            self.width, self.height, self.descriptor.layout, self.descriptor.channel_type
        )
    }
}

// ---------------------------------------------------------------------------
// ImgRef → PixelBuffer (From impls, always copies)
// ---------------------------------------------------------------------------

macro_rules! impl_from_imgref {
    ($pixel:ty, $descriptor:expr) => {
        impl<'a> From<ImgRef<'a, $pixel>> for PixelBuffer {
            fn from(img: ImgRef<'a, $pixel>) -> Self {
                use rgb::ComponentBytes;
                let descriptor = $descriptor;
                let width = img.width() as u32;
                let height = img.height() as u32;
                let mut data = Vec::with_capacity(descriptor.stride(width) * height as usize);
                for row in img.rows() {
                    data.extend_from_slice(row.as_bytes());
                }
                PixelBuffer {
                    data,
                    width,
                    height,
                    stride: descriptor.stride(width),
                    descriptor,
                }
            }
        }
    };
}

impl_from_imgref!(Rgb<u8>, PixelDescriptor::RGB8);
impl_from_imgref!(Rgba<u8>, PixelDescriptor::RGBA8);
impl_from_imgref!(Rgb<u16>, PixelDescriptor::RGB16);
impl_from_imgref!(Rgba<u16>, PixelDescriptor::RGBA16);
impl_from_imgref!(Gray<u8>, PixelDescriptor::GRAY8);
impl_from_imgref!(Gray<u16>, PixelDescriptor::GRAY16);
impl_from_imgref!(BGRA<u8>, PixelDescriptor::BGRA8);

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn decode_pixel(descriptor: PixelDescriptor, bytes: &[u8]) -> Channels {
    let mut values = [0u16; crate::channels::MAX_CHANNELS];
    let stored = descriptor.channels();
    match descriptor.channel_type {
        ChannelType::U8 => {
            for (v, b) in values.iter_mut().zip(bytes) {
                *v = u16::from(*b);
            }
        }
        ChannelType::U16 => {
            for (v, b) in values.iter_mut().zip(bytes.chunks_exact(2)) {
                *v = u16::from_ne_bytes([b[0], b[1]]);
            }
        }
    }
    if !descriptor.has_alpha() {
        values[stored] = descriptor.max_value();
    }
    Channels::from_raw(values, descriptor.reported_channels())
}

/// Writes the leading stored channels of `values`; the sentinel slot of an
/// opaque layout has no storage and is dropped.
fn encode_pixel(descriptor: PixelDescriptor, values: &[u16], bytes: &mut [u8]) {
    let stored = descriptor.channels().min(values.len());
    match descriptor.channel_type {
        ChannelType::U8 => {
            for (b, v) in bytes.iter_mut().zip(&values[..stored]) {
                *b = (*v).min(u8::MAX as u16) as u8;
            }
        }
        ChannelType::U16 => {
            for (b, v) in bytes.chunks_exact_mut(2).zip(&values[..stored]) {
                b.copy_from_slice(&v.to_ne_bytes());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
