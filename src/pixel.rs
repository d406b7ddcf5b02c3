//! Handles to single pixels and their channel transforms.

use core::cell::RefCell;
use core::fmt;

use crate::buffer::PixelDescriptor;
use crate::channels::Channels;
use crate::engine::{PixelEngine, borrow, borrow_mut};
use crate::error::{Error, Result};
use crate::geometry::Position;

/// A positional handle to one pixel of a buffer.
///
/// A `Pixel` is not a snapshot: every read and write goes to the engine at
/// the moment of the call. Two handles are equal when they point at the same
/// coordinates of the same buffer, whatever their channel values.
///
/// The buffer is only borrowed for the duration of each engine call, so the
/// closures passed to the `apply*` family may freely read other pixels of the
/// same buffer.
pub struct Pixel<'a, E> {
    buffer: &'a RefCell<E>,
    x: i32,
    y: i32,
}

impl<'a, E: PixelEngine> Pixel<'a, E> {
    /// Handle to the pixel at global `(x, y)`. No bounds check happens until
    /// the pixel is read or written.
    pub fn new(buffer: &'a RefCell<E>, x: i32, y: i32) -> Self {
        Self { buffer, x, y }
    }

    /// Global coordinates within the buffer.
    #[inline]
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Format of the buffer this pixel lives in.
    pub fn descriptor(&self) -> Result<PixelDescriptor> {
        Ok(borrow(self.buffer)?.descriptor())
    }

    pub fn get_channels(&self) -> Result<Channels> {
        borrow(self.buffer)?.get_pixel(self.x, self.y)
    }

    /// Overwrite the leading `values.len()` channels.
    ///
    /// Writing the trailing slot of a format without alpha has no effect.
    pub fn set_channels(&self, values: &[u16]) -> Result<()> {
        borrow_mut(self.buffer)?.set_pixel(self.x, self.y, values)
    }

    /// Map every channel, alpha included, through `f`.
    ///
    /// `f` is called exactly once per channel in index order. Results above
    /// the format's ceiling are clamped by the engine.
    pub fn apply<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(u16) -> u16,
    {
        let mut channels = self.get_channels()?;
        for c in channels.iter_mut() {
            *c = f(*c);
        }
        self.set_channels(&channels)
    }

    /// Map color channels through `f` and the alpha channel through
    /// `alpha_f`.
    ///
    /// For formats without alpha, `alpha_f` still runs on the sentinel but
    /// its result is dropped.
    pub fn apply_with_alpha<F, G>(&self, mut f: F, mut alpha_f: G) -> Result<()>
    where
        F: FnMut(u16) -> u16,
        G: FnMut(u16) -> u16,
    {
        let has_alpha = self.descriptor()?.has_alpha();
        let mut channels = self.get_channels()?;
        let Some((alpha, color)) = channels.split_last_mut() else {
            return Ok(());
        };
        for c in color {
            *c = f(*c);
        }
        let new_alpha = alpha_f(*alpha);
        if has_alpha {
            *alpha = new_alpha;
        }
        self.set_channels(&channels)
    }

    /// Map every channel except the last through `f`.
    ///
    /// The alpha (or sentinel) value is never passed to `f`.
    pub fn apply_without_alpha<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(u16) -> u16,
    {
        let mut channels = self.get_channels()?;
        let Some((_, color)) = channels.split_last_mut() else {
            return Ok(());
        };
        for c in color {
            *c = f(*c);
        }
        self.set_channels(&channels)
    }

    /// Combine channel `i` of this pixel with channel `i` of `other` through
    /// `f`, storing the result in this pixel. `other` is only read.
    pub fn apply2<F>(&self, other: &Pixel<'_, E>, mut f: F) -> Result<()>
    where
        F: FnMut(u16, u16) -> u16,
    {
        let mut channels = self.get_channels()?;
        let theirs = other.get_channels()?;
        if channels.len() != theirs.len() {
            return Err(Error::ChannelCountMismatch {
                expected: channels.len(),
                actual: theirs.len(),
            });
        }
        for (c, t) in channels.iter_mut().zip(theirs.iter()) {
            *c = f(*c, *t);
        }
        self.set_channels(&channels)
    }

    /// Replace each color channel `c` with `max - c`; alpha is untouched.
    pub fn invert(&self) -> Result<()> {
        let max = self.descriptor()?.max_value();
        self.apply_without_alpha(|c| max.saturating_sub(c))
    }

    /// Composite `other` over this pixel using the engine's blend primitive.
    pub fn blend(&self, other: &Pixel<'_, E>) -> Result<()> {
        let source = other.get_channels()?;
        borrow_mut(self.buffer)?.blend_pixel(self.x, self.y, &source)
    }
}

impl<E> Clone for Pixel<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Pixel<'_, E> {}

impl<E> PartialEq for Pixel<'_, E> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.buffer, other.buffer) && self.x == other.x && self.y == other.y
    }
}

impl<E> Eq for Pixel<'_, E> {}

impl<E> fmt::Debug for Pixel<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pixel({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufferError, PixelBuffer};
    use alloc::vec;
    use alloc::vec::Vec;

    /// RGB8 buffer whose (0, 0) and (100, 0) pixels hold the cat photo samples.
    fn cat() -> RefCell<PixelBuffer> {
        let mut buf = PixelBuffer::new(101, 1, PixelDescriptor::RGB8);
        buf.set_pixel(0, 0, &[142, 152, 115]).unwrap();
        buf.set_pixel(100, 0, &[165, 170, 148]).unwrap();
        RefCell::new(buf)
    }

    #[test]
    fn get_and_set_channels() {
        let buf = cat();
        let pixel = Pixel::new(&buf, 0, 0);
        assert_eq!(pixel.get_channels().unwrap(), [142, 152, 115, 255]);

        pixel.set_channels(&[0, 0]).unwrap();
        assert_eq!(pixel.get_channels().unwrap(), [0, 0, 115, 255]);
    }

    #[test]
    fn set_channels_rejects_too_many() {
        let buf = cat();
        let pixel = Pixel::new(&buf, 0, 0);
        assert_eq!(
            pixel.set_channels(&[1, 2, 3, 4, 5]),
            Err(Error::ChannelCountMismatch {
                expected: 4,
                actual: 5
            })
        );
    }

    #[test]
    fn apply_family_without_alpha_channel() {
        let buf = cat();
        let pixel = Pixel::new(&buf, 0, 0);
        let mut seen = Vec::new();

        pixel
            .apply(|c| {
                seen.push(c);
                0
            })
            .unwrap();
        assert_eq!(seen, [142, 152, 115, 255]);
        // No storage behind the sentinel, so it reads back as 255.
        assert_eq!(pixel.get_channels().unwrap(), [0, 0, 0, 255]);

        seen.clear();
        let mut alpha_seen = Vec::new();
        pixel
            .apply_with_alpha(
                |c| {
                    seen.push(c);
                    1
                },
                |a| {
                    alpha_seen.push(a);
                    1
                },
            )
            .unwrap();
        assert_eq!(seen, [0, 0, 0]);
        assert_eq!(alpha_seen, [255]);
        assert_eq!(pixel.get_channels().unwrap(), [1, 1, 1, 255]);

        seen.clear();
        pixel
            .apply_without_alpha(|c| {
                seen.push(c);
                2
            })
            .unwrap();
        assert_eq!(seen, [1, 1, 1]);
        assert_eq!(pixel.get_channels().unwrap(), [2, 2, 2, 255]);
    }

    #[test]
    fn apply_with_alpha_on_rgba() {
        let buf = RefCell::new(PixelBuffer::filled(
            1,
            1,
            PixelDescriptor::RGBA8,
            &[10, 20, 30, 40],
        ));
        let pixel = Pixel::new(&buf, 0, 0);
        pixel.apply_with_alpha(|c| c + 1, |a| a * 2).unwrap();
        assert_eq!(pixel.get_channels().unwrap(), [11, 21, 31, 80]);

        pixel.apply_without_alpha(|c| c * 2).unwrap();
        assert_eq!(pixel.get_channels().unwrap(), [22, 42, 62, 80]);
    }

    #[test]
    fn apply_clamps_to_channel_ceiling() {
        let buf = cat();
        let pixel = Pixel::new(&buf, 0, 0);
        pixel.apply(|_| 1000).unwrap();
        assert_eq!(pixel.get_channels().unwrap(), [255, 255, 255, 255]);
    }

    #[test]
    fn apply2_reads_other_without_writing_it() {
        let buf = cat();
        let pixel = Pixel::new(&buf, 0, 0);
        let other = Pixel::new(&buf, 100, 0);
        let mut pairs = Vec::new();

        pixel
            .apply2(&other, |a, b| {
                pairs.push((a, b));
                0
            })
            .unwrap();
        assert_eq!(pairs, [(142, 165), (152, 170), (115, 148), (255, 255)]);
        assert_eq!(pixel.get_channels().unwrap(), [0, 0, 0, 255]);
        assert_eq!(other.get_channels().unwrap(), [165, 170, 148, 255]);
    }

    #[test]
    fn apply2_across_buffers_with_different_counts() {
        let rgb = cat();
        let gray = RefCell::new(PixelBuffer::new(1, 1, PixelDescriptor::GRAY8));
        let pixel = Pixel::new(&rgb, 0, 0);
        let other = Pixel::new(&gray, 0, 0);
        assert_eq!(
            pixel.apply2(&other, |a, _| a),
            Err(Error::ChannelCountMismatch {
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn invert_leaves_alpha() {
        let buf = cat();
        let pixel = Pixel::new(&buf, 0, 0);
        pixel.invert().unwrap();
        assert_eq!(pixel.get_channels().unwrap(), [113, 103, 140, 255]);

        let wide = RefCell::new(PixelBuffer::filled(
            1,
            1,
            PixelDescriptor::RGBA16,
            &[0, 1, 65535, 7],
        ));
        let pixel = Pixel::new(&wide, 0, 0);
        pixel.invert().unwrap();
        assert_eq!(pixel.get_channels().unwrap(), [65535, 65534, 0, 7]);
    }

    #[test]
    fn blend_takes_opaque_other() {
        let buf = cat();
        let pixel = Pixel::new(&buf, 0, 0);
        let other = Pixel::new(&buf, 100, 0);
        pixel.blend(&other).unwrap();
        assert_eq!(pixel.get_channels().unwrap(), [165, 170, 148, 255]);
        assert_eq!(other.get_channels().unwrap(), [165, 170, 148, 255]);
    }

    #[test]
    fn blend_composites_translucent_other() {
        let data = vec![0, 255, 255, 128];
        let buf = RefCell::new(PixelBuffer::from_vec(data, 2, 1, PixelDescriptor::GRAYA8).unwrap());
        let pixel = Pixel::new(&buf, 0, 0);
        pixel.blend(&Pixel::new(&buf, 1, 0)).unwrap();
        assert_eq!(pixel.get_channels().unwrap(), [128, 255]);
    }

    #[test]
    fn out_of_range_surfaces_on_access() {
        let buf = cat();
        let pixel = Pixel::new(&buf, 101, 0);
        assert!(matches!(
            pixel.get_channels(),
            Err(Error::OutOfBounds { x: 101, y: 0, .. })
        ));
        assert!(matches!(
            pixel.invert(),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn closures_may_read_the_same_buffer() {
        let buf = cat();
        let pixel = Pixel::new(&buf, 0, 0);
        let other = Pixel::new(&buf, 100, 0);
        pixel
            .apply_without_alpha(|c| {
                let peek = other.get_channels().map(|ch| ch[0]).unwrap_or(0);
                c.max(peek)
            })
            .unwrap();
        assert_eq!(pixel.get_channels().unwrap(), [165, 165, 165, 255]);
    }

    #[test]
    fn held_borrow_is_reported_as_busy() {
        let buf = cat();
        let pixel = Pixel::new(&buf, 0, 0);
        let _guard = buf.borrow_mut();
        assert_eq!(
            pixel.get_channels(),
            Err(Error::Engine(BufferError::Busy))
        );
    }

    #[test]
    fn equality_is_positional() {
        let a = cat();
        let b = cat();
        assert_eq!(Pixel::new(&a, 0, 0), Pixel::new(&a, 0, 0));
        assert_ne!(Pixel::new(&a, 0, 0), Pixel::new(&a, 100, 0));
        assert_ne!(Pixel::new(&a, 0, 0), Pixel::new(&b, 0, 0));
    }
}
