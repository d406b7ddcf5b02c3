//! The storage interface views and pixel handles delegate to.
//!
//! Views only compute coordinates and pixel handles only select channels;
//! every actual read, write, and region copy goes through a [`PixelEngine`].
//! [`PixelBuffer`] is the implementation shipped with this crate.

use core::cell::{Ref, RefCell, RefMut};

use log::trace;

use crate::blend;
use crate::buffer::{BufferError, PixelBuffer, PixelDescriptor};
use crate::channels::Channels;
use crate::error::{Error, Result};
use crate::geometry::Bounds;

/// Pixel storage addressed by global coordinates.
///
/// Coordinates are signed so that translated positions left of or above the
/// buffer are representable; they simply fail with
/// [`Error::OutOfBounds`].
pub trait PixelEngine: Sized {
    /// Format of every pixel in this buffer.
    fn descriptor(&self) -> PixelDescriptor;

    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// `(x, y, width, height)` of the whole buffer.
    fn bounds(&self) -> (i32, i32, u32, u32) {
        let (width, height) = self.dimensions();
        (0, 0, width, height)
    }

    /// Whether `(x, y)` addresses a pixel.
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        let (width, height) = self.dimensions();
        x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height
    }

    /// Read the channel sequence at `(x, y)`.
    fn get_pixel(&self, x: i32, y: i32) -> Result<Channels>;

    /// Overwrite the leading `values.len()` channels at `(x, y)`.
    ///
    /// Fails with [`Error::ChannelCountMismatch`] when `values` is longer
    /// than the reported channel count.
    fn set_pixel(&mut self, x: i32, y: i32, values: &[u16]) -> Result<()>;

    /// Composite `source` over the pixel at `(x, y)`.
    fn blend_pixel(&mut self, x: i32, y: i32, source: &Channels) -> Result<()> {
        let current = self.get_pixel(x, y)?;
        if current.len() != source.len() {
            return Err(Error::ChannelCountMismatch {
                expected: current.len(),
                actual: source.len(),
            });
        }
        let blended = blend::composite(self.descriptor(), &current, source);
        self.set_pixel(x, y, &blended)
    }

    /// Copy the `w x h` rectangle at `(src_x, src_y)` of `src` into this
    /// buffer at `(dst_x, dst_y)`.
    #[allow(clippy::too_many_arguments)]
    fn copy_region_from_subrect(
        &mut self,
        src: &Self,
        src_x: i32,
        src_y: i32,
        w: u32,
        h: u32,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<()>;

    /// Copy all of `src` into this buffer at `(dst_x, dst_y)`.
    fn copy_region_from_whole(&mut self, src: &Self, dst_x: i32, dst_y: i32) -> Result<()> {
        let (width, height) = src.dimensions();
        self.copy_region_from_subrect(src, 0, 0, width, height, dst_x, dst_y)
    }

    /// Copy a rectangle of this buffer onto another position of itself.
    fn copy_within(
        &mut self,
        src_x: i32,
        src_y: i32,
        w: u32,
        h: u32,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<()>;

    /// Copy a rectangle into a new, independently owned buffer.
    fn extract_region(&self, x: i32, y: i32, w: u32, h: u32) -> Result<Self>;
}

/// Shared borrow of a buffer for the duration of one engine call.
pub(crate) fn borrow<E>(buffer: &RefCell<E>) -> Result<Ref<'_, E>> {
    buffer
        .try_borrow()
        .map_err(|_| Error::Engine(BufferError::Busy))
}

/// Exclusive borrow of a buffer for the duration of one engine call.
pub(crate) fn borrow_mut<E>(buffer: &RefCell<E>) -> Result<RefMut<'_, E>> {
    buffer
        .try_borrow_mut()
        .map_err(|_| Error::Engine(BufferError::Busy))
}

impl PixelBuffer {
    fn out_of_bounds(&self, x: i32, y: i32) -> Error {
        Error::OutOfBounds {
            x,
            y,
            width: self.width(),
            height: self.height(),
        }
    }

    fn checked_rect(&self, rect: Bounds) -> Result<Bounds> {
        if rect.fits_within(self.width(), self.height()) {
            Ok(rect)
        } else {
            Err(self.out_of_bounds(rect.x, rect.y))
        }
    }
}

impl PixelEngine for PixelBuffer {
    fn descriptor(&self) -> PixelDescriptor {
        PixelBuffer::descriptor(self)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn get_pixel(&self, x: i32, y: i32) -> Result<Channels> {
        if !self.in_bounds(x, y) {
            return Err(self.out_of_bounds(x, y));
        }
        Ok(self.read(x as u32, y as u32))
    }

    fn set_pixel(&mut self, x: i32, y: i32, values: &[u16]) -> Result<()> {
        if !self.in_bounds(x, y) {
            return Err(self.out_of_bounds(x, y));
        }
        let expected = self.descriptor().reported_channels();
        if values.len() > expected {
            return Err(Error::ChannelCountMismatch {
                expected,
                actual: values.len(),
            });
        }
        self.write(x as u32, y as u32, values);
        Ok(())
    }

    /// The source rectangle must lie inside `src`; the destination is
    /// clipped to this buffer.
    #[allow(clippy::too_many_arguments)]
    fn copy_region_from_subrect(
        &mut self,
        src: &Self,
        src_x: i32,
        src_y: i32,
        w: u32,
        h: u32,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<()> {
        let rect = src.checked_rect(Bounds::new(src_x, src_y, w, h))?;
        if !self.descriptor().layout_compatible(&src.descriptor()) {
            return Err(BufferError::FormatMismatch.into());
        }

        // Clip against this buffer in i64 so that no edge arithmetic overflows.
        let (dst_w, dst_h) = (i64::from(self.width()), i64::from(self.height()));
        let (dx, dy) = (i64::from(dst_x), i64::from(dst_y));
        let x0 = dx.max(0);
        let y0 = dy.max(0);
        let x1 = (dx + i64::from(rect.width)).min(dst_w);
        let y1 = (dy + i64::from(rect.height)).min(dst_h);
        trace!(
            "copy {}x{} from ({}, {}) to ({dst_x}, {dst_y}), visible {}x{}",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            (x1 - x0).max(0),
            (y1 - y0).max(0)
        );
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        let bpp = self.descriptor().bytes_per_pixel();
        let row_bytes = (x1 - x0) as usize * bpp;
        // Offset of the first visible column/row inside the source rectangle.
        let sx = (i64::from(rect.x) + (x0 - dx)) as usize * bpp;
        let sy = i64::from(rect.y) + (y0 - dy);
        for row in 0..(y1 - y0) {
            let src_row = &src.row((sy + row) as u32)[sx..sx + row_bytes];
            let dst_start = x0 as usize * bpp;
            self.row_mut((y0 + row) as u32)[dst_start..dst_start + row_bytes]
                .copy_from_slice(src_row);
        }
        Ok(())
    }

    /// Both rectangles must lie inside the buffer. Overlap is handled.
    fn copy_within(
        &mut self,
        src_x: i32,
        src_y: i32,
        w: u32,
        h: u32,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<()> {
        let src = self.checked_rect(Bounds::new(src_x, src_y, w, h))?;
        let dst = self.checked_rect(Bounds::new(dst_x, dst_y, w, h))?;
        trace!("copy_within {w}x{h} from ({src_x}, {src_y}) to ({dst_x}, {dst_y})");
        if w == 0 || h == 0 {
            return Ok(());
        }

        let bpp = self.descriptor().bytes_per_pixel();
        let stride = self.stride();
        let row_bytes = w as usize * bpp;
        let copy_row = |data: &mut [u8], row: u32| {
            let from = (src.y as u32 + row) as usize * stride + src.x as usize * bpp;
            let to = (dst.y as u32 + row) as usize * stride + dst.x as usize * bpp;
            data.copy_within(from..from + row_bytes, to);
        };
        let data = self.data_mut();
        // Walk rows away from the destination so overlapping rows are read
        // before they are overwritten.
        if dst.y > src.y {
            for row in (0..h).rev() {
                copy_row(data, row);
            }
        } else {
            for row in 0..h {
                copy_row(data, row);
            }
        }
        Ok(())
    }

    fn extract_region(&self, x: i32, y: i32, w: u32, h: u32) -> Result<Self> {
        let rect = self.checked_rect(Bounds::new(x, y, w, h))?;
        trace!("extract {w}x{h} at ({x}, {y})");
        Ok(self.crop_copy(rect.x as u32, rect.y as u32, rect.width, rect.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    /// RGB8 buffer whose pixel (x, y) is `[x, y, 10 * y + x]`.
    fn numbered(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height, PixelDescriptor::RGB8);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                buf.set_pixel(x, y, &[x as u16, y as u16, (10 * y + x) as u16])
                    .unwrap();
            }
        }
        buf
    }

    fn id(buf: &PixelBuffer, x: i32, y: i32) -> u16 {
        buf.get_pixel(x, y).unwrap()[2]
    }

    #[test]
    fn bounds_default_to_origin() {
        let buf = PixelBuffer::new(7, 3, PixelDescriptor::RGBA8);
        assert_eq!(buf.bounds(), (0, 0, 7, 3));
        assert!(buf.in_bounds(6, 2));
        assert!(!buf.in_bounds(7, 2));
        assert!(!buf.in_bounds(-1, 0));
    }

    #[test]
    fn get_pixel_out_of_bounds() {
        let buf = PixelBuffer::new(2, 2, PixelDescriptor::RGB8);
        assert_eq!(
            buf.get_pixel(2, 0),
            Err(Error::OutOfBounds {
                x: 2,
                y: 0,
                width: 2,
                height: 2
            })
        );
    }

    #[test]
    fn set_pixel_rejects_extra_channels() {
        let mut buf = PixelBuffer::new(1, 1, PixelDescriptor::GRAY8);
        assert_eq!(
            buf.set_pixel(0, 0, &[1, 2, 3]),
            Err(Error::ChannelCountMismatch {
                expected: 2,
                actual: 3
            })
        );
        buf.set_pixel(0, 0, &[7, 0]).unwrap();
        assert_eq!(buf.get_pixel(0, 0).unwrap(), [7, 255]);
    }

    #[test]
    fn blend_pixel_composites() {
        let mut buf = PixelBuffer::filled(1, 1, PixelDescriptor::GRAYA8, &[0, 255]);
        buf.blend_pixel(0, 0, &Channels::from([255, 128])).unwrap();
        assert_eq!(buf.get_pixel(0, 0).unwrap(), [128, 255]);
    }

    #[test]
    fn copy_subrect_into_other_buffer() {
        let src = numbered(4, 3);
        let mut dst = PixelBuffer::new(4, 3, PixelDescriptor::RGB8);
        dst.copy_region_from_subrect(&src, 1, 1, 2, 2, 0, 0).unwrap();
        assert_eq!(id(&dst, 0, 0), 11);
        assert_eq!(id(&dst, 1, 1), 22);
        assert_eq!(id(&dst, 2, 0), 0);
    }

    #[test]
    fn copy_subrect_clips_destination() {
        let src = numbered(4, 3);
        let mut dst = PixelBuffer::new(3, 3, PixelDescriptor::RGB8);
        dst.copy_region_from_subrect(&src, 0, 0, 4, 3, -1, 1).unwrap();
        // Column 0 of src falls off the left edge, row 2 off the bottom.
        assert_eq!(id(&dst, 0, 1), 1);
        assert_eq!(id(&dst, 2, 2), 13);
        assert_eq!(id(&dst, 0, 0), 0);
    }

    #[test]
    fn copy_subrect_source_must_fit() {
        let src = numbered(4, 3);
        let mut dst = PixelBuffer::new(4, 3, PixelDescriptor::RGB8);
        let err = dst.copy_region_from_subrect(&src, 3, 0, 2, 1, 0, 0);
        assert!(matches!(err, Err(Error::OutOfBounds { x: 3, y: 0, .. })));
    }

    #[test]
    fn copy_requires_compatible_layouts() {
        let src = PixelBuffer::new(1, 1, PixelDescriptor::RGBA8);
        let mut dst = PixelBuffer::new(1, 1, PixelDescriptor::RGB8);
        assert_eq!(
            dst.copy_region_from_whole(&src, 0, 0),
            Err(Error::Engine(BufferError::FormatMismatch))
        );
    }

    #[test]
    fn copy_whole_ignores_size_mismatch() {
        let src = numbered(4, 3);
        let mut dst = PixelBuffer::new(2, 2, PixelDescriptor::RGB8);
        dst.copy_region_from_whole(&src, 0, 0).unwrap();
        assert_eq!(id(&dst, 1, 1), 11);
    }

    #[test]
    fn copy_within_overlapping_down_right() {
        let mut buf = numbered(4, 3);
        buf.copy_within(0, 0, 3, 2, 1, 1).unwrap();
        let ids: Vec<u16> = (0..3)
            .flat_map(|y| (0..4).map(move |x| (x, y)))
            .map(|(x, y)| id(&buf, x, y))
            .collect();
        assert_eq!(ids, [0, 1, 2, 3, 10, 0, 1, 2, 20, 10, 11, 12]);
    }

    #[test]
    fn copy_within_overlapping_up_left() {
        let mut buf = numbered(4, 3);
        buf.copy_within(1, 1, 3, 2, 0, 0).unwrap();
        assert_eq!(id(&buf, 0, 0), 11);
        assert_eq!(id(&buf, 2, 1), 23);
        assert_eq!(id(&buf, 3, 2), 23);
    }

    #[test]
    fn copy_within_rejects_escaping_target() {
        let mut buf = numbered(4, 3);
        assert!(matches!(
            buf.copy_within(0, 0, 2, 2, 3, 0),
            Err(Error::OutOfBounds { x: 3, y: 0, .. })
        ));
    }

    #[test]
    fn borrow_conflict_is_busy() {
        let cell = RefCell::new(PixelBuffer::new(1, 1, PixelDescriptor::RGB8));
        let _held = cell.borrow_mut();
        assert!(matches!(
            borrow(&cell),
            Err(Error::Engine(BufferError::Busy))
        ));
    }

    #[test]
    fn extract_region_is_independent() {
        let src = numbered(4, 3);
        let mut out = src.extract_region(2, 1, 2, 2).unwrap();
        assert_eq!(out.dimensions(), (2, 2));
        assert_eq!(id(&out, 0, 0), 12);
        out.set_pixel(0, 0, &[0, 0, 0]).unwrap();
        assert_eq!(id(&src, 2, 1), 12);
    }
}
