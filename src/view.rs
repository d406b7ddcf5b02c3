//! Whole-buffer and rectangular views over a pixel buffer.
//!
//! A [`View`] owns no pixels. It translates local coordinates into the global
//! coordinates of its buffer and forwards everything else to the
//! [`PixelEngine`]. Nested views are flattened on construction: a view of a
//! view stores its rectangle in buffer space and refers to the buffer
//! directly, so translation is always a single offset.

use core::cell::RefCell;
use core::fmt;
use core::iter::FusedIterator;

use log::debug;

use crate::engine::{PixelEngine, borrow, borrow_mut};
use crate::error::Result;
use crate::geometry::{Bounds, Dimensions, Position};
use crate::pixel::Pixel;

/// A whole buffer, or a rectangle of one.
///
/// Bounds are not validated: a rectangle reaching outside the buffer is
/// accepted and fails with [`Error::OutOfBounds`](crate::Error::OutOfBounds)
/// on first access.
///
/// Queries that cannot fail otherwise ([`dimensions`](Self::dimensions),
/// [`extent`](Self::extent), [`in_bounds`](Self::in_bounds)) panic if the
/// buffer is mutably borrowed elsewhere at the time of the call.
pub enum View<'a, E> {
    /// The whole buffer; local and global coordinates coincide.
    Root(&'a RefCell<E>),
    /// A rectangle of the buffer, its origin in buffer coordinates.
    Bounded(&'a RefCell<E>, Bounds),
}

impl<'a, E: PixelEngine> View<'a, E> {
    /// View of the whole buffer.
    pub fn new(buffer: &'a RefCell<E>) -> Self {
        View::Root(buffer)
    }

    /// View of `bounds`, given in buffer coordinates.
    pub fn with_bounds(buffer: &'a RefCell<E>, bounds: Bounds) -> Self {
        View::Bounded(buffer, bounds)
    }

    #[inline]
    pub fn buffer(&self) -> &'a RefCell<E> {
        match *self {
            View::Root(buffer) | View::Bounded(buffer, _) => buffer,
        }
    }

    /// The rectangle of a bounded view, `None` for a root view.
    #[inline]
    pub fn view_bounds(&self) -> Option<Bounds> {
        match *self {
            View::Root(_) => None,
            View::Bounded(_, bounds) => Some(bounds),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self, View::Root(_))
    }

    /// Move this view to `bounds`, given in buffer coordinates.
    ///
    /// A root view becomes a bounded one.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        *self = View::Bounded(self.buffer(), bounds);
    }

    /// Size of the addressed area.
    pub fn dimensions(&self) -> Dimensions {
        match *self {
            View::Root(buffer) => buffer.borrow().dimensions().into(),
            View::Bounded(_, bounds) => bounds.dimensions(),
        }
    }

    /// Origin and size of the addressed area, in buffer coordinates.
    pub fn extent(&self) -> Bounds {
        match *self {
            View::Root(buffer) => buffer.borrow().bounds().into(),
            View::Bounded(_, bounds) => bounds,
        }
    }

    /// Size of the whole underlying buffer, whatever this view addresses.
    pub fn buffer_dimensions(&self) -> Dimensions {
        self.buffer().borrow().dimensions().into()
    }

    /// Translate a local position into buffer coordinates.
    #[inline]
    pub fn to_global(&self, local: Position) -> Position {
        match *self {
            View::Root(_) => local,
            View::Bounded(_, bounds) => local.offset(bounds.x, bounds.y),
        }
    }

    /// Handle to the pixel at `local`. Range errors surface when the pixel
    /// is read or written.
    pub fn get_pixel(&self, local: Position) -> Pixel<'a, E> {
        let global = self.to_global(local);
        Pixel::new(self.buffer(), global.x, global.y)
    }

    /// Overwrite the pixel at `local` with `source`.
    pub fn put_pixel(&self, local: Position, source: &[u16]) -> Result<()> {
        self.get_pixel(local).set_channels(source)
    }

    pub fn in_bounds(&self, local: Position) -> bool {
        let global = self.to_global(local);
        self.buffer().borrow().in_bounds(global.x, global.y)
    }

    /// Every pixel of the view in row-major order.
    ///
    /// Each call starts a fresh enumeration at `(0, 0)`.
    pub fn pixels(&self) -> Pixels<'a, E> {
        Pixels {
            view: *self,
            x: 0,
            y: 0,
            size: self.dimensions(),
        }
    }

    /// Copy `source` into this view with its top-left corner at `target`.
    ///
    /// A bounded source contributes only its rectangle; a root source
    /// contributes its whole buffer, independent of this view's own size.
    /// The engine clips the copy to this view's buffer.
    pub fn copy_from(&self, source: &View<'_, E>, target: Position) -> Result<()> {
        let target = self.to_global(target);

        if core::ptr::eq(self.buffer(), source.buffer()) {
            // One RefCell cannot lend itself out shared and exclusive at
            // once; stage the source area in a scratch buffer instead.
            debug!(
                "copy_from on a shared buffer, staging {:?} before writing at {target:?}",
                source.extent()
            );
            let staged = source.materialize()?;
            return borrow_mut(self.buffer())?.copy_region_from_whole(&staged, target.x, target.y);
        }

        let src = borrow(source.buffer())?;
        let mut dst = borrow_mut(self.buffer())?;
        match *source {
            View::Bounded(_, b) => {
                dst.copy_region_from_subrect(&src, b.x, b.y, b.width, b.height, target.x, target.y)
            }
            View::Root(_) => dst.copy_region_from_whole(&src, target.x, target.y),
        }
    }

    /// Copy the local rectangle `source_bounds` of this view so that its
    /// top-left corner lands on the local position `target`.
    pub fn copy_within(&self, source_bounds: Bounds, target: Position) -> Result<()> {
        let source = self.to_global(source_bounds.origin());
        let target = self.to_global(target);
        borrow_mut(self.buffer())?.copy_within(
            source.x,
            source.y,
            source_bounds.width,
            source_bounds.height,
            target.x,
            target.y,
        )
    }

    /// View of the local rectangle `bounds`, attached directly to the buffer.
    pub fn sub_view(&self, bounds: Bounds) -> View<'a, E> {
        let global = match *self {
            View::Root(_) => bounds,
            View::Bounded(_, outer) => bounds.translate(outer.x, outer.y),
        };
        View::Bounded(self.buffer(), global)
    }

    /// Copy the addressed area into a new, independently owned buffer.
    pub fn materialize(&self) -> Result<E> {
        let Bounds {
            x,
            y,
            width,
            height,
        } = self.extent();
        debug!("materializing {width}x{height} at ({x}, {y})");
        borrow(self.buffer())?.extract_region(x, y, width, height)
    }
}

impl<E> Clone for View<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for View<'_, E> {}

impl<E> fmt::Debug for View<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Root(_) => f.write_str("View::Root"),
            View::Bounded(_, b) => write!(
                f,
                "View::Bounded({}x{} at {}, {})",
                b.width, b.height, b.x, b.y
            ),
        }
    }
}

/// Row-major iterator over the pixels of a [`View`].
///
/// Created by [`View::pixels`].
pub struct Pixels<'a, E> {
    view: View<'a, E>,
    x: u32,
    y: u32,
    size: Dimensions,
}

impl<'a, E: PixelEngine> Pixels<'a, E> {
    fn remaining(&self) -> u64 {
        if self.size.is_empty() || self.y >= self.size.height {
            return 0;
        }
        self.size.area() - self.consumed()
    }

    fn consumed(&self) -> u64 {
        u64::from(self.y) * u64::from(self.size.width) + u64::from(self.x)
    }

    /// Handle for local `(x, y)`, translated in 64-bit space so that columns
    /// past `i32::MAX` never wrap back into the buffer.
    fn pixel_at(&self, x: u32, y: u32) -> Pixel<'a, E> {
        let origin = self.view.view_bounds().map_or(Position::ORIGIN, Bounds::origin);
        let gx = i64::from(origin.x) + i64::from(x);
        let gy = i64::from(origin.y) + i64::from(y);
        Pixel::new(self.view.buffer(), saturate(gx), saturate(gy))
    }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl<'a, E: PixelEngine> Iterator for Pixels<'a, E> {
    type Item = Pixel<'a, E>;

    fn next(&mut self) -> Option<Pixel<'a, E>> {
        if self.remaining() == 0 {
            return None;
        }
        let pixel = self.pixel_at(self.x, self.y);
        self.x += 1;
        if self.x >= self.size.width {
            self.x = 0;
            self.y += 1;
        }
        Some(pixel)
    }

    fn nth(&mut self, n: usize) -> Option<Pixel<'a, E>> {
        let skip = u64::try_from(n).unwrap_or(u64::MAX);
        if skip >= self.remaining() {
            self.x = 0;
            self.y = self.size.height;
            return None;
        }
        let index = self.consumed() + skip;
        let width = u64::from(self.size.width);
        self.x = (index % width) as u32;
        self.y = (index / width) as u32;
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

impl<E: PixelEngine> ExactSizeIterator for Pixels<'_, E> {}

impl<E: PixelEngine> FusedIterator for Pixels<'_, E> {}
