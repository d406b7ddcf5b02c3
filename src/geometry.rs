//! Positions, sizes, and rectangles in buffer or view coordinates.

/// A pixel coordinate.
///
/// Whether it is local to a [`View`](crate::View) or global to the underlying
/// buffer depends on where it is used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Shift by `(dx, dy)`.
    ///
    /// Saturates instead of wrapping so a position pushed past `i32::MAX`
    /// still lands outside every buffer.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count.
    #[inline]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether either side is zero.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// A rectangle: origin plus extent.
///
/// For a bounded [`View`](crate::View) the origin is expressed in the
/// coordinate space of the underlying buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner.
    #[inline]
    pub const fn origin(self) -> Position {
        Position::new(self.x, self.y)
    }

    #[inline]
    pub const fn dimensions(self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Same extent, origin moved by `(dx, dy)`.
    #[inline]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        let origin = self.origin().offset(dx, dy);
        Self {
            x: origin.x,
            y: origin.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Whether this rectangle lies entirely inside `[0, width) x [0, height)`.
    ///
    /// Empty rectangles are contained as long as their origin is not negative.
    pub fn fits_within(self, width: u32, height: u32) -> bool {
        if self.x < 0 || self.y < 0 {
            return false;
        }
        let right = self.x as u64 + self.width as u64;
        let bottom = self.y as u64 + self.height as u64;
        right <= width as u64 && bottom <= height as u64
    }
}

impl From<(i32, i32, u32, u32)> for Bounds {
    fn from((x, y, width, height): (i32, i32, u32, u32)) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_saturates() {
        let p = Position::new(i32::MAX - 1, 0).offset(5, -3);
        assert_eq!(p, Position::new(i32::MAX, -3));
    }

    #[test]
    fn translate_keeps_extent() {
        let b = Bounds::new(2, 3, 10, 20).translate(5, 7);
        assert_eq!(b, Bounds::new(7, 10, 10, 20));
    }

    #[test]
    fn fits_within_edges() {
        assert!(Bounds::new(0, 0, 4, 4).fits_within(4, 4));
        assert!(Bounds::new(3, 3, 1, 1).fits_within(4, 4));
        assert!(!Bounds::new(3, 3, 2, 1).fits_within(4, 4));
        assert!(!Bounds::new(-1, 0, 1, 1).fits_within(4, 4));
        assert!(Bounds::new(4, 4, 0, 0).fits_within(4, 4));
    }

    #[test]
    fn dimensions_area_and_empty() {
        assert_eq!(Dimensions::new(10, 20).area(), 200);
        assert!(Dimensions::new(0, 20).is_empty());
        assert!(!Dimensions::new(1, 1).is_empty());
    }
}
