//! Fixed-capacity channel sequences.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::{Deref, DerefMut};

/// Largest number of channels any supported layout reports.
pub const MAX_CHANNELS: usize = 4;

/// The channel values of one pixel, lowest index first.
///
/// Layouts without an alpha channel still report a trailing alpha slot
/// holding the format's maximum value, so the last entry is always the
/// alpha (or alpha sentinel). Values are stored as `u16`; 8-bit formats
/// stay within `0..=255`.
#[derive(Clone, Copy)]
pub struct Channels {
    values: [u16; MAX_CHANNELS],
    len: u8,
}

impl Channels {
    /// Build from a slice.
    ///
    /// Returns `None` if `values` holds more than [`MAX_CHANNELS`] entries.
    pub fn from_slice(values: &[u16]) -> Option<Self> {
        if values.len() > MAX_CHANNELS {
            return None;
        }
        let mut out = Self {
            values: [0; MAX_CHANNELS],
            len: values.len() as u8,
        };
        out.values[..values.len()].copy_from_slice(values);
        Some(out)
    }

    /// `len` must not exceed [`MAX_CHANNELS`].
    pub(crate) const fn from_raw(values: [u16; MAX_CHANNELS], len: usize) -> Self {
        debug_assert!(len <= MAX_CHANNELS);
        Self {
            values,
            len: len as u8,
        }
    }

    /// Number of channels.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The trailing alpha (or sentinel) value.
    #[inline]
    pub fn alpha(&self) -> Option<u16> {
        self.as_slice().last().copied()
    }

    /// All channels except the trailing alpha slot.
    #[inline]
    pub fn color(&self) -> &[u16] {
        let n = self.len().saturating_sub(1);
        &self.values[..n]
    }

    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        &self.values[..self.len()]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u16] {
        let n = self.len();
        &mut self.values[..n]
    }
}

impl Deref for Channels {
    type Target = [u16];

    fn deref(&self) -> &[u16] {
        self.as_slice()
    }
}

impl DerefMut for Channels {
    fn deref_mut(&mut self) -> &mut [u16] {
        self.as_mut_slice()
    }
}

impl<const N: usize> From<[u16; N]> for Channels {
    /// Arrays longer than [`MAX_CHANNELS`] fail to compile.
    fn from(values: [u16; N]) -> Self {
        const { assert!(N <= MAX_CHANNELS, "too many channels") };
        let mut out = Self {
            values: [0; MAX_CHANNELS],
            len: N as u8,
        };
        out.values[..N].copy_from_slice(&values);
        out
    }
}

impl PartialEq for Channels {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Channels {}

impl Hash for Channels {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl PartialEq<[u16]> for Channels {
    fn eq(&self, other: &[u16]) -> bool {
        self.as_slice() == other
    }
}

impl<const N: usize> PartialEq<[u16; N]> for Channels {
    fn eq(&self, other: &[u16; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl fmt::Debug for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
