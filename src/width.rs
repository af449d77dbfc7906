//! Width of the public pixel indices.
//!
//! The same algorithms are exposed for two signed integer widths:
//! * `i32`, the traditional width, supporting `nside` up to `8192`
//!   (`12 * 8192^2 = 805_306_368 < 2^31`);
//! * `i64`, the wide width, supporting `nside` up to `2^29`, the largest NESTED depth.
//!
//! Internally, all computations are made on `u32` (nside, coordinates in a base cell) and
//! `u64` (hash values), so both widths share the exact same code path.

use std::fmt::{Debug, Display};

use num_traits::{CheckedMul, PrimInt, Signed};

use super::NSIDE_MAX;

/// Signed integer type usable as a public Nside / Npix / pixel index.
/// In practice `i32` and `i64` implement this trait.
pub trait PixelIndex:
  PrimInt + Signed + CheckedMul + Copy + Display + Debug + Send + Sync + 'static
{
  /// Largest supported Nside for this width.
  const NSIDE_MAX: u32;
  /// Value used for absent neighbours and, at compatibility boundaries, for errors.
  const SENTINEL: Self;

  /// Lossless conversion to `i64`, used in error messages and range checks.
  fn as_i64(self) -> i64;

  /// Conversion from the internal hash domain.
  /// The caller ensures that `v` fits in `Self`, which is always the case for a hash at
  /// an nside `<= Self::NSIDE_MAX`.
  fn from_u64(v: u64) -> Self;

  /// Returns the internal hash if `self` is in `[0, npix[`.
  fn to_hash(self, npix: u64) -> Option<u64> {
    // `None` for negative values
    self.to_u64().filter(|h| *h < npix)
  }

  /// `NSIDE_MAX` in the width of `Self`.
  fn nside_max() -> Self {
    Self::from_u64(Self::NSIDE_MAX as u64)
  }
}

impl PixelIndex for i32 {
  const NSIDE_MAX: u32 = 8192;
  const SENTINEL: Self = -1;

  #[inline]
  fn as_i64(self) -> i64 {
    self as i64
  }

  #[inline]
  fn from_u64(v: u64) -> Self {
    debug_assert!(v <= i32::MAX as u64);
    v as i32
  }
}

impl PixelIndex for i64 {
  const NSIDE_MAX: u32 = NSIDE_MAX;
  const SENTINEL: Self = -1;

  #[inline]
  fn as_i64(self) -> i64 {
    self
  }

  #[inline]
  fn from_u64(v: u64) -> Self {
    debug_assert!(v <= i64::MAX as u64);
    v as i64
  }
}
