//! 2D Morton code (z-order curve) used to build NESTED hash values from the `(i, j)` coordinates
//! of a cell inside its base cell.
//! The `i` coordinate is stored in the even bits of the hash, `j` in the odd bits.
//!
//! Two families of implementations:
//! * "magic bits": portable shifts and masks, see
//!   [here](https://graphics.stanford.edu/~seander/bithacks.html#InterleaveBMN);
//! * BMI 2.0 `pdep`/`pext` instructions, only available when compiling with
//!   `-C target-feature=+bmi2` on `x86_64`.

/// Bit interleaving of two coordinates into a single hash, and its reverse operation.
pub trait ZOrderCurve: Sync + Send {
  /// Spreads the bits of `i` so that bit `k` of `i` becomes bit `2k` of the result.
  fn spread(&self, i: u32) -> u64;
  /// Inverse of `spread`: keeps the even bits of `h` and packs them.
  fn compact(&self, h: u64) -> u32;

  /// Interleaves `i` (even bits) and `j` (odd bits).
  fn ij2h(&self, i: u32, j: u32) -> u64 {
    self.spread(i) | (self.spread(j) << 1)
  }

  /// De-interleaves the given hash into its `(i, j)` coordinates.
  fn h2ij(&self, h: u64) -> (u32, u32) {
    (self.compact(h), self.compact(h >> 1))
  }

  /// Returns the `i` coordinate (even bits) of the given hash.
  fn h2i(&self, h: u64) -> u32 {
    self.compact(h)
  }

  /// Returns the `j` coordinate (odd bits) of the given hash.
  fn h2j(&self, h: u64) -> u32 {
    self.compact(h >> 1)
  }
}

/// Depth 0: a base cell contains a single cell.
pub struct EmptyZOC;
impl ZOrderCurve for EmptyZOC {
  fn spread(&self, _i: u32) -> u64 { 0 }
  fn compact(&self, _h: u64) -> u32 { 0 }
  fn ij2h(&self, _i: u32, _j: u32) -> u64 { 0 }
  fn h2ij(&self, _h: u64) -> (u32, u32) { (0, 0) }
}

/// For depths up to 16, i.e. coordinates on 16 bits and hash (without base cell) on 32 bits.
pub struct SmallZOC;
impl ZOrderCurve for SmallZOC {
  fn spread(&self, i: u32) -> u64 {
    let mut x = i & 0x0000FFFF;
    x = (x | (x << 8)) & 0x00FF00FF;
    x = (x | (x << 4)) & 0x0F0F0F0F;
    x = (x | (x << 2)) & 0x33333333;
    x = (x | (x << 1)) & 0x55555555;
    x as u64
  }
  fn compact(&self, h: u64) -> u32 {
    let mut x = (h as u32) & 0x55555555;
    x = (x | (x >> 1)) & 0x33333333;
    x = (x | (x >> 2)) & 0x0F0F0F0F;
    x = (x | (x >> 4)) & 0x00FF00FF;
    x = (x | (x >> 8)) & 0x0000FFFF;
    x
  }
}

/// For depths up to 29 (coordinates on up to 32 bits, hash on 64 bits).
pub struct LargeZOC;
impl ZOrderCurve for LargeZOC {
  fn spread(&self, i: u32) -> u64 {
    let mut x = i as u64;
    x = (x | (x << 16)) & 0x0000FFFF0000FFFF;
    x = (x | (x << 8)) & 0x00FF00FF00FF00FF;
    x = (x | (x << 4)) & 0x0F0F0F0F0F0F0F0F;
    x = (x | (x << 2)) & 0x3333333333333333;
    x = (x | (x << 1)) & 0x5555555555555555;
    x
  }
  fn compact(&self, h: u64) -> u32 {
    let mut x = h & 0x5555555555555555;
    x = (x | (x >> 1)) & 0x3333333333333333;
    x = (x | (x >> 2)) & 0x0F0F0F0F0F0F0F0F;
    x = (x | (x >> 4)) & 0x00FF00FF00FF00FF;
    x = (x | (x >> 8)) & 0x0000FFFF0000FFFF;
    x = (x | (x >> 16)) & 0x00000000FFFFFFFF;
    x as u32
  }
}

#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
pub struct LargeZOCbmi;
#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
impl ZOrderCurve for LargeZOCbmi {
  fn spread(&self, i: u32) -> u64 {
    use std::arch::x86_64::_pdep_u64;
    // SAFETY: the bmi2 target feature is statically enabled
    unsafe { _pdep_u64(i as u64, 0x5555555555555555) }
  }
  fn compact(&self, h: u64) -> u32 {
    use std::arch::x86_64::_pext_u64;
    // SAFETY: the bmi2 target feature is statically enabled
    unsafe { _pext_u64(h, 0x5555555555555555) as u32 }
  }
  fn ij2h(&self, i: u32, j: u32) -> u64 {
    use std::arch::x86_64::_pdep_u64;
    // SAFETY: the bmi2 target feature is statically enabled
    unsafe { _pdep_u64(i as u64, 0x5555555555555555) | _pdep_u64(j as u64, 0xAAAAAAAAAAAAAAAA) }
  }
  fn h2ij(&self, h: u64) -> (u32, u32) {
    use std::arch::x86_64::_pext_u64;
    // SAFETY: the bmi2 target feature is statically enabled
    unsafe {
      (
        _pext_u64(h, 0x5555555555555555) as u32,
        _pext_u64(h, 0xAAAAAAAAAAAAAAAA) as u32,
      )
    }
  }
}

pub static EMPTY_ZOC: EmptyZOC = EmptyZOC;
pub static SMALL_ZOC: SmallZOC = SmallZOC;
pub static LARGE_ZOC: LargeZOC = LargeZOC;
#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
pub static LARGE_ZOC_BMI: LargeZOCbmi = LargeZOCbmi;

/// Z-order curve implementation selected for a given depth, usable in `const` contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOC {
  /// depth = 0
  EMPTY,
  /// depth in [1, 16]
  SMALL,
  /// depth in [17, 29]
  LARGE,
}

impl ZOC {
  pub const fn from_depth(depth: u8) -> Self {
    match depth {
      0 => ZOC::EMPTY,
      1..=16 => ZOC::SMALL,
      _ => ZOC::LARGE,
    }
  }
}

#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
impl ZOrderCurve for ZOC {
  #[inline]
  fn spread(&self, i: u32) -> u64 {
    match self {
      ZOC::EMPTY => EMPTY_ZOC.spread(i),
      ZOC::SMALL => SMALL_ZOC.spread(i),
      ZOC::LARGE => LARGE_ZOC.spread(i),
    }
  }
  #[inline]
  fn compact(&self, h: u64) -> u32 {
    match self {
      ZOC::EMPTY => EMPTY_ZOC.compact(h),
      ZOC::SMALL => SMALL_ZOC.compact(h),
      ZOC::LARGE => LARGE_ZOC.compact(h),
    }
  }
  #[inline]
  fn ij2h(&self, i: u32, j: u32) -> u64 {
    match self {
      ZOC::EMPTY => EMPTY_ZOC.ij2h(i, j),
      ZOC::SMALL => SMALL_ZOC.ij2h(i, j),
      ZOC::LARGE => LARGE_ZOC.ij2h(i, j),
    }
  }
  #[inline]
  fn h2ij(&self, h: u64) -> (u32, u32) {
    match self {
      ZOC::EMPTY => EMPTY_ZOC.h2ij(h),
      ZOC::SMALL => SMALL_ZOC.h2ij(h),
      ZOC::LARGE => LARGE_ZOC.h2ij(h),
    }
  }
}

// With pdep/pext, a single instruction per coordinate whatever the depth
#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
impl ZOrderCurve for ZOC {
  #[inline]
  fn spread(&self, i: u32) -> u64 {
    match self {
      ZOC::EMPTY => EMPTY_ZOC.spread(i),
      _ => LARGE_ZOC_BMI.spread(i),
    }
  }
  #[inline]
  fn compact(&self, h: u64) -> u32 {
    match self {
      ZOC::EMPTY => EMPTY_ZOC.compact(h),
      _ => LARGE_ZOC_BMI.compact(h),
    }
  }
  #[inline]
  fn ij2h(&self, i: u32, j: u32) -> u64 {
    match self {
      ZOC::EMPTY => EMPTY_ZOC.ij2h(i, j),
      _ => LARGE_ZOC_BMI.ij2h(i, j),
    }
  }
  #[inline]
  fn h2ij(&self, h: u64) -> (u32, u32) {
    match self {
      ZOC::EMPTY => EMPTY_ZOC.h2ij(h),
      _ => LARGE_ZOC_BMI.h2ij(h),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Naive bit by bit interleaving, used as reference.
  fn naive_ij2h(i: u32, j: u32) -> u64 {
    (0..32).fold(0_u64, |h, k| {
      h | ((((i >> k) & 1) as u64) << (2 * k)) | ((((j >> k) & 1) as u64) << (2 * k + 1))
    })
  }

  #[test]
  fn testok_small() {
    let n = 1_u32 << 16;
    for i in (0..n).step_by(7) {
      for j in (0..n).step_by(997) {
        let h = SMALL_ZOC.ij2h(i, j);
        assert_eq!(h, naive_ij2h(i, j));
        assert_eq!((i, j), SMALL_ZOC.h2ij(h));
      }
    }
  }

  #[test]
  fn testok_large() {
    let n = 0xFFFFFFFF_u32;
    for i in (0..n).step_by(14999991) {
      for j in (0..n).step_by(1499991) {
        let h = LARGE_ZOC.ij2h(i, j);
        assert_eq!(h, naive_ij2h(i, j));
        assert_eq!((i, j), LARGE_ZOC.h2ij(h));
        #[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
        assert_eq!(h, LARGE_ZOC_BMI.ij2h(i, j));
      }
    }
  }

  #[test]
  fn testok_small_equals_large() {
    for i in (0..(1_u32 << 16)).step_by(131) {
      let j = (1_u32 << 16) - 1 - i;
      assert_eq!(SMALL_ZOC.ij2h(i, j), LARGE_ZOC.ij2h(i, j));
      assert_eq!(ZOC::from_depth(16).ij2h(i, j), ZOC::from_depth(29).ij2h(i, j));
    }
  }

  #[test]
  fn testok_h2i_h2j() {
    let zoc = ZOC::from_depth(10);
    for (i, j) in [(0, 0), (1, 0), (0, 1), (1023, 5), (512, 1023)] {
      let h = zoc.ij2h(i, j);
      assert_eq!(i, zoc.h2i(h));
      assert_eq!(j, zoc.h2j(h));
    }
  }

  #[test]
  fn testok_depth0() {
    assert_eq!(0, ZOC::from_depth(0).ij2h(0, 0));
    assert_eq!((0, 0), ZOC::from_depth(0).h2ij(0));
  }
}
