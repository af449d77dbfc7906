//! Core of the HEALPix pixelization: equal-area pixels on the sphere, NESTED and RING indexing,
//! conversion between both schemes and neighbours, for 32-bit (`i32`, Nside up to 8192) and
//! 64-bit (`i64`, Nside up to 2^29) pixel indices.
//! See papers:
//! * Gorsky2005: "HEALPix: A Framework for High-Resolution Discretization and Fast Analysis of Data
//!                Distributed on the Sphere", Górski, K. M. et al., 2005; 2005ApJ...622..759G.
//! * Calabretta2007: "Mapping on the HEALPix grid", Calabretta, M. R. et Roukema, B. F., 2007; 2007MNRAS.381..865C
//!
//! Public angles are the colatitude `theta` in `[0, pi]` and the longitude `phi`, in radians.
//! Internally, computations are made in longitude/latitude, `lat = pi/2 - theta`.
//!
//! ```rust
//! use std::f64::consts::FRAC_PI_2;
//! use hpxcore::{ang2pix_nest, ang2pix_ring, nest2ring, npix2nside, nside2npix};
//!
//! assert_eq!(Ok(192_i32), nside2npix(4_i32));
//! assert_eq!(Ok(4_i64), npix2nside(192_i64));
//! assert!(npix2nside(193_i64).is_err());
//!
//! let ring = ang2pix_ring(4_i64, FRAC_PI_2, 0.0).unwrap();
//! let nest = ang2pix_nest(4_i64, FRAC_PI_2, 0.0).unwrap();
//! assert_eq!(Ok(ring), nest2ring(4_i64, nest));
//! ```

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

pub mod compass_point;
pub mod error;
pub mod fits;
/// NESTED scheme, power of 2 Nside only
pub mod nested;
/// RING scheme, any Nside
pub mod ring;
pub mod scheme;
pub mod sph_geom;
pub mod width;

pub use error::HealpixError;
pub use scheme::{
  ang2pix_nest, ang2pix_ring, nest2ring, neighbours_nest, pix2ang_nest, pix2ang_ring,
  pix2vec_nest, pix2vec_ring, ring2nest, vec2pix_nest, vec2pix_ring, Scheme, Sentinel,
};
pub use sph_geom::coo3d::{ang2vec, ang_dist, cross_product, euclidean_dist, vec2ang};
pub use width::PixelIndex;

/// Constant = sqrt(6).
///
/// ```rust
/// use hpxcore::SQRT6;
/// assert_eq!(6_f64.sqrt(), SQRT6);
/// ```
pub const SQRT6: f64 = 2.449_489_742_783_178_f64;
const ONE_OVER_SQRT6: f64 = 0.408_248_290_463_863_f64;
const HALF: f64 = 0.5_f64;

/// Upper limit on sqrt(3(1-|z|)) to consider that we are not near from the poles
const EPS_POLE: f64 = 1e-13_f64;

/// Constant = 2 * pi.
pub const TWICE_PI: f64 = 2.0 * PI;

/// Constant = 4 / pi.
///
/// ```rust
/// use hpxcore::FOUR_OVER_PI;
/// use std::f64::consts::PI;
/// assert_eq!(4f64 / PI, FOUR_OVER_PI);
/// ```
pub const FOUR_OVER_PI: f64 = 4_f64 / PI;

/// Constant = 29, i.e. the largest depth for which a hash (4 bits for the base cell + 2 bits
/// per depth) fits in a signed 64-bit integer.
pub const DEPTH_MAX: u8 = 29;

/// Constant = nside(29), the largest Nside of the wide (`i64`) indices.
///
/// ```rust
/// use hpxcore::{DEPTH_MAX, NSIDE_MAX, nside};
/// assert_eq!(nside(DEPTH_MAX), NSIDE_MAX);
/// ```
pub const NSIDE_MAX: u32 = 536870912;

/// Limit on the latitude (in radians) between the equatorial region and the polar caps.
/// Equals asin(2/3) = 0.7297276562269663 radians ~= 41,81 degrees.
///
/// ```rust
/// use hpxcore::TRANSITION_LATITUDE;
/// assert_eq!(f64::asin(2f64 / 3f64), TRANSITION_LATITUDE);
/// ```
pub const TRANSITION_LATITUDE: f64 = 0.729_727_656_226_966_3_f64; // asin(2/3)
/// Limit on |z|=|sin(lat)| between the equatorial region and the polar caps.
/// Equals 2/3, see Eq. (1) in Gorsky2005.
pub const TRANSITION_Z: f64 = 2_f64 / 3_f64;
/// Equals 1/(2/3) = 1.5.
pub const ONE_OVER_TRANSITION_Z: f64 = 1.5_f64;

const F64_SIGN_BIT_MASK: u64 = 0x8000000000000000;
const F64_BUT_SIGN_BIT_MASK: u64 = 0x7FFFFFFFFFFFFFFF;

////////////////////////////
// Resolution (public API) //
////////////////////////////

/// Returns the number of pixels `12 * nside^2`.
///
/// # Errors
/// `InvalidNside` if `nside` is not in `[1, T::NSIDE_MAX]`.
///
/// ```rust
/// use hpxcore::nside2npix;
///
/// assert_eq!(Ok(12_i32), nside2npix(1_i32));
/// assert_eq!(Ok(805306368_i32), nside2npix(8192_i32));
/// assert!(nside2npix(8193_i32).is_err());
/// assert_eq!(Ok(3458764513820540928_i64), nside2npix(1_i64 << 29));
/// // Any positive nside is valid in the RING scheme
/// assert_eq!(Ok(300_i64), nside2npix(5_i64));
/// ```
pub fn nside2npix<T: PixelIndex>(nside: T) -> Result<T, HealpixError> {
  check_nside(nside)?;
  nside
    .checked_mul(&nside)
    .and_then(|n2| n2.checked_mul(&T::from_u64(12)))
    .ok_or_else(|| HealpixError::InvalidNside {
      nside: nside.as_i64(),
      nside_max: T::NSIDE_MAX as i64,
    })
}

/// Returns the Nside such that `npix = 12 * nside^2`.
///
/// # Errors
/// `InvalidNpix` if `npix / 12` is not a perfect square or if the resulting Nside is larger than
/// `T::NSIDE_MAX`.
///
/// ```rust
/// use hpxcore::npix2nside;
///
/// assert_eq!(Ok(4_i32), npix2nside(192_i32));
/// assert!(npix2nside(193_i32).is_err());
/// assert!(npix2nside(13_i64).is_err());
/// assert!(npix2nside(0_i64).is_err());
/// assert_eq!(Ok(5_i64), npix2nside(300_i64));
/// ```
pub fn npix2nside<T: PixelIndex>(npix: T) -> Result<T, HealpixError> {
  let err = || HealpixError::InvalidNpix(npix.as_i64());
  let twelve = T::from_u64(12);
  if !npix.is_positive() || npix % twelve != T::zero() {
    return Err(err());
  }
  let nside = T::from_u64(isqrt((npix / twelve).to_u64().ok_or_else(err)?));
  if nside > T::nside_max() || nside * nside * twelve != npix {
    Err(err())
  } else {
    Ok(nside)
  }
}

/// Returns `true` if the given value is a strictly positive power of 2.
///
/// ```rust
/// use hpxcore::is_power_of_two;
///
/// assert!(is_power_of_two(1_i32));
/// assert!(is_power_of_two(8192_i32));
/// assert!(!is_power_of_two(0_i32));
/// assert!(!is_power_of_two(-4_i64));
/// assert!(!is_power_of_two(12_i64));
/// ```
pub fn is_power_of_two<T: PixelIndex>(nside: T) -> bool {
  nside.is_positive() && nside.count_ones() == 1
}

/// Checks that Nside is in `[1, T::NSIDE_MAX]` and returns it as a `u32`.
pub(crate) fn check_nside<T: PixelIndex>(nside: T) -> Result<u32, HealpixError> {
  if T::one() <= nside && nside <= T::nside_max() {
    Ok(nside.as_i64() as u32)
  } else {
    Err(HealpixError::InvalidNside {
      nside: nside.as_i64(),
      nside_max: T::NSIDE_MAX as i64,
    })
  }
}

/// Checks that Nside is valid for the NESTED scheme and returns its depth.
pub(crate) fn check_nested_nside<T: PixelIndex>(nside: T) -> Result<u8, HealpixError> {
  let n = check_nside(nside)?;
  if is_nside(n) {
    Ok(depth(n))
  } else {
    Err(HealpixError::NsideNotPowerOfTwo(n as i64))
  }
}

//////////////////////////////////
// Resolution (internal, u32/u8) //
//////////////////////////////////

/// Returns the nside of the given depth, `depth` must be in `[0, 29]`.
///
/// ```rust
/// use hpxcore::nside;
///
/// assert_eq!(1, nside(0));
/// assert_eq!(8192, nside(13));
/// for depth in 0..29 {
///     assert_eq!(2u32.pow(depth), nside(depth as u8));
/// }
/// ```
#[inline]
pub const fn nside(depth: u8) -> u32 {
  debug_assert!(depth <= DEPTH_MAX);
  1_u32 << depth
}

/// Returns the depth of the given power of 2 nside, i.e. `log2(nside)`.
///
/// ```rust
/// use hpxcore::{nside, depth};
///
/// for d in 0..29 {
///     assert_eq!(d, depth(nside(d as u8)));
/// }
/// ```
#[inline]
pub const fn depth(nside: u32) -> u8 {
  nside.trailing_zeros() as u8
}

/// Returns `true` if the given argument is a valid `nside` for the NESTED scheme, i.e.
/// if it is a power of 2, is != 0 and is <= [NSIDE_MAX](constant.NSIDE_MAX.html).
#[inline]
pub const fn is_nside(nside: u32) -> bool {
  nside.is_power_of_two() && nside <= NSIDE_MAX
}

/// Returns the number of cells at the given depth, `12 * nside^2`.
///
/// ```rust
/// use hpxcore::n_hash;
///
/// assert_eq!(12u64, n_hash(0u8));
/// assert_eq!(48u64, n_hash(1u8));
/// assert_eq!(192u64, n_hash(2u8));
/// assert_eq!(3458764513820540928u64, n_hash(29u8));
/// ```
#[inline]
pub const fn n_hash(depth: u8) -> u64 {
  12_u64 << (depth << 1_u8)
}

/// Exact integer square root (floor) of a `u64`.
/// The `f64` estimate is exact up to 2^52, we correct it beyond.
///
/// ```rust
/// use hpxcore::isqrt;
///
/// assert_eq!(0, isqrt(0));
/// assert_eq!(3, isqrt(15));
/// assert_eq!(4, isqrt(16));
/// assert_eq!(4294967295, isqrt(u64::MAX));
/// ```
pub fn isqrt(x: u64) -> u64 {
  let mut r = (x as f64).sqrt() as u64;
  while r.checked_mul(r).map_or(true, |r2| r2 > x) {
    r -= 1;
  }
  while (r + 1).checked_mul(r + 1).is_some_and(|r2| r2 <= x) {
    r += 1;
  }
  r
}

////////////////
// Projection //
////////////////

/// Compute the HEALPix projection of the given point on the unit sphere.
///
/// # Input
/// - `lon` in radians, support reasonably large positive and negative values
/// - `lat` in radians, must be in `[-pi/2, pi/2]`
///
/// # Output
/// - `(x, y)` the projected coordinates, with `x` in `[-8, 8]` (sign of `lon`) and `y` in `[-2, 2]`
///
/// ```rust
/// use hpxcore::{TRANSITION_LATITUDE, proj};
/// use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
///
/// fn dist(p1: (f64, f64), p2: (f64, f64)) -> f64 {
///     f64::sqrt((p2.0 - p1.0) * (p2.0 - p1.0) + (p2.1 - p1.1) * (p2.1 - p1.1))
/// }
/// assert!(dist((0.0, 0.0), proj(0.0, 0.0)) < 1e-15);
/// assert!(dist((0.0, 1.0), proj(0.0, TRANSITION_LATITUDE)) < 1e-15);
/// assert!(dist((1.0, 2.0), proj(FRAC_PI_4, FRAC_PI_2)) < 1e-15);
/// assert!(dist((2.0, 1.0), proj(FRAC_PI_2, TRANSITION_LATITUDE)) < 1e-15);
/// assert!(dist((7.0, -2.0), proj(3.0 * FRAC_PI_2 + FRAC_PI_4, -FRAC_PI_2)) < 1e-15);
/// assert!(dist((-2.0, 1.0), proj(-FRAC_PI_2, TRANSITION_LATITUDE)) < 1e-15);
/// ```
#[inline]
pub fn proj(lon: f64, lat: f64) -> (f64, f64) {
  debug_assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&lat));
  let lon = abs_sign_decompose(lon);
  let lat = abs_sign_decompose(lat);
  let x = pm1_offset_decompose(lon.abs * FOUR_OVER_PI);
  let mut xy = (x.pm1, lat.abs);
  if lat.abs <= TRANSITION_LATITUDE {
    proj_cea(&mut xy);
  } else {
    proj_collignon(&mut xy);
  }
  apply_offset_and_signs(&mut xy, x.offset, lon.sign, lat.sign);
  xy
}

/// Unproject the given HEALPix projected point.
///  - if input `x` in `[-8, 0[`, then output `lon` in `[-2pi, 0]`
///  - if input `x` in `[ 0, 8]`, then output `lon` in `[0, 2pi]`
///  - output `lat` always in `[-pi/2, pi/2]`
///
/// `y` must be in `[-2, 2]`.
///
/// ```rust
/// use hpxcore::{TRANSITION_LATITUDE, proj, unproj};
/// use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
///
/// let points: [(f64, f64); 6] = [
///     (0.0, 0.0),
///     (FRAC_PI_2, TRANSITION_LATITUDE),
///     (FRAC_PI_4, FRAC_PI_2),
///     (3.0 * FRAC_PI_2, -TRANSITION_LATITUDE),
///     (0.3, -0.2),
///     (5.5, 1.2),
/// ];
/// for (lon, lat) in points.iter() {
///     let (x, y): (f64, f64) = proj(*lon, *lat);
///     let (lon2, lat2) = unproj(x, y);
///     assert!((lat2 - lat).abs() < 1e-15);
///     if lat.abs() < FRAC_PI_2 {
///         assert!((lon2 - lon).abs() < 1e-14);
///     }
/// }
/// ```
#[inline]
pub fn unproj(x: f64, y: f64) -> (f64, f64) {
  debug_assert!((-2.0..=2.0).contains(&y));
  let x = abs_sign_decompose(x);
  let y = abs_sign_decompose(y);
  let lon = pm1_offset_decompose(x.abs);
  let mut lonlat = (lon.pm1, y.abs);
  if y.abs <= 1.0 {
    deproj_cea(&mut lonlat);
  } else {
    deproj_collignon(&mut lonlat);
  }
  apply_offset_and_signs(&mut lonlat, lon.offset, x.sign, y.sign);
  lonlat.0 *= FRAC_PI_4;
  lonlat
}

// Absolute value of a double together with its bit of sign
struct AbsAndSign {
  abs: f64,
  sign: u64,
}
#[inline]
fn abs_sign_decompose(x: f64) -> AbsAndSign {
  let bits = f64::to_bits(x);
  AbsAndSign {
    abs: f64::from_bits(bits & F64_BUT_SIGN_BIT_MASK),
    sign: bits & F64_SIGN_BIT_MASK,
  }
}

// Positive real value decomposed in
// - an odd integer offset in [1, 3, 5, 7] (*PI/4) and
// - a real value in [-1.0, 1.0] (*PI/4)
struct OffsetAndPM1 {
  offset: u8,
  pm1: f64,
}
#[inline]
fn pm1_offset_decompose(x: f64) -> OffsetAndPM1 {
  let floor: u8 = x as u8;
  let odd_floor: u8 = floor | 1_u8;
  OffsetAndPM1 {
    offset: odd_floor & 7_u8,
    pm1: x - (odd_floor as f64),
  }
}

// Cylindrical Equal Area projection
#[inline]
fn proj_cea(xy: &mut (f64, f64)) {
  xy.1 = xy.1.sin() * ONE_OVER_TRANSITION_Z;
}
#[inline]
fn deproj_cea(lonlat: &mut (f64, f64)) {
  // |lat * TRANSITION_Z| <= 2/3, so asin is accurate
  lonlat.1 = f64::asin(lonlat.1 * TRANSITION_Z);
}

// Collignon projection
#[inline]
fn proj_collignon(xy: &mut (f64, f64)) {
  let (ref mut x, ref mut y) = *xy;
  *y = SQRT6 * f64::cos(HALF * *y + FRAC_PI_4);
  *x *= *y;
  *y = 2.0 - *y;
}
#[inline]
fn deproj_collignon(lonlat: &mut (f64, f64)) {
  let (ref mut lon, ref mut lat) = *lonlat;
  *lat = 2.0 - *lat;
  if *lat > EPS_POLE {
    *lon = (*lon / *lat).clamp(-1.0, 1.0);
  } // at the pole, lon = lat = 0 (no division by 0)
  *lat *= ONE_OVER_SQRT6;
  // lat < 1/sqrt(6), so acos is accurate
  *lat = 2.0 * f64::acos(*lat) - FRAC_PI_2;
}

// Shift a by the given offset and apply the signs to a and b
#[inline]
fn apply_offset_and_signs(ab: &mut (f64, f64), off: u8, a_sign: u64, b_sign: u64) {
  let (ref mut a, ref mut b) = *ab;
  *a += off as f64;
  *a = f64::from_bits(f64::to_bits(*a) | a_sign);
  *b = f64::from_bits(f64::to_bits(*b) | b_sign);
}

//////////////////////////////
// Base cells neighbourhood //
//////////////////////////////

/// Returns (mod4 - 1) in [0, 2], and 3 if mod4 == 0
#[inline]
const fn prev(mod4: u8) -> u8 {
  (mod4 + 3) & 3
}

/// Returns (mod4 + 1) in [1, 3], and 0 if mod4 == 3
#[inline]
const fn next(mod4: u8) -> u8 {
  (mod4 + 1) & 3
}

/// Returns (mod4 + 2) modulo 4, i.e. the base cell on the other side of the pole
#[inline]
const fn oppo(mod4: u8) -> u8 {
  (mod4 + 2) & 3
}

/// Identity, for legibility
#[inline]
const fn iden(mod4: u8) -> u8 {
  mod4
}

/// Compute the base cell from its (i, j) coordinates:
/// - i: index along the longitude axis ( = base_cell modulo 4)
/// - j: index along the latitude axis ( = base_cell / 4)
///   - = 0 for the cells covering the north polar cap
///   - = 1 for the cells with are only in the equatorial region
///   - = 2 for the cells covering the south polar cap
#[inline]
const fn base_cell(i: u8, j: u8) -> u8 {
  debug_assert!(i < 4 && j < 3);
  (j << 2) + i
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn testok_nside() {
    assert_eq!(1, nside(0));
    assert_eq!(2, nside(1));
    assert_eq!(1024, nside(10));
    assert_eq!(8192, nside(13));
    assert_eq!(536870912, nside(29));
    for d in 0..=DEPTH_MAX {
      assert!(is_nside(nside(d)));
      assert_eq!(n_hash(d), 12 * (nside(d) as u64) * (nside(d) as u64));
    }
    assert!(!is_nside(0));
    assert!(!is_nside(3));
    assert!(!is_nside(1 << 30));
  }

  #[test]
  fn testok_npix_nside_roundtrip() {
    for n in (1_i64..5000).chain([8191, 8192, (1 << 29) - 1, 1 << 29]) {
      let npix = nside2npix(n).unwrap();
      assert_eq!(Ok(n), npix2nside(npix));
      if npix > 12 {
        assert!(npix2nside(npix - 12).map_or(true, |m| m != n));
        assert!(npix2nside(npix + 1).is_err());
      }
    }
  }

  #[test]
  fn testok_npix2nside_concrete() {
    assert_eq!(Ok(192_i32), nside2npix(4_i32));
    assert_eq!(Ok(4_i32), npix2nside(192_i32));
    assert_eq!(Err(HealpixError::InvalidNpix(193)), npix2nside(193_i32));
    assert_eq!(Err(HealpixError::InvalidNpix(13)), npix2nside(13_i64));
    assert_eq!(Err(HealpixError::InvalidNpix(-12)), npix2nside(-12_i64));
    // 12 * 16384^2 fits in an i32 but Nside is above the traditional limit
    assert!(npix2nside(12_i64 * 16384 * 16384).is_ok());
  }

  #[test]
  fn testerr_nside2npix() {
    assert!(nside2npix(0_i32).is_err());
    assert!(nside2npix(-1_i64).is_err());
    assert_eq!(
      Err(HealpixError::InvalidNside { nside: 8193, nside_max: 8192 }),
      nside2npix(8193_i32)
    );
    assert!(nside2npix((1_i64 << 29) + 1).is_err());
  }

  #[test]
  fn testok_check_nested_nside() {
    assert_eq!(Ok(0), check_nested_nside(1_i32));
    assert_eq!(Ok(13), check_nested_nside(8192_i32));
    assert_eq!(Ok(29), check_nested_nside(1_i64 << 29));
    assert_eq!(Err(HealpixError::NsideNotPowerOfTwo(12)), check_nested_nside(12_i64));
    assert!(check_nested_nside(0_i64).unwrap_err().is_invalid_resolution());
  }

  #[test]
  fn testok_isqrt() {
    for x in 0_u64..10_000 {
      let r = isqrt(x);
      assert!(r * r <= x && (r + 1) * (r + 1) > x);
    }
    for r in [(1_u64 << 26) + 1, (1 << 31) - 1, 3037000499, (1 << 32) - 1] {
      let sq = r * r;
      assert_eq!(r, isqrt(sq));
      assert_eq!(r - 1, isqrt(sq - 1));
      if r < (1 << 32) - 1 {
        assert_eq!(r, isqrt(sq + 1));
      }
    }
  }

  #[test]
  fn testok_proj_unproj() {
    fn dist(p1: (f64, f64), p2: (f64, f64)) -> f64 {
      f64::sqrt((p2.0 - p1.0) * (p2.0 - p1.0) + (p2.1 - p1.1) * (p2.1 - p1.1))
    }
    assert!(dist((0.0, 0.0), proj(0.0, 0.0)) < 1e-15);
    assert!(dist((3.0, 2.0), proj(FRAC_PI_2 + FRAC_PI_4, FRAC_PI_2)) < 1e-15);
    assert!(dist((4.0, -1.0), proj(PI, -TRANSITION_LATITUDE)) < 1e-15);
    assert!(dist((-5.0, 2.0), proj(-PI - FRAC_PI_4, FRAC_PI_2)) < 1e-15);
    for lon in (0..36).map(|d| (d as f64 * 10.0).to_radians()) {
      for lat in (-17..=17).map(|d| (d as f64 * 5.0).to_radians()) {
        let (x, y) = proj(lon, lat);
        let (lon2, lat2) = unproj(x, y);
        assert!((lon - lon2).abs() < 1e-14, "{} != {}", lon, lon2);
        assert!((lat - lat2).abs() < 1e-14, "{} != {}", lat, lat2);
      }
    }
  }

  #[test]
  fn testok_mod4() {
    assert_eq!([3, 0, 1, 2], [0, 1, 2, 3].map(prev));
    assert_eq!([1, 2, 3, 0], [0, 1, 2, 3].map(next));
    assert_eq!([2, 3, 0, 1], [0, 1, 2, 3].map(oppo));
    assert_eq!(9, base_cell(iden(1), 2));
  }
}
