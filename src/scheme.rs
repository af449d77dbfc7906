//! Checked public API, generic over the width of the pixel indices (see [PixelIndex]).
//!
//! Every function validates its inputs (Nside, pixel index, angles or vector) before calling the
//! unchecked [nested](../nested/index.html) and [ring](../ring/index.html) internals, and returns
//! a [HealpixError] on invalid input.
//! Angles are the colatitude `theta` in `[0, pi]` and the longitude `phi`, in radians.
//! A finite `phi` outside `[0, 2pi[` is folded into that range.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use log::trace;
use thiserror::Error;

use super::sph_geom::coo3d::{vec3_of, Vec3};
use super::{check_nested_nside, check_nside, nested, ring, HealpixError, PixelIndex, TWICE_PI};

/// Ordering scheme of the pixel indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
  /// Iso-latitude rings, from north to south. Any Nside.
  Ring,
  /// Hierarchical z-order inside each base cell. Power of 2 Nside only.
  Nested,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown ordering scheme. Expected: 'RING' or 'NESTED'. Actual: '{0}'.")]
pub struct ParseSchemeError(pub String);

impl FromStr for Scheme {
  type Err = ParseSchemeError;

  /// Case insensitive, accepts the FITS `ORDERING` values `RING` and `NESTED` (or `NEST`).
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "RING" => Ok(Scheme::Ring),
      "NESTED" | "NEST" => Ok(Scheme::Nested),
      _ => Err(ParseSchemeError(s.to_string())),
    }
  }
}

impl Display for Scheme {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Scheme::Ring => "RING",
      Scheme::Nested => "NESTED",
    })
  }
}

impl Scheme {
  /// Checks that the given Nside is valid for this scheme.
  ///
  /// ```rust
  /// use hpxcore::{HealpixError, Scheme};
  ///
  /// assert_eq!(Ok(()), Scheme::Ring.validate(3_i32));
  /// assert_eq!(Err(HealpixError::NsideNotPowerOfTwo(3)), Scheme::Nested.validate(3_i32));
  /// assert!(Scheme::Ring.validate(0_i64).is_err());
  /// ```
  pub fn validate<T: PixelIndex>(&self, nside: T) -> Result<(), HealpixError> {
    match self {
      Scheme::Ring => check_nside(nside).map(|_| ()),
      Scheme::Nested => check_nested_nside(nside).map(|_| ()),
    }
  }

  pub fn ang2pix<T: PixelIndex>(&self, nside: T, theta: f64, phi: f64) -> Result<T, HealpixError> {
    match self {
      Scheme::Ring => ang2pix_ring(nside, theta, phi),
      Scheme::Nested => ang2pix_nest(nside, theta, phi),
    }
  }

  pub fn pix2ang<T: PixelIndex>(&self, nside: T, ipix: T) -> Result<(f64, f64), HealpixError> {
    match self {
      Scheme::Ring => pix2ang_ring(nside, ipix),
      Scheme::Nested => pix2ang_nest(nside, ipix),
    }
  }

  pub fn vec2pix<T: PixelIndex, V: Vec3>(&self, nside: T, v: &V) -> Result<T, HealpixError> {
    match self {
      Scheme::Ring => vec2pix_ring(nside, v),
      Scheme::Nested => vec2pix_nest(nside, v),
    }
  }

  pub fn pix2vec<T: PixelIndex>(&self, nside: T, ipix: T) -> Result<[f64; 3], HealpixError> {
    match self {
      Scheme::Ring => pix2vec_ring(nside, ipix),
      Scheme::Nested => pix2vec_nest(nside, ipix),
    }
  }

  /// Index, in the `target` scheme, of the pixel of index `ipix` in this scheme.
  ///
  /// ```rust
  /// use hpxcore::Scheme;
  ///
  /// assert_eq!(Ok(13_i32), Scheme::Nested.convert(Scheme::Ring, 2, 0));
  /// assert_eq!(Ok(0_i32), Scheme::Ring.convert(Scheme::Nested, 2, 13));
  /// assert_eq!(Ok(13_i32), Scheme::Ring.convert(Scheme::Ring, 2, 13));
  /// ```
  pub fn convert<T: PixelIndex>(&self, target: Scheme, nside: T, ipix: T) -> Result<T, HealpixError> {
    match (self, target) {
      (Scheme::Ring, Scheme::Nested) => ring2nest(nside, ipix),
      (Scheme::Nested, Scheme::Ring) => nest2ring(nside, ipix),
      (_, _) => {
        target.validate(nside)?;
        check_ipix(ipix, n_hash_of(nside)?)?;
        Ok(ipix)
      }
    }
  }
}

/// Converts a `Result` of the public API into the in-band convention: the value on success,
/// `-1` (for each slot in the case of neighbours) on error.
///
/// ```rust
/// use hpxcore::{npix2nside, ring2nest, Sentinel};
///
/// assert_eq!(-1, npix2nside(193_i32).or_sentinel());
/// assert_eq!(4, npix2nside(192_i32).or_sentinel());
/// assert_eq!(-1_i64, ring2nest(4, 192).or_sentinel());
/// ```
pub trait Sentinel<T> {
  fn or_sentinel(self) -> T;
}

macro_rules! impl_sentinel {
  ($t:ty) => {
    impl Sentinel<$t> for Result<$t, HealpixError> {
      fn or_sentinel(self) -> $t {
        self.unwrap_or(<$t as PixelIndex>::SENTINEL)
      }
    }

    impl Sentinel<[$t; 8]> for Result<[$t; 8], HealpixError> {
      fn or_sentinel(self) -> [$t; 8] {
        self.unwrap_or([<$t as PixelIndex>::SENTINEL; 8])
      }
    }
  };
}

impl_sentinel!(i32);
impl_sentinel!(i64);

/// Pixel containing the given direction, RING scheme.
///
/// ```rust
/// use hpxcore::ang2pix_ring;
/// use std::f64::consts::{FRAC_PI_2, PI};
///
/// assert_eq!(Ok(4_i32), ang2pix_ring(1, FRAC_PI_2, 0.0));
/// assert_eq!(Ok(0_i32), ang2pix_ring(5, 0.0, 0.0));
/// assert_eq!(Ok(299_i64), ang2pix_ring(5, PI, 6.2));
/// ```
pub fn ang2pix_ring<T: PixelIndex>(nside: T, theta: f64, phi: f64) -> Result<T, HealpixError> {
  trace!("ang2pix_ring. nside: {}; theta: {}; phi: {}", nside, theta, phi);
  let nside = check_nside(nside)?;
  let (lon, lat) = lonlat_from_ang(theta, phi)?;
  Ok(T::from_u64(ring::hash(nside, lon, lat)))
}

/// Pixel containing the given direction, NESTED scheme.
///
/// ```rust
/// use hpxcore::{ang2pix_nest, HealpixError};
/// use std::f64::consts::{FRAC_PI_2, PI};
///
/// assert_eq!(Ok(4_i32), ang2pix_nest(1, FRAC_PI_2, 0.0));
/// assert_eq!(Ok(5_i32), ang2pix_nest(1, FRAC_PI_2, FRAC_PI_2));
/// assert_eq!(Ok(6_i32), ang2pix_nest(1, FRAC_PI_2, PI));
/// assert_eq!(Ok(7_i32), ang2pix_nest(1, FRAC_PI_2, 1.5 * PI));
/// assert_eq!(Err(HealpixError::NsideNotPowerOfTwo(5)), ang2pix_nest(5_i64, 0.0, 0.0));
/// ```
pub fn ang2pix_nest<T: PixelIndex>(nside: T, theta: f64, phi: f64) -> Result<T, HealpixError> {
  trace!("ang2pix_nest. nside: {}; theta: {}; phi: {}", nside, theta, phi);
  let depth = check_nested_nside(nside)?;
  let (lon, lat) = lonlat_from_ang(theta, phi)?;
  Ok(T::from_u64(nested::get(depth).hash(lon, lat)))
}

/// Colatitude and longitude of the center of the given pixel, RING scheme.
pub fn pix2ang_ring<T: PixelIndex>(nside: T, ipix: T) -> Result<(f64, f64), HealpixError> {
  trace!("pix2ang_ring. nside: {}; ipix: {}", nside, ipix);
  let nside = check_nside(nside)?;
  let hash = check_ipix(ipix, ring::n_hash(nside))?;
  let (lon, lat) = ring::center(nside, hash);
  Ok((FRAC_PI_2 - lat, lon))
}

/// Colatitude and longitude of the center of the given pixel, NESTED scheme.
///
/// ```rust
/// use hpxcore::pix2ang_nest;
/// use std::f64::consts::{FRAC_PI_2, PI};
///
/// let (theta, phi) = pix2ang_nest(1_i32, 6).unwrap();
/// assert!((theta - FRAC_PI_2).abs() < 1e-15);
/// assert!((phi - PI).abs() < 1e-15);
/// assert!(pix2ang_nest(1_i32, 12).is_err());
/// ```
pub fn pix2ang_nest<T: PixelIndex>(nside: T, ipix: T) -> Result<(f64, f64), HealpixError> {
  trace!("pix2ang_nest. nside: {}; ipix: {}", nside, ipix);
  let layer = nested::get(check_nested_nside(nside)?);
  let hash = check_ipix(ipix, layer.n_hash())?;
  let (lon, lat) = layer.center(hash);
  Ok((FRAC_PI_2 - lat, lon))
}

/// Pixel containing the given direction, RING scheme. The vector need not be normalized.
pub fn vec2pix_ring<T: PixelIndex, V: Vec3>(nside: T, v: &V) -> Result<T, HealpixError> {
  trace!("vec2pix_ring. nside: {}; v: ({}, {}, {})", nside, v.x(), v.y(), v.z());
  let nside = check_nside(nside)?;
  let (lon, lat) = lonlat_from_vec(v)?;
  Ok(T::from_u64(ring::hash(nside, lon, lat)))
}

/// Pixel containing the given direction, NESTED scheme. The vector need not be normalized.
///
/// ```rust
/// use hpxcore::{vec2pix_nest, HealpixError};
///
/// assert_eq!(Ok(4_i32), vec2pix_nest(1, &[2.0, 0.0, 0.0]));
/// assert_eq!(Err(HealpixError::InvalidVector), vec2pix_nest(1_i32, &[0.0, 0.0, 0.0]));
/// ```
pub fn vec2pix_nest<T: PixelIndex, V: Vec3>(nside: T, v: &V) -> Result<T, HealpixError> {
  trace!("vec2pix_nest. nside: {}; v: ({}, {}, {})", nside, v.x(), v.y(), v.z());
  let depth = check_nested_nside(nside)?;
  let (lon, lat) = lonlat_from_vec(v)?;
  Ok(T::from_u64(nested::get(depth).hash(lon, lat)))
}

/// Unit vector pointing to the center of the given pixel, RING scheme.
pub fn pix2vec_ring<T: PixelIndex>(nside: T, ipix: T) -> Result<[f64; 3], HealpixError> {
  trace!("pix2vec_ring. nside: {}; ipix: {}", nside, ipix);
  let nside = check_nside(nside)?;
  let hash = check_ipix(ipix, ring::n_hash(nside))?;
  let (lon, lat) = ring::center(nside, hash);
  Ok(vec3_of(lon, lat).to_array())
}

/// Unit vector pointing to the center of the given pixel, NESTED scheme.
pub fn pix2vec_nest<T: PixelIndex>(nside: T, ipix: T) -> Result<[f64; 3], HealpixError> {
  trace!("pix2vec_nest. nside: {}; ipix: {}", nside, ipix);
  let layer = nested::get(check_nested_nside(nside)?);
  let hash = check_ipix(ipix, layer.n_hash())?;
  let (lon, lat) = layer.center(hash);
  Ok(vec3_of(lon, lat).to_array())
}

/// Converts a RING index into a NESTED index. Pure integer algebra.
///
/// ```rust
/// use hpxcore::{ring2nest, HealpixError};
///
/// assert_eq!(Ok(0_i32), ring2nest(2, 13));
/// assert_eq!(Ok(16_i64), ring2nest(2, 28));
/// assert_eq!(Err(HealpixError::InvalidIndex { ipix: 48, npix: 48 }), ring2nest(2_i32, 48));
/// ```
pub fn ring2nest<T: PixelIndex>(nside: T, ipix: T) -> Result<T, HealpixError> {
  trace!("ring2nest. nside: {}; ipix: {}", nside, ipix);
  let layer = nested::get(check_nested_nside(nside)?);
  let hash = check_ipix(ipix, layer.n_hash())?;
  Ok(T::from_u64(layer.from_ring(hash)))
}

/// Converts a NESTED index into a RING index. Pure integer algebra.
///
/// ```rust
/// use hpxcore::nest2ring;
///
/// assert_eq!(Ok(13_i32), nest2ring(2, 0));
/// assert_eq!(Ok(35_i64), nest2ring(2, 47));
/// assert!(nest2ring(2_i32, -1).is_err());
/// ```
pub fn nest2ring<T: PixelIndex>(nside: T, ipix: T) -> Result<T, HealpixError> {
  trace!("nest2ring. nside: {}; ipix: {}", nside, ipix);
  let layer = nested::get(check_nested_nside(nside)?);
  let hash = check_ipix(ipix, layer.n_hash())?;
  Ok(T::from_u64(layer.to_ring(hash)))
}

/// The 8 neighbours of the given NESTED pixel, in the order `S, SE, E, SW, NE, W, NW, N`
/// (see [MainWind::NEIGHBOURS](../compass_point/enum.MainWind.html#associatedconstant.NEIGHBOURS)).
/// A missing neighbour is set to `-1`: for `nside > 1`, 24 pixels have only 7 neighbours,
/// for `nside = 1` each base cell has 6 neighbours.
///
/// ```rust
/// use hpxcore::neighbours_nest;
///
/// //   S  SE   E  SW  NE   W  NW   N
/// assert_eq!(Ok([8, 5, -1, 4, 1, -1, 3, 2]), neighbours_nest(1_i32, 0));
/// assert_eq!(Ok([0, 1, 4, 2, 6, 8, 9, 12]), neighbours_nest(4_i64, 3));
/// ```
pub fn neighbours_nest<T: PixelIndex>(nside: T, ipix: T) -> Result<[T; 8], HealpixError> {
  trace!("neighbours_nest. nside: {}; ipix: {}", nside, ipix);
  let layer = nested::get(check_nested_nside(nside)?);
  let hash = check_ipix(ipix, layer.n_hash())?;
  Ok(
    layer
      .neighbours(hash, false)
      .neighbours()
      .map(|n| n.map_or(T::SENTINEL, T::from_u64)),
  )
}

fn n_hash_of<T: PixelIndex>(nside: T) -> Result<u64, HealpixError> {
  check_nside(nside).map(ring::n_hash)
}

fn check_ipix<T: PixelIndex>(ipix: T, n_hash: u64) -> Result<u64, HealpixError> {
  ipix.to_hash(n_hash).ok_or(HealpixError::InvalidIndex {
    ipix: ipix.as_i64(),
    npix: n_hash as i64,
  })
}

/// Converts `(theta, phi)` into `(lon, lat)`, `lon` folded in `[0, 2pi[`.
fn lonlat_from_ang(theta: f64, phi: f64) -> Result<(f64, f64), HealpixError> {
  if !(0.0..=PI).contains(&theta) {
    return Err(HealpixError::InvalidColatitude(theta));
  }
  if !phi.is_finite() {
    return Err(HealpixError::InvalidLongitude(phi));
  }
  let mut lon = phi.rem_euclid(TWICE_PI);
  // rem_euclid may round up to 2pi for tiny negative values
  if lon >= TWICE_PI {
    lon = 0.0;
  }
  Ok((lon, FRAC_PI_2 - theta))
}

fn lonlat_from_vec<V: Vec3>(v: &V) -> Result<(f64, f64), HealpixError> {
  let (x, y, z) = (v.x(), v.y(), v.z());
  if x.is_finite() && y.is_finite() && z.is_finite() && (x != 0.0 || y != 0.0 || z != 0.0) {
    Ok(v.lonlat())
  } else {
    Err(HealpixError::InvalidVector)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::nested::HashParts;
  use crate::{ang_dist, nside2npix};

  use rand::rngs::StdRng;
  use rand::{Rng, SeedableRng};

  fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
  }

  #[test]
  fn testok_ang2pix_depth0() {
    init_logger();
    for (k, phi) in [0.0, FRAC_PI_2, PI, 1.5 * PI].into_iter().enumerate() {
      let expected = 4 + k as i32;
      assert_eq!(Ok(expected), ang2pix_nest(1, FRAC_PI_2, phi));
      assert_eq!(Ok(expected), ang2pix_ring(1, FRAC_PI_2, phi));
    }
  }

  #[test]
  fn testok_ring_and_nest_same_equatorial_pixel() {
    let ring: i32 = ang2pix_ring(4, FRAC_PI_2, 0.0).unwrap();
    let nest: i32 = ang2pix_nest(4, FRAC_PI_2, 0.0).unwrap();
    assert_eq!(Ok(nest), ring2nest(4, ring));
    assert_eq!(Ok(ring), nest2ring(4, nest));
  }

  #[test]
  fn testok_nest2ring_known_values() {
    for (nest, ring) in [(0, 13), (1, 5), (2, 4), (3, 0), (47, 35)] {
      assert_eq!(Ok(ring), nest2ring(2_i32, nest));
    }
    for (nest, ring) in [
      (47, 2),
      (29, 7),
      (60, 22),
      (51, 54),
      (88, 107),
      (174, 129),
      (177, 187),
      (153, 157),
      (144, 189),
    ] {
      assert_eq!(Ok(ring), nest2ring(4_i64, nest));
      assert_eq!(Ok(nest), ring2nest(4_i64, ring));
    }
  }

  #[test]
  fn testok_pixel_center_roundtrip() {
    for depth in 0..=5 {
      let nside = 1_i32 << depth;
      let npix = nside2npix(nside).unwrap();
      for p in 0..npix {
        for scheme in [Scheme::Ring, Scheme::Nested] {
          let (theta, phi) = scheme.pix2ang(nside, p).unwrap();
          assert_eq!(Ok(p), scheme.ang2pix(nside, theta, phi), "{} nside: {}", scheme, nside);
          let v = scheme.pix2vec(nside, p).unwrap();
          assert!((v.norm() - 1.0).abs() < 1e-15);
          assert_eq!(Ok(p), scheme.vec2pix(nside, &v));
          // Unnormalized vector
          let v3 = [3.0 * v[0], 3.0 * v[1], 3.0 * v[2]];
          assert_eq!(Ok(p), scheme.vec2pix(nside, &v3));
        }
      }
    }
  }

  #[test]
  fn testok_ring_any_nside_roundtrip() {
    for nside in [3_i64, 5, 6, 7, 10, 13] {
      for p in 0..nside2npix(nside).unwrap() {
        let (theta, phi) = pix2ang_ring(nside, p).unwrap();
        assert_eq!(Ok(p), ang2pix_ring(nside, theta, phi), "nside: {}", nside);
        let v = pix2vec_ring(nside, p).unwrap();
        assert_eq!(Ok(p), vec2pix_ring(nside, &v));
      }
    }
  }

  #[test]
  fn testok_converter_bijection() {
    for depth in 0..=6 {
      let nside = 1_i32 << depth;
      let npix = nside2npix(nside).unwrap();
      let mut seen = vec![false; npix as usize];
      for p in 0..npix {
        let n = ring2nest(nside, p).unwrap();
        assert!(!seen[n as usize]);
        seen[n as usize] = true;
        assert_eq!(Ok(p), nest2ring(nside, n));
        assert_eq!(Ok(p), ring2nest(nside, nest2ring(nside, p).unwrap()));
        // Same result going through the face decomposition
        let HashParts { d0h, i, j } = ring::decode_hash(nside as u32, p as u64);
        assert_eq!(n as u64, nested::get(depth).build_hash_from_parts(d0h, i, j));
      }
    }
  }

  #[test]
  fn testok_ring_and_nest_agree_on_centers() {
    for depth in 0..=5 {
      let nside = 1_i32 << depth;
      for p in 0..nside2npix(nside).unwrap() {
        let (theta, phi) = pix2ang_nest(nside, p).unwrap();
        let r = ang2pix_ring(nside, theta, phi).unwrap();
        assert_eq!(Ok(p), ring2nest(nside, r));
      }
    }
  }

  #[test]
  fn testok_widths_agree() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10_000 {
      let theta = (2.0 * rng.gen::<f64>() - 1.0).acos();
      let phi = TWICE_PI * rng.gen::<f64>();
      let n32: i32 = ang2pix_nest(8192, theta, phi).unwrap();
      let n64: i64 = ang2pix_nest(8192, theta, phi).unwrap();
      assert_eq!(n32 as i64, n64);
      let r32: i32 = ang2pix_ring(8192, theta, phi).unwrap();
      let r64: i64 = ang2pix_ring(8192, theta, phi).unwrap();
      assert_eq!(r32 as i64, r64);
      assert_eq!(Ok(n32), ring2nest(8192, r32));
    }
  }

  #[test]
  fn testok_wide_nside() {
    let mut rng = StdRng::seed_from_u64(7);
    let nside = 1_i64 << 29;
    let npix = nside2npix(nside).unwrap();
    // Pixel size ~ 0.4 mas
    let pix_size = (4.0 * PI / npix as f64).sqrt();
    for _ in 0..10_000 {
      let theta = (2.0 * rng.gen::<f64>() - 1.0).acos();
      let phi = TWICE_PI * rng.gen::<f64>();
      for scheme in [Scheme::Ring, Scheme::Nested] {
        let p = scheme.ang2pix(nside, theta, phi).unwrap();
        assert!((0..npix).contains(&p));
        let (theta_c, phi_c) = scheme.pix2ang(nside, p).unwrap();
        let d = ang_dist(&crate::ang2vec(theta, phi), &crate::ang2vec(theta_c, phi_c));
        assert!(d < 3.0 * pix_size, "{} d: {}", scheme, d);
      }
      let p = rng.gen_range(0..npix);
      assert_eq!(Ok(p), ring2nest(nside, nest2ring(nside, p).unwrap()));
    }
    // Non power of 2, ring only
    let nside = (1_i64 << 29) - 1;
    for p in [0, 1, 12345678901, nside2npix(nside).unwrap() - 1] {
      let (theta, phi) = pix2ang_ring(nside, p).unwrap();
      assert_eq!(Ok(p), ang2pix_ring(nside, theta, phi));
    }
  }

  #[test]
  fn testok_phi_folding() {
    for phi in [0.1, 1.0, 3.0, 6.0] {
      let expected: i32 = ang2pix_nest(16, 1.0, phi).unwrap();
      assert_eq!(Ok(expected), ang2pix_nest(16, 1.0, phi + TWICE_PI));
      assert_eq!(Ok(expected), ang2pix_nest(16, 1.0, phi - TWICE_PI));
      assert_eq!(Ok(expected), ang2pix_nest(16, 1.0, phi + 100.0 * TWICE_PI));
    }
    assert_eq!(ang2pix_ring(16_i32, 1.0, 0.0), ang2pix_ring(16_i32, 1.0, -1e-300));
  }

  #[test]
  fn testok_poles() {
    assert_eq!(Ok(3_i32), ang2pix_nest(2, 0.0, 0.0));
    assert_eq!(Ok(0_i32), ang2pix_ring(2, 0.0, 0.0));
    assert_eq!(Ok(32_i32), ang2pix_nest(2, PI, 0.0));
    assert_eq!(Ok(44_i32), ang2pix_ring(2, PI, 0.0));
  }

  #[test]
  fn testok_neighbours_count() {
    for depth in 0..=5 {
      let nside = 1_i32 << depth;
      let mut n_with_7 = 0;
      for p in 0..nside2npix(nside).unwrap() {
        let neigs = neighbours_nest(nside, p).unwrap();
        let n = neigs.iter().filter(|&&n| n != -1).count();
        if depth == 0 {
          assert_eq!(6, n);
        } else {
          assert!(n == 7 || n == 8, "nside: {}, ipix: {}", nside, p);
          if n == 7 {
            n_with_7 += 1;
          }
        }
        assert!(neigs.iter().all(|&n| n >= -1 && n < nside2npix(nside).unwrap() && n != p));
      }
      if depth > 0 {
        assert_eq!(24, n_with_7);
      }
    }
  }

  #[test]
  fn testok_neighbours_are_close() {
    let nside = 64_i64;
    let pix_size = (4.0 * PI / nside2npix(nside).unwrap() as f64).sqrt();
    for p in (0..nside2npix(nside).unwrap()).step_by(37) {
      let c = pix2vec_nest(nside, p).unwrap();
      for n in neighbours_nest(nside, p).unwrap() {
        if n != -1 {
          let d = ang_dist(&c, &pix2vec_nest(nside, n).unwrap());
          assert!(d < 3.0 * pix_size, "ipix: {}, neighbour: {}, d: {}", p, n, d);
        }
      }
    }
  }

  #[test]
  fn testok_monte_carlo_equal_area() {
    let mut rng = StdRng::seed_from_u64(1234);
    let nside = 2_i32;
    let npix = nside2npix(nside).unwrap() as usize;
    let n_per_pix = 10_000;
    let mut counts_nest = vec![0_u32; npix];
    let mut counts_ring = vec![0_u32; npix];
    for _ in 0..(n_per_pix * npix) {
      // Uniform on the sphere: z uniform in [-1, 1]
      let theta = (2.0 * rng.gen::<f64>() - 1.0).acos();
      let phi = TWICE_PI * rng.gen::<f64>();
      counts_nest[ang2pix_nest(nside, theta, phi).unwrap() as usize] += 1;
      counts_ring[ang2pix_ring(nside, theta, phi).unwrap() as usize] += 1;
    }
    // Binomial std dev ~ sqrt(10_000) = 100, check at 6 sigma
    for counts in [counts_nest, counts_ring] {
      for c in counts {
        assert!((c as i64 - n_per_pix as i64).abs() < 600, "count: {}", c);
      }
    }
  }

  #[test]
  fn testok_or_sentinel() {
    assert_eq!(-1, ring2nest(4_i32, 192).or_sentinel());
    assert_eq!(-1, nest2ring(3_i64, 0).or_sentinel());
    assert_eq!([-1_i32; 8], neighbours_nest(3, 0).or_sentinel());
    assert_eq!(13, nest2ring(2_i32, 0).or_sentinel());
  }

  #[test]
  fn testok_scheme_parse() {
    assert_eq!(Ok(Scheme::Ring), "RING".parse());
    assert_eq!(Ok(Scheme::Ring), " ring ".parse());
    assert_eq!(Ok(Scheme::Nested), "NESTED".parse());
    assert_eq!(Ok(Scheme::Nested), "nest".parse());
    assert!("NESTED2".parse::<Scheme>().is_err());
    assert_eq!("RING", Scheme::Ring.to_string());
    assert_eq!("NESTED", Scheme::Nested.to_string());
  }

  #[test]
  fn testerr_nside() {
    assert_eq!(
      Err(HealpixError::InvalidNside { nside: 8193, nside_max: 8192 }),
      ang2pix_ring(8193_i32, 0.0, 0.0)
    );
    assert!(ang2pix_ring(8193_i64, 0.0, 0.0).is_ok());
    assert!(ang2pix_ring(0_i64, 0.0, 0.0).unwrap_err().is_invalid_resolution());
    assert!(pix2ang_ring(-4_i32, 0).unwrap_err().is_invalid_resolution());
    assert_eq!(Err(HealpixError::NsideNotPowerOfTwo(6)), pix2ang_nest(6_i32, 0));
    assert_eq!(Err(HealpixError::NsideNotPowerOfTwo(6)), ring2nest(6_i32, 0));
    assert_eq!(Err(HealpixError::NsideNotPowerOfTwo(6)), neighbours_nest(6_i32, 0));
    assert!(ang2pix_nest((1_i64 << 29) + 1, 0.0, 0.0).is_err());
    assert!(ang2pix_nest(1_i64 << 30, 0.0, 0.0).is_err());
  }

  #[test]
  fn testerr_ipix() {
    assert_eq!(
      Err(HealpixError::InvalidIndex { ipix: -1, npix: 192 }),
      pix2ang_ring(4_i32, -1)
    );
    assert_eq!(
      Err(HealpixError::InvalidIndex { ipix: 192, npix: 192 }),
      pix2vec_nest(4_i64, 192)
    );
    assert!(neighbours_nest(4_i32, 192).is_err());
    assert!(Scheme::Ring.convert(Scheme::Ring, 4_i32, 192).is_err());
  }

  #[test]
  fn testerr_angles() {
    assert_eq!(Err(HealpixError::InvalidColatitude(-0.1)), ang2pix_ring(4_i32, -0.1, 0.0));
    assert_eq!(Err(HealpixError::InvalidColatitude(3.2)), ang2pix_nest(4_i32, 3.2, 0.0));
    assert!(matches!(
      ang2pix_nest(4_i32, f64::NAN, 0.0),
      Err(HealpixError::InvalidColatitude(_))
    ));
    assert!(matches!(
      ang2pix_ring(4_i64, 1.0, f64::INFINITY),
      Err(HealpixError::InvalidLongitude(_))
    ));
  }

  #[test]
  fn testerr_vector() {
    assert_eq!(Err(HealpixError::InvalidVector), vec2pix_ring(4_i32, &[0.0, 0.0, 0.0]));
    assert_eq!(Err(HealpixError::InvalidVector), vec2pix_nest(4_i32, &[f64::NAN, 1.0, 0.0]));
    assert_eq!(Err(HealpixError::InvalidVector), vec2pix_nest(4_i64, &[1.0, f64::INFINITY, 0.0]));
  }
}
