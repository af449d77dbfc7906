//! The RING scheme: cells are numbered along isolatitude rings, from the north pole to the south
//! pole, and from `lon = 0` eastward inside a ring.
//!
//! Contrary to the NESTED scheme, `nside` here is not necessarily a power of 2.
//! The smallest possible value is `1`, the largest [NSIDE_MAX](../constant.NSIDE_MAX.html).
//!
//! Both schemes share the same decomposition of the sphere in 12 base cells of `nside x nside`
//! cells, so a RING hash is computed from the base cell and the `(i, j)` coordinates inside it.

use super::nested::{HashParts, Layer};
use super::{isqrt, unproj};

/// Returns the number of isolatitude in the whole sphere at the given `nside`,
/// i.e. the number of small circles parallel to the equator containing HEALPix cell centers.
///
/// # Output
/// -  $4 * nside - 1$: $2 * nside - 1$ ring for the NPC cell, $2 * nside - 1$ for the SPC cell
/// $+1$ for the equator.
///
/// # Example
/// ```rust
/// use hpxcore::ring::n_isolatitude_rings;
///
/// assert_eq!(n_isolatitude_rings(1),  3);
/// assert_eq!(n_isolatitude_rings(2),  7);
/// assert_eq!(n_isolatitude_rings(3), 11);
/// assert_eq!(n_isolatitude_rings(4), 15);
/// assert_eq!(n_isolatitude_rings(5), 19);
/// assert_eq!(n_isolatitude_rings(6), 23);
/// ```
pub const fn n_isolatitude_rings(nside: u32) -> u32 {
  (nside << 2) - 1
}

/// Number of cells at the given `nside`, i.e. `12 * nside^2`.
#[inline]
pub const fn n_hash(nside: u32) -> u64 {
  let n = nside as u64;
  12 * n * n
}

/// Index of the first cell which is fully in the Equatorial Region,
/// i.e. number of cells in the 4 polar cap triangles,
/// i.e. four time the $nside^{\mathrm{th}}$ [triangular number](https://en.wikipedia.org/wiki/Triangular_number).
/// ```math
/// 4 * \sum_{i=1}^{nside} i = 4 * \frac{nside (nside + 1)}{2} = 2 nside (nside + 1)
/// ```
///
/// # Example
/// ```rust
/// use hpxcore::ring::first_hash_in_eqr;
///
/// assert_eq!(first_hash_in_eqr(1),  4);
/// assert_eq!(first_hash_in_eqr(2), 12);
/// assert_eq!(first_hash_in_eqr(3), 24);
/// assert_eq!(first_hash_in_eqr(4), 40);
/// assert_eq!(first_hash_in_eqr(5), 60);
/// assert_eq!(first_hash_in_eqr(8), 144);
/// ```
#[inline]
pub const fn first_hash_in_eqr(nside: u32) -> u64 {
  triangular_number_x4(nside as u64)
}

/// Index of the first cell on the North polar cap / Equatorial Region transition latitude.
/// I.e. number of cells in the 4 polar cap triangles of side = nside - 1,
/// ```math
/// 4 * \sum_{i=1}^{nside - 1} i = 2 nside (nside - 1)
/// ```
///
/// # Example
/// ```rust
/// use hpxcore::ring::first_hash_on_npc_eqr_transition;
///
/// assert_eq!(first_hash_on_npc_eqr_transition(1),  0);
/// assert_eq!(first_hash_on_npc_eqr_transition(2),  4);
/// assert_eq!(first_hash_on_npc_eqr_transition(3), 12);
/// assert_eq!(first_hash_on_npc_eqr_transition(4), 24);
/// assert_eq!(first_hash_on_npc_eqr_transition(9), 144);
/// ```
#[inline]
pub const fn first_hash_on_npc_eqr_transition(nside: u32) -> u64 {
  triangular_number_x4((nside - 1) as u64)
}

/// Index of the first cell on the Equatorial Region / South polar cap transition latitude.
///
/// # Example
/// ```rust
/// use hpxcore::ring::first_hash_on_eqr_spc_transition;
///
/// assert_eq!(first_hash_on_eqr_spc_transition(1),   8);
/// assert_eq!(first_hash_on_eqr_spc_transition(2),  36);
/// assert_eq!(first_hash_on_eqr_spc_transition(4), 152);
/// ```
#[inline]
pub const fn first_hash_on_eqr_spc_transition(nside: u32) -> u64 {
  let n = nside as u64;
  // 8n^2 + (2*n^2 - 2n) = 2n(5n - 1)
  (n * (5 * n - 1)) << 1
}

/// Index of the first cell fully in the South polar cap.
///
/// # Example
/// ```rust
/// use hpxcore::ring::first_hash_in_spc;
///
/// assert_eq!(first_hash_in_spc(1),  12);
/// assert_eq!(first_hash_in_spc(2),  44);
/// assert_eq!(first_hash_in_spc(4), 168);
/// ```
#[inline]
pub const fn first_hash_in_spc(nside: u32) -> u64 {
  let n = nside as u64;
  // 8n^2 + (2*n^2 + 2n) = 2n(5n + 1)
  (n * (5 * n + 1)) << 1
}

/// Four time the [triangular number](https://en.wikipedia.org/wiki/Triangular_number), i.e.
/// ```math
/// 4 * \sum_{i=1}^{n} i = 4 * \frac{n (n + 1)}{2} = 2 n (n + 1)
/// ```
#[inline]
pub(crate) const fn triangular_number_x4(n: u64) -> u64 {
  (n * (n + 1)) << 1
}

/// Longitude of the center of the given base cell, in units of `pi/4`:
/// odd for the polar caps base cells, even for the equatorial ones.
#[inline]
const fn base_cell_center_lon_x4_over_pi(d0h: u8) -> i64 {
  (((d0h & 3) << 1) | (((d0h >> 2) + 1) & 1)) as i64
}

/// Returns the RING hash value of the cell of given coordinates `(i, j)` in the given base cell.
///
/// ```rust
/// use hpxcore::ring::hash_from_parts;
///
/// assert_eq!(13, hash_from_parts(2, 0, 0, 0));
/// assert_eq!(27, hash_from_parts(2, 4, 0, 1));
/// assert_eq!(47, hash_from_parts(2, 11, 0, 0));
/// // nside = 3
/// assert_eq!(0, hash_from_parts(3, 0, 2, 2));
/// assert_eq!(107, hash_from_parts(3, 11, 0, 0));
/// ```
pub fn hash_from_parts(nside: u32, d0h: u8, i: u32, j: u32) -> u64 {
  debug_assert!(d0h < 12 && i < nside && j < nside);
  let n = nside as i64;
  let (i, j) = (i as i64, j as i64);
  // Index of the ring from the north pole, in [1, 4 * nside - 1]
  let i_ring = ((d0h >> 2) as i64 + 2) * n - (i + j) - 1;
  // Quarter of the number of cells in the ring, hash of the first cell in the ring and
  // shift (1 if the first cell center is not at lon = 0, else 0)
  let (n_in_ring_quarter, first_hash_in_ring, shift) = if i_ring < n {
    // North polar cap
    (i_ring, triangular_number_x4((i_ring - 1) as u64), 0)
  } else if i_ring > 3 * n {
    // South polar cap
    let r = (n << 2) - i_ring;
    (r, n_hash(nside) - triangular_number_x4(r as u64), 0)
  } else {
    // Equatorial region (including the transition rings)
    let first = first_hash_on_npc_eqr_transition(nside) + ((i_ring - n) * (n << 2)) as u64;
    (n, first, (i_ring - n) & 1)
  };
  // Always even, so the shift is an exact division
  let mut i_in_ring = (base_cell_center_lon_x4_over_pi(d0h) * n_in_ring_quarter + i - j + 1 + shift) >> 1;
  if i_in_ring > n << 2 {
    i_in_ring -= n << 2;
  } else if i_in_ring < 1 {
    i_in_ring += n << 2;
  }
  first_hash_in_ring + (i_in_ring - 1) as u64
}

/// Returns the base cell and the `(i, j)` coordinates inside the base cell of the cell of given
/// RING hash value. Inverse of [hash_from_parts](fn.hash_from_parts.html).
///
/// ```rust
/// use hpxcore::nested::HashParts;
/// use hpxcore::ring::decode_hash;
///
/// assert_eq!(HashParts { d0h: 0, i: 1, j: 1 }, decode_hash(2, 0));
/// assert_eq!(HashParts { d0h: 4, i: 0, j: 1 }, decode_hash(2, 27));
/// assert_eq!(HashParts { d0h: 11, i: 0, j: 0 }, decode_hash(2, 47));
/// ```
pub fn decode_hash(nside: u32, hash: u64) -> HashParts {
  debug_assert!(hash < n_hash(nside));
  let n = nside as i64;
  let hash = hash as i64;
  let first_hash_on_npc_eqr_transition = first_hash_on_npc_eqr_transition(nside) as i64;
  let n_hash = n_hash(nside) as i64;
  // Ring index from the north pole in [1, 4 * nside - 1], index in the ring starting at 1,
  // shift, a quarter of the number of cells in the ring and base cell.
  let (i_ring, i_in_ring, shift, n_in_ring_quarter, d0h) = if hash < first_hash_on_npc_eqr_transition {
    // North polar cap: solve 2r(r - 1) <= hash
    let i_ring = (1 + isqrt(1 + (hash << 1) as u64) as i64) >> 1;
    let i_in_ring = hash + 1 - triangular_number_x4((i_ring - 1) as u64) as i64;
    (i_ring, i_in_ring, 0, i_ring, (i_in_ring - 1) / i_ring)
  } else if hash < n_hash - first_hash_on_npc_eqr_transition {
    // Equatorial region
    let h = hash - first_hash_on_npc_eqr_transition;
    let k = h / (n << 2);
    let i_ring = k + n;
    let i_in_ring = h - k * (n << 2) + 1;
    let shift = (i_ring + n) & 1;
    // Index of the base cell columns crossed by the two diagonals going through the cell
    let ifm = (i_in_ring - ((k + 1) >> 1) + n - 1) / n;
    let ifp = (i_in_ring - (((n << 1) + 1 - k) >> 1) + n - 1) / n;
    let d0h = if ifp == ifm {
      ifp | 4
    } else if ifp < ifm {
      ifp
    } else {
      ifm + 8
    };
    (i_ring, i_in_ring, shift, n, d0h)
  } else {
    // South polar cap, counting in reverse order from the south pole
    let h = n_hash - hash;
    let r = (1 + isqrt(((h << 1) - 1) as u64) as i64) >> 1;
    let i_in_ring = (r << 2) + 1 - (h - triangular_number_x4((r - 1) as u64) as i64);
    ((n << 2) - r, i_in_ring, 0, r, (i_in_ring - 1) / r + 8)
  };
  let d0h = d0h as u8;
  // Position relative to the base cell center: h along the north-south axis, l along the
  // west-east axis
  let h = i_ring - ((2 + (d0h >> 2) as i64) * n) + 1;
  let mut l = (i_in_ring << 1) - base_cell_center_lon_x4_over_pi(d0h) * n_in_ring_quarter - shift - 1;
  if l >= n << 1 {
    l -= n << 3;
  }
  HashParts {
    d0h,
    i: ((l - h) >> 1) as u32,
    j: ((-l - h) >> 1) as u32,
  }
}

/// Returns the cell number (hash value) associated with the given position on the unit sphere.
/// # Inputs
/// - `nside`: any value in `[1, NSIDE_MAX]`
/// - `lon`: longitude in radians, see [Layer::hash](../nested/struct.Layer.html#method.hash)
/// - `lat`: latitude in radians, must be in `[-pi/2, pi/2]`
///
/// # Example
/// ```rust
/// use hpxcore::ring::hash;
/// use std::f64::consts::FRAC_PI_2;
///
/// assert_eq!(0, hash(5, 0.1, FRAC_PI_2));
/// assert_eq!(299, hash(5, 6.2, -FRAC_PI_2));
/// assert_eq!(4, hash(1, 0.0, 0.0));
/// ```
pub fn hash(nside: u32, lon: f64, lat: f64) -> u64 {
  let (d0h, l_in_d0c, h_in_d0c) = Layer::d0h_lh_in_d0c(lon, lat);
  let half_nside = 0.5 * nside as f64;
  // - ok to cast on u32 since small negative values due to numerical inaccuracies are rounded to 0
  let i = ((h_in_d0c + l_in_d0c) * half_nside) as u32;
  let j = ((h_in_d0c - l_in_d0c) * half_nside) as u32;
  // - deals with numerical inaccuracies
  let i = if i >= nside { nside - 1 } else { i };
  let j = if j >= nside { nside - 1 } else { j };
  hash_from_parts(nside, d0h, i, j)
}

/// Compute the position on the unit sphere of the center (in the Euclidean projection plane)
/// of the cell associated to the given hash value.
///
/// # Output
/// - `(lon, lat)` in radians, `lon` in `[0, 2pi[` and `lat` in `[-pi/2, pi/2]`.
///
/// # Example
/// ```rust
/// use hpxcore::ring::center;
///
/// let (lon, lat) = center(1, 4);
/// assert_eq!((0.0, 0.0), (lon, lat));
/// ```
pub fn center(nside: u32, hash: u64) -> (f64, f64) {
  let (x, y) = center_of_projected_cell(nside, hash);
  unproj(x, y)
}

/// Center of the given cell in the Euclidean projection space.
/// # Output
/// - `(x, y)` coordinates such that `x` in `[0, 8[` and `y` in `[-2, 2]`.
pub fn center_of_projected_cell(nside: u32, hash: u64) -> (f64, f64) {
  let HashParts { d0h, i, j } = decode_hash(nside, hash);
  let one_over_nside = 1.0 / nside as f64;
  let mut x = (i as i64 - j as i64) as f64 * one_over_nside;
  let mut y = (i as i64 + j as i64 - (nside as i64 - 1)) as f64 * one_over_nside;
  x += base_cell_center_lon_x4_over_pi(d0h) as f64;
  y += 1.0 - (d0h >> 2) as f64;
  if x < 0.0 {
    x += 8.0;
  }
  (x, y)
}

#[cfg(test)]
mod tests {
  use super::*;

  const NSIDES: [u32; 10] = [1, 2, 3, 4, 5, 7, 8, 12, 17, 40];

  #[test]
  fn testok_decode_hash_bijection() {
    for nside in NSIDES {
      for h in 0..n_hash(nside) {
        let HashParts { d0h, i, j } = decode_hash(nside, h);
        assert!(d0h < 12 && i < nside && j < nside, "nside: {}, hash: {}", nside, h);
        assert_eq!(h, hash_from_parts(nside, d0h, i, j), "nside: {}", nside);
      }
    }
  }

  #[test]
  fn testok_decode_hash_large_nside() {
    for nside in [8191_u32, 8192, 1_000_003, (1 << 29) - 1, 1 << 29] {
      let n_hash = n_hash(nside);
      let ring_limits = [
        first_hash_on_npc_eqr_transition(nside),
        first_hash_in_eqr(nside),
        first_hash_on_eqr_spc_transition(nside),
        first_hash_in_spc(nside),
      ];
      for h0 in [0, 1, n_hash / 3, n_hash / 2, n_hash - 2]
        .into_iter()
        .chain(ring_limits.into_iter().map(|h| h - 1))
        .chain(ring_limits)
      {
        for h in h0..(h0 + 2).min(n_hash) {
          let HashParts { d0h, i, j } = decode_hash(nside, h);
          assert!(d0h < 12 && i < nside && j < nside);
          assert_eq!(h, hash_from_parts(nside, d0h, i, j));
        }
      }
    }
  }

  #[test]
  fn testok_center_hash() {
    for nside in NSIDES {
      for h in 0..n_hash(nside) {
        let (lon, lat) = center(nside, h);
        assert_eq!(h, hash(nside, lon, lat), "nside: {}, lon: {}, lat: {}", nside, lon, lat);
      }
    }
  }

  #[test]
  fn testok_ring_structure() {
    for nside in NSIDES {
      let mut h = 0;
      let mut prev_lat = std::f64::consts::FRAC_PI_2;
      for r in 1..=n_isolatitude_rings(nside) as u64 {
        let n = nside as u64;
        let n_in_ring = 4 * r.min(n).min(4 * n - r);
        let (_, lat_first) = center(nside, h);
        assert!(lat_first < prev_lat);
        let mut prev_lon = -1.0;
        for _ in 0..n_in_ring {
          let (lon, lat) = center(nside, h);
          assert!((lat - lat_first).abs() < 1e-14, "nside: {}, ring: {}", nside, r);
          assert!(lon > prev_lon, "nside: {}, ring: {}", nside, r);
          prev_lon = lon;
          h += 1;
        }
        prev_lat = lat_first;
      }
      assert_eq!(n_hash(nside), h);
    }
  }

  #[test]
  fn testok_first_hashes() {
    for nside in NSIDES {
      assert_eq!(n_hash(nside), first_hash_in_spc(nside) + first_hash_in_eqr(nside));
      assert_eq!(
        n_hash(nside),
        first_hash_on_eqr_spc_transition(nside) + first_hash_on_npc_eqr_transition(nside) + 4 * nside as u64
      );
    }
  }
}
