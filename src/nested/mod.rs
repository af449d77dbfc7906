//! The NESTED scheme: each of the 12 base cells is divided in a `nside x nside` grid of cells
//! and the cells of a base cell are ordered following a z-order curve.
//! For a given depth (`nside = 2^depth`) all constants are pre-computed in a [Layer](struct.Layer.html).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::ops::Shr;

use super::compass_point::MainWind::{C, E, N, NE, NW, S, SE, SW, W};
use super::compass_point::{MainWind, MainWindMap};
use super::ring::triangular_number_x4;
use super::{
  base_cell, iden, isqrt, n_hash, next, nside, oppo, prev, unproj, DEPTH_MAX, F64_BUT_SIGN_BIT_MASK,
  F64_SIGN_BIT_MASK, FOUR_OVER_PI, HALF, ONE_OVER_TRANSITION_Z, SQRT6, TRANSITION_LATITUDE,
};

pub mod zordercurve;

use self::zordercurve::{ZOrderCurve, ZOC};

/// `1 / nside` for each depth, exact since nside is a power of 2.
const ONE_OVER_NSIDE: [f64; 30] = [
  1.0,
  0.5,
  0.25,
  0.125,
  0.0625,
  0.03125,
  0.015625,
  0.0078125,
  0.00390625,
  0.001953125,
  0.0009765625,
  0.00048828125,
  0.000244140625,
  0.0001220703125,
  0.00006103515625,
  0.000030517578125,
  0.0000152587890625,
  0.00000762939453125,
  0.000003814697265625,
  0.0000019073486328125,
  0.00000095367431640625,
  0.000000476837158203125,
  0.0000002384185791015625,
  0.00000011920928955078125,
  0.000000059604644775390625,
  0.0000000298023223876953125,
  0.00000001490116119384765625,
  0.000000007450580596923828125,
  0.0000000037252902984619140625,
  0.00000000186264514923095703125,
];

/// Array storing pre-computed values for each of the 30 possible depth (from 0 to 29)
static LAYERS: [Layer; 30] = [
  Layer::new(0),
  Layer::new(1),
  Layer::new(2),
  Layer::new(3),
  Layer::new(4),
  Layer::new(5),
  Layer::new(6),
  Layer::new(7),
  Layer::new(8),
  Layer::new(9),
  Layer::new(10),
  Layer::new(11),
  Layer::new(12),
  Layer::new(13),
  Layer::new(14),
  Layer::new(15),
  Layer::new(16),
  Layer::new(17),
  Layer::new(18),
  Layer::new(19),
  Layer::new(20),
  Layer::new(21),
  Layer::new(22),
  Layer::new(23),
  Layer::new(24),
  Layer::new(25),
  Layer::new(26),
  Layer::new(27),
  Layer::new(28),
  Layer::new(29),
];

/// Get the [Layer](struct.Layer.html) of the given depth.
///
/// # Panics
/// If `depth` is larger than [DEPTH_MAX](../constant.DEPTH_MAX.html).
///
/// ```rust
/// use hpxcore::nested::get;
///
/// assert_eq!(8192, get(13).nside());
/// ```
#[inline]
pub fn get(depth: u8) -> &'static Layer {
  debug_assert!(depth <= DEPTH_MAX);
  &LAYERS[depth as usize]
}

/// Base cell together with the cell coordinates inside the base cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParts {
  /// depth 0 hash, i.e. base cell number in `[0, 12[`
  pub d0h: u8,
  /// coordinate along the base cell south-east axis, in `[0, nside[`
  pub i: u32,
  /// coordinate along the base cell south-west axis, in `[0, nside[`
  pub j: u32,
}

// Hash splitted in its bits components, without shifting them
struct HashBits {
  d0h: u64, // base cell number (depth 0 hash value) bits
  i: u64,   // in the base cell, z-order curve coordinate along the x-axis bits
  j: u64,   // in the base cell, z-order curve coordinate along the y-axis bits
}

/// Defines an HEALPix layer in the NESTED scheme.
/// A layer is simply an utility structure containing all constants and methods related
/// to a given depth.
#[derive(Debug)]
pub struct Layer {
  depth: u8,
  nside: u32,
  nside_minus_1: u32,
  n_hash: u64,
  twice_depth: u8,
  d0h_mask: u64,
  x_mask: u64,
  y_mask: u64,
  xy_mask: u64,
  time_half_nside: i64,
  one_over_nside: f64,
  z_order_curve: ZOC,
}

impl Layer {
  const fn new(depth: u8) -> Layer {
    let twice_depth: u8 = depth << 1u8;
    let nside: u32 = nside(depth);
    Layer {
      depth,
      nside,
      nside_minus_1: nside - 1,
      n_hash: n_hash(depth),
      twice_depth,
      d0h_mask: 15_u64 << twice_depth,
      x_mask: x_mask(depth),
      y_mask: y_mask(depth),
      xy_mask: xy_mask(depth),
      time_half_nside: (depth as i64 - 1) << 52,
      one_over_nside: ONE_OVER_NSIDE[depth as usize],
      z_order_curve: ZOC::from_depth(depth),
    }
  }

  /// Returns the depth of the Layer (i.e. the HEALPix *order*)
  #[inline]
  pub fn depth(&self) -> u8 {
    self.depth
  }

  #[inline]
  pub fn nside(&self) -> u32 {
    self.nside
  }

  /// Returns the number of hash value of the Layer, i.e. the number of cells.
  #[inline]
  pub fn n_hash(&self) -> u64 {
    self.n_hash
  }

  /// `true` if the given value is a valid hash value for this layer, i.e. is in `[0, 12*nside^2[`.
  #[inline]
  pub fn is_hash(&self, hash: u64) -> bool {
    hash < self.n_hash
  }

  /// NESTED index, in `[0, 12*nside^2[`, of the pixel containing the given position.
  /// # Inputs
  /// - `lon`: longitude in radians, any finite value (folded in `[0, 2pi[` by the quarter
  ///   decomposition, without extended range reduction);
  /// - `lat`: latitude in radians, in `[-pi/2, pi/2]`.
  /// # Examples
  /// ```rust
  /// use hpxcore::nested::{get, Layer};
  ///
  /// let nested12: &Layer = get(12);
  /// let nside = nested12.nside() as u64;
  /// assert_eq!(nside * nside - 1, nested12.hash(12.5_f64.to_radians(), 89.99999_f64.to_radians()));
  /// ```
  pub fn hash(&self, lon: f64, lat: f64) -> u64 {
    debug_assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&lat), "Wrong latitude: {}", lat);
    let (d0h, l_in_d0c, h_in_d0c) = Layer::d0h_lh_in_d0c(lon, lat);
    // (h +- l) * nside / 2, the multiplication being an addition on the f64 exponent.
    // Tiny negative values (round-off) saturate to 0 in the u32 cast.
    let scale = |v: f64| f64::from_bits((self.time_half_nside + v.to_bits() as i64) as u64) as u32;
    // Round-off may also give nside on the upper edge
    let i = scale(h_in_d0c + l_in_d0c).min(self.nside_minus_1);
    let j = scale(h_in_d0c - l_in_d0c).min(self.nside_minus_1);
    self.build_hash_from_parts(d0h, i, j)
  }

  /// Returns the base cell containing the given position, together with the position in the
  /// base cell projection frame:
  /// - `l` along the west-east axis, in `[-1, 1]`
  /// - `h` along the south-north axis, in `[0, 2]`
  ///
  /// so that the coordinates in the base cell, in `[0, 1]`, are `i = (h + l) / 2` and
  /// `j = (h - l) / 2`.
  #[inline]
  pub(crate) fn d0h_lh_in_d0c(lon: f64, lat: f64) -> (u8, f64, f64) {
    let (x_pm1, q) = Layer::xpm1_and_q(lon);
    if lat > TRANSITION_LATITUDE {
      // Collignon, origin at (pi/4, 0)
      let sqrt_3_one_min_z = SQRT6 * (HALF * lat + FRAC_PI_4).cos();
      let (x_proj, y_proj) = (x_pm1 * sqrt_3_one_min_z, 2.0 - sqrt_3_one_min_z);
      (q, x_proj, y_proj)
    } else if lat < -TRANSITION_LATITUDE {
      // Collignon, origin at (pi/4, -pi/2)
      let sqrt_3_one_min_z = SQRT6 * (HALF * lat - FRAC_PI_4).cos();
      let (x_proj, y_proj) = (x_pm1 * sqrt_3_one_min_z, sqrt_3_one_min_z);
      (q + 8, x_proj, y_proj)
    } else {
      // Cylindrical equal area. The square of side 2 centred on the quarter is split by its
      // diagonals into 4 triangles: 0 (south), 1 (east), 2 (north) and 3 (west).
      // A point on a southern diagonal goes with the southern triangle.
      let y_pm1 = lat.sin() * ONE_OVER_TRANSITION_Z;
      let q01 = (x_pm1 > y_pm1) as u8;
      let q12 = (x_pm1 >= -y_pm1) as u8;
      let q1 = q01 & q12;
      // 2 in triangle 0, 1 in triangles 1 and 3, 0 in triangle 2
      let q013 = q01 + (1 - q12);
      // Recentre x on the base cell: +1 in triangle 3, -1 in triangle 1
      let x_proj = x_pm1 - ((q01 + q12) as i8 - 1) as f64;
      let y_proj = y_pm1 + q013 as f64;
      let d0h = (q013 << 2) + ((q + q1) & 3);
      (d0h, x_proj, y_proj)
    }
  }

  /// Splits a longitude (radians) into a quarter `q` in `[0, 3]` and a position `x` in `[-1, 1[`
  /// relative to the centre of that quarter: `lon = (x + 1) * pi/4 + q * pi/2` (modulo 2pi).
  #[inline]
  fn xpm1_and_q(lon: f64) -> (f64, u8) {
    let lon_bits = lon.to_bits();
    let lon_abs = f64::from_bits(lon_bits & F64_BUT_SIGN_BIT_MASK);
    let lon_sign = lon_bits & F64_SIGN_BIT_MASK;
    let x = lon_abs * FOUR_OVER_PI;
    let q = x as u8 | 1_u8;
    if lon_sign == 0 {
      (x - (q as f64), (q & 7_u8) >> 1)
    } else {
      // Mirror: e.g. -pi/2 lands in quarter 2 with x = 1
      (q as f64 - x, 3 - ((q & 7_u8) >> 1))
    }
  }

  #[inline]
  pub fn build_hash_from_parts(&self, d0h: u8, i: u32, j: u32) -> u64 {
    self.build_hash((d0h as u64) << self.twice_depth, i, j)
  }

  #[inline]
  fn build_hash(&self, d0h_bits: u64, i: u32, j: u32) -> u64 {
    debug_assert!(i < self.nside && j < self.nside, "nside: {}; i: {}, j: {}", self.nside, i, j);
    d0h_bits | self.z_order_curve.ij2h(i, j)
  }

  /// Split the given hash into the base cell and the coordinates inside the base cell.
  ///
  /// ```rust
  /// use hpxcore::nested::{get, HashParts};
  ///
  /// let layer = get(2);
  /// assert_eq!(HashParts { d0h: 11, i: 1, j: 3 }, layer.decode_hash(187));
  /// assert_eq!(187, layer.build_hash_from_parts(11, 1, 3));
  /// ```
  #[inline]
  pub fn decode_hash(&self, hash: u64) -> HashParts {
    let (i, j) = self.z_order_curve.h2ij(hash & self.xy_mask);
    HashParts {
      d0h: self.h_2_d0h(hash),
      i,
      j,
    }
  }

  #[inline]
  fn h_2_d0h(&self, hash: u64) -> u8 {
    (hash >> self.twice_depth) as u8
  }

  #[inline]
  fn pull_bits_appart(&self, hash: u64) -> HashBits {
    HashBits {
      d0h: hash & self.d0h_mask,
      i: hash & self.x_mask,
      j: hash & self.y_mask,
    }
  }

  /// Transforms the given NESTED hash value into the RING hash value.
  ///
  /// # Examples
  ///
  /// At depth 0, no differences:
  /// ```rust
  /// use hpxcore::nested::get;
  ///
  /// let n0 = get(0);
  /// for h in 0..12 {
  ///   assert_eq!(n0.to_ring(h), h);
  /// }
  /// ```
  ///
  /// At depth 1:
  /// ```rust
  /// use hpxcore::nested::get;
  ///
  /// let n1 = get(1);
  /// let expected: [u64; 48] = [
  ///   13,  5,  4,  0, 15,  7,  6,  1, 17,  9,  8,  2, 19, 11, 10,  3,
  ///   28, 20, 27, 12, 30, 22, 21, 14, 32, 24, 23, 16, 34, 26, 25, 18,
  ///   44, 37, 36, 29, 45, 39, 38, 31, 46, 41, 40, 33, 47, 43, 42, 35,
  /// ];
  /// for (nested, ring) in expected.iter().enumerate() {
  ///   assert_eq!(*ring, n1.to_ring(nested as u64));
  /// }
  /// ```
  ///
  /// At depth 2 (non exhaustive test):
  /// ```rust
  /// use hpxcore::nested::get;
  ///
  /// let n2 = get(2);
  /// // NPC
  /// assert_eq!(n2.to_ring(47),  2);
  /// assert_eq!(n2.to_ring(29),  7);
  /// assert_eq!(n2.to_ring(60), 22);
  /// // EQR
  /// assert_eq!(n2.to_ring(51),   54);
  /// assert_eq!(n2.to_ring(88),  107);
  /// assert_eq!(n2.to_ring(174), 129);
  /// // SPC
  /// assert_eq!(n2.to_ring(177), 187);
  /// assert_eq!(n2.to_ring(153), 157);
  /// assert_eq!(n2.to_ring(144), 189);
  /// ```
  pub fn to_ring(&self, hash: u64) -> u64 {
    // Rings are numbered from 0 at the north pole; ring nside - 1 is the last one of the north cap,
    // 2 nside - 1 the equator and 3 nside - 1 the first one of the south cap.
    // A base cell of row j_d0h (0, 1 or 2) spans 2 nside - 1 rings, the one of its cell (i, j)
    // being (j_d0h + 2) nside - 2 - (i + j).
    let HashParts { d0h, i, j } = self.decode_hash(hash);
    let h: u64 = i as u64 + j as u64;
    let l: i64 = i as i64 - j as i64;
    let i_d0h = div4_remainder(d0h) as u64;
    let j_d0h = div4_quotient(d0h) as u64;
    debug_assert!(j_d0h <= 2);
    let i_ring: u64 = self.nside_time(j_d0h + 2) - (h + 2);
    // Cells per ring: 4 (i_ring + 1) in the north cap, 4 nside in the belt, 4 (4 nside - 1 - i_ring)
    // in the south cap. Position in the ring starts from floor((i - j) / 2).
    let first_isolat_index;
    let mut i_in_ring = div2_quotient(l);
    if i_ring < self.nside as u64 {
      let ip1 = i_ring + 1;
      first_isolat_index = triangular_number_x4(i_ring);
      i_in_ring += (div2_quotient(ip1) + ip1 * i_d0h) as i64;
    } else if i_ring >= self.nside_time(3) - 1 {
      let ip1 = h + 1;
      first_isolat_index = self.n_hash - triangular_number_x4(ip1);
      i_in_ring += (div2_quotient(ip1) + ip1 * i_d0h) as i64;
    } else {
      first_isolat_index = self.first_hash_in_eqr() + self.minus_nside_x_4nside(i_ring);
      i_in_ring += div2_quotient(self.nside_time(div2_remainder(j_d0h + 1))) as i64;
      // Base cell 4 straddles lon = 0: its western half is at the end of the ring
      i_in_ring += self.nside_time(if d0h == 4 && l < 0 { 4 } else { i_d0h }) as i64;
    }
    i_in_ring as u64 + first_isolat_index
  }

  /// Transforms the given RING hash value into the NESTED hash value.
  ///
  /// # Examples
  ///
  /// At depth 1:
  /// ```rust
  /// use hpxcore::nested::get;
  ///
  /// let n1 = get(1);
  /// let expected: [u64; 48] = [
  ///    3,  7, 11, 15,  2,  1,  6,  5, 10,  9, 14, 13, 19,  0, 23,  4,
  ///   27,  8, 31, 12, 17, 22, 21, 26, 25, 30, 29, 18, 16, 35, 20, 39,
  ///   24, 43, 28, 47, 34, 33, 38, 37, 42, 41, 46, 45, 32, 36, 40, 44,
  /// ];
  /// for (ring, nested) in expected.iter().enumerate() {
  ///   assert_eq!(*nested, n1.from_ring(ring as u64));
  /// }
  /// ```
  ///
  /// At depth 2 (non exhaustive test):
  /// ```rust
  /// use hpxcore::nested::get;
  ///
  /// let n2 = get(2);
  /// // NPC
  /// assert_eq!(47, n2.from_ring(2));
  /// assert_eq!(29, n2.from_ring(7));
  /// assert_eq!(60, n2.from_ring(22));
  /// // EQR
  /// assert_eq!(51,  n2.from_ring(54));
  /// assert_eq!(88,  n2.from_ring(107));
  /// assert_eq!(174, n2.from_ring(129));
  /// // SPC
  /// assert_eq!(177, n2.from_ring(187));
  /// assert_eq!(153, n2.from_ring(157));
  /// assert_eq!(144, n2.from_ring(189));
  /// ```
  pub fn from_ring(&self, hash: u64) -> u64 {
    let first_hash_in_eqr = self.first_hash_in_eqr();
    let first_hash_on_eqr_spc_transition = self.n_hash - first_hash_in_eqr;
    if hash < first_hash_in_eqr {
      // Largest ring n with 2n(n + 1) <= hash
      let i_ring: u64 = (isqrt(1 + (hash << 1)) - 1) >> 1;
      let n_in_ring: u64 = i_ring + 1;
      let i_in_ring = hash - triangular_number_x4(i_ring);
      let d0h = i_in_ring / n_in_ring;
      let h = (((self.nside as u64) << 1) - 2) as i64 - i_ring as i64;
      let l = ((i_in_ring - n_in_ring * d0h) << 1) as i64 - i_ring as i64;
      self.build_hash_from_parts(d0h as u8, ((h + l) >> 1) as u32, ((h - l) >> 1) as u32)
    } else if hash >= first_hash_on_eqr_spc_transition {
      // Same as the north cap, counting backward from the last pixel
      let hash = self.n_hash - 1 - hash;
      let i_ring = (isqrt(1 + (hash << 1)) - 1) >> 1;
      let n_in_ring = i_ring + 1;
      let i_in_ring = ((n_in_ring << 2) - 1) - (hash - triangular_number_x4(i_ring));
      let d0h = i_in_ring / n_in_ring;
      let h = i_ring as i64;
      let l = ((i_in_ring - n_in_ring * d0h) << 1) as i64 - i_ring as i64;
      self.build_hash_from_parts(d0h as u8 + 8, ((h + l) >> 1) as u32, ((h - l) >> 1) as u32)
    } else {
      // Ring and position counted from the first belt ring, 4 nside pixels per ring
      let offset = hash - first_hash_in_eqr;
      let i_ring = offset >> (self.depth + 2);
      let i_in_ring = offset - (i_ring << (self.depth + 2));
      // (l, h) in the frame of base cell 4, h = 0 on its southern cell
      let l = (i_in_ring << 1) + div2_remainder(i_ring);
      let h = (((self.nside as u64) << 1) - 2) - i_ring;
      let i_in_d0c = (h + l) >> 1;
      let j_in_d0c = (h as i64 - l as i64) >> 1;
      // j may be negative: shift by 4 nside (a multiple of nside) before splitting
      let j_in_d0c = (j_in_d0c + ((self.nside as i64) << 2)) as u64;
      let i_d0c = self.div_by_nside_floor_u8(i_in_d0c);
      let j_d0c = self.div_by_nside_floor_u8(j_in_d0c);
      self.build_hash_from_parts(
        depth0_hash_unsafe(i_d0c, j_d0c),
        self.modulo_nside_u32(i_in_d0c as u32),
        self.modulo_nside_u32(j_in_d0c as u32),
      )
    }
  }

  /// arg * nside
  #[inline]
  fn nside_time(&self, i: u64) -> u64 {
    i << self.depth
  }

  #[inline]
  fn div_by_nside_floor_u8(&self, val: u64) -> u8 {
    (val >> self.depth) as u8
  }

  #[inline]
  fn modulo_nside_u32(&self, val: u32) -> u32 {
    val & self.nside_minus_1
  }

  /// Same as `ring::first_hash_in_eqr`, using the fact that nside is a power of 2.
  #[inline]
  fn first_hash_in_eqr(&self) -> u64 {
    // 2*nside*(nside + 1) = 2*[nside^2 + nside]
    ((1_u64 << self.twice_depth) + self.nside as u64) << 1
  }

  /// (i_ring - nside) * 4 * nside
  #[inline]
  fn minus_nside_x_4nside(&self, i_ring: u64) -> u64 {
    (i_ring - self.nside as u64) << (self.depth + 2)
  }

  /// Compute the position on the unit sphere of the center (in the Euclidean projection plane)
  /// of the cell associated to the given hash value.
  ///
  /// # Output
  /// - `(lon, lat)` in radians, the unprojected position (on the unit sphere) of the center of
  ///   the cell in the Euclidean plane
  ///   - `lon`, longitude in `[0, 2pi[` radians;
  ///   - `lat`, latitude in `[-pi/2, pi/2]` radians.
  ///
  /// # Example
  /// ```rust
  /// use hpxcore::TRANSITION_LATITUDE;
  /// use hpxcore::nested::get;
  /// use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
  ///
  /// let (lon, lat) = get(0).center(0);
  /// assert!((lon - FRAC_PI_4).abs() < 1e-15);
  /// assert!((lat - TRANSITION_LATITUDE).abs() < 1e-15);
  /// ```
  #[inline]
  pub fn center(&self, hash: u64) -> (f64, f64) {
    let (x, y) = self.center_of_projected_cell(hash);
    unproj(x, y)
  }

  /// Center of the given cell in the Euclidean projection space.
  /// # Output
  /// - `(x, y)` coordinates such that `x` in `[0, 8[` and `y` in `[-2, 2]`.
  pub fn center_of_projected_cell(&self, hash: u64) -> (f64, f64) {
    debug_assert!(self.is_hash(hash));
    let HashParts { d0h, i, j } = self.decode_hash(hash);
    let mut hl: (i32, i32) = rotate45_scale2(i, j);
    self.shift_from_small_cell_center_to_base_cell_center(&mut hl);
    let mut xy: (f64, f64) = self.scale_to_proj_dividing_by_nside(hl);
    let (offset_x, offset_y) = compute_base_cell_center_offsets_in_8x3_grid(d0h);
    apply_base_cell_center_offsets(&mut xy, offset_x, offset_y);
    xy
  }

  #[inline]
  fn shift_from_small_cell_center_to_base_cell_center(&self, ij: &mut (i32, i32)) {
    let (ref mut _i, ref mut j) = *ij;
    *j -= self.nside_minus_1 as i32;
  }

  #[inline]
  fn scale_to_proj_dividing_by_nside(&self, (x, y): (i32, i32)) -> (f64, f64) {
    (x as f64 * self.one_over_nside, y as f64 * self.one_over_nside)
  }

  /// Returns the hash value of the neighbour cell of the cell of given hash, in the given direction.
  /// `None` if the cell has no neighbour in the given direction (corner of a base cell where
  /// only 3 base cells meet).
  ///
  /// ```rust
  /// use hpxcore::compass_point::MainWind;
  /// use hpxcore::nested::get;
  ///
  /// let nested0 = get(0);
  /// assert_eq!(Some(5), nested0.neighbour(4, MainWind::E));
  /// assert_eq!(None, nested0.neighbour(4, MainWind::N));
  /// ```
  #[inline]
  pub fn neighbour(&self, hash: u64, direction: MainWind) -> Option<u64> {
    let HashParts { d0h, i, j } = self.decode_hash(hash);
    self.neighbour_from_parts(d0h, i, j, direction)
  }

  /// Returns the hash values of all the neighbour cells of the cell of given hash.
  /// The given cell itself can be included (setting the `include_center` parameters to `true`).
  ///
  /// ```rust
  /// use hpxcore::compass_point::MainWind;
  /// use hpxcore::nested::get;
  ///
  /// let nested0 = get(0);
  /// let neigs = nested0.neighbours(4, false);
  /// assert_eq!(Some(&5), neigs.get(MainWind::E));
  /// assert_eq!(6, neigs.len());
  /// ```
  pub fn neighbours(&self, hash: u64, include_center: bool) -> MainWindMap<u64> {
    debug_assert!(self.is_hash(hash));
    let mut result_map = MainWindMap::new();
    if include_center {
      result_map.put(C, hash);
    }
    let h_bits: HashBits = self.pull_bits_appart(hash);
    if self.is_in_base_cell_border(h_bits.i, h_bits.j) {
      self.edge_cell_neighbours(hash, &mut result_map);
    } else {
      self.inner_cell_neighbours(h_bits.d0h, h_bits.i, h_bits.j, &mut result_map);
    }
    result_map
  }

  #[inline]
  fn is_in_base_cell_border(&self, i_in_base_cell_bits: u64, j_in_base_cell_bits: u64) -> bool {
    0_u64 == i_in_base_cell_bits
      || i_in_base_cell_bits == self.x_mask
      || 0_u64 == j_in_base_cell_bits
      || j_in_base_cell_bits == self.y_mask
  }

  fn inner_cell_neighbours(
    &self,
    d0h_bits: u64,
    i_in_d0h_bits: u64,
    j_in_d0h_bits: u64,
    result_map: &mut MainWindMap<u64>,
  ) {
    let (i, j) = self.z_order_curve.h2ij(i_in_d0h_bits | j_in_d0h_bits);
    // i-1 and j-1 bits
    let ij = self.z_order_curve.ij2h(i - 1, j - 1);
    let im1_bits = ij & self.x_mask;
    let jm1_bits = ij & self.y_mask;
    // i+1 and j+1 bits
    let ij = self.z_order_curve.ij2h(i + 1, j + 1);
    let ip1_bits = ij & self.x_mask;
    let jp1_bits = ij & self.y_mask;
    result_map.put(S, bits_2_hash(d0h_bits, im1_bits, jm1_bits));
    result_map.put(SE, bits_2_hash(d0h_bits, i_in_d0h_bits, jm1_bits));
    result_map.put(E, bits_2_hash(d0h_bits, ip1_bits, jm1_bits));
    result_map.put(SW, bits_2_hash(d0h_bits, im1_bits, j_in_d0h_bits));
    result_map.put(NE, bits_2_hash(d0h_bits, ip1_bits, j_in_d0h_bits));
    result_map.put(W, bits_2_hash(d0h_bits, im1_bits, jp1_bits));
    result_map.put(NW, bits_2_hash(d0h_bits, i_in_d0h_bits, jp1_bits));
    result_map.put(N, bits_2_hash(d0h_bits, ip1_bits, jp1_bits));
  }

  fn edge_cell_neighbours(&self, hash: u64, result_map: &mut MainWindMap<u64>) {
    let HashParts { d0h, i, j } = self.decode_hash(hash);
    for dir in MainWind::NEIGHBOURS {
      result_map.put_opt(dir, self.neighbour_from_parts(d0h, i, j, dir));
    }
  }

  fn neighbour_from_parts(&self, d0h: u8, i: u32, j: u32, dir: MainWind) -> Option<u64> {
    let i = (i as i32) + (dir.offset_se() as i32);
    let j = (j as i32) + (dir.offset_sw() as i32);
    let d0_neighbour_dir = MainWind::from_offsets(
      self.neighbour_base_cell_offset(i),
      self.neighbour_base_cell_offset(j),
    );
    self.neighbour_from_shifted_coos(d0h, i as u32, j as u32, d0_neighbour_dir)
  }

  /// This method has a single input parameters `coo` which must be in `[-1, nside]`, and returns:
  /// - -1 if `coo` == -1
  /// -  0 if `coo` in `[0, nside[`
  /// -  1 if `coo` == nside
  #[inline]
  fn neighbour_base_cell_offset(&self, coo_in_base_cell: i32) -> i8 {
    debug_assert!(-1_i32 <= coo_in_base_cell && coo_in_base_cell <= (self.nside as i32));
    (coo_in_base_cell >> 31 | coo_in_base_cell >> self.depth) as i8
  }

  /// `i` and `j` may be out of the base cell (`-1` wrapped to `u32::MAX`, or `nside`): they are
  /// only used when the neighbour is in the same base cell or along the shared edge.
  #[inline]
  fn neighbour_from_shifted_coos(
    &self,
    d0h: u8,
    i: u32,
    j: u32,
    base_cell_neighbour_dir: MainWind,
  ) -> Option<u64> {
    if base_cell_neighbour_dir == MainWind::C {
      Some(self.build_hash_from_parts(d0h, i, j))
    } else {
      let d0h_mod_4 = div4_remainder(d0h);
      match div4_quotient(d0h) {
        0 => self.npc_neighbour(d0h_mod_4, i, j, base_cell_neighbour_dir),
        1 => self.eqr_neighbour(d0h_mod_4, i, j, base_cell_neighbour_dir),
        _ => self.spc_neighbour(d0h_mod_4, i, j, base_cell_neighbour_dir),
      }
    }
  }

  // Base cell adjacency, one function per latitude band:
  // (direction of the neighbour base cell) -> (neighbour base cell, coordinates in it).

  #[inline]
  fn npc_neighbour(&self, d0h_mod_4: u8, i: u32, j: u32, base_cell_neighbour_dir: MainWind) -> Option<u64> {
    let m = self.nside_minus_1;
    match base_cell_neighbour_dir {
      S => Some(self.build_hash_from_parts(base_cell(iden(d0h_mod_4), 2), m, m)),
      SE => Some(self.build_hash_from_parts(base_cell(next(d0h_mod_4), 1), i, m)),
      SW => Some(self.build_hash_from_parts(base_cell(iden(d0h_mod_4), 1), m, j)),
      NE => Some(self.build_hash_from_parts(base_cell(next(d0h_mod_4), 0), j, m)),
      NW => Some(self.build_hash_from_parts(base_cell(prev(d0h_mod_4), 0), m, i)),
      N => Some(self.build_hash_from_parts(base_cell(oppo(d0h_mod_4), 0), m, m)),
      _ => None,
    }
  }

  #[inline]
  fn eqr_neighbour(&self, d0h_mod_4: u8, i: u32, j: u32, base_cell_neighbour_dir: MainWind) -> Option<u64> {
    let m = self.nside_minus_1;
    match base_cell_neighbour_dir {
      SE => Some(self.build_hash_from_parts(base_cell(iden(d0h_mod_4), 2), i, m)),
      E => Some(self.build_hash_from_parts(base_cell(next(d0h_mod_4), 1), 0, m)),
      SW => Some(self.build_hash_from_parts(base_cell(prev(d0h_mod_4), 2), m, j)),
      NE => Some(self.build_hash_from_parts(base_cell(iden(d0h_mod_4), 0), 0, j)),
      W => Some(self.build_hash_from_parts(base_cell(prev(d0h_mod_4), 1), m, 0)),
      NW => Some(self.build_hash_from_parts(base_cell(prev(d0h_mod_4), 0), i, 0)),
      _ => None,
    }
  }

  #[inline]
  fn spc_neighbour(&self, d0h_mod_4: u8, i: u32, j: u32, base_cell_neighbour_dir: MainWind) -> Option<u64> {
    match base_cell_neighbour_dir {
      S => Some(self.build_hash_from_parts(base_cell(oppo(d0h_mod_4), 2), 0, 0)),
      SE => Some(self.build_hash_from_parts(base_cell(next(d0h_mod_4), 2), 0, i)),
      SW => Some(self.build_hash_from_parts(base_cell(prev(d0h_mod_4), 2), j, 0)),
      NE => Some(self.build_hash_from_parts(base_cell(next(d0h_mod_4), 1), 0, j)),
      NW => Some(self.build_hash_from_parts(base_cell(iden(d0h_mod_4), 1), i, 0)),
      N => Some(self.build_hash_from_parts(base_cell(iden(d0h_mod_4), 0), 0, 0)),
      _ => None,
    }
  }
}

/// Base cell number from the `(i, j)` base cell coordinates of the rotated equatorial frame.
/// `(i, j)` must come from a cell centre: boundaries are not handled.
#[inline]
fn depth0_hash_unsafe(i: u8, j: u8) -> u8 {
  let k = 5_i8 - (i + j) as i8;
  ((k << 2) + (((i as i8) + ((k - 1) >> 7)) & 3_i8)) as u8
}

#[inline]
const fn rotate45_scale2(i_in_d0h: u32, j_in_d0h: u32) -> (i32, i32) {
  (i_in_d0h as i32 - j_in_d0h as i32, (i_in_d0h + j_in_d0h) as i32)
}

/// offset_x in [0, 7], odd for polar caps, even for equatorial region
/// offset_y in [-1, 1], -1 or 1 for polar caps, 0 for equatorial region
#[inline]
const fn compute_base_cell_center_offsets_in_8x3_grid(d0h: u8) -> (u8, i8) {
  let offset_y = 1 - div4_quotient(d0h) as i8;
  let mut offset_x = (div4_remainder(d0h)) << 1u8;
  // +1 if the base cell is not equatorial
  offset_x |= (offset_y & 1_i8) as u8;
  (offset_x, offset_y)
}

#[inline]
fn apply_base_cell_center_offsets(xy: &mut (f64, f64), offset_x: u8, offset_y: i8) {
  let (ref mut x, ref mut y) = *xy;
  *x += offset_x as f64;
  *y += offset_y as f64;
  // If x < 0, then x += 8; (happens only in case of base cell 4)
  *x += ((f64::to_bits(*x) & F64_SIGN_BIT_MASK) >> 60) as f64;
}

#[inline]
const fn bits_2_hash(d0h_bits: u64, i_in_d0h_bits: u64, j_in_d0h_bits: u64) -> u64 {
  d0h_bits | i_in_d0h_bits | j_in_d0h_bits
}

/// x / 2
#[inline]
fn div2_quotient<T: Shr<u8, Output = T>>(x: T) -> T {
  x.shr(1)
}

/// x modulo 2
#[inline]
const fn div2_remainder(x: u64) -> u64 {
  x & 1
}

/// x / 4
#[inline]
const fn div4_quotient(x: u8) -> u8 {
  x >> 2
}

/// x modulo 4
#[inline]
const fn div4_remainder(x: u8) -> u8 {
  x & 3
}

/// mask ...010101
/// ```rust
/// use hpxcore::nested::x_mask;
/// assert_eq!(x_mask(3), 0b00010101);
/// assert_eq!(x_mask(0), 0);
/// ```
#[inline]
pub const fn x_mask(depth: u8) -> u64 {
  0x0555555555555555_u64 >> (60 - (depth << 1))
}

/// mask ...101010
/// ```rust
/// use hpxcore::nested::{y_mask, x_mask};
/// assert_eq!(y_mask(3), 0b00101010);
/// assert_eq!(y_mask(3), x_mask(3) << 1);
/// ```
#[inline]
pub const fn y_mask(depth: u8) -> u64 {
  0x0AAAAAAAAAAAAAAA_u64 >> (60 - (depth << 1))
}

/// mask ...111111
/// ```rust
/// use hpxcore::nested::xy_mask;
/// assert_eq!(xy_mask(3), 0b00111111);
/// ```
#[inline]
pub const fn xy_mask(depth: u8) -> u64 {
  (1_u64 << (depth << 1)) - 1_u64
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ring;

  #[test]
  fn testok_layers() {
    for depth in 0..=DEPTH_MAX {
      let layer = get(depth);
      assert_eq!(depth, layer.depth());
      assert_eq!(1_f64 / layer.nside() as f64, layer.one_over_nside);
      assert_eq!(layer.xy_mask, layer.x_mask | layer.y_mask);
      assert_eq!(layer.n_hash - 1, (11 << layer.twice_depth) | layer.xy_mask);
    }
  }

  #[test]
  fn testok_hash_d0() {
    let layer = get(0);
    assert_eq!(4_u64, layer.hash(0.0_f64.to_radians(), 0.0_f64.to_radians()));
    assert_eq!(5_u64, layer.hash(90.0_f64.to_radians(), 0.0_f64.to_radians()));
    assert_eq!(6_u64, layer.hash(180.0_f64.to_radians(), 0.0_f64.to_radians()));
    assert_eq!(7_u64, layer.hash(270.0_f64.to_radians(), 0.0_f64.to_radians()));

    assert_eq!(0_u64, layer.hash(45.0_f64.to_radians(), 41.0_f64.to_radians()));
    assert_eq!(1_u64, layer.hash(135.0_f64.to_radians(), 41.0_f64.to_radians()));
    assert_eq!(2_u64, layer.hash(225.0_f64.to_radians(), 41.0_f64.to_radians()));
    assert_eq!(3_u64, layer.hash(315.0_f64.to_radians(), 41.0_f64.to_radians()));

    assert_eq!(8_u64, layer.hash(45.0_f64.to_radians(), -41.0_f64.to_radians()));
    assert_eq!(9_u64, layer.hash(135.0_f64.to_radians(), -41.0_f64.to_radians()));
    assert_eq!(10_u64, layer.hash(225.0_f64.to_radians(), -41.0_f64.to_radians()));
    assert_eq!(11_u64, layer.hash(315.0_f64.to_radians(), -41.0_f64.to_radians()));
  }

  #[test]
  fn testok_hash() {
    let layer = get(3);
    let hash = layer.hash(333.5982493968911_f64.to_radians(), -25.919634217871433_f64.to_radians());
    assert_eq!(735_u64, hash);
  }

  #[test]
  fn testok_hash_negative_lon() {
    let layer = get(5);
    for lon in [-0.1, -1.0, -3.0, -6.0] {
      for lat in [-1.2, -0.3, 0.0, 0.5, 1.5] {
        assert_eq!(layer.hash(lon + super::super::TWICE_PI, lat), layer.hash(lon, lat));
      }
    }
  }

  #[test]
  fn testok_poles() {
    for depth in [0_u8, 1, 4, 13, 29] {
      let layer = get(depth);
      let m = layer.nside_minus_1;
      let north = layer.hash(0.3, std::f64::consts::FRAC_PI_2);
      assert_eq!(HashParts { d0h: 0, i: m, j: m }, layer.decode_hash(north));
      let south = layer.hash(0.3, -std::f64::consts::FRAC_PI_2);
      assert_eq!(HashParts { d0h: 8, i: 0, j: 0 }, layer.decode_hash(south));
    }
  }

  #[test]
  fn testok_center_hash() {
    for depth in 0..=6 {
      let layer = get(depth);
      for h in 0..layer.n_hash() {
        let (lon, lat) = layer.center(h);
        assert!((0.0..super::super::TWICE_PI).contains(&lon));
        assert_eq!(h, layer.hash(lon, lat), "depth: {}, lon: {}, lat: {}", depth, lon, lat);
      }
    }
    for depth in [12_u8, 13, 20, 29] {
      let layer = get(depth);
      for h in (0..layer.n_hash()).step_by((layer.n_hash() / 9973) as usize) {
        let (lon, lat) = layer.center(h);
        assert_eq!(h, layer.hash(lon, lat), "depth: {}, hash: {}", depth, h);
      }
    }
  }

  #[test]
  fn testok_to_ring_from_ring_bijection() {
    for depth in 0..=6 {
      let layer = get(depth);
      let mut seen = vec![false; layer.n_hash() as usize];
      for h in 0..layer.n_hash() {
        let r = layer.to_ring(h);
        assert!(r < layer.n_hash());
        assert!(!seen[r as usize]);
        seen[r as usize] = true;
        assert_eq!(h, layer.from_ring(r));
      }
    }
    let layer = get(DEPTH_MAX);
    for h in [0, 1, 4611686018427387903, 1729382256910270463, layer.n_hash() - 1] {
      assert_eq!(h, layer.from_ring(layer.to_ring(h)));
    }
  }

  #[test]
  fn testok_to_ring_equals_face_decomposition() {
    for depth in 0..=5 {
      let layer = get(depth);
      for h in 0..layer.n_hash() {
        let HashParts { d0h, i, j } = layer.decode_hash(h);
        assert_eq!(ring::hash_from_parts(layer.nside(), d0h, i, j), layer.to_ring(h));
      }
    }
  }

  #[test]
  fn testok_neighbours_d0() {
    let layer = get(0);
    let n = |h: u64| layer.neighbours(h, false).neighbours();
    assert_eq!(
      [Some(8), Some(5), None, Some(4), Some(1), None, Some(3), Some(2)],
      n(0)
    );
    assert_eq!(
      [None, Some(8), Some(5), Some(11), Some(0), Some(7), Some(3), None],
      n(4)
    );
    assert_eq!(
      [Some(10), Some(9), None, Some(11), Some(5), None, Some(4), Some(0)],
      n(8)
    );
    for h in 0..12 {
      assert_eq!(6, layer.neighbours(h, false).len());
      assert_eq!(7, layer.neighbours(h, true).len());
    }
  }

  #[test]
  fn testok_neighbours_symmetric() {
    for depth in 1..=5 {
      let layer = get(depth);
      let mut n_with_7 = 0;
      for h in 0..layer.n_hash() {
        let neigs = layer.neighbours(h, false).entries();
        match neigs.len() {
          8 => {}
          7 => n_with_7 += 1,
          n => panic!("depth: {}, hash: {}, n neighbours: {}", depth, h, n),
        }
        let mut values: Vec<u64> = neigs.iter().map(|(_, v)| *v).collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(neigs.len(), values.len());
        for (_, v) in neigs {
          assert_ne!(h, v);
          assert!(
            layer.neighbours(v, false).entries().iter().any(|(_, vv)| *vv == h),
            "depth: {}, {} in neighbours of {} but not the reverse",
            depth,
            v,
            h
          );
        }
      }
      assert_eq!(24, n_with_7);
    }
  }

  #[test]
  fn testok_neighbours_inner() {
    let layer = get(2);
    // d0h = 5, i = 1, j = 2
    let h = layer.build_hash_from_parts(5, 1, 2);
    let neigs = layer.neighbours(h, true);
    assert_eq!(Some(&h), neigs.get(MainWind::C));
    assert_eq!(Some(&layer.build_hash_from_parts(5, 0, 1)), neigs.get(MainWind::S));
    assert_eq!(Some(&layer.build_hash_from_parts(5, 2, 3)), neigs.get(MainWind::N));
    assert_eq!(Some(&layer.build_hash_from_parts(5, 2, 1)), neigs.get(MainWind::E));
    assert_eq!(Some(&layer.build_hash_from_parts(5, 0, 3)), neigs.get(MainWind::W));
    assert_eq!(Some(layer.build_hash_from_parts(5, 1, 1)), layer.neighbour(h, MainWind::SE));
  }
}
