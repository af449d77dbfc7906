//! Euclidean coordinates of directions on the unit sphere and the associated geometry.
//!
//! Angles of the public functions are the colatitude `theta` and the longitude `phi`,
//! the methods of the traits work in longitude/latitude.

use std::f64::consts::FRAC_PI_2;

use crate::TWICE_PI;

/// A vector in the 3D Euclidean space, not necessarily of unit norm.
pub trait Vec3 {
  fn x(&self) -> f64;
  fn y(&self) -> f64;
  fn z(&self) -> f64;

  fn norm(&self) -> f64 {
    self.squared_norm().sqrt()
  }

  fn squared_norm(&self) -> f64 {
    squared_norm_of(self.x(), self.y(), self.z())
  }

  fn dot_product<V: Vec3>(&self, other: &V) -> f64 {
    self.x() * other.x() + self.y() * other.y() + self.z() * other.z()
  }

  /// Longitude in `[0, 2pi[` and latitude in `[-pi/2, pi/2]`, in radians.
  fn lonlat(&self) -> (f64, f64) {
    lonlat_of(self.x(), self.y(), self.z())
  }

  fn opposite(&self) -> Vect3 {
    Vect3::new(-self.x(), -self.y(), -self.z())
  }

  fn squared_euclidean_dist<V: Vec3>(&self, other: &V) -> f64 {
    pow2(self.x() - other.x()) + pow2(self.y() - other.y()) + pow2(self.z() - other.z())
  }

  fn euclidean_dist<V: Vec3>(&self, other: &V) -> f64 {
    self.squared_euclidean_dist(other).sqrt()
  }

  /// Components are NaN if the vector is null.
  #[inline]
  fn normalized(&self) -> UnitVect3 {
    let norm = self.norm();
    UnitVect3 {
      x: self.x() / norm,
      y: self.y() / norm,
      z: self.z() / norm,
    }
  }
}

// Apply to all references to a type that implements the Vec3 trait
impl<T> Vec3 for &T
where
  T: Vec3,
{
  #[inline]
  fn x(&self) -> f64 {
    Vec3::x(*self)
  }

  #[inline]
  fn y(&self) -> f64 {
    Vec3::y(*self)
  }

  #[inline]
  fn z(&self) -> f64 {
    Vec3::z(*self)
  }
}

impl Vec3 for [f64; 3] {
  #[inline]
  fn x(&self) -> f64 {
    self[0]
  }

  #[inline]
  fn y(&self) -> f64 {
    self[1]
  }

  #[inline]
  fn z(&self) -> f64 {
    self[2]
  }
}

/// A vector of unit norm.
pub trait UnitVec3: Vec3 {
  fn cross_prod_norm<T: UnitVec3>(&self, other: &T) -> f64 {
    let nx = self.y() * other.z() - self.z() * other.y();
    let ny = self.z() * other.x() - self.x() * other.z();
    let nz = self.x() * other.y() - self.y() * other.x();
    squared_norm_of(nx, ny, nz).sqrt()
  }

  /// Compute the angular distance between this vector and the other given vector
  fn ang_dist<T: UnitVec3>(&self, other: &T) -> f64 {
    let cos = self.dot_product(other);
    let sin = self.cross_prod_norm(other);
    debug_assert!(sin >= 0.0);
    // 2 * asin(0.5 * euclidean_dist) is unstable for angles near pi
    sin.atan2(cos)
  }

  fn to_struct(&self) -> UnitVect3 {
    UnitVect3 {
      x: self.x(),
      y: self.y(),
      z: self.z(),
    }
  }
}

#[inline]
fn pow2(x: f64) -> f64 {
  x * x
}

#[inline]
pub fn squared_norm_of(x: f64, y: f64, z: f64) -> f64 {
  pow2(x) + pow2(y) + pow2(z)
}

#[inline]
pub fn dot_product<T1, T2>(v1: &T1, v2: &T2) -> f64
where
  T1: Vec3,
  T2: Vec3,
{
  v1.x() * v2.x() + v1.y() * v2.y() + v1.z() * v2.z()
}

/// Standard cross product, no normalization.
///
/// ```rust
/// use hpxcore::cross_product;
/// use hpxcore::sph_geom::coo3d::Vec3;
///
/// let c = cross_product(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
/// assert_eq!((0.0, 0.0, 1.0), (c.x(), c.y(), c.z()));
/// let c = cross_product(&[2.0, 0.0, 0.0], &[0.0, 0.0, 3.0]);
/// assert_eq!([0.0, -6.0, 0.0], c.to_array());
/// ```
#[inline]
pub fn cross_product<T1, T2>(v1: &T1, v2: &T2) -> Vect3
where
  T1: Vec3,
  T2: Vec3,
{
  Vect3::new(
    v1.y() * v2.z() - v1.z() * v2.y(),
    v1.z() * v2.x() - v1.x() * v2.z(),
    v1.x() * v2.y() - v1.y() * v2.x(),
  )
}

/// Longitude in `[0, 2pi[` and latitude in `[-pi/2, pi/2]` of the given (not necessarily unit)
/// vector. A null vector has coordinates `(0, 0)`.
#[inline]
pub fn lonlat_of(x: f64, y: f64, z: f64) -> (f64, f64) {
  let mut lon = y.atan2(x);
  if lon < 0.0_f64 {
    lon += TWICE_PI;
  }
  if lon >= TWICE_PI {
    lon = 0.0;
  }
  let lat = z.atan2(x.hypot(y));
  debug_assert!((0.0..TWICE_PI).contains(&lon) || lon.is_nan());
  debug_assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&lat) || lat.is_nan());
  (lon, lat)
}

/// Unit vector of the given longitude and latitude, in radians.
#[inline]
pub fn vec3_of(lon: f64, lat: f64) -> UnitVect3 {
  let (sin_lon, cos_lon) = lon.sin_cos();
  let (sin_lat, cos_lat) = lat.sin_cos();
  UnitVect3 {
    x: cos_lat * cos_lon,
    y: cos_lat * sin_lon,
    z: sin_lat,
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vect3 {
  x: f64,
  y: f64,
  z: f64,
}

impl Vect3 {
  pub fn new(x: f64, y: f64, z: f64) -> Vect3 {
    Vect3 { x, y, z }
  }

  pub fn to_array(&self) -> [f64; 3] {
    [self.x, self.y, self.z]
  }
}

impl Vec3 for Vect3 {
  #[inline]
  fn x(&self) -> f64 {
    self.x
  }

  #[inline]
  fn y(&self) -> f64 {
    self.y
  }

  #[inline]
  fn z(&self) -> f64 {
    self.z
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitVect3 {
  x: f64,
  y: f64,
  z: f64,
}

impl UnitVect3 {
  /// The caller is responsible for providing a unit vector.
  #[inline]
  pub fn new_unsafe(x: f64, y: f64, z: f64) -> UnitVect3 {
    UnitVect3 { x, y, z }
  }

  pub fn to_array(&self) -> [f64; 3] {
    [self.x, self.y, self.z]
  }
}

impl Vec3 for UnitVect3 {
  #[inline]
  fn x(&self) -> f64 {
    self.x
  }

  #[inline]
  fn y(&self) -> f64 {
    self.y
  }

  #[inline]
  fn z(&self) -> f64 {
    self.z
  }
}

impl UnitVec3 for UnitVect3 {}

/// Unit vector `(sin(theta) cos(phi), sin(theta) sin(phi), cos(theta))`.
/// Out of range angles are not rejected.
///
/// ```rust
/// use hpxcore::ang2vec;
/// use std::f64::consts::{FRAC_PI_2, PI};
///
/// assert_eq!([0.0, 0.0, 1.0], ang2vec(0.0, 0.0));
/// let [x, y, z] = ang2vec(FRAC_PI_2, PI);
/// assert!((x + 1.0).abs() < 1e-15 && y.abs() < 1e-15 && z.abs() < 1e-15);
/// ```
#[inline]
pub fn ang2vec(theta: f64, phi: f64) -> [f64; 3] {
  let (sin_theta, cos_theta) = theta.sin_cos();
  let (sin_phi, cos_phi) = phi.sin_cos();
  [sin_theta * cos_phi, sin_theta * sin_phi, cos_theta]
}

/// Colatitude in `[0, pi]` and longitude in `[0, 2pi[` of the given vector, which need not be
/// normalized. `theta = atan2(sqrt(x^2 + y^2), z)`, equal to `acos(z / |v|)` but accurate near
/// the poles.
///
/// ```rust
/// use hpxcore::{ang2vec, vec2ang};
///
/// let (theta, phi) = vec2ang(&[0.0, -2.0, 0.0]);
/// assert!((theta - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
/// assert!((phi - 1.5 * std::f64::consts::PI).abs() < 1e-15);
/// let (theta, phi) = vec2ang(&ang2vec(0.3, 5.0));
/// assert!((theta - 0.3).abs() < 1e-15 && (phi - 5.0).abs() < 1e-14);
/// ```
#[inline]
pub fn vec2ang<V: Vec3>(v: &V) -> (f64, f64) {
  let mut phi = v.y().atan2(v.x());
  if phi < 0.0 {
    phi += TWICE_PI;
  }
  if phi >= TWICE_PI {
    phi = 0.0;
  }
  (v.x().hypot(v.y()).atan2(v.z()), phi)
}

/// Angular distance, in radians, between two vectors of any (non-null) norm:
/// `atan2(|a x b|, a . b)` on the normalized vectors.
///
/// ```rust
/// use hpxcore::ang_dist;
/// use std::f64::consts::PI;
///
/// let v = [0.3, -4.0, 1e-3];
/// assert_eq!(0.0, ang_dist(&v, &v));
/// assert_eq!(PI, ang_dist(&v, &[-0.3, 4.0, -1e-3]));
/// assert!((ang_dist(&[1.0, 0.0, 0.0], &[0.0, 1e100, 0.0]) - 0.5 * PI).abs() < 1e-15);
/// ```
#[inline]
pub fn ang_dist<V1: Vec3, V2: Vec3>(a: &V1, b: &V2) -> f64 {
  a.normalized().ang_dist(&b.normalized())
}

/// Straight line distance between the two given points.
#[inline]
pub fn euclidean_dist<V1: Vec3, V2: Vec3>(a: &V1, b: &V2) -> f64 {
  a.euclidean_dist(b)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::f64::consts::{FRAC_PI_4, PI};

  #[test]
  fn testok_ang2vec2ang() {
    for theta in (0..=18).map(|d| (d as f64 * 10.0).to_radians()) {
      for phi in (0..36).map(|d| (d as f64 * 10.0).to_radians()) {
        let v = ang2vec(theta, phi);
        assert!((v.norm() - 1.0).abs() < 1e-15);
        let (theta2, phi2) = vec2ang(&v);
        assert!((theta - theta2).abs() < 1e-14, "{} != {}", theta, theta2);
        if theta > 0.0 && theta < PI {
          assert!((phi - phi2).abs() < 1e-14, "{} != {}", phi, phi2);
        }
        let (theta3, phi3) = vec2ang(&[v[0] * 7.5, v[1] * 7.5, v[2] * 7.5]);
        assert!((theta2 - theta3).abs() < 1e-14 && (phi2 - phi3).abs() < 1e-14);
      }
    }
  }

  #[test]
  fn testok_vec2ang_null() {
    assert_eq!((0.0, 0.0), vec2ang(&[0.0, 0.0, 0.0]));
    assert_eq!((PI, 0.0), vec2ang(&[0.0, 0.0, -1.0]));
  }

  #[test]
  fn testok_phi_folded() {
    let (_, phi) = vec2ang(&[1.0, -1e-300, 0.0]);
    assert!((0.0..TWICE_PI).contains(&phi));
    let (_, phi) = vec2ang(&[-1.0, -0.0, 0.0]);
    assert!((0.0..TWICE_PI).contains(&phi));
  }

  #[test]
  fn testok_ang_dist() {
    let a = [1.0, 2.0, 3.0];
    let b = [-2.0, 0.5, 1.0];
    assert_eq!(0.0, ang_dist(&a, &a));
    assert_eq!(PI, ang_dist(&a, &a.opposite()));
    let expected = (dot_product(&a, &b) / (a.norm() * b.norm())).acos();
    assert!((ang_dist(&a, &b) - expected).abs() < 1e-14);
    assert!((ang_dist(&a, &b) - ang_dist(&[10.0, 20.0, 30.0], &b)).abs() < 1e-15);
    assert!((ang_dist(&[1.0, 0.0, 0.0], &[1.0, 1.0, 0.0]) - FRAC_PI_4).abs() < 1e-15);
    // Nearly parallel vectors, where acos(dot) returns 0
    let c = vec3_of(0.0, 0.0);
    let d = vec3_of(1e-9, 0.0);
    assert!((ang_dist(&c, &d) - 1e-9).abs() < 1e-20);
  }

  #[test]
  fn testok_euclidean_dist() {
    assert_eq!(5.0, euclidean_dist(&[0.0, 3.0, 0.0], &[4.0, 0.0, 0.0]));
    assert_eq!(2.0, euclidean_dist(&ang2vec(0.0, 0.0), &ang2vec(PI, 0.0)));
  }

  #[test]
  fn testok_cross_product() {
    let a = vec3_of(0.2, 0.3);
    let b = vec3_of(1.2, -0.5);
    let c = cross_product(&a, &b);
    assert!(dot_product(&c, &a).abs() < 1e-15);
    assert!(dot_product(&c, &b).abs() < 1e-15);
    assert!((c.norm() - a.ang_dist(&b).sin()).abs() < 1e-15);
  }

  #[test]
  fn testok_lonlat() {
    let v = vec3_of(4.0, -1.1);
    let (lon, lat) = v.lonlat();
    assert!((lon - 4.0).abs() < 1e-15 && (lat + 1.1).abs() < 1e-15);
    assert_eq!(v, v.to_struct());
  }
}
