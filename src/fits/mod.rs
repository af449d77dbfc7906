//! Full sky HEALPix maps stored in FITS BINTABLE extensions, as written by the HEALPix libraries.
//!
//! ```rust
//! use std::io::{BufReader, Cursor};
//! use hpxcore::{
//!   fits::{get_fits_size_from, read_healpix_map_from, write_healpix_map_to, CoordSys, HealpixMap},
//!   Scheme,
//! };
//!
//! let map = HealpixMap::new((0..48).map(|i| i as f32).collect(), Scheme::Ring, CoordSys::Gal).unwrap();
//! let mut buf: Vec<u8> = Vec::new();
//! write_healpix_map_to(&mut buf, &map).unwrap();
//!
//! let size = get_fits_size_from(BufReader::new(Cursor::new(&buf))).unwrap();
//! assert_eq!((2, Scheme::Ring, 48), (size.nside, size.scheme, size.n_values));
//! assert_eq!(map, read_healpix_map_from(BufReader::new(Cursor::new(&buf))).unwrap());
//! ```

use log::debug;
use rayon::prelude::*;

use crate::{npix2nside, HealpixError, Scheme};

pub mod error;
pub mod keywords;
pub mod read;
pub mod write;

pub use error::FitsError;
pub use keywords::CoordSys;
pub use read::{get_fits_size, get_fits_size_from, read_healpix_map, read_healpix_map_from};
pub use write::{write_healpix_map, write_healpix_map_to};

/// Value of a pixel with no data.
pub const UNSEEN: f32 = -1.6375e30;

/// Content of the header of an HEALPix FITS file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitsSize {
  pub nside: u32,
  pub scheme: Scheme,
  /// Number of values in the first column, i.e. `12 * nside^2`
  pub n_values: u64,
}

/// A full sky map: one `f32` value per HEALPix pixel, stored in the order of the map scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct HealpixMap {
  nside: u32,
  scheme: Scheme,
  coordsys: CoordSys,
  values: Vec<f32>,
}

impl HealpixMap {
  /// # Errors
  /// * if the number of values is not a valid number of pixels
  /// * if the scheme is NESTED and the Nside deduced from the number of values is not a power of 2
  pub fn new(values: Vec<f32>, scheme: Scheme, coordsys: CoordSys) -> Result<Self, FitsError> {
    let nside = npix2nside(values.len() as i64)?;
    scheme.validate(nside)?;
    Ok(Self {
      nside: nside as u32,
      scheme,
      coordsys,
      values,
    })
  }

  /// Map of the given Nside in which all pixels have the [UNSEEN](constant.UNSEEN.html) value.
  pub fn unseen(nside: u32, scheme: Scheme, coordsys: CoordSys) -> Result<Self, FitsError> {
    scheme.validate(nside as i64)?;
    let n_hash = crate::ring::n_hash(nside) as usize;
    Ok(Self {
      nside,
      scheme,
      coordsys,
      values: vec![UNSEEN; n_hash],
    })
  }

  pub fn nside(&self) -> u32 {
    self.nside
  }

  pub fn scheme(&self) -> Scheme {
    self.scheme
  }

  pub fn coordsys(&self) -> CoordSys {
    self.coordsys
  }

  pub fn values(&self) -> &[f32] {
    &self.values
  }

  pub fn into_values(self) -> Vec<f32> {
    self.values
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  /// Always `false`: a map contains at least 12 values.
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Value of the pixel of index `ipix` in the given scheme (not necessarily the map scheme).
  pub fn value(&self, scheme: Scheme, ipix: i64) -> Result<f32, HealpixError> {
    scheme
      .convert(self.scheme, self.nside as i64, ipix)
      .map(|i| self.values[i as usize])
  }

  /// Value of the pixel containing the given position.
  pub fn value_at(&self, theta: f64, phi: f64) -> Result<f32, HealpixError> {
    self
      .scheme
      .ang2pix(self.nside as i64, theta, phi)
      .map(|i| self.values[i as usize])
  }

  /// Returns the same map with values re-ordered according to the `target` scheme.
  ///
  /// # Errors
  /// If `target` is NESTED and the Nside of the map is not a power of 2.
  pub fn to_scheme(&self, target: Scheme) -> Result<HealpixMap, HealpixError> {
    if target == self.scheme {
      return Ok(self.clone());
    }
    target.validate(self.nside as i64)?;
    debug!(
      "Reorder map of Nside {} from {} to {}.",
      self.nside, self.scheme, target
    );
    let nside = self.nside as i64;
    let values = (0..self.values.len() as i64)
      .into_par_iter()
      .map(|ipix| {
        target
          .convert(self.scheme, nside, ipix)
          .map(|i| self.values[i as usize])
      })
      .collect::<Result<Vec<f32>, HealpixError>>()?;
    Ok(HealpixMap {
      nside: self.nside,
      scheme: target,
      coordsys: self.coordsys,
      values,
    })
  }
}
