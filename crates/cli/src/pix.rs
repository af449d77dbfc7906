//! Pixel index computations, in the RING or NESTED scheme, with 64-bit indices.

use std::{
  error::Error,
  io::{stdout, StdoutLock, Write},
};

use clap::Args;

use hpxlib::{
  ang2vec, ang_dist, nest2ring, neighbours_nest, npix2nside, nside2npix, ring2nest, HealpixError,
  Scheme, Sentinel,
};

use crate::input::{coo::CooInput, index::IndexInput, n_values};

/// Scheme and Nside common to all pixel index operations.
#[derive(Debug, Args)]
pub struct Grid {
  /// Nside of the HEALPix grid (power of 2 in the NESTED scheme)
  #[clap(value_name = "NSIDE")]
  nside: i64,
  /// Indexing scheme: 'ring' or 'nested'
  #[clap(short, long, default_value = "nested")]
  scheme: Scheme,
}
impl Grid {
  /// Fails early, before reading any input, if the Nside is not valid for the scheme.
  fn validate(&self) -> Result<(), HealpixError> {
    self.scheme.validate(self.nside)
  }
}

fn to_rad(deg: bool, angle: f64) -> f64 {
  if deg {
    angle.to_radians()
  } else {
    angle
  }
}

fn from_rad(deg: bool, angle: f64) -> f64 {
  if deg {
    angle.to_degrees()
  } else {
    angle
  }
}

/// Number of pixels of a grid of given Nside
#[derive(Debug, Args)]
pub struct Nside2Npix {
  #[clap(allow_negative_numbers = true)]
  nside: i64,
}
impl Nside2Npix {
  pub fn exec(self) -> Result<(), Box<dyn Error>> {
    let npix = nside2npix(self.nside)?;
    writeln!(stdout(), "{}", npix).map_err(|e| e.into())
  }
}

/// Nside of a grid having the given number of pixels
#[derive(Debug, Args)]
pub struct Npix2Nside {
  #[clap(allow_negative_numbers = true)]
  npix: i64,
}
impl Npix2Nside {
  pub fn exec(self) -> Result<(), Box<dyn Error>> {
    let nside = npix2nside(self.npix)?;
    writeln!(stdout(), "{}", nside).map_err(|e| e.into())
  }
}

/// Index of the pixel containing the given position(s) `THETA PHI` (colatitude, longitude)
#[derive(Debug, Args)]
pub struct Ang2Pix {
  #[command(flatten)]
  grid: Grid,
  /// Angles in degrees instead of radians
  #[clap(long)]
  deg: bool,
  /// Print -1 instead of failing on invalid positions
  #[clap(long)]
  sentinel: bool,
  #[command(subcommand)]
  pos: CooInput,
}
impl Ang2Pix {
  pub fn exec(self) -> Result<(), Box<dyn Error>> {
    self.grid.validate()?;
    self.pos.exec(
      |values: &[f64], write: &mut StdoutLock<'static>, _sep: char| -> Result<(), Box<dyn Error>> {
        let [theta, phi] = n_values::<2>(values)?;
        let res = self
          .grid
          .scheme
          .ang2pix(self.grid.nside, to_rad(self.deg, theta), to_rad(self.deg, phi));
        let ipix = if self.sentinel { res.or_sentinel() } else { res? };
        write!(write, "{}", ipix).map_err(|e| e.into())
      },
    )
  }
}

/// Colatitude and longitude of the center of the given pixel(s)
#[derive(Debug, Args)]
pub struct Pix2Ang {
  #[command(flatten)]
  grid: Grid,
  /// Output angles in degrees instead of radians
  #[clap(long)]
  deg: bool,
  #[command(subcommand)]
  hash: IndexInput,
}
impl Pix2Ang {
  pub fn exec(self) -> Result<(), Box<dyn Error>> {
    self.grid.validate()?;
    self.hash.exec(
      |ipix: i64, write: &mut StdoutLock<'static>, sep: char| -> Result<(), Box<dyn Error>> {
        let (theta, phi) = self.grid.scheme.pix2ang(self.grid.nside, ipix)?;
        write!(
          write,
          "{:.15}{}{:.15}",
          from_rad(self.deg, theta),
          sep,
          from_rad(self.deg, phi)
        )
        .map_err(|e| e.into())
      },
    )
  }
}

/// Index of the pixel containing the given direction(s) `X Y Z` (need not be normalized)
#[derive(Debug, Args)]
pub struct Vec2Pix {
  #[command(flatten)]
  grid: Grid,
  #[command(subcommand)]
  vec: CooInput,
}
impl Vec2Pix {
  pub fn exec(self) -> Result<(), Box<dyn Error>> {
    self.grid.validate()?;
    self.vec.exec(
      |values: &[f64], write: &mut StdoutLock<'static>, _sep: char| -> Result<(), Box<dyn Error>> {
        let v = n_values::<3>(values)?;
        let ipix = self.grid.scheme.vec2pix(self.grid.nside, &v)?;
        write!(write, "{}", ipix).map_err(|e| e.into())
      },
    )
  }
}

/// Unit vector of the center of the given pixel(s)
#[derive(Debug, Args)]
pub struct Pix2Vec {
  #[command(flatten)]
  grid: Grid,
  #[command(subcommand)]
  hash: IndexInput,
}
impl Pix2Vec {
  pub fn exec(self) -> Result<(), Box<dyn Error>> {
    self.grid.validate()?;
    self.hash.exec(
      |ipix: i64, write: &mut StdoutLock<'static>, sep: char| -> Result<(), Box<dyn Error>> {
        let [x, y, z] = self.grid.scheme.pix2vec(self.grid.nside, ipix)?;
        write!(write, "{:+.15}{}{:+.15}{}{:+.15}", x, sep, y, sep, z).map_err(|e| e.into())
      },
    )
  }
}

/// Conversion of pixel indices from one scheme to the other (power of 2 Nside only)
#[derive(Debug, Args)]
pub struct Convert {
  /// Nside of the HEALPix grid (power of 2)
  nside: i64,
  /// Print -1 instead of failing on invalid indices
  #[clap(long)]
  sentinel: bool,
  #[command(subcommand)]
  hash: IndexInput,
}
impl Convert {
  pub fn exec(self, from: Scheme) -> Result<(), Box<dyn Error>> {
    Scheme::Nested.validate(self.nside)?;
    let f: fn(i64, i64) -> Result<i64, HealpixError> = match from {
      Scheme::Ring => ring2nest::<i64>,
      Scheme::Nested => nest2ring::<i64>,
    };
    self.hash.exec(
      |ipix: i64, write: &mut StdoutLock<'static>, _sep: char| -> Result<(), Box<dyn Error>> {
        let res = f(self.nside, ipix);
        let converted = if self.sentinel { res.or_sentinel() } else { res? };
        write!(write, "{}", converted).map_err(|e| e.into())
      },
    )
  }
}

/// Indices of the neighbours (S, SE, E, SW, NE, W, NW, N) of the given pixel(s), -1 if missing
#[derive(Debug, Args)]
pub struct Neighbours {
  #[command(flatten)]
  grid: Grid,
  #[command(subcommand)]
  hash: IndexInput,
}
impl Neighbours {
  pub fn exec(self) -> Result<(), Box<dyn Error>> {
    Scheme::Nested.validate(self.grid.nside)?;
    let nside = self.grid.nside;
    let scheme = self.grid.scheme;
    self.hash.exec(
      |ipix: i64, write: &mut StdoutLock<'static>, sep: char| -> Result<(), Box<dyn Error>> {
        let neigh = neighbours(scheme, nside, ipix)?;
        write!(write, "{}", neigh[0])?;
        for h in &neigh[1..] {
          write!(write, "{}{}", sep, h)?;
        }
        Ok(())
      },
    )
  }
}

/// Neighbours in the given scheme, computed in the NESTED scheme.
fn neighbours(scheme: Scheme, nside: i64, ipix: i64) -> Result<[i64; 8], HealpixError> {
  match scheme {
    Scheme::Nested => neighbours_nest(nside, ipix),
    Scheme::Ring => {
      let mut neigh = neighbours_nest(nside, ring2nest(nside, ipix)?)?;
      for h in neigh.iter_mut().filter(|h| **h >= 0) {
        *h = nest2ring(nside, *h)?;
      }
      Ok(neigh)
    }
  }
}

/// Angular distance between two positions `THETA1 PHI1 THETA2 PHI2`
#[derive(Debug, Args)]
pub struct AngDist {
  /// Input and output angles in degrees instead of radians
  #[clap(long)]
  deg: bool,
  #[command(subcommand)]
  pos: CooInput,
}
impl AngDist {
  pub fn exec(self) -> Result<(), Box<dyn Error>> {
    self.pos.exec(
      |values: &[f64], write: &mut StdoutLock<'static>, _sep: char| -> Result<(), Box<dyn Error>> {
        let [t1, p1, t2, p2] = n_values::<4>(values)?.map(|a| to_rad(self.deg, a));
        let d = ang_dist(&ang2vec(t1, p1), &ang2vec(t2, p2));
        write!(write, "{:.15}", from_rad(self.deg, d)).map_err(|e| e.into())
      },
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn testok_neighbours_ring() {
    let nest = neighbours(Scheme::Nested, 4, 3).unwrap();
    let ring = neighbours(Scheme::Ring, 4, nest2ring(4, 3).unwrap()).unwrap();
    for (n, r) in nest.iter().zip(ring.iter()) {
      if *n < 0 {
        assert_eq!(-1, *r);
      } else {
        assert_eq!(nest2ring(4, *n).unwrap(), *r);
      }
    }
    // Missing neighbours stay missing
    let ring = neighbours(Scheme::Ring, 1, 0).unwrap();
    assert_eq!(2, ring.iter().filter(|h| **h == -1).count());
  }

  #[test]
  fn testerr_neighbours() {
    assert!(neighbours(Scheme::Ring, 3, 0).is_err());
    assert!(neighbours(Scheme::Nested, 4, 192).is_err());
  }
}
