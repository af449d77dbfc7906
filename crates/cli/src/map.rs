//! Operations on full sky HEALPix maps stored in FITS files.

use std::{
  error::Error,
  io::{stdout, Write},
  path::PathBuf,
};

use clap::Args;
use log::info;

use hpxlib::{
  fits::{get_fits_size, read_healpix_map, write_healpix_map},
  Scheme,
};

use super::get_thread_pool;

/// Prints the Nside, scheme and number of values of a map, reading only the FITS header.
#[derive(Debug, Args)]
pub struct Info {
  /// Path of the input map FITS file (possibly gzipped).
  #[clap(value_name = "FITS_FILE")]
  input: PathBuf,
  /// Also read the whole map, checking its values can be loaded, and print its coordinate system.
  #[clap(long)]
  full: bool,
}
impl Info {
  pub fn exec(self) -> Result<(), Box<dyn Error>> {
    let size = get_fits_size(&self.input)?;
    let mut handle = stdout().lock();
    writeln!(&mut handle, "nside: {}", size.nside)?;
    writeln!(&mut handle, "ordering: {}", size.scheme)?;
    writeln!(&mut handle, "n_values: {}", size.n_values)?;
    if self.full {
      let map = read_healpix_map(&self.input)?;
      writeln!(&mut handle, "coordsys: {}", map.coordsys())?;
    }
    Ok(())
  }
}

/// Re-orders the values of a map from one scheme to the other.
#[derive(Debug, Args)]
pub struct Reorder {
  /// Path of the input map FITS file (possibly gzipped).
  #[clap(value_name = "IN_FILE")]
  input: PathBuf,
  /// Path of the output FITS file.
  #[clap(value_name = "OUT_FILE")]
  output: PathBuf,
  /// Target scheme: 'ring' or 'nested' [default: the scheme the input map is not in]
  #[clap(short, long)]
  scheme: Option<Scheme>,
  /// Set the number of threads [default: use all available threads]
  #[clap(long, value_name = "N")]
  parallel: Option<usize>,
}
impl Reorder {
  pub fn exec(self) -> Result<(), Box<dyn Error>> {
    let map = read_healpix_map(&self.input)?;
    let target = self.scheme.unwrap_or(match map.scheme() {
      Scheme::Ring => Scheme::Nested,
      Scheme::Nested => Scheme::Ring,
    });
    info!(
      "Reorder map of Nside {} from {} to {}",
      map.nside(),
      map.scheme(),
      target
    );
    let thread_pool = get_thread_pool(self.parallel)?;
    let reordered = thread_pool.install(|| map.to_scheme(target))?;
    write_healpix_map(self.output, &reordered).map_err(|e| e.into())
  }
}
