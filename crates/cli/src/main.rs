use std::error::Error;

use clap::Parser;

use hpxlib::Scheme;

use hpx_cli::{
  map::{Info, Reorder},
  pix::{
    AngDist, Ang2Pix, Convert, Neighbours, Npix2Nside, Nside2Npix, Pix2Ang, Pix2Vec, Vec2Pix,
  },
};

// Avoid musl's default allocator due to lackluster performance
// https://nickb.dev/blog/default-musl-allocator-considered-harmful-to-performance
#[cfg(all(target_env = "musl", target_arch = "x86_64"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Perform HEALPix related operations on the command line.
/// Pixel indices are 64-bit integers; angles are the colatitude (theta) and longitude (phi).
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
enum Args {
  /// Number of pixels of a given Nside
  #[clap(name = "nside2npix")]
  Nside2Npix(Nside2Npix),
  /// Nside of a given number of pixels
  #[clap(name = "npix2nside")]
  Npix2Nside(Npix2Nside),
  #[clap(name = "ang2pix")]
  Ang2Pix(Ang2Pix),
  #[clap(name = "pix2ang")]
  Pix2Ang(Pix2Ang),
  #[clap(name = "vec2pix")]
  Vec2Pix(Vec2Pix),
  #[clap(name = "pix2vec")]
  Pix2Vec(Pix2Vec),
  /// RING to NESTED pixel indices
  #[clap(name = "ring2nest")]
  Ring2Nest(Convert),
  /// NESTED to RING pixel indices
  #[clap(name = "nest2ring")]
  Nest2Ring(Convert),
  Neighbours(Neighbours),
  #[clap(name = "angdist")]
  AngDist(AngDist),
  #[clap(name = "map-info")]
  MapInfo(Info),
  #[clap(name = "map-reorder")]
  MapReorder(Reorder),
}

impl Args {
  fn exec(self) -> Result<(), Box<dyn Error>> {
    match self {
      Self::Nside2Npix(e) => e.exec(),
      Self::Npix2Nside(e) => e.exec(),
      Self::Ang2Pix(e) => e.exec(),
      Self::Pix2Ang(e) => e.exec(),
      Self::Vec2Pix(e) => e.exec(),
      Self::Pix2Vec(e) => e.exec(),
      Self::Ring2Nest(e) => e.exec(Scheme::Ring),
      Self::Nest2Ring(e) => e.exec(Scheme::Nested),
      Self::Neighbours(e) => e.exec(),
      Self::AngDist(e) => e.exec(),
      Self::MapInfo(e) => e.exec(),
      Self::MapReorder(e) => e.exec(),
    }
  }
}

fn main() -> Result<(), Box<dyn Error>> {
  env_logger::init();
  let args = Args::parse();
  args.exec()
}
