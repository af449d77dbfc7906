use thiserror::Error;

/// Errors of the pixelization core.
///
/// `InvalidNside`, `NsideNotPowerOfTwo` and `InvalidNpix` are the three flavours of an invalid
/// resolution; `InvalidIndex` is a pixel index out of `[0, npix[`.
/// An absent neighbour is not an error (see [neighbours_nest](../scheme/fn.neighbours_nest.html)).
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum HealpixError {
  #[error("Wrong Nside. Expected: value in [1, {nside_max}]. Actual: {nside}.")]
  InvalidNside { nside: i64, nside_max: i64 },
  #[error("Wrong Nside for the NESTED scheme. Expected: a power of 2. Actual: {0}.")]
  NsideNotPowerOfTwo(i64),
  #[error("Wrong Npix. Expected: 12 * Nside^2. Actual: {0}.")]
  InvalidNpix(i64),
  #[error("Wrong pixel index. Expected: value in [0, {npix}[. Actual: {ipix}.")]
  InvalidIndex { ipix: i64, npix: i64 },
  #[error("Wrong colatitude. Expected: value in [0, pi]. Actual: {0}.")]
  InvalidColatitude(f64),
  #[error("Wrong longitude. Expected: a finite value. Actual: {0}.")]
  InvalidLongitude(f64),
  #[error("Wrong vector. Expected: finite non-null components.")]
  InvalidVector,
}

impl HealpixError {
  /// `true` for the errors related to the resolution parameter (Nside or Npix).
  pub fn is_invalid_resolution(&self) -> bool {
    matches!(
      self,
      Self::InvalidNside { .. } | Self::NsideNotPowerOfTwo(_) | Self::InvalidNpix(_)
    )
  }
}
