use std::{io, num::ParseIntError};

use thiserror::Error;

use crate::HealpixError;

#[derive(Error, Debug)]
pub enum FitsError {
  /// IO error
  #[error("I/O error.")]
  Io(#[from] io::Error),
  #[error("I/O error. Path: {path:}. Error: {err:?}.")]
  IoWithPath { path: String, err: io::Error },
  #[error("Wrong FITS keyword. Expected: {expected:?}. Actual: {actual:?}).")]
  UnexpectedKeyword { expected: String, actual: String },
  #[error("Value indicator not found in keyword record '{keyword_record:?}'.")]
  ValueIndicatorNotFound { keyword_record: String },
  #[error("Wrong value for keyword '{keyword:}'. Expected: '{expected:}'. Actual: '{actual:}'.")]
  UnexpectedValue {
    keyword: String,
    expected: String,
    actual: String,
  },
  #[error("Unsigned int value not found in keyword record '{keyword_record:}'.")]
  UintValueNotFound { keyword_record: String },
  #[error("String value no found in keyword record '{keyword_record:}'.")]
  StringValueNotFound { keyword_record: String },
  #[error("Parse {context:}. Error: {err:?}")]
  WrongUintValue { context: String, err: ParseIntError },
  #[error("Missing keyword '{keyword:}'.")]
  MissingKeyword { keyword: String },
  #[error("Less data than expected!")]
  PrematureEndOfData,
  #[error("HEALPix error: {0}")]
  Healpix(#[from] HealpixError),
  #[error("FITS not valid: '{msg:}'.")]
  Custom { msg: String },
}

impl FitsError {
  pub fn new_custom(msg: String) -> Self {
    Self::Custom { msg }
  }

  /// Turns an unexpected end of file into [PrematureEndOfData](#variant.PrematureEndOfData).
  pub(super) fn from_data_io(err: io::Error) -> Self {
    if err.kind() == io::ErrorKind::UnexpectedEof {
      Self::PrematureEndOfData
    } else {
      Self::Io(err)
    }
  }
}
