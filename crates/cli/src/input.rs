//! Values read either from the command line or from a file (or stdin), one item per line.

use std::{
  fs::File,
  io::{stdin, BufRead, BufReader},
  path::Path,
};

use thiserror::Error;

pub mod coo;
pub mod index;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("Wrong number of values in '{line}'. Expected: {expected}. Actual: {actual}.")]
  WrongNumberOfValues {
    line: String,
    expected: usize,
    actual: usize,
  },
  #[error("Unable to parse '{value}' in line '{line}'.")]
  ParseValue { value: String, line: String },
}

/// Opens the given file, or stdin if the path is `-`.
pub(crate) fn open(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
  if path == Path::new("-") {
    Ok(Box::new(stdin().lock()))
  } else {
    File::open(path).map(|f| Box::new(BufReader::new(f)) as Box<dyn BufRead>)
  }
}

/// Checks that exactly `N` values have been provided.
pub fn n_values<const N: usize>(values: &[f64]) -> Result<[f64; N], InputError> {
  <[f64; N]>::try_from(values).map_err(|_| InputError::WrongNumberOfValues {
    line: values
      .iter()
      .map(|v| v.to_string())
      .collect::<Vec<String>>()
      .join(" "),
    expected: N,
    actual: values.len(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn testok_n_values() {
    assert_eq!([1.0, -2.5], n_values::<2>(&[1.0, -2.5]).unwrap());
  }

  #[test]
  fn testerr_n_values() {
    assert!(matches!(
      n_values::<3>(&[1.0, -2.5]),
      Err(InputError::WrongNumberOfValues {
        expected: 3,
        actual: 2,
        ..
      })
    ));
  }
}
