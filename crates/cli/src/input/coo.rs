//! Floating point coordinates: angles `(theta, phi)` or vectors `(x, y, z)`.

use std::{
  error::Error,
  io::{stdout, BufRead, StdoutLock, Write},
  path::PathBuf,
};

use clap::{Args, Subcommand};

use super::{open, InputError};

#[derive(Debug, Clone, Subcommand)]
pub enum CooInput {
  Value(CooVal),
  List(CooList),
}
impl CooInput {
  /// # Params
  /// * `f`: input parameters are
  ///     + the coordinates read (the number of values is checked by `f`)
  ///     + writer
  ///     + separator
  pub fn exec<F>(self, f: F) -> Result<(), Box<dyn Error>>
  where
    F: Fn(&[f64], &mut StdoutLock<'static>, char) -> Result<(), Box<dyn Error>>,
  {
    match self {
      Self::Value(e) => e.exec(f),
      Self::List(e) => e.exec(f),
    }
  }
}

/// Single set of coordinates provided in the command line
#[derive(Debug, Clone, Args)]
pub struct CooVal {
  /// Coordinates, e.g. `THETA PHI` or `X Y Z`
  #[clap(allow_negative_numbers = true, required = true, value_name = "COO")]
  pub values: Vec<f64>,
}

impl CooVal {
  fn exec<F>(self, f: F) -> Result<(), Box<dyn Error>>
  where
    F: Fn(&[f64], &mut StdoutLock<'static>, char) -> Result<(), Box<dyn Error>>,
  {
    let mut lock = stdout().lock();
    f(&self.values, &mut lock, ' ').and_then(|()| writeln!(&mut lock).map_err(|e| e.into()))
  }
}

/// List of DELIM separated coordinates; one set of coordinates per line.
#[derive(Debug, Clone, Args)]
pub struct CooList {
  /// Path of the input file ('-' for stdin)
  #[clap(value_name = "FILE", default_value = "-")]
  pub input: PathBuf,
  /// Use DELIM delimiter
  #[clap(short, long, value_name = "DELIM", default_value_t = '\t')]
  pub delimiter: char,
}

impl CooList {
  fn exec<F>(self, f: F) -> Result<(), Box<dyn Error>>
  where
    F: Fn(&[f64], &mut StdoutLock<'static>, char) -> Result<(), Box<dyn Error>>,
  {
    let read = open(&self.input)?;
    let mut lock = stdout().lock();
    for line in read.lines() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }
      parse_line(&line, self.delimiter)
        .map_err(|e| e.into())
        .and_then(|values| f(&values, &mut lock, self.delimiter))
        .and_then(|()| writeln!(&mut lock).map_err(|e| e.into()))?;
    }
    Ok(())
  }
}

/// Parses the DELIM separated values of the given line (spaces around values are ignored).
fn parse_line(line: &str, delimiter: char) -> Result<Vec<f64>, InputError> {
  line
    .split(delimiter)
    .map(str::trim)
    .filter(|field| !field.is_empty())
    .map(|field| {
      field.parse::<f64>().map_err(|_| InputError::ParseValue {
        value: field.to_string(),
        line: line.to_string(),
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn testok_parse_line() {
    assert_eq!(vec![0.5, -1.25], parse_line("0.5\t-1.25", '\t').unwrap());
    assert_eq!(vec![1.0, 2.0, 3.0], parse_line(" 1, 2 ,3", ',').unwrap());
  }

  #[test]
  fn testerr_parse_line() {
    assert!(matches!(
      parse_line("0.5\tabc", '\t'),
      Err(InputError::ParseValue { .. })
    ));
  }
}
