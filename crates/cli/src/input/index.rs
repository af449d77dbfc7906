//! Deals with HEALPix pixel indices (aka ipix or hash values).

use std::{
  error::Error,
  io::{stdout, BufRead, StdoutLock, Write},
  path::PathBuf,
};

use clap::{Args, Subcommand};

use super::{open, InputError};

#[derive(Debug, Clone, Subcommand)]
pub enum IndexInput {
  Value(IndexVal),
  List(IndexList),
}
impl IndexInput {
  /// # Params
  /// * `f`: input parameters are
  ///     + pixel index
  ///     + writer
  ///     + separator
  pub fn exec<F>(self, f: F) -> Result<(), Box<dyn Error>>
  where
    F: Fn(i64, &mut StdoutLock<'static>, char) -> Result<(), Box<dyn Error>>,
  {
    match self {
      Self::Value(e) => e.exec(f),
      Self::List(e) => e.exec(f),
    }
  }
}

/// Single pixel index provided in the command line
#[derive(Debug, Clone, Args)]
pub struct IndexVal {
  /// HEALPix pixel index (aka ipix)
  #[clap(allow_negative_numbers = true, value_name = "IPIX")]
  pub ipix: i64,
}

impl IndexVal {
  fn exec<F>(self, f: F) -> Result<(), Box<dyn Error>>
  where
    F: Fn(i64, &mut StdoutLock<'static>, char) -> Result<(), Box<dyn Error>>,
  {
    let mut lock = stdout().lock();
    f(self.ipix, &mut lock, ' ').and_then(|()| writeln!(&mut lock).map_err(|e| e.into()))
  }
}

/// List of pixel indices; one value per line.
#[derive(Debug, Clone, Args)]
pub struct IndexList {
  /// Path of the input file ('-' for stdin)
  #[clap(value_name = "FILE", default_value = "-")]
  pub input: PathBuf,
  /// Use DELIM as output delimiter
  #[clap(short, long, value_name = "DELIM", default_value_t = '\t')]
  pub delimiter: char,
}

impl IndexList {
  fn exec<F>(self, f: F) -> Result<(), Box<dyn Error>>
  where
    F: Fn(i64, &mut StdoutLock<'static>, char) -> Result<(), Box<dyn Error>>,
  {
    let read = open(&self.input)?;
    let mut lock = stdout().lock();
    for line in read.lines() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }
      parse_index(&line)
        .map_err(|e| e.into())
        .and_then(|ipix| f(ipix, &mut lock, self.delimiter))
        .and_then(|()| writeln!(&mut lock).map_err(|e| e.into()))?;
    }
    Ok(())
  }
}

fn parse_index(line: &str) -> Result<i64, InputError> {
  let value = line.trim();
  value.parse::<i64>().map_err(|_| InputError::ParseValue {
    value: value.to_string(),
    line: line.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn testok_parse_index() {
    assert_eq!(42, parse_index(" 42 ").unwrap());
    assert_eq!(-1, parse_index("-1").unwrap());
  }

  #[test]
  fn testerr_parse_index() {
    assert!(parse_index("4.2").is_err());
  }
}
