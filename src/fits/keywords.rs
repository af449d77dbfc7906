//! Keyword records (cards) of the BINTABLE header of an HEALPix map.

use std::{fmt, mem::size_of, str};

use log::warn;

use super::{
  error::FitsError,
  read::{get_keyword, get_str_val_no_quote, parse_uint_val},
  write::write_keyword_record,
};
use crate::Scheme;

pub trait FitsCard: Sized {
  const KEYWORD: &'static [u8; 8];

  fn keyword_str() -> &'static str {
    str::from_utf8(Self::KEYWORD).map_or("", str::trim_end)
  }

  fn keyword_string() -> String {
    Self::keyword_str().to_string()
  }

  fn parse_value(keyword_record: &[u8]) -> Result<Self, FitsError>;

  fn write_keyword_record(&self, keyword_record: &mut [u8]) {
    write_keyword_record(keyword_record, Self::KEYWORD, &self.to_fits_value())
  }

  /// Must be in quotes `'val'` if the value type is string
  fn to_fits_value(&self) -> String;

  /// Generate an error in case the parsed value does not match a pre-define list of possible values.
  fn predefine_val_err(parsed_value: &[u8], expected_values: &[&str]) -> FitsError {
    FitsError::UnexpectedValue {
      keyword: Self::keyword_string(),
      expected: format!("{:?}", expected_values),
      actual: String::from_utf8_lossy(parsed_value).to_string(),
    }
  }
}

/// Quoted string value, padded to at least 8 characters.
fn quoted(s: &str) -> String {
  format!("'{:<8}'", s)
}

/// `ORDERING` keyword.
impl FitsCard for Scheme {
  const KEYWORD: &'static [u8; 8] = b"ORDERING";

  fn parse_value(keyword_record: &[u8]) -> Result<Self, FitsError> {
    let val = get_str_val_no_quote(keyword_record)?;
    String::from_utf8_lossy(val)
      .parse::<Scheme>()
      .map_err(|_| Self::predefine_val_err(val, &["RING", "NESTED"]))
  }

  fn to_fits_value(&self) -> String {
    quoted(&self.to_string())
  }
}

/// Coordinate system of a map.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CoordSys {
  /// Celestial (equatorial), `C`
  Cel,
  /// Galactic, `G`
  Gal,
  /// Ecliptic, `E`
  Ecl,
}
impl CoordSys {
  pub fn to_char(&self) -> char {
    match self {
      CoordSys::Cel => 'C',
      CoordSys::Gal => 'G',
      CoordSys::Ecl => 'E',
    }
  }
}
impl fmt::Display for CoordSys {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_char())
  }
}
impl str::FromStr for CoordSys {
  type Err = FitsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::from_bytes(s.trim().as_bytes())
  }
}
impl CoordSys {
  fn from_bytes(val: &[u8]) -> Result<Self, FitsError> {
    match val {
      b"C" | b"c" => Ok(CoordSys::Cel),
      b"G" | b"g" => Ok(CoordSys::Gal),
      b"E" | b"e" => Ok(CoordSys::Ecl),
      b"Q" | b"CEL" | b"EQU" => {
        warn!("COORDSYS value should be 'C', not '{}'", String::from_utf8_lossy(val));
        Ok(CoordSys::Cel)
      }
      b"GAL" => {
        warn!("COORDSYS value should be 'G', not 'GAL'");
        Ok(CoordSys::Gal)
      }
      b"ECL" => {
        warn!("COORDSYS value should be 'E', not 'ECL'");
        Ok(CoordSys::Ecl)
      }
      parsed_val => Err(Self::predefine_val_err(parsed_val, &["C", "G", "E"])),
    }
  }
}
impl FitsCard for CoordSys {
  const KEYWORD: &'static [u8; 8] = b"COORDSYS";

  fn parse_value(keyword_record: &[u8]) -> Result<Self, FitsError> {
    Self::from_bytes(get_str_val_no_quote(keyword_record)?)
  }

  fn to_fits_value(&self) -> String {
    quoted(&self.to_string())
  }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PixType {
  Healpix,
}
impl FitsCard for PixType {
  const KEYWORD: &'static [u8; 8] = b"PIXTYPE ";

  fn parse_value(keyword_record: &[u8]) -> Result<Self, FitsError> {
    match get_str_val_no_quote(keyword_record)? {
      b"HEALPIX" => Ok(PixType::Healpix),
      parsed_val => Err(Self::predefine_val_err(parsed_val, &["HEALPIX"])),
    }
  }

  fn to_fits_value(&self) -> String {
    quoted("HEALPIX")
  }
}

/// Only full sky maps, i.e. `IMPLICIT` index schema, are supported.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IndexSchema {
  Implicit,
  Explicit,
}
impl FitsCard for IndexSchema {
  const KEYWORD: &'static [u8; 8] = b"INDXSCHM";

  fn parse_value(keyword_record: &[u8]) -> Result<Self, FitsError> {
    match get_str_val_no_quote(keyword_record)? {
      b"IMPLICIT" => Ok(IndexSchema::Implicit),
      b"EXPLICIT" => Ok(IndexSchema::Explicit),
      parsed_val => Err(Self::predefine_val_err(parsed_val, &["IMPLICIT", "EXPLICIT"])),
    }
  }

  fn to_fits_value(&self) -> String {
    quoted(match self {
      IndexSchema::Implicit => "IMPLICIT",
      IndexSchema::Explicit => "EXPLICIT",
    })
  }
}

/// Binary type of the values stored in the first column.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TFormType {
  /// u8
  B,
  /// i16
  I,
  /// i32
  J,
  /// i64
  K,
  /// f32
  E,
  /// f64
  D,
}
impl TFormType {
  fn from_byte(b: u8) -> Option<Self> {
    match b {
      b'B' => Some(TFormType::B),
      b'I' => Some(TFormType::I),
      b'J' => Some(TFormType::J),
      b'K' => Some(TFormType::K),
      b'E' => Some(TFormType::E),
      b'D' => Some(TFormType::D),
      _ => None,
    }
  }

  fn to_char(self) -> char {
    match self {
      TFormType::B => 'B',
      TFormType::I => 'I',
      TFormType::J => 'J',
      TFormType::K => 'K',
      TFormType::E => 'E',
      TFormType::D => 'D',
    }
  }

  pub fn n_bytes(self) -> usize {
    match self {
      TFormType::B => size_of::<u8>(),
      TFormType::I => size_of::<i16>(),
      TFormType::J => size_of::<i32>(),
      TFormType::K => size_of::<i64>(),
      TFormType::E => size_of::<f32>(),
      TFormType::D => size_of::<f64>(),
    }
  }
}

/// `TFORM1 = 'nX'`: `n` values of type `X` per row.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TForm1 {
  pub repeat: u32,
  pub kind: TFormType,
}
impl TForm1 {
  /// Number of bytes of the column in a row.
  pub fn n_bytes(&self) -> usize {
    self.repeat as usize * self.kind.n_bytes()
  }

  /// Number of values of the column in a row.
  pub fn n_pack(&self) -> u32 {
    self.repeat
  }
}
impl FitsCard for TForm1 {
  const KEYWORD: &'static [u8; 8] = b"TFORM1  ";

  fn parse_value(keyword_record: &[u8]) -> Result<Self, FitsError> {
    let val = get_str_val_no_quote(keyword_record)?;
    let wrong_val = || Self::predefine_val_err(val, &["nB", "nI", "nJ", "nK", "nE", "nD"]);
    let (n, k) = val.split_at(val.len().saturating_sub(1));
    let kind = k.first().copied().and_then(TFormType::from_byte).ok_or_else(wrong_val)?;
    let repeat = if n.is_empty() {
      1
    } else {
      let n_str = String::from_utf8_lossy(n);
      n_str.parse::<u32>().map_err(|err| FitsError::WrongUintValue {
        context: n_str.to_string(),
        err,
      })?
    };
    Ok(TForm1 { repeat, kind })
  }

  fn to_fits_value(&self) -> String {
    quoted(&format!("{}{}", self.repeat, self.kind.to_char()))
  }
}

#[derive(Debug)]
pub struct TType1(pub String);
impl FitsCard for TType1 {
  const KEYWORD: &'static [u8; 8] = b"TTYPE1  ";

  fn parse_value(keyword_record: &[u8]) -> Result<Self, FitsError> {
    get_str_val_no_quote(keyword_record)
      .map(|s| String::from_utf8_lossy(s).to_string())
      .map(Self)
  }

  fn to_fits_value(&self) -> String {
    quoted(&self.0)
  }
}

#[derive(Debug, PartialEq)]
pub struct Nside(pub u32);
impl FitsCard for Nside {
  const KEYWORD: &'static [u8; 8] = b"NSIDE   ";

  fn parse_value(keyword_record: &[u8]) -> Result<Self, FitsError> {
    parse_uint_val::<u32>(keyword_record).map(Self)
  }

  fn to_fits_value(&self) -> String {
    self.0.to_string()
  }
}

#[derive(Debug, PartialEq)]
pub struct FirstPix(pub u64);
impl FitsCard for FirstPix {
  const KEYWORD: &'static [u8; 8] = b"FIRSTPIX";

  fn parse_value(keyword_record: &[u8]) -> Result<Self, FitsError> {
    parse_uint_val::<u64>(keyword_record).map(Self)
  }

  fn to_fits_value(&self) -> String {
    self.0.to_string()
  }
}

#[derive(Debug, PartialEq)]
pub struct LastPix(pub u64);
impl FitsCard for LastPix {
  const KEYWORD: &'static [u8; 8] = b"LASTPIX ";

  fn parse_value(keyword_record: &[u8]) -> Result<Self, FitsError> {
    parse_uint_val::<u64>(keyword_record).map(Self)
  }

  fn to_fits_value(&self) -> String {
    self.0.to_string()
  }
}

/// Uses the index in an array of `Option<MapKeywords>` for fast retrieving of the card.
pub trait MapCard: FitsCard {
  const INDEX: u8;

  fn from_keyword(kw: &MapKeywords) -> Option<&Self>;
}

macro_rules! impl_map_card {
  ($t:ident, $index:expr) => {
    impl MapCard for $t {
      const INDEX: u8 = $index;

      fn from_keyword(kw: &MapKeywords) -> Option<&Self> {
        match kw {
          MapKeywords::$t(v) => Some(v),
          _ => None,
        }
      }
    }
  };
}

#[derive(Debug)]
pub enum MapKeywords {
  Scheme(Scheme),
  CoordSys(CoordSys),
  PixType(PixType),
  TForm1(TForm1),
  TType1(TType1),
  Nside(Nside),
  FirstPix(FirstPix),
  LastPix(LastPix),
  IndexSchema(IndexSchema),
}

impl_map_card!(Scheme, 0);
impl_map_card!(CoordSys, 1);
impl_map_card!(PixType, 2);
impl_map_card!(TForm1, 3);
impl_map_card!(TType1, 4);
impl_map_card!(Nside, 5);
impl_map_card!(FirstPix, 6);
impl_map_card!(LastPix, 7);
impl_map_card!(IndexSchema, 8);

impl MapKeywords {
  /// Returns `None` if the keyword of the given record is not an HEALPix map keyword.
  pub(super) fn is_map_kw(keyword_record: &[u8]) -> Result<Option<Self>, FitsError> {
    match get_keyword(keyword_record) {
      b"ORDERING" => Scheme::parse_value(keyword_record).map(|v| Some(MapKeywords::Scheme(v))),
      b"COORDSYS" => CoordSys::parse_value(keyword_record).map(|v| Some(MapKeywords::CoordSys(v))),
      b"PIXTYPE " => PixType::parse_value(keyword_record).map(|v| Some(MapKeywords::PixType(v))),
      b"TFORM1  " => TForm1::parse_value(keyword_record).map(|v| Some(MapKeywords::TForm1(v))),
      b"TTYPE1  " => TType1::parse_value(keyword_record).map(|v| Some(MapKeywords::TType1(v))),
      b"NSIDE   " => Nside::parse_value(keyword_record).map(|v| Some(MapKeywords::Nside(v))),
      b"FIRSTPIX" => FirstPix::parse_value(keyword_record).map(|v| Some(MapKeywords::FirstPix(v))),
      b"LASTPIX " => LastPix::parse_value(keyword_record).map(|v| Some(MapKeywords::LastPix(v))),
      b"INDXSCHM" => {
        IndexSchema::parse_value(keyword_record).map(|v| Some(MapKeywords::IndexSchema(v)))
      }
      _ => Ok(None),
    }
  }

  fn index(&self) -> usize {
    (match self {
      MapKeywords::Scheme(_) => Scheme::INDEX,
      MapKeywords::CoordSys(_) => CoordSys::INDEX,
      MapKeywords::PixType(_) => PixType::INDEX,
      MapKeywords::TForm1(_) => TForm1::INDEX,
      MapKeywords::TType1(_) => TType1::INDEX,
      MapKeywords::Nside(_) => Nside::INDEX,
      MapKeywords::FirstPix(_) => FirstPix::INDEX,
      MapKeywords::LastPix(_) => LastPix::INDEX,
      MapKeywords::IndexSchema(_) => IndexSchema::INDEX,
    }) as usize
  }

  pub(super) fn keyword_str(&self) -> &'static str {
    match self {
      MapKeywords::Scheme(_) => Scheme::keyword_str(),
      MapKeywords::CoordSys(_) => CoordSys::keyword_str(),
      MapKeywords::PixType(_) => PixType::keyword_str(),
      MapKeywords::TForm1(_) => TForm1::keyword_str(),
      MapKeywords::TType1(_) => TType1::keyword_str(),
      MapKeywords::Nside(_) => Nside::keyword_str(),
      MapKeywords::FirstPix(_) => FirstPix::keyword_str(),
      MapKeywords::LastPix(_) => LastPix::keyword_str(),
      MapKeywords::IndexSchema(_) => IndexSchema::keyword_str(),
    }
  }
}

#[derive(Debug, Default)]
pub(super) struct MapKeywordsMap {
  entries: [Option<MapKeywords>; 9],
}
impl MapKeywordsMap {
  pub(super) fn new() -> MapKeywordsMap {
    Self::default()
  }

  /// Keeps the first occurrence of a keyword, and returns the rejected one.
  pub(super) fn insert(&mut self, entry: MapKeywords) -> Option<MapKeywords> {
    let slot = &mut self.entries[entry.index()];
    if slot.is_some() {
      Some(entry)
    } else {
      *slot = Some(entry);
      None
    }
  }

  pub(super) fn get<T: MapCard>(&self) -> Option<&T> {
    self.entries[T::INDEX as usize].as_ref().and_then(T::from_keyword)
  }

  /// Returns the value of a mandatory keyword.
  pub(super) fn require<T: MapCard>(&self) -> Result<&T, FitsError> {
    self.get::<T>().ok_or_else(|| FitsError::MissingKeyword {
      keyword: T::keyword_string(),
    })
  }

  /// Checks the value of a keyword, assuming the expected value (with a warning) if the keyword
  /// is missing and `accept_not_found` is `true`.
  pub(super) fn check<T: MapCard + PartialEq>(
    &self,
    expected: &T,
    accept_not_found: bool,
  ) -> Result<(), FitsError> {
    match self.get::<T>() {
      Some(actual) if actual == expected => Ok(()),
      Some(actual) => Err(FitsError::UnexpectedValue {
        keyword: T::keyword_string(),
        expected: expected.to_fits_value(),
        actual: actual.to_fits_value(),
      }),
      None if accept_not_found => {
        warn!(
          "Missing keyword '{}'; Value '{}' is assumed!",
          T::keyword_str(),
          expected.to_fits_value()
        );
        Ok(())
      }
      None => Err(FitsError::MissingKeyword {
        keyword: T::keyword_string(),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn card(s: &str) -> [u8; 80] {
    let mut card = [b' '; 80];
    card[..s.len()].copy_from_slice(s.as_bytes());
    card
  }

  #[test]
  fn testok_parse_cards() {
    assert_eq!(Scheme::Ring, Scheme::parse_value(&card("ORDERING= 'RING    '")).unwrap());
    assert_eq!(Scheme::Nested, Scheme::parse_value(&card("ORDERING= 'NESTED  ' / comment")).unwrap());
    assert_eq!(CoordSys::Gal, CoordSys::parse_value(&card("COORDSYS= 'G       '")).unwrap());
    assert_eq!(CoordSys::Cel, CoordSys::parse_value(&card("COORDSYS= 'CEL'")).unwrap());
    assert_eq!(Nside(2048), Nside::parse_value(&card("NSIDE   =                 2048")).unwrap());
    assert_eq!(
      TForm1 { repeat: 1024, kind: TFormType::E },
      TForm1::parse_value(&card("TFORM1  = '1024E   '")).unwrap()
    );
    assert_eq!(
      TForm1 { repeat: 1, kind: TFormType::D },
      TForm1::parse_value(&card("TFORM1  = 'D       '")).unwrap()
    );
  }

  #[test]
  fn testerr_parse_cards() {
    assert!(Scheme::parse_value(&card("ORDERING= 'NUNIQ   '")).is_err());
    assert!(CoordSys::parse_value(&card("COORDSYS= 'X'")).is_err());
    assert!(TForm1::parse_value(&card("TFORM1  = '12A     '")).is_err());
    assert!(TForm1::parse_value(&card("TFORM1  = ''")).is_err());
    assert!(Nside::parse_value(&card("NSIDE   = 'abc'")).is_err());
  }

  #[test]
  fn testok_write_then_parse() {
    let mut dest = [b' '; 80];
    TForm1 { repeat: 1, kind: TFormType::E }.write_keyword_record(&mut dest);
    assert_eq!(b"TFORM1  = '1E      '", &dest[..20]);
    assert_eq!(
      TForm1 { repeat: 1, kind: TFormType::E },
      TForm1::parse_value(&dest).unwrap()
    );
  }

  #[test]
  fn testok_keywords_map() {
    let mut kws = MapKeywordsMap::new();
    assert!(kws.insert(MapKeywords::Nside(Nside(4))).is_none());
    assert!(kws.insert(MapKeywords::Nside(Nside(8))).is_some());
    assert_eq!(Some(&Nside(4)), kws.get::<Nside>());
    assert!(kws.check(&Nside(4), false).is_ok());
    assert!(kws.check(&Nside(8), true).is_err());
    assert!(kws.check(&FirstPix(0), true).is_ok());
    assert!(matches!(
      kws.check(&FirstPix(0), false),
      Err(FitsError::MissingKeyword { .. })
    ));
    assert!(kws.require::<Scheme>().is_err());
  }
}
