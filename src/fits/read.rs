use std::{
  fs::File,
  io::{BufRead, BufReader, Read, Seek},
  num::ParseIntError,
  path::Path,
  str::FromStr,
};

use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use log::{debug, warn};

use super::{
  error::FitsError,
  keywords::{
    CoordSys, FirstPix, FitsCard, IndexSchema, LastPix, MapKeywords, MapKeywordsMap, Nside, PixType,
    TForm1, TFormType, TType1,
  },
  FitsSize, HealpixMap,
};
use crate::{ring, Scheme};

const GZ_MAGIC_NUM: [u8; 2] = [0x1F, 0x8B];

/// Reads a full sky HEALPix map from a FITS file (possibly gzipped).
///
/// We expect the file to contain an empty primary HDU followed by a BINTABLE extension:
/// ```bash
/// XTENSION= 'BINTABLE'           / binary table extension
/// BITPIX  =                    8 / array data type
/// NAXIS   =                    2 / number of array dimensions
/// NAXIS1  =                   ?? / length of a row, in bytes
/// NAXIS2  =                   ?? / number of rows
/// PCOUNT  =                    0 / number of group parameters
/// GCOUNT  =                    1 / number of groups
/// TFIELDS =                   ?? / number of table fields
/// TTYPE1  = 'SIGNAL  '
/// TFORM1  = 'nE      '           / n values per row, 'B', 'I', 'J', 'K' or 'D' also accepted
/// ...
/// PIXTYPE = 'HEALPIX '           / HEALPIX pixelisation
/// ORDERING= 'RING    '           / Pixel ordering scheme: RING or NESTED
/// NSIDE   =                   ?? / any value for RING, power of 2 for NESTED
/// INDXSCHM= 'IMPLICIT'           / WARNING if not found
/// FIRSTPIX=                    0 / WARNING if not found
/// LASTPIX =                   ?? / WARNING if not found
/// COORDSYS= 'C       '           / WARNING if not found
/// ...
/// END
/// ```
/// Only the first column is read; its values are converted to `f32`.
pub fn read_healpix_map<P: AsRef<Path>>(path: P) -> Result<HealpixMap, FitsError> {
  read_healpix_map_from(open(path.as_ref())?)
}

/// Same as [read_healpix_map](fn.read_healpix_map.html), from a reader.
pub fn read_healpix_map_from<R: Read + Seek>(mut reader: BufReader<R>) -> Result<HealpixMap, FitsError> {
  if is_gz(&mut reader)? {
    read_healpix_map_internal(BufReader::new(GzDecoder::new(reader)))
  } else {
    read_healpix_map_internal(reader)
  }
}

/// Reads only the header of the HEALPix map stored in the given FITS file.
pub fn get_fits_size<P: AsRef<Path>>(path: P) -> Result<FitsSize, FitsError> {
  get_fits_size_from(open(path.as_ref())?)
}

/// Same as [get_fits_size](fn.get_fits_size.html), from a reader.
pub fn get_fits_size_from<R: Read + Seek>(mut reader: BufReader<R>) -> Result<FitsSize, FitsError> {
  let header = if is_gz(&mut reader)? {
    read_map_header(&mut BufReader::new(GzDecoder::new(reader)))
  } else {
    read_map_header(&mut reader)
  }?;
  Ok(FitsSize {
    nside: header.nside,
    scheme: header.scheme,
    n_values: header.n_values,
  })
}

fn open(path: &Path) -> Result<BufReader<File>, FitsError> {
  File::open(path)
    .map(BufReader::new)
    .map_err(|err| FitsError::IoWithPath {
      path: path.to_string_lossy().to_string(),
      err,
    })
}

/// Peeks the two first bytes of the stream, without consuming them.
fn is_gz<R: Read + Seek>(reader: &mut BufReader<R>) -> Result<bool, FitsError> {
  let mut magic_bytes = [0u8; 2];
  reader
    .read_exact(&mut magic_bytes)
    .map_err(FitsError::from_data_io)?;
  reader.seek_relative(-(magic_bytes.len() as i64))?;
  Ok(magic_bytes == GZ_MAGIC_NUM)
}

fn read_healpix_map_internal<R: BufRead>(mut reader: R) -> Result<HealpixMap, FitsError> {
  let header = read_map_header(&mut reader)?;
  let values = header.read_values(&mut reader)?;
  debug!(
    "HEALPix map read. Nside: {}; ordering: {}; coordsys: {}; n values: {}.",
    header.nside,
    header.scheme,
    header.coordsys,
    values.len()
  );
  HealpixMap::new(values, header.scheme, header.coordsys)
}

/// Information from the BINTABLE header needed to read the map values.
#[derive(Debug)]
struct MapHeader {
  nside: u32,
  scheme: Scheme,
  coordsys: CoordSys,
  tform1: TForm1,
  n_bytes_per_row: usize,
  n_rows: u64,
  n_values: u64,
}

/// Largest number of values reserved before reading the data, the header being untrusted.
const MAX_INITIAL_CAPACITY: u64 = 1 << 20;

impl MapHeader {
  /// Reads the values of the first column, row by row.
  fn read_values<R: BufRead>(&self, reader: &mut R) -> Result<Vec<f32>, FitsError> {
    let mut row = vec![0_u8; self.n_bytes_per_row];
    let mut values = Vec::with_capacity(self.n_values.min(MAX_INITIAL_CAPACITY) as usize);
    for _ in 0..self.n_rows {
      reader.read_exact(&mut row).map_err(FitsError::from_data_io)?;
      let mut col = &row[..self.tform1.n_bytes()];
      for _ in 0..self.tform1.n_pack() {
        values.push(read_value(self.tform1.kind, &mut col)?);
      }
    }
    Ok(values)
  }
}

fn read_value<R: Read>(kind: TFormType, reader: &mut R) -> Result<f32, FitsError> {
  match kind {
    TFormType::B => reader.read_u8().map(|v| v as f32),
    TFormType::I => reader.read_i16::<BigEndian>().map(|v| v as f32),
    TFormType::J => reader.read_i32::<BigEndian>().map(|v| v as f32),
    TFormType::K => reader.read_i64::<BigEndian>().map(|v| v as f32),
    TFormType::E => reader.read_f32::<BigEndian>(),
    TFormType::D => reader.read_f64::<BigEndian>().map(|v| v as f32),
  }
  .map_err(FitsError::from_data_io)
}

fn read_map_header<R: BufRead>(reader: &mut R) -> Result<MapHeader, FitsError> {
  let mut header_block = [b' '; 2880];
  consume_primary_hdu(reader, &mut header_block)?;
  // Read the extension HDU
  next_36_chunks_of_80_bytes(reader, &mut header_block)?;
  // See Table 10 and 17 in https://fits.gsfc.nasa.gov/standard40/fits_standard40aa-le.pdf
  check_keyword_and_val(card(&header_block, 0), b"XTENSION", b"'BINTABLE'")?;
  check_keyword_and_val(card(&header_block, 1), b"BITPIX  ", b"8")?;
  check_keyword_and_val(card(&header_block, 2), b"NAXIS  ", b"2")?;
  let n_bytes_per_row = check_keyword_and_parse_uint_val::<u64>(card(&header_block, 3), b"NAXIS1  ")?;
  let n_rows = check_keyword_and_parse_uint_val::<u64>(card(&header_block, 4), b"NAXIS2  ")?;
  check_keyword_and_val(card(&header_block, 5), b"PCOUNT  ", b"0")?;
  check_keyword_and_val(card(&header_block, 6), b"GCOUNT  ", b"1")?;
  let n_cols = check_keyword_and_parse_uint_val::<u64>(card(&header_block, 7), b"TFIELDS ")?;

  let mut map_kws = MapKeywordsMap::new();
  let mut first_card = 8;
  'hr: loop {
    for kw_record in header_block.chunks_exact(80).skip(first_card) {
      match MapKeywords::is_map_kw(kw_record)? {
        Some(kw) => {
          if let Some(rejected) = map_kws.insert(kw) {
            warn!(
              "Keyword '{}' found more than once in a same HDU! We use the first occurrence.",
              rejected.keyword_str()
            );
          }
        }
        None => {
          if &kw_record[0..4] == b"END " {
            break 'hr;
          } else {
            debug!("Ignored FITS card: {}", String::from_utf8_lossy(kw_record).trim_end())
          }
        }
      }
    }
    // Read next 2880 bytes
    next_36_chunks_of_80_bytes(reader, &mut header_block)?;
    first_card = 0;
  }

  map_kws.check(&PixType::Healpix, false)?;
  map_kws.check(&IndexSchema::Implicit, true)?;
  map_kws.check(&FirstPix(0), true)?;
  let scheme = *map_kws.require::<Scheme>()?;
  let nside = map_kws.require::<Nside>()?.0;
  scheme.validate(nside as i64)?;
  let n_hash = ring::n_hash(nside);
  map_kws.check(&LastPix(n_hash - 1), true)?;
  let coordsys = match map_kws.get::<CoordSys>() {
    Some(coordsys) => *coordsys,
    None => {
      warn!(
        "Missing keyword '{}'; Value '{}' is assumed!",
        CoordSys::keyword_str(),
        CoordSys::Cel
      );
      CoordSys::Cel
    }
  };
  if let Some(TType1(colname)) = map_kws.get::<TType1>() {
    debug!("Map column name: {}", colname);
  }
  let tform1 = *map_kws.require::<TForm1>()?;
  debug!("Map column type: {}", tform1.to_fits_value());

  // Check the row size
  let n_bytes_per_row = n_bytes_per_row as usize;
  if (n_cols == 1 && n_bytes_per_row != tform1.n_bytes()) || n_bytes_per_row < tform1.n_bytes() {
    return Err(FitsError::new_custom(format!(
      "Number of bytes per row {} do not match TFORM1 = {}",
      n_bytes_per_row,
      tform1.to_fits_value()
    )));
  }
  if n_cols > 1 {
    debug!("Only the first of the {} columns is read.", n_cols);
  }
  // Check the number of values
  let n_values = (tform1.n_pack() as u64).checked_mul(n_rows).ok_or_else(|| {
    FitsError::new_custom(format!(
      "Number of elements overflow: {} rows of {} values",
      n_rows,
      tform1.n_pack()
    ))
  })?;
  if n_values != n_hash {
    return Err(FitsError::new_custom(format!(
      "Number of elements {} do not match number of HEALPix cells {}",
      n_values, n_hash
    )));
  }
  Ok(MapHeader {
    nside,
    scheme,
    coordsys,
    tform1,
    n_bytes_per_row,
    n_rows,
    n_values,
  })
}

const VALUE_INDICATOR: &[u8; 2] = b"= ";

/// # Params
/// - `header_block`: re-usable header block used to avoid multiple allocations
fn consume_primary_hdu<R: BufRead>(reader: &mut R, header_block: &mut [u8; 2880]) -> Result<(), FitsError> {
  next_36_chunks_of_80_bytes(reader, header_block)?;
  // SIMPLE = 'T' => file compliant with the FITS standard
  check_keyword_and_val(card(header_block, 0), b"SIMPLE ", b"T")?;
  // Do not check for BITPIX (we expect an empty header)
  // NAXIS = 0 => we only support FITS files with no data in the primary HDU
  check_keyword_and_val(card(header_block, 2), b"NAXIS ", b"0")?;
  // Ignore possible additional keywords
  while !contains_end(header_block) {
    next_36_chunks_of_80_bytes(reader, header_block)?;
  }
  Ok(())
}

fn next_36_chunks_of_80_bytes<R: BufRead>(reader: &mut R, header_block: &mut [u8; 2880]) -> Result<(), FitsError> {
  reader.read_exact(header_block).map_err(FitsError::from_data_io)
}

/// The `i`-th keyword record of the given header block.
fn card(header_block: &[u8; 2880], i: usize) -> &[u8] {
  &header_block[i * 80..(i + 1) * 80]
}

fn contains_end(header_block: &[u8; 2880]) -> bool {
  header_block
    .chunks_exact(80)
    .any(|kw_rc| &kw_rc[0..4] == b"END ")
}

pub(super) fn check_keyword_and_val(
  keyword_record: &[u8],
  expected_kw: &[u8],
  expected_val: &[u8],
) -> Result<(), FitsError> {
  check_expected_keyword(keyword_record, expected_kw)?;
  check_for_value_indicator(keyword_record)?;
  check_expected_value(keyword_record, expected_val)
}

fn check_keyword_and_parse_uint_val<T>(keyword_record: &[u8], expected_kw: &[u8]) -> Result<T, FitsError>
where
  T: Into<u64> + FromStr<Err = ParseIntError>,
{
  check_expected_keyword(keyword_record, expected_kw)?;
  check_for_value_indicator(keyword_record)?;
  parse_uint_val::<T>(keyword_record)
}

pub(super) fn check_expected_keyword(keyword_record: &[u8], expected: &[u8]) -> Result<(), FitsError> {
  debug_assert!(keyword_record.len() == 80); // length of a FITS keyword-record
  debug_assert!(expected.len() <= 8); // length of a FITS keyword
  if &keyword_record[..expected.len()] == expected {
    Ok(())
  } else {
    let expected_str = String::from_utf8_lossy(expected).trim_end().to_string();
    // Here, may contains binary data
    let actual = String::from_utf8_lossy(&keyword_record[..expected.len()])
      .trim_end()
      .to_string();
    Err(FitsError::UnexpectedKeyword {
      expected: expected_str,
      actual,
    })
  }
}

pub(super) fn check_for_value_indicator(keyword_record: &[u8]) -> Result<(), FitsError> {
  debug_assert!(keyword_record.len() == 80); // length of a FITS keyword-record
  if get_value_indicator(keyword_record) == VALUE_INDICATOR {
    Ok(())
  } else {
    let keyword_record = String::from_utf8_lossy(keyword_record).trim_end().to_string();
    Err(FitsError::ValueIndicatorNotFound { keyword_record })
  }
}

pub(super) fn get_keyword(keyword_record: &[u8]) -> &[u8] {
  &keyword_record[..8]
}
pub(super) fn get_value_indicator(keyword_record: &[u8]) -> &[u8] {
  &keyword_record[8..10]
}
pub(super) fn get_value(keyword_record: &[u8]) -> &[u8] {
  &keyword_record[10..]
}
pub(super) fn get_left_trimmed_value(keyword_record: &[u8]) -> &[u8] {
  get_value(keyword_record).trim_ascii_start()
}

pub(super) fn check_expected_value(keyword_record: &[u8], expected: &[u8]) -> Result<(), FitsError> {
  debug_assert!(keyword_record.len() == 80); // length of a FITS keyword-record
  let lt_src = get_left_trimmed_value(keyword_record);
  if lt_src.len() >= expected.len() && &lt_src[..expected.len()] == expected {
    Ok(())
  } else {
    let keyword = String::from_utf8_lossy(get_keyword(keyword_record))
      .trim_end()
      .to_string();
    let expected_str = String::from_utf8_lossy(expected).to_string();
    // Here, may contains binary data
    let actual = String::from_utf8_lossy(&lt_src[..expected.len().min(lt_src.len())]).to_string();
    Err(FitsError::UnexpectedValue {
      keyword,
      expected: expected_str,
      actual,
    })
  }
}

/// We know that the expected value does not contains a simple quote.
/// A trim_end is applied so that the result does not contain leading or trailing spaces.
pub(super) fn get_str_val_no_quote(keyword_record: &[u8]) -> Result<&[u8], FitsError> {
  let mut it = get_left_trimmed_value(keyword_record).split_inclusive(|c| *c == b'\'');
  if let Some([b'\'']) = it.next() {
    if let Some([subslice @ .., b'\'']) = it.next() {
      return Ok(subslice.trim_ascii());
    }
  }
  let keyword_record = String::from_utf8_lossy(keyword_record).trim_end().to_string();
  Err(FitsError::StringValueNotFound { keyword_record })
}

pub(super) fn parse_uint_val<T>(keyword_record: &[u8]) -> Result<T, FitsError>
where
  T: Into<u64> + FromStr<Err = ParseIntError>,
{
  let src = get_left_trimmed_value(keyword_record);
  let to = index_of_last_digit(src);
  if to == 0 {
    let keyword_record = String::from_utf8_lossy(keyword_record).trim_end().to_string();
    Err(FitsError::UintValueNotFound { keyword_record })
  } else {
    // Only ASCII digits from here
    let str_val = String::from_utf8_lossy(&src[..to]);
    str_val.parse::<T>().map_err(|e| FitsError::WrongUintValue {
      context: str_val.to_string(),
      err: e,
    })
  }
}

pub(super) fn index_of_last_digit(src: &[u8]) -> usize {
  src
    .iter()
    .position(|c| !c.is_ascii_digit())
    .unwrap_or(src.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn testok_uint_val() {
    let mut kw = [b' '; 80];
    kw[..30].copy_from_slice(b"NSIDE   =                 1024");
    assert_eq!(1024_u32, parse_uint_val::<u32>(&kw).unwrap());
    kw[30..40].copy_from_slice(b" / comment");
    assert_eq!(1024_u64, parse_uint_val::<u64>(&kw).unwrap());
  }

  #[test]
  fn testerr_uint_val() {
    let mut kw = [b' '; 80];
    kw[..20].copy_from_slice(b"NSIDE   = 'HEALPIX' ");
    assert!(matches!(
      parse_uint_val::<u32>(&kw),
      Err(FitsError::UintValueNotFound { .. })
    ));
    kw[..30].copy_from_slice(b"NSIDE   =          99999999999");
    assert!(matches!(
      parse_uint_val::<u32>(&kw),
      Err(FitsError::WrongUintValue { .. })
    ));
  }

  #[test]
  fn testok_str_val() {
    let mut kw = [b' '; 80];
    kw[..20].copy_from_slice(b"PIXTYPE = 'HEALPIX '");
    assert_eq!(b"HEALPIX", get_str_val_no_quote(&kw).unwrap());
    assert!(check_keyword_and_val(&kw, b"PIXTYPE ", b"'HEALPIX").is_ok());
    assert!(matches!(
      check_keyword_and_val(&kw, b"ORDERING", b"'RING"),
      Err(FitsError::UnexpectedKeyword { .. })
    ));
  }
}
