use std::{
  fs::File,
  io::{BufWriter, Write},
  mem::size_of,
  path::Path,
};

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{SecondsFormat, Utc};
use log::debug;

use super::{
  error::FitsError,
  keywords::{FitsCard, IndexSchema, PixType, TForm1, TFormType},
  HealpixMap,
};

/// Writes the given map in a FITS file, overwriting the file if it already exists.
///
/// The values are stored in a BINTABLE extension with one `SIGNAL` column of `f32` (`TFORM1 = '1E'`),
/// one value per row.
pub fn write_healpix_map<P: AsRef<Path>>(path: P, map: &HealpixMap) -> Result<(), FitsError> {
  let path = path.as_ref();
  let file = File::create(path).map_err(|err| FitsError::IoWithPath {
    path: path.to_string_lossy().to_string(),
    err,
  })?;
  let mut writer = BufWriter::new(file);
  write_healpix_map_to(&mut writer, map)?;
  writer.flush().map_err(FitsError::Io)
}

/// Same as [write_healpix_map](fn.write_healpix_map.html), in a writer.
pub fn write_healpix_map_to<W: Write>(mut writer: W, map: &HealpixMap) -> Result<(), FitsError> {
  write_primary_hdu(&mut writer)?;
  write_map_header(&mut writer, map)?;
  for value in map.values() {
    writer.write_f32::<BigEndian>(*value)?;
  }
  debug!(
    "HEALPix map written. Nside: {}; ordering: {}; n values: {}.",
    map.nside(),
    map.scheme(),
    map.len()
  );
  write_final_padding(writer, map.len() * size_of::<f32>())
}

/// Possible add blanks at the end of the FITS file to complete the last
/// 2880 bytes block.
pub(crate) fn write_final_padding<W: Write>(
  mut writer: W,
  n_bytes_already_written: usize,
) -> Result<(), FitsError> {
  let mod2880 = n_bytes_already_written % 2880;
  if mod2880 != 0 {
    writer.write_all(&vec![0_u8; 2880 - mod2880])?;
  }
  Ok(())
}

/// # Params
/// - `dest` destination, must contains 80 bytes
/// - `value_part` is string, must be already quote: `'str_value'`
pub(crate) fn write_keyword_record(dest: &mut [u8], keyword: &[u8; 8], value_part: &str) {
  const VALUE_INDICATOR: &[u8; 2] = b"= ";
  debug_assert_eq!(dest.len(), 80);
  dest[0..8].copy_from_slice(&keyword[..]);
  dest[8..10].copy_from_slice(VALUE_INDICATOR);
  let val_bytes = value_part.as_bytes();
  let len = val_bytes.len().min(70);
  dest[10..10 + len].copy_from_slice(&val_bytes[..len]);
}

/// Integer value right-justified in columns 11 to 30 (fixed format).
pub(crate) fn write_uint_mandatory_keyword_record(dest: &mut [u8], keyword: &[u8; 8], val: u64) {
  let val = format!("{:>20}", val);
  write_keyword_record(dest, keyword, &val)
}

pub(crate) fn write_primary_hdu<W: Write>(writer: &mut W) -> Result<(), FitsError> {
  let mut header_block = HeaderBlock::new();
  header_block.raw(b"SIMPLE  =                    T");
  header_block.raw(b"BITPIX  =                    8");
  header_block.raw(b"NAXIS   =                    0");
  header_block.raw(b"EXTEND  =                    T");
  header_block.write_end(writer)
}

fn write_map_header<W: Write>(writer: &mut W, map: &HealpixMap) -> Result<(), FitsError> {
  let n_cells = map.len() as u64;
  let tform1 = TForm1 {
    repeat: 1,
    kind: TFormType::E,
  };
  let mut header_block = HeaderBlock::new();
  // BINTABLE specific keywords
  header_block.raw(b"XTENSION= 'BINTABLE'");
  header_block.raw(b"BITPIX  =                    8");
  header_block.raw(b"NAXIS   =                    2");
  header_block.uint(b"NAXIS1  ", tform1.n_bytes() as u64);
  header_block.uint(b"NAXIS2  ", n_cells);
  header_block.raw(b"PCOUNT  =                    0");
  header_block.raw(b"GCOUNT  =                    1");
  header_block.raw(b"TFIELDS =                    1");
  header_block.raw(b"TTYPE1  = 'SIGNAL  '");
  header_block.card(&tform1);
  // HEALPix specific keywords
  header_block.card(&PixType::Healpix);
  header_block.card(&map.scheme());
  header_block.card(&IndexSchema::Implicit);
  header_block.uint(b"NSIDE   ", map.nside() as u64);
  header_block.raw(b"FIRSTPIX=                    0");
  header_block.uint(b"LASTPIX ", n_cells - 1);
  header_block.raw(b"OBJECT  = 'FULLSKY '");
  header_block.card(&map.coordsys());
  header_block.keyword(
    b"DATE    ",
    &format!("'{}'", Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
  );
  header_block.keyword(
    b"CREATOR ",
    &format!(
      "'Rust crate {} {}'",
      env!("CARGO_PKG_NAME"),
      env!("CARGO_PKG_VERSION")
    ),
  );
  header_block.write_end(writer)
}

/// A single 2880 bytes header block, filled card after card.
struct HeaderBlock {
  block: [u8; 2880],
  n_cards: usize,
}

impl HeaderBlock {
  fn new() -> Self {
    Self {
      block: [b' '; 2880],
      n_cards: 0,
    }
  }

  fn next_card(&mut self) -> &mut [u8] {
    // The 'END' card must fit in the block
    debug_assert!(self.n_cards < 35);
    let from = self.n_cards * 80;
    self.n_cards += 1;
    &mut self.block[from..from + 80]
  }

  fn raw(&mut self, record: &[u8]) {
    self.next_card()[..record.len()].copy_from_slice(record);
  }

  fn uint(&mut self, keyword: &[u8; 8], val: u64) {
    write_uint_mandatory_keyword_record(self.next_card(), keyword, val);
  }

  fn keyword(&mut self, keyword: &[u8; 8], value_part: &str) {
    write_keyword_record(self.next_card(), keyword, value_part);
  }

  fn card<C: FitsCard>(&mut self, card: &C) {
    card.write_keyword_record(self.next_card());
  }

  fn write_end<W: Write>(mut self, writer: &mut W) -> Result<(), FitsError> {
    self.raw(b"END");
    writer.write_all(&self.block[..]).map_err(FitsError::Io)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn testok_primary_hdu() {
    let mut buf = Vec::new();
    write_primary_hdu(&mut buf).unwrap();
    assert_eq!(2880, buf.len());
    assert_eq!(b"SIMPLE  =                    T", &buf[0..30]);
    assert_eq!(b"END ", &buf[320..324]);
  }

  #[test]
  fn testok_uint_keyword_record() {
    let mut dest = [b' '; 80];
    write_uint_mandatory_keyword_record(&mut dest, b"NSIDE   ", 1024);
    assert_eq!(b"NSIDE   =                 1024", &dest[..30]);
    assert!(dest[30..].iter().all(|b| *b == b' '));
  }

  #[test]
  fn testok_padding() {
    let mut buf = Vec::new();
    write_final_padding(&mut buf, 4 * 12).unwrap();
    assert_eq!(2880 - 48, buf.len());
    let mut buf = Vec::new();
    write_final_padding(&mut buf, 2880).unwrap();
    assert!(buf.is_empty());
  }
}
