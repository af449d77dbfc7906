//! Directions of the neighbours of a cell in the local `(i, j)` grid of its base cell.

use std::mem;

/// Main winds directions, from the point of view of a cell in its base cell.
/// The south-east axis is the `i` axis, the south-west axis is the `j` axis:
/// ```text
///  W NW  N
/// SW  C NE
///  S SE  E
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MainWind {
  /// South
  S,
  /// Southeast
  SE,
  /// East
  E,
  /// Southwest
  SW,
  /// Center (not a real main winds)
  C,
  /// Northeast
  NE,
  /// West
  W,
  /// Northwest
  NW,
  /// North
  N,
}

impl MainWind {
  /// The 8 main winds but the center, in the order used to report neighbours.
  pub const NEIGHBOURS: [MainWind; 8] = [
    MainWind::S,
    MainWind::SE,
    MainWind::E,
    MainWind::SW,
    MainWind::NE,
    MainWind::W,
    MainWind::NW,
    MainWind::N,
  ];

  /// Returns the main wind of given index, `None` if the index is not in `[0, 8]`.
  ///
  /// ```rust
  /// use hpxcore::compass_point::MainWind;
  ///
  /// assert_eq!(MainWind::from_index(0), Some(MainWind::S));
  /// assert_eq!(MainWind::from_index(4), Some(MainWind::C));
  /// assert_eq!(MainWind::from_index(8), Some(MainWind::N));
  /// assert_eq!(MainWind::from_index(9), None);
  /// ```
  pub fn from_index(i: u8) -> Option<MainWind> {
    match i {
      0 => Some(MainWind::S),
      1 => Some(MainWind::SE),
      2 => Some(MainWind::E),
      3 => Some(MainWind::SW),
      4 => Some(MainWind::C),
      5 => Some(MainWind::NE),
      6 => Some(MainWind::W),
      7 => Some(MainWind::NW),
      8 => Some(MainWind::N),
      _ => None,
    }
  }

  /// Returns the main wind given the offsets along the south-east and the south-west axis,
  /// both in `[-1, 1]`.
  ///
  /// ```rust
  /// use hpxcore::compass_point::MainWind;
  /// use hpxcore::compass_point::MainWind::{S, SE, E, SW, C, NE, W, NW, N};
  ///
  /// assert_eq!(MainWind::from_offsets(-1, -1),  S);
  /// assert_eq!(MainWind::from_offsets( 0, -1), SE);
  /// assert_eq!(MainWind::from_offsets( 1, -1),  E);
  /// assert_eq!(MainWind::from_offsets(-1,  0), SW);
  /// assert_eq!(MainWind::from_offsets( 0,  0),  C);
  /// assert_eq!(MainWind::from_offsets( 1,  0), NE);
  /// assert_eq!(MainWind::from_offsets(-1,  1),  W);
  /// assert_eq!(MainWind::from_offsets( 0,  1), NW);
  /// assert_eq!(MainWind::from_offsets( 1,  1),  N);
  /// ```
  pub fn from_offsets(offset_se: i8, offset_sw: i8) -> MainWind {
    debug_assert!((-1_i8..=1_i8).contains(&offset_se));
    debug_assert!((-1_i8..=1_i8).contains(&offset_sw));
    match (offset_se, offset_sw) {
      (-1, -1) => MainWind::S,
      (0, -1) => MainWind::SE,
      (1, -1) => MainWind::E,
      (-1, 0) => MainWind::SW,
      (1, 0) => MainWind::NE,
      (-1, 1) => MainWind::W,
      (0, 1) => MainWind::NW,
      (1, 1) => MainWind::N,
      _ => MainWind::C,
    }
  }

  /// ```rust
  /// use hpxcore::compass_point::MainWind;
  ///
  /// assert_eq!(MainWind::S.opposite(),  MainWind::N);
  /// assert_eq!(MainWind::SE.opposite(), MainWind::NW);
  /// assert_eq!(MainWind::C.opposite(),  MainWind::C);
  /// ```
  pub fn opposite(&self) -> MainWind {
    match *self {
      MainWind::S => MainWind::N,
      MainWind::SE => MainWind::NW,
      MainWind::E => MainWind::W,
      MainWind::SW => MainWind::NE,
      MainWind::C => MainWind::C,
      MainWind::NE => MainWind::SW,
      MainWind::W => MainWind::E,
      MainWind::NW => MainWind::SE,
      MainWind::N => MainWind::S,
    }
  }

  fn index(&self) -> usize {
    (3 * (self.offset_sw() + 1) + (self.offset_se() + 1)) as usize
  }

  /// Offset along the south-east (`i`) axis:
  /// ```text
  ///  W NW  N
  /// SW  C NE
  ///  S SE  E
  /// -1  0  1
  /// ```
  pub(crate) fn offset_se(&self) -> i8 {
    match *self {
      MainWind::S | MainWind::SW | MainWind::W => -1,
      MainWind::SE | MainWind::C | MainWind::NW => 0,
      MainWind::E | MainWind::NE | MainWind::N => 1,
    }
  }

  /// Offset along the south-west (`j`) axis:
  /// ```text
  ///  1 |  W NW  N
  ///  0 | SW  C NE
  /// -1 |  S SE  E
  /// ```
  pub(crate) fn offset_sw(&self) -> i8 {
    match *self {
      MainWind::S | MainWind::SE | MainWind::E => -1,
      MainWind::SW | MainWind::C | MainWind::NE => 0,
      MainWind::W | MainWind::NW | MainWind::N => 1,
    }
  }
}

/// Equivalent of a Java EnumMap for the main winds.
/// We require T to implement the Copy trait since internally we use an array stored on the stack.
#[derive(Debug, Clone, Copy)]
pub struct MainWindMap<T: Copy> {
  array: [Option<T>; 9],
}

impl<T: Copy> Default for MainWindMap<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<V: Copy> MainWindMap<V> {
  /// Creates a new empty map.
  pub fn new() -> MainWindMap<V> {
    MainWindMap { array: [None; 9] }
  }

  /// Associate the given value with the given direction
  pub fn put(&mut self, key: MainWind, value: V) -> Option<V> {
    mem::replace(&mut self.array[key.index()], Some(value))
  }

  /// Associate the given Option with the given direction
  pub fn put_opt(&mut self, key: MainWind, value: Option<V>) -> Option<V> {
    mem::replace(&mut self.array[key.index()], value)
  }

  pub fn get(&self, key: MainWind) -> Option<&V> {
    self.array[key.index()].as_ref()
  }

  /// Number of directions having a value.
  pub fn len(&self) -> usize {
    self.array.iter().filter(|o| o.is_some()).count()
  }

  pub fn is_empty(&self) -> bool {
    self.array.iter().all(|o| o.is_none())
  }

  /// Values of the 8 neighbour directions (the center excluded), in the
  /// [MainWind::NEIGHBOURS](enum.MainWind.html#associatedconstant.NEIGHBOURS) order.
  pub fn neighbours(&self) -> [Option<V>; 8] {
    MainWind::NEIGHBOURS.map(|dir| self.array[dir.index()])
  }

  pub fn entries(&self) -> Vec<(MainWind, V)> {
    self
      .array
      .iter()
      .enumerate()
      .filter_map(|(i, o)| {
        o.and_then(|v| MainWind::from_index(i as u8).map(|dir| (dir, v)))
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn testok_index_matches_from_index() {
    for i in 0..9_u8 {
      let dir = MainWind::from_index(i).unwrap();
      assert_eq!(i as usize, dir.index());
      assert_eq!(dir, MainWind::from_offsets(dir.offset_se(), dir.offset_sw()));
      assert_eq!(dir.opposite().opposite(), dir);
    }
  }

  #[test]
  fn testok_map() {
    let mut map = MainWindMap::new();
    assert!(map.is_empty());
    map.put(MainWind::N, 3_u64);
    map.put_opt(MainWind::S, Some(1));
    map.put_opt(MainWind::E, None);
    map.put(MainWind::C, 0);
    assert_eq!(3, map.len());
    assert_eq!(Some(&3), map.get(MainWind::N));
    assert_eq!(None, map.get(MainWind::E));
    assert_eq!(
      [Some(1), None, None, None, None, None, None, Some(3)],
      map.neighbours()
    );
    assert_eq!(
      vec![(MainWind::S, 1), (MainWind::C, 0), (MainWind::N, 3)],
      map.entries()
    );
  }
}
