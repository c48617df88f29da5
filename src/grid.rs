use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::AssetLoadError;
use crate::npy;

/// Width and height of every map.
pub const GRID_SIZE: usize = 20;

/// The map compiled into the binary: `(20, 20, 3)` uint8, channel 0 is
/// traversability.
static BUNDLED_MAP: &[u8] = include_bytes!("../assets/qvik_array.npy");

/// A grid coordinate. `x` is the column, `y` the row, row 0 at the top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Immutable 20x20 traversability matrix, addressed `[row][col]`.
#[derive(Clone, PartialEq, Eq)]
pub struct GridMap {
    cells: [[bool; GRID_SIZE]; GRID_SIZE],
}

impl GridMap {
    /// A map with every cell passable.
    pub fn open() -> Self {
        Self {
            cells: [[true; GRID_SIZE]; GRID_SIZE],
        }
    }

    /// Decode the map shipped with the crate.
    pub fn bundled() -> Result<Self, AssetLoadError> {
        Self::from_npy(BUNDLED_MAP)
    }

    /// Read a map from disk. `.npy` files are decoded as NumPy arrays,
    /// everything else as ASCII art (see [`GridMap::from_ascii`]).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AssetLoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        if path.extension().is_some_and(|ext| ext == "npy") {
            Self::from_npy(&bytes)
        } else {
            let text = String::from_utf8(bytes)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            Self::from_ascii(&text)
        }
    }

    /// Decode a `(20, 20)` or `(20, 20, k)` one-byte array. Only channel 0
    /// of a three-dimensional array is used; nonzero means passable.
    pub fn from_npy(bytes: &[u8]) -> Result<Self, AssetLoadError> {
        let arr = npy::parse(bytes)?;
        let channels = match arr.shape.as_slice() {
            [GRID_SIZE, GRID_SIZE] => 1,
            [GRID_SIZE, GRID_SIZE, 0] => {
                return Err(AssetLoadError::Npy("array has no channels".to_string()));
            }
            [GRID_SIZE, GRID_SIZE, k] => *k,
            [rows, cols] | [rows, cols, _] => {
                return Err(AssetLoadError::Shape {
                    rows: *rows,
                    cols: *cols,
                });
            }
            [n] => return Err(AssetLoadError::Shape { rows: *n, cols: 0 }),
            [] => return Err(AssetLoadError::Shape { rows: 0, cols: 0 }),
            dims => {
                return Err(AssetLoadError::Npy(format!(
                    "expected 2 or 3 dimensions, got {}",
                    dims.len()
                )));
            }
        };

        let mut cells = [[false; GRID_SIZE]; GRID_SIZE];
        for (y, row) in cells.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = arr.data[(y * GRID_SIZE + x) * channels] != 0;
            }
        }
        Ok(Self { cells })
    }

    /// Parse 20 lines of 20 characters, `.` for open and `#` for wall.
    /// Blank lines and surrounding whitespace are ignored.
    pub fn from_ascii(text: &str) -> Result<Self, AssetLoadError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.len() != GRID_SIZE {
            let cols = rows.first().map_or(0, |r| r.chars().count());
            return Err(AssetLoadError::Shape {
                rows: rows.len(),
                cols,
            });
        }

        let mut cells = [[false; GRID_SIZE]; GRID_SIZE];
        for (y, line) in rows.iter().enumerate() {
            let width = line.chars().count();
            if width != GRID_SIZE {
                return Err(AssetLoadError::Shape {
                    rows: GRID_SIZE,
                    cols: width,
                });
            }
            for (x, ch) in line.chars().enumerate() {
                cells[y][x] = match ch {
                    '.' => true,
                    '#' => false,
                    found => {
                        return Err(AssetLoadError::Cell {
                            row: y,
                            col: x,
                            found,
                        });
                    }
                };
            }
        }
        Ok(Self { cells })
    }

    /// Whether `(x, y)` lies on the map. Takes signed coordinates so a
    /// candidate move off the edge can be asked about directly.
    #[inline]
    pub fn contains(x: isize, y: isize) -> bool {
        (0..GRID_SIZE as isize).contains(&x) && (0..GRID_SIZE as isize).contains(&y)
    }

    /// Whether the robot may enter `cell`. Panics if `cell` is off the map.
    #[inline]
    pub fn passable(&self, cell: Cell) -> bool {
        self.cells[cell.y][cell.x]
    }

    #[cfg(test)]
    fn open_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c).count()
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for &open in row {
                f.write_str(if open { "." } else { "#" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GridMap\n{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npy::tests::encode;

    const BUNDLED_ASCII: &str = "
        #..#.#...##....#....
        .#....#....#....#...
        ..##...#.#..#..#....
        ...#....##...#....#.
        ...##....#.........#
        #....#....#.........
        .#.#..#..#.#...##...
        ..##...#.#.....#.#..
        ...#....##...#.#..#.
        ....#.........#....#
        #..#.#.........#....
        .#.#..#....#...##...
        ..##.....#..#..#.#..
        ...#....#....#....#.
        ...#.....#....##...#
        #........##....#....
        .#....#..#.#...##...
        .......#....#....#..
        ...#....##...#.#..#.
        ...##....#....##...#
    ";

    #[test]
    fn test_bundled_matches_ascii() {
        let bundled = GridMap::bundled().unwrap();
        let ascii = GridMap::from_ascii(BUNDLED_ASCII).unwrap();
        assert_eq!(bundled, ascii);
    }

    #[test]
    fn test_bundled_start_and_goal_open() {
        let map = GridMap::bundled().unwrap();
        assert!(map.passable(Cell::new(0, 19)));
        assert!(map.passable(Cell::new(19, 0)));
    }

    #[test]
    fn test_display_round_trips() {
        let map = GridMap::from_ascii(BUNDLED_ASCII).unwrap();
        let again = GridMap::from_ascii(&map.to_string()).unwrap();
        assert_eq!(map, again);
    }

    #[test]
    fn test_open_map() {
        let map = GridMap::open();
        assert_eq!(map.open_count(), GRID_SIZE * GRID_SIZE);
    }

    #[test]
    fn test_row_is_y() {
        let mut text = String::new();
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                text.push(if x == 3 && y == 7 { '#' } else { '.' });
            }
            text.push('\n');
        }
        let map = GridMap::from_ascii(&text).unwrap();
        assert!(!map.passable(Cell::new(3, 7)));
        assert!(map.passable(Cell::new(7, 3)));
        assert_eq!(map.open_count(), GRID_SIZE * GRID_SIZE - 1);
    }

    #[test]
    fn test_ascii_wrong_row_count() {
        let text = ".".repeat(GRID_SIZE) + "\n";
        assert!(matches!(
            GridMap::from_ascii(&text),
            Err(AssetLoadError::Shape { rows: 1, cols: 20 })
        ));
    }

    #[test]
    fn test_ascii_wrong_width() {
        let mut text = String::new();
        for _ in 0..GRID_SIZE {
            text.push_str(&".".repeat(GRID_SIZE - 1));
            text.push('\n');
        }
        assert!(matches!(
            GridMap::from_ascii(&text),
            Err(AssetLoadError::Shape { rows: 20, cols: 19 })
        ));
    }

    #[test]
    fn test_ascii_bad_character() {
        let text = BUNDLED_ASCII.replacen('#', "x", 1);
        assert!(matches!(
            GridMap::from_ascii(&text),
            Err(AssetLoadError::Cell { row: 0, col: 0, found: 'x' })
        ));
    }

    #[test]
    fn test_npy_two_dimensional() {
        let mut data = vec![1u8; GRID_SIZE * GRID_SIZE];
        data[5 * GRID_SIZE + 2] = 0;
        let map = GridMap::from_npy(&encode("|b1", &[20, 20], &data)).unwrap();
        assert!(!map.passable(Cell::new(2, 5)));
        assert_eq!(map.open_count(), GRID_SIZE * GRID_SIZE - 1);
    }

    #[test]
    fn test_npy_uses_first_channel() {
        // Channel 0 open everywhere, other channels closed.
        let mut data = vec![0u8; GRID_SIZE * GRID_SIZE * 2];
        for i in 0..GRID_SIZE * GRID_SIZE {
            data[i * 2] = 255;
        }
        let map = GridMap::from_npy(&encode("|u1", &[20, 20, 2], &data)).unwrap();
        assert_eq!(map, GridMap::open());
    }

    #[test]
    fn test_npy_wrong_shape() {
        let data = vec![1u8; 10 * 40];
        assert!(matches!(
            GridMap::from_npy(&encode("|u1", &[10, 40], &data)),
            Err(AssetLoadError::Shape { rows: 10, cols: 40 })
        ));
        let data = vec![1u8; 400];
        assert!(matches!(
            GridMap::from_npy(&encode("|u1", &[400], &data)),
            Err(AssetLoadError::Shape { rows: 400, cols: 0 })
        ));
    }

    #[test]
    fn test_npy_without_channels() {
        let err = GridMap::from_npy(&encode("|u1", &[20, 20, 0], &[])).unwrap_err();
        assert!(matches!(&err, AssetLoadError::Npy(m) if m.contains("no channels")));
        assert!(!err.to_string().contains("20x20, got 20x20"));
    }

    #[test]
    fn test_npy_too_many_dimensions() {
        let data = vec![1u8; GRID_SIZE * GRID_SIZE * 2];
        assert!(matches!(
            GridMap::from_npy(&encode("|u1", &[20, 20, 1, 2], &data)),
            Err(AssetLoadError::Npy(m)) if m.contains("got 4")
        ));
    }

    #[test]
    fn test_npy_oversized_shape() {
        let bytes = encode("|u1", &[20, 20, usize::MAX / 100], &[1; 400]);
        assert!(matches!(GridMap::from_npy(&bytes), Err(AssetLoadError::Npy(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = GridMap::load("/definitely/not/here.npy").unwrap_err();
        assert!(matches!(err, AssetLoadError::Io(_)));
    }

    #[test]
    fn test_contains() {
        assert!(GridMap::contains(0, 0));
        assert!(GridMap::contains(19, 19));
        assert!(!GridMap::contains(-1, 0));
        assert!(!GridMap::contains(0, 20));
    }
}
