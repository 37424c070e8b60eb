//! Rectangular character maps
//!
//! The global map and every player's private view share the [`Grid`] type:
//! one contiguous byte buffer addressed by row stride. Loading validates
//! that every row has the same width and only uses map symbols.

use log::debug;
use rand::Rng;
use shared::{is_map_symbol, FLOOR, VOID};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Random placement gives up after this many samples per grid cell.
const PLACEMENT_ATTEMPTS_PER_CELL: usize = 16;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("map has no rows")]
    Empty,
    #[error("row {row} is {found} columns wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unexpected symbol {symbol:?} at row {row}, column {col}")]
    InvalidSymbol { row: usize, col: usize, symbol: char },
    #[error("failed to read map: {0}")]
    Io(#[from] std::io::Error),
    #[error("no open floor found after {attempts} attempts")]
    MapFull { attempts: usize },
}

/// A cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offsets the position, returning `None` if it would leave the
    /// non-negative quadrant.
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Pos> {
        Some(Pos {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// Parses a map from text, one row per line.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let lines: Vec<&str> = text.lines().collect();
        let columns = match lines.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(GridError::Empty),
        };

        let mut cells = Vec::with_capacity(lines.len() * columns);
        for (row, line) in lines.iter().enumerate() {
            if line.len() != columns {
                return Err(GridError::RaggedRow {
                    row,
                    expected: columns,
                    found: line.len(),
                });
            }
            for (col, symbol) in line.bytes().enumerate() {
                if !is_map_symbol(symbol) {
                    return Err(GridError::InvalidSymbol {
                        row,
                        col,
                        symbol: symbol as char,
                    });
                }
            }
            cells.extend_from_slice(line.as_bytes());
        }

        debug!("Loaded {}x{} map", lines.len(), columns);
        Ok(Self {
            rows: lines.len(),
            columns,
            cells,
        })
    }

    /// Reads and parses a map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GridError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Creates an all-void grid with the same dimensions, used as a
    /// player's initial view.
    pub fn blank_like(&self) -> Self {
        Self {
            rows: self.rows,
            columns: self.columns,
            cells: vec![VOID; self.cells.len()],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.columns
    }

    fn index(&self, pos: Pos) -> usize {
        pos.row * self.columns + pos.col
    }

    /// Returns the symbol at `pos`, or `None` outside the grid.
    pub fn get(&self, pos: Pos) -> Option<u8> {
        if self.contains(pos) {
            Some(self.cells[self.index(pos)])
        } else {
            None
        }
    }

    /// Writes a symbol. Writes outside the grid are ignored.
    pub fn set(&mut self, pos: Pos, symbol: u8) {
        if self.contains(pos) {
            let index = self.index(pos);
            self.cells[index] = symbol;
        }
    }

    /// Iterates over every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |col| Pos { row, col }))
    }

    /// Marks a uniformly random floor cell with `symbol` and returns it.
    ///
    /// Sampling is bounded; a map with no reachable floor yields
    /// [`GridError::MapFull`] instead of spinning forever.
    pub fn place_random<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        symbol: u8,
    ) -> Result<Pos, GridError> {
        let attempts = self.cells.len().max(1) * PLACEMENT_ATTEMPTS_PER_CELL;
        if self.cells.is_empty() {
            return Err(GridError::MapFull { attempts: 0 });
        }

        for _ in 0..attempts {
            let pos = Pos {
                row: rng.gen_range(0..self.rows),
                col: rng.gen_range(0..self.columns),
            };
            if self.get(pos) == Some(FLOOR) {
                self.set(pos, symbol);
                return Ok(pos);
            }
        }

        Err(GridError::MapFull { attempts })
    }

    /// Serializes the grid for a DISPLAY message. When a view is given its
    /// cells are shown instead of the global ones.
    pub fn render(&self, view: Option<&Grid>) -> String {
        let source = match view {
            Some(view) => {
                debug_assert!(
                    view.rows == self.rows && view.columns == self.columns,
                    "view is {}x{}, map is {}x{}",
                    view.rows,
                    view.columns,
                    self.rows,
                    self.columns
                );
                view
            }
            None => self,
        };

        let mut out = String::with_capacity(self.rows * (self.columns + 1));
        for (row, chunk) in source.cells.chunks(self.columns.max(1)).enumerate() {
            if row > 0 {
                out.push('\n');
            }
            out.extend(chunk.iter().map(|&b| b as char));
        }
        out
    }
}
