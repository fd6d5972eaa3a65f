//! Domain types for the TA-to-section assignment problem.

use serde::{Deserialize, Serialize};

/// A course section needing TA coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section_id: usize,
    pub instructor: String,
    /// Meeting slot; two sections conflict when these are equal.
    pub daytime: String,
    pub location: String,
    pub students: u32,
    pub topic: String,
    /// Minimum TAs required.
    pub min_ta: u32,
    pub max_ta: u32,
}

/// How a TA feels about a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preference {
    /// `U`: cannot take the section.
    Unavailable,
    /// `W`: willing but not preferred.
    Willing,
    /// Any other code.
    Preferred,
}

impl Preference {
    /// Parse a preference code from the TA table.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "U" => Self::Unavailable,
            "W" => Self::Willing,
            _ => Self::Preferred,
        }
    }
}

/// A teaching assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ta {
    pub ta_id: usize,
    pub name: String,
    /// Maximum sections this TA may take.
    pub max_assigned: u32,
    /// `(section column, preference)` in table order.
    pub preferences: Vec<(usize, Preference)>,
}

/// The fixed problem instance objectives are evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub sections: Vec<Section>,
    pub tas: Vec<Ta>,
}

impl Problem {
    /// Grid shape `(tas, sections)` for candidates of this problem.
    pub fn shape(&self) -> (usize, usize) {
        (self.tas.len(), self.sections.len())
    }
}

/// Binary TA x section assignment grid (row = TA, column = section).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GridData")]
pub struct Assignment {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

/// Serialized grid, checked before it becomes an [`Assignment`].
#[derive(Deserialize)]
struct GridData {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

/// A serialized grid whose cell count does not match its dimensions.
#[derive(Debug, thiserror::Error)]
#[error("grid of {rows} x {cols} cannot hold {cells} cells")]
pub struct GridShapeError {
    pub rows: usize,
    pub cols: usize,
    pub cells: usize,
}

impl TryFrom<GridData> for Assignment {
    type Error = GridShapeError;

    fn try_from(data: GridData) -> Result<Self, Self::Error> {
        if data.rows.checked_mul(data.cols) != Some(data.cells.len()) {
            return Err(GridShapeError {
                rows: data.rows,
                cols: data.cols,
                cells: data.cells.len(),
            });
        }
        Ok(Self {
            rows: data.rows,
            cols: data.cols,
            cells: data.cells,
        })
    }
}

impl Assignment {
    /// An empty (all zero) grid.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    /// Build from row vectors of 0/1 values. Returns `None` if rows are ragged.
    pub fn from_rows(rows: &[Vec<u8>]) -> Option<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let cells = rows.iter().flatten().map(|&v| v != 0).collect();
        Some(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.cells[row * self.cols + col] = value;
    }

    /// Flip one cell.
    #[inline]
    pub fn toggle(&mut self, row: usize, col: usize) {
        let idx = row * self.cols + col;
        self.cells[idx] = !self.cells[idx];
    }

    /// One TA's row.
    pub fn row(&self, row: usize) -> &[bool] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// Replace one TA's row with the same row of `other`.
    pub fn copy_row_from(&mut self, other: &Assignment, row: usize) {
        let range = row * self.cols..(row + 1) * self.cols;
        self.cells[range.clone()].copy_from_slice(&other.cells[range]);
    }

    /// Sections assigned to a TA, ascending.
    pub fn assigned_sections(&self, row: usize) -> Vec<usize> {
        self.row(row)
            .iter()
            .enumerate()
            .filter_map(|(c, &v)| v.then_some(c))
            .collect()
    }

    /// TAs not assigned to a section, ascending.
    pub fn unassigned_tas(&self, col: usize) -> Vec<usize> {
        (0..self.rows).filter(|&r| !self.get(r, col)).collect()
    }

    /// Number of sections assigned to each TA.
    pub fn row_sums(&self) -> Vec<u32> {
        (0..self.rows)
            .map(|r| self.row(r).iter().filter(|&&v| v).count() as u32)
            .collect()
    }

    /// Number of TAs assigned to each section.
    pub fn col_sums(&self) -> Vec<u32> {
        let mut sums = vec![0u32; self.cols];
        for r in 0..self.rows {
            for (c, &v) in self.row(r).iter().enumerate() {
                sums[c] += v as u32;
            }
        }
        sums
    }

    /// All assigned `(ta, section)` cells in row-major order.
    pub fn assigned_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(|(i, _)| (i / self.cols, i % self.cols))
    }
}
