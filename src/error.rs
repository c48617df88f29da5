use std::io;

/// The grid asset could not be read or does not describe a 20x20 map.
#[derive(thiserror::Error, Debug)]
pub enum AssetLoadError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed npy container: {0}")]
    Npy(String),
    #[error("unsupported dtype {0}")]
    Dtype(String),
    #[error("expected a 20x20 grid, got {rows}x{cols}")]
    Shape { rows: usize, cols: usize },
    #[error("unexpected character {found:?} at row {row}, column {col}")]
    Cell { row: usize, col: usize, found: char },
}

/// A program referenced an instruction tag outside the vocabulary.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid instruction {tag:?} (expected one of forward, backward, left, right, f1, f2)")]
pub struct InvalidInstruction {
    pub tag: String,
}
