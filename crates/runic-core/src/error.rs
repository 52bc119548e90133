//! Error types shared across the compositor core.

use thiserror::Error;

/// Failure to produce pixel or vertex data at the asset boundary.
///
/// A load failure is never fatal to a frame: the failing resource is pinned
/// to the no-texture sentinel and the sweep continues over the remaining
/// cells.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The named file does not exist or could not be read.
    #[error("missing asset: {0}")]
    MissingAsset(String),

    /// The asset exists but its contents could not be decoded.
    #[error("decode error in {path}: {reason}")]
    Decode { path: String, reason: String },

    /// The font has no usable glyph for this character.
    #[error("no glyph for {0:?}")]
    MissingGlyph(char),

    /// The loader was handed a cache key of the wrong kind.
    #[error("loader cannot serve key {0}")]
    BadKey(String),

    /// The mesh has no geometry to render.
    #[error("mesh is empty")]
    EmptyMesh,
}

/// Rejected grid mutation. The screen's state is untouched whenever one of
/// these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    /// `(row, col)` lies outside the logical extent.
    #[error("cell ({row}, {col}) outside logical extent {cols}x{rows}")]
    OutOfBounds {
        row: usize,
        col: usize,
        cols: usize,
        rows: usize,
    },

    /// The requested footprint overlaps another multi-cell rune.
    #[error("footprint at ({row}, {col}) overlaps an existing rune")]
    Overlap { row: usize, col: usize },

    /// A resize beyond the backing capacity.
    #[error("resize to {cols}x{rows} exceeds capacity {cap_cols}x{cap_rows}")]
    CapacityExceeded {
        cols: usize,
        rows: usize,
        cap_cols: usize,
        cap_rows: usize,
    },
}
