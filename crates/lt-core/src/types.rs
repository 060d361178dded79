//! Shared data model: labels and row-major embedding matrices.

use std::fmt;
use std::ops::Range;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferError};

/// Categorical label attached to a reference embedding. Only equality matters
/// for consensus; the ordering is used to fix a deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build a label sequence from string slices.
pub fn labels<S: AsRef<str>>(names: &[S]) -> Vec<Label> {
    names.iter().map(|s| Label::from(s.as_ref())).collect()
}

/// N x D embedding collection stored row-major.
///
/// Every row has the same dimension; this is checked when the matrix is
/// constructed so downstream code never has to re-validate it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Build from per-row vectors. An empty input yields an empty matrix of
    /// dimension 0; rows of length 0 are rejected.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.first().map(|r| r.len()).unwrap_or(0);
        if dim == 0 && !rows.is_empty() {
            return Err(TransferError::InvalidDimension { expected: 0, got: 0 });
        }
        let mut data = Vec::with_capacity(dim * rows.len());
        for row in rows {
            if row.len() != dim {
                return Err(TransferError::InvalidDimension {
                    expected: dim,
                    got: row.len(),
                });
            }
            data.extend_from_slice(&row);
        }
        Ok(Self { dim, data })
    }

    /// Build from a flat row-major buffer.
    pub fn from_flat(dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 {
            if data.is_empty() {
                return Ok(Self::default());
            }
            return Err(TransferError::InvalidDimension { expected: 0, got: data.len() });
        }
        if data.len() % dim != 0 {
            return Err(TransferError::InvalidDimension {
                expected: dim,
                got: data.len(),
            });
        }
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn view(&self) -> MatrixView<'_> {
        self.slice(0..self.len())
    }

    /// Borrow a contiguous range of rows.
    pub fn slice(&self, rows: Range<usize>) -> MatrixView<'_> {
        MatrixView {
            dim: self.dim,
            offset: rows.start,
            data: &self.data[rows.start * self.dim..rows.end * self.dim],
        }
    }

    /// Split into contiguous batches of at most `batch_size` rows, in order.
    /// The last batch may be shorter. A `batch_size` of 0 is treated as 1.
    pub fn batches(&self, batch_size: usize) -> impl Iterator<Item = MatrixView<'_>> + '_ {
        let size = batch_size.max(1);
        let len = self.len();
        (0..len).step_by(size).map(move |start| self.slice(start..(start + size).min(len)))
    }
}

/// Borrowed, contiguous run of rows from an [`EmbeddingMatrix`].
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a> {
    dim: usize,
    /// Position of the first row in the parent matrix.
    offset: usize,
    data: &'a [f32],
}

impl<'a> MatrixView<'a> {
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, i: usize) -> &'a [f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &'a [f32]> + 'a {
        let view = *self;
        (0..view.len()).map(move |i| view.row(i))
    }
}
