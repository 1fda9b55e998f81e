use std::collections::HashMap;

use thiserror::Error;

use super::solver::{Point, TransformMatrix};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
}

// ---------------------------------------------------------------------------
// Coordinate input: cell text or numbers
// ---------------------------------------------------------------------------

/// Anything that can be read as a coordinate value.
pub trait ToCoordinate {
    fn to_coordinate(&self) -> Result<f64, TransformError>;
}

impl ToCoordinate for f64 {
    fn to_coordinate(&self) -> Result<f64, TransformError> {
        Ok(*self)
    }
}

/// Cell text; surrounding whitespace is ignored and a decimal comma is
/// accepted.
impl ToCoordinate for str {
    fn to_coordinate(&self) -> Result<f64, TransformError> {
        let text = self.trim();
        text.replace(',', ".")
            .parse::<f64>()
            .map_err(|_| TransformError::NotANumber(text.to_string()))
    }
}

impl ToCoordinate for String {
    fn to_coordinate(&self) -> Result<f64, TransformError> {
        self.as_str().to_coordinate()
    }
}

/// Apply `matrix` to one `(x, y, z)` triple.
pub fn transform<T>(matrix: &TransformMatrix, x: &T, y: &T, z: &T) -> Result<Point, TransformError>
where
    T: ToCoordinate + ?Sized,
{
    let p = [x.to_coordinate()?, y.to_coordinate()?, z.to_coordinate()?];
    Ok(matrix.apply(p))
}

// ---------------------------------------------------------------------------
// CoordinateTransformer – per-row memoization
// ---------------------------------------------------------------------------

/// Transforms rows and remembers the result by row identity, so redrawing
/// an unchanged preview does not recompute. Call [`invalidate`] whenever
/// the underlying table changes.
///
/// [`invalidate`]: CoordinateTransformer::invalidate
#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    matrix: TransformMatrix,
    cache: HashMap<usize, Point>,
}

impl CoordinateTransformer {
    pub fn new(matrix: TransformMatrix) -> Self {
        Self {
            matrix,
            cache: HashMap::new(),
        }
    }

    /// Transformed coordinates of source row `row`. Failures are not cached.
    pub fn transform_row(&mut self, row: usize, x: &str, y: &str, z: &str) -> Result<Point, TransformError> {
        if let Some(p) = self.cache.get(&row) {
            return Ok(*p);
        }
        let p = transform(&self.matrix, x, y, z)?;
        self.cache.insert(row, p);
        Ok(p)
    }

    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    #[cfg(test)]
    pub fn cached_rows(&self) -> usize {
        self.cache.len()
    }
}
