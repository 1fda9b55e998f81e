/// Coordinate conversion between the local mine grid and the geodetic
/// system.
///
/// ```text
///  3 local + 3 geodetic control points
///        │
///        ▼
///   ┌──────────┐
///   │  solver   │  Kabsch fit → TransformMatrix (4x4, det R = +1)
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ transformer  │  (x, y, z) text → transformed point, cached per row
///   └─────────────┘
/// ```

pub mod reference;
pub mod solver;
pub mod transformer;
