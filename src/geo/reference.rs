use std::sync::OnceLock;

use super::solver::{solve, Point, TransformMatrix};

/// Survey control points in the mine's local engineering grid (metres).
pub const LOCAL_REFERENCE_POINTS: [Point; 3] = [
    [1000.0, 2000.0, 300.0],
    [3500.0, 1500.0, 250.0],
    [2000.0, 4500.0, -200.0],
];

/// The same control points in the projected geodetic system
/// (easting, northing, height).
pub const GEODETIC_REFERENCE_POINTS: [Point; 3] = [
    [570200.0, 7394400.0, 180.0],
    [572100.0, 7396100.0, 130.0],
    [568800.0, 7396700.0, -320.0],
];

static REFERENCE_TRANSFORM: OnceLock<TransformMatrix> = OnceLock::new();

/// Local → geodetic transform, solved once per process.
pub fn reference_transform() -> &'static TransformMatrix {
    REFERENCE_TRANSFORM.get_or_init(|| {
        let m = solve(&LOCAL_REFERENCE_POINTS, &GEODETIC_REFERENCE_POINTS);
        log::debug!(
            "Reference transform: rotation {} translation {}",
            m.rotation(),
            m.translation()
        );
        m
    })
}
