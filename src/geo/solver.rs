use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

/// A point as `[x, y, z]`.
pub type Point = [f64; 3];

// ---------------------------------------------------------------------------
// TransformMatrix – 4x4 homogeneous rigid-body transform
// ---------------------------------------------------------------------------

/// Homogeneous rotation + translation. Immutable once built; the rotation
/// block is a proper rotation (determinant +1) when produced by [`solve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrix(Matrix4<f64>);

impl TransformMatrix {
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    pub fn from_parts(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Self {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
        Self(m)
    }

    #[cfg(test)]
    pub fn as_matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// Top-left 3x3 block.
    pub fn rotation(&self) -> Matrix3<f64> {
        self.0.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Top-right column.
    pub fn translation(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// `M · [x, y, z, 1]ᵀ`, first three components.
    pub fn apply(&self, p: Point) -> Point {
        let v = self.0 * Vector4::new(p[0], p[1], p[2], 1.0);
        [v.x, v.y, v.z]
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Least-squares rigid transform mapping `source[i]` onto `target[i]`
/// (Kabsch fit).
///
/// Both point sets are centred on their centroids, the cross-covariance
/// `H = Σ (sᵢ - s̄)(tᵢ - t̄)ᵀ` is decomposed as `U Σ Vᵀ` and the rotation is
/// `R = V Uᵀ`. An improper result (det < 0) is corrected by flipping the
/// row of `Vᵀ` belonging to the smallest singular value. The translation is
/// `t̄ - R s̄`.
///
/// Collinear or coincident points leave the rotation under-determined; the
/// result is then whatever the decomposition yields and is not checked.
pub fn solve(source: &[Point; 3], target: &[Point; 3]) -> TransformMatrix {
    let src = source.map(Vector3::from);
    let dst = target.map(Vector3::from);
    let src_centroid = centroid(&src);
    let dst_centroid = centroid(&dst);

    let mut h = Matrix3::zeros();
    for (s, d) in src.iter().zip(&dst) {
        h += (s - src_centroid) * (d - dst_centroid).transpose();
    }

    // Both factors are requested, so they are always present.
    let svd = h.svd(true, true);
    let (Some(u), Some(mut v_t)) = (svd.u, svd.v_t) else {
        log::error!("SVD returned no U/Vᵀ factors, using the identity transform");
        return TransformMatrix::identity();
    };

    let mut rotation = v_t.transpose() * u.transpose();
    if rotation.determinant() < 0.0 {
        let smallest = svd.singular_values.imin();
        v_t.row_mut(smallest).neg_mut();
        rotation = v_t.transpose() * u.transpose();
    }

    let translation = dst_centroid - rotation * src_centroid;
    TransformMatrix::from_parts(&rotation, &translation)
}

fn centroid(points: &[Vector3<f64>; 3]) -> Vector3<f64> {
    points.iter().fold(Vector3::zeros(), |acc, p| acc + p) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Unit};

    const EPS: f64 = 1e-9;

    fn assert_close(a: Point, b: Point, tol: f64) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < tol, "{a:?} != {b:?}");
        }
    }

    fn assert_proper_rotation(m: &TransformMatrix) {
        let r = m.rotation();
        let should_be_identity = r.transpose() * r;
        assert!((should_be_identity - Matrix3::identity()).abs().max() < EPS);
        assert!((r.determinant() - 1.0).abs() < EPS);
        assert_eq!(m.as_matrix().row(3).transpose(), Vector4::new(0.0, 0.0, 0.0, 1.0));
    }

    const P: [Point; 3] = [[1.0, 2.0, 3.0], [4.0, -1.0, 0.5], [-2.0, 5.0, 7.0]];

    #[test]
    fn identity_point_sets() {
        let m = solve(&P, &P);
        assert_proper_rotation(&m);
        for p in P {
            assert_close(m.apply(p), p, EPS);
        }
        assert_close(m.apply([123.0, -45.5, 6.25]), [123.0, -45.5, 6.25], 1e-8);
    }

    #[test]
    fn recovers_rotation_and_translation() {
        let axis = Unit::new_normalize(Vector3::new(1.0, -2.0, 0.5));
        let rot = Rotation3::from_axis_angle(&axis, 0.7);
        let shift = Vector3::new(10.0, -4.0, 2.5);
        let target = P.map(|p| {
            let q = rot * Vector3::from(p) + shift;
            [q.x, q.y, q.z]
        });

        let m = solve(&P, &target);
        assert_proper_rotation(&m);
        assert!((m.rotation() - rot.matrix()).abs().max() < EPS);
        assert!((m.translation() - shift).abs().max() < EPS);
        for (p, t) in P.iter().zip(&target) {
            assert_close(m.apply(*p), *t, EPS);
        }
    }

    #[test]
    fn mirrored_target_still_gives_proper_rotation() {
        let mirrored = P.map(|p| [-p[0], p[1], p[2]]);
        let m = solve(&P, &mirrored);
        assert_proper_rotation(&m);
    }

    #[test]
    fn translation_only() {
        let target = P.map(|p| [p[0] + 5.0, p[1] - 3.0, p[2] + 0.25]);
        let m = solve(&P, &target);
        assert!((m.rotation() - Matrix3::identity()).abs().max() < EPS);
        assert!((m.translation() - Vector3::new(5.0, -3.0, 0.25)).abs().max() < EPS);
    }
}
