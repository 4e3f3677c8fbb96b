//! Mathematical utilities and type definitions.
//!
//! This module provides the fundamental linear algebra aliases used
//! throughout the workspace plus a few matrix helpers shared by the
//! sampler, the rig placement and the JSON serializers.

use nalgebra::{Isometry3, Matrix3, Matrix4, Point3, Rotation3, Vector3};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;

/// Rotation matrix for an XYZ Euler triple (radians).
///
/// The rotation is applied X first, then Y, then Z, i.e. `Rz * Ry * Rx`.
/// This is the "XYZ" Euler mode of common DCC tools.
pub fn euler_xyz(rotation: &Vec3) -> Mat3 {
    Rotation3::from_euler_angles(rotation.x, rotation.y, rotation.z).into_inner()
}

/// Embed a 3×3 linear map into a homogeneous 4×4 matrix.
pub fn homogeneous(m: &Mat3) -> Mat4 {
    m.to_homogeneous()
}

/// Row-major nested array view of a 4×4 matrix, as written to JSON.
pub fn mat4_rows(m: &Mat4) -> [[Real; 4]; 4] {
    let mut rows = [[0.0; 4]; 4];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, v) in row.iter_mut().enumerate() {
            *v = m[(r, c)];
        }
    }
    rows
}

/// Inverse of [`mat4_rows`].
pub fn mat4_from_rows(rows: &[[Real; 4]; 4]) -> Mat4 {
    Mat4::from_fn(|r, c| rows[r][c])
}

/// Row-major nested array view of a 3×3 matrix.
pub fn mat3_rows(m: &Mat3) -> [[Real; 3]; 3] {
    let mut rows = [[0.0; 3]; 3];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, v) in row.iter_mut().enumerate() {
            *v = m[(r, c)];
        }
    }
    rows
}

/// Whether every entry of the matrix is finite.
pub fn is_finite_mat4(m: &Mat4) -> bool {
    m.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn euler_xyz_applies_x_then_z() {
        // +90° about X maps Y to Z, then +90° about Z maps Z to Z.
        let r = euler_xyz(&Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        let v = r * Vec3::y();
        assert!((v - Vec3::z()).norm() < 1e-12, "got {v:?}");

        // X axis goes through Rx unchanged, then Rz maps it to Y.
        let v = r * Vec3::x();
        assert!((v - Vec3::y()).norm() < 1e-12, "got {v:?}");
    }

    #[test]
    fn rows_roundtrip_preserves_layout() {
        let m = Mat4::new(
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        let rows = mat4_rows(&m);
        assert_eq!(rows[0], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(rows[2][3], 12.0);
        assert_eq!(mat4_from_rows(&rows), m);
    }
}
