//! Conversion between the host and OpenCV/COLMAP coordinate conventions.
//!
//! Host convention: Z-up world, cameras look down their local −Z axis with
//! local +Y pointing up. OpenCV convention: cameras look down local +Z with
//! local +Y pointing down, and the world is re-oriented by two fixed
//! quarter turns.
//!
//! Pose conversion (`to_target_pose`) is three pre-multiplications applied
//! in a fixed order:
//!
//! 1. flip the local Y and Z camera axes (rotation columns only),
//! 2. apply the fixed world rotation [`world_rx`],
//! 3. apply the fixed world rotation [`world_ry`].
//!
//! Geometry conversion applies only steps 2–3. The forward map is not an
//! involution; use the `from_target_*` functions to go back.

use serde::{Deserialize, Serialize};

use crate::math::{Mat3, Mat4, Pt3, Vec3, homogeneous, is_finite_mat4};

/// Target coordinate convention for emitted poses and geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// Keep the host convention untouched.
    Host,
    /// OpenCV/COLMAP convention.
    #[default]
    OpenCv,
}

impl Convention {
    /// Express a host camera-to-world pose in this convention.
    pub fn apply_to_pose(self, pose: &Mat4) -> Mat4 {
        match self {
            Convention::Host => *pose,
            Convention::OpenCv => to_target_pose(pose),
        }
    }
}

/// Fixed world rotation about X, first stage of the world re-orientation.
pub fn world_rx() -> Mat3 {
    Mat3::new(
        1.0, 0.0, 0.0, //
        0.0, 0.0, -1.0, //
        0.0, 1.0, 0.0,
    )
}

/// Fixed world rotation about Y, second stage of the world re-orientation.
pub fn world_ry() -> Mat3 {
    Mat3::new(
        0.0, 0.0, 1.0, //
        0.0, 1.0, 0.0, //
        -1.0, 0.0, 0.0,
    )
}

fn world_rotation() -> Mat3 {
    world_ry() * world_rx()
}

fn flip_local_yz(pose: &Mat4) -> Mat4 {
    let mut out = *pose;
    for r in 0..3 {
        out[(r, 1)] = -out[(r, 1)];
        out[(r, 2)] = -out[(r, 2)];
    }
    out
}

/// Convert a host camera-to-world pose into the OpenCV convention.
///
/// # Panics
///
/// In debug builds, panics if the pose contains non-finite entries.
pub fn to_target_pose(pose: &Mat4) -> Mat4 {
    debug_assert!(is_finite_mat4(pose), "pose must be finite: {pose}");
    let flipped = flip_local_yz(pose);
    let rotated_x = homogeneous(&world_rx()) * flipped;
    homogeneous(&world_ry()) * rotated_x
}

/// Inverse of [`to_target_pose`].
pub fn from_target_pose(pose: &Mat4) -> Mat4 {
    debug_assert!(is_finite_mat4(pose), "pose must be finite: {pose}");
    let back = homogeneous(&world_rotation().transpose()) * pose;
    flip_local_yz(&back)
}

/// Convert point coordinates and normals from host world into OpenCV world.
///
/// Normals are rotated with the same matrix as points; both maps are pure
/// rotations so no renormalization is needed.
pub fn to_target_geometry(points: &[Pt3], normals: &[Vec3]) -> (Vec<Pt3>, Vec<Vec3>) {
    rotate_geometry(&world_rotation(), points, normals)
}

/// Inverse of [`to_target_geometry`].
pub fn from_target_geometry(points: &[Pt3], normals: &[Vec3]) -> (Vec<Pt3>, Vec<Vec3>) {
    rotate_geometry(&world_rotation().transpose(), points, normals)
}

fn rotate_geometry(r: &Mat3, points: &[Pt3], normals: &[Vec3]) -> (Vec<Pt3>, Vec<Vec3>) {
    let points = points.iter().map(|p| Pt3::from(r * p.coords)).collect();
    let normals = normals.iter().map(|n| r * n).collect();
    (points, normals)
}
