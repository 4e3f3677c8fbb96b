//! Geometry snapshots captured from the scene at a reference frame.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::convention;
use crate::math::{Mat4, Pt3, Real, Vec3};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("{attribute} has {found} entries, expected {expected} (one per vertex)")]
    AttributeLength {
        attribute: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("face {face} references vertex {index}, but only {count} vertices exist")]
    FaceIndex {
        face: usize,
        index: u32,
        count: usize,
    },
    #[error("face {0} has fewer than 3 vertices")]
    DegenerateFace(usize),
}

/// Vertex set with optional per-vertex normals and RGB colors plus
/// polygon faces, in world coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometrySnapshot {
    pub positions: Vec<Pt3>,
    pub normals: Option<Vec<Vec3>>,
    pub colors: Option<Vec<[u8; 3]>>,
    /// Polygons as vertex index lists (three or more indices each).
    pub faces: Vec<Vec<u32>>,
}

impl GeometrySnapshot {
    /// Check attribute lengths and face indices.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let n = self.positions.len();
        if let Some(normals) = &self.normals {
            if normals.len() != n {
                return Err(GeometryError::AttributeLength {
                    attribute: "normals",
                    found: normals.len(),
                    expected: n,
                });
            }
        }
        if let Some(colors) = &self.colors {
            if colors.len() != n {
                return Err(GeometryError::AttributeLength {
                    attribute: "colors",
                    found: colors.len(),
                    expected: n,
                });
            }
        }
        for (face_idx, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(GeometryError::DegenerateFace(face_idx));
            }
            if let Some(&index) = face.iter().find(|&&i| i as usize >= n) {
                return Err(GeometryError::FaceIndex {
                    face: face_idx,
                    index,
                    count: n,
                });
            }
        }
        Ok(())
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Apply an affine world transform. Normals use the inverse transpose
    /// of the linear part and are renormalized.
    pub fn transformed(&self, world: &Mat4) -> Self {
        let linear = world.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_map = linear
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or(linear);
        Self {
            positions: self
                .positions
                .iter()
                .map(|p| world.transform_point(p))
                .collect(),
            normals: self.normals.as_ref().map(|normals| {
                normals
                    .iter()
                    .map(|n| {
                        let m = normal_map * n;
                        let len = m.norm();
                        if len > 0.0 { m / len } else { m }
                    })
                    .collect()
            }),
            colors: self.colors.clone(),
            faces: self.faces.clone(),
        }
    }

    /// Re-express the snapshot in the OpenCV world convention.
    pub fn to_target_convention(&self) -> Self {
        let normals = self.normals.as_deref().unwrap_or(&[]);
        let (positions, rotated_normals) = convention::to_target_geometry(&self.positions, normals);
        Self {
            positions,
            normals: self.normals.as_ref().map(|_| rotated_normals),
            colors: self.colors.clone(),
            faces: self.faces.clone(),
        }
    }

    /// Append another snapshot, offsetting its face indices.
    ///
    /// Optional attributes survive only if both sides carry them, except
    /// when `self` is still empty.
    pub fn append(&mut self, other: &GeometrySnapshot) {
        if self.positions.is_empty() && self.faces.is_empty() {
            *self = other.clone();
            return;
        }
        let offset = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals = match (self.normals.take(), &other.normals) {
            (Some(mut a), Some(b)) => {
                a.extend_from_slice(b);
                Some(a)
            }
            _ => None,
        };
        self.colors = match (self.colors.take(), &other.colors) {
            (Some(mut a), Some(b)) => {
                a.extend_from_slice(b);
                Some(a)
            }
            _ => None,
        };
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| f.iter().map(|i| i + offset).collect::<Vec<_>>()),
        );
    }

    /// Fan triangulation of every face.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.faces.iter().flat_map(|face| {
            (1..face.len().saturating_sub(1)).map(move |k| [face[0], face[k], face[k + 1]])
        })
    }

    /// Total triangle area.
    pub fn surface_area(&self) -> Real {
        self.triangles()
            .map(|t| triangle_area(&self.positions, t))
            .sum()
    }
}

/// Area of the triangle `t` over `positions`.
pub fn triangle_area(positions: &[Pt3], t: [u32; 3]) -> Real {
    let a = positions[t[0] as usize];
    let b = positions[t[1] as usize];
    let c = positions[t[2] as usize];
    0.5 * (b - a).cross(&(c - a)).norm()
}
