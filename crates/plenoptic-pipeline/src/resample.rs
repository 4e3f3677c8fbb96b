//! Dense point-cloud resampling of exported scene geometry.

use std::path::Path;

use anyhow::{Context, Result};
use plenoptic_core::{GeometryError, GeometrySnapshot, Pt3, Real, Vec3, triangle_area};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::io::{Array2, read_ply, write_npz, write_ply};

pub const GEOMETRY_FILE: &str = "points3d.ply";
pub const DENSE_NPZ_FILE: &str = "init_pt_cld.npz";
pub const DENSE_PLY_FILE: &str = "init_pt_cld.ply";
/// Average cloud size of public dynamic Gaussian Splatting datasets.
pub const DEFAULT_POINT_COUNT: usize = 150_000;

/// Columns per point: position, color, segmentation.
pub const DENSE_COLUMNS: usize = 7;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResampleError {
    #[error("geometry has no surface area to sample from")]
    EmptySurface,
    #[error("requested zero points")]
    ZeroCount,
    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),
}

/// Points sampled on a surface with colors in `[0, 1]` and a constant
/// segmentation value.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseCloud {
    pub points: Vec<Pt3>,
    pub colors: Vec<Vec3>,
    pub segmentation: Vec<Real>,
}

impl DenseCloud {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rows of `[x, y, z, r, g, b, seg]`.
    pub fn to_array(&self) -> Result<Array2> {
        let mut data = Vec::with_capacity(self.len() * DENSE_COLUMNS);
        for ((p, c), s) in self.points.iter().zip(&self.colors).zip(&self.segmentation) {
            data.extend_from_slice(&[p.x, p.y, p.z, c.x, c.y, c.z, *s]);
        }
        Array2::new(self.len(), DENSE_COLUMNS, data)
    }

    /// Point-only snapshot with 8-bit colors.
    pub fn to_snapshot(&self) -> GeometrySnapshot {
        GeometrySnapshot {
            positions: self.points.clone(),
            normals: None,
            colors: Some(
                self.colors
                    .iter()
                    .map(|c| c.map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8).into())
                    .collect(),
            ),
            faces: Vec::new(),
        }
    }
}

fn vertex_color(geometry: &GeometrySnapshot, index: u32) -> Vec3 {
    geometry.colors.as_ref().map_or_else(Vec3::zeros, |colors| {
        let [r, g, b] = colors[index as usize];
        Vec3::new(Real::from(r), Real::from(g), Real::from(b)) / 255.0
    })
}

/// Sample exactly `count` points uniformly by area over the surface.
///
/// Polygons are fan-triangulated; triangles are picked through the
/// cumulative area table and points are uniform in barycentric
/// coordinates. Colors are interpolated from the vertices, or zero when
/// the geometry has none.
pub fn resample_point_cloud<R: Rng + ?Sized>(
    geometry: &GeometrySnapshot,
    count: usize,
    rng: &mut R,
) -> Result<DenseCloud, ResampleError> {
    geometry.validate()?;
    if count == 0 {
        return Err(ResampleError::ZeroCount);
    }

    let triangles: Vec<[u32; 3]> = geometry.triangles().collect();
    let mut cumulative = Vec::with_capacity(triangles.len());
    let mut total = 0.0;
    for t in &triangles {
        total += triangle_area(&geometry.positions, *t);
        cumulative.push(total);
    }
    if !(total > 0.0 && total.is_finite()) {
        return Err(ResampleError::EmptySurface);
    }

    let mut cloud = DenseCloud {
        points: Vec::with_capacity(count),
        colors: Vec::with_capacity(count),
        segmentation: vec![1.0; count],
    };
    for _ in 0..count {
        let target = rng.random::<Real>() * total;
        let idx = cumulative
            .partition_point(|&c| c <= target)
            .min(triangles.len() - 1);
        let [ia, ib, ic] = triangles[idx];

        let mut u = rng.random::<Real>();
        let mut v = rng.random::<Real>();
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        let w = 1.0 - u - v;

        let pos = &geometry.positions;
        let (a, b, c) = (pos[ia as usize], pos[ib as usize], pos[ic as usize]);
        cloud
            .points
            .push(Pt3::from(a.coords * w + b.coords * u + c.coords * v));
        cloud.colors.push(
            vertex_color(geometry, ia) * w
                + vertex_color(geometry, ib) * u
                + vertex_color(geometry, ic) * v,
        );
    }
    log::debug!(
        "sampled {count} points over {} triangles (area {total:.4})",
        triangles.len()
    );
    Ok(cloud)
}

/// Resample `points3d.ply` in `dir` and write `init_pt_cld.npz` and
/// `init_pt_cld.ply` next to it.
pub fn resample_dataset_dir(dir: &Path, count: usize, seed: u64) -> Result<DenseCloud> {
    let source = dir.join(GEOMETRY_FILE);
    let geometry = read_ply(&source).with_context(|| format!("failed to load {}", source.display()))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let cloud = resample_point_cloud(&geometry, count, &mut rng)
        .with_context(|| format!("cannot resample {}", source.display()))?;

    let array = cloud.to_array()?;
    write_npz(&dir.join(DENSE_NPZ_FILE), &[("data", &array)])?;
    write_ply(&dir.join(DENSE_PLY_FILE), &cloud.to_snapshot())?;
    log::info!("wrote {} dense points to {}", cloud.len(), dir.display());
    Ok(cloud)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_quads() -> GeometrySnapshot {
        // Unit square at z=0 (red) and a 2x1 rectangle at z=1 (blue).
        GeometrySnapshot {
            positions: vec![
                Pt3::new(0.0, 0.0, 0.0),
                Pt3::new(1.0, 0.0, 0.0),
                Pt3::new(1.0, 1.0, 0.0),
                Pt3::new(0.0, 1.0, 0.0),
                Pt3::new(0.0, 0.0, 1.0),
                Pt3::new(2.0, 0.0, 1.0),
                Pt3::new(2.0, 1.0, 1.0),
                Pt3::new(0.0, 1.0, 1.0),
            ],
            normals: None,
            colors: Some(vec![
                [255, 0, 0],
                [255, 0, 0],
                [255, 0, 0],
                [255, 0, 0],
                [0, 0, 255],
                [0, 0, 255],
                [0, 0, 255],
                [0, 0, 255],
            ]),
            faces: vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]],
        }
    }

    #[test]
    fn sampling_is_area_weighted_and_exact() {
        let mut rng = StdRng::seed_from_u64(3);
        let cloud = resample_point_cloud(&two_quads(), 9_000, &mut rng).unwrap();
        assert_eq!(cloud.len(), 9_000);
        let upper = cloud.points.iter().filter(|p| p.z > 0.5).count();
        // The upper rectangle has twice the area: expect ~6000.
        assert!((5_700..=6_300).contains(&upper), "upper = {upper}");
        for (p, c) in cloud.points.iter().zip(&cloud.colors) {
            if p.z > 0.5 {
                assert!(p.x <= 2.0 && p.y <= 1.0);
                assert!((c - Vec3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
            } else {
                assert!(p.x <= 1.0 && p.y <= 1.0);
                assert!((c - Vec3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
            }
        }
        assert!(cloud.segmentation.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn missing_colors_sample_black() {
        let mut g = two_quads();
        g.colors = None;
        let mut rng = StdRng::seed_from_u64(0);
        let cloud = resample_point_cloud(&g, 10, &mut rng).unwrap();
        assert!(cloud.colors.iter().all(|c| *c == Vec3::zeros()));
    }

    #[test]
    fn degenerate_inputs_are_errors() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut points_only = two_quads();
        points_only.faces.clear();
        assert_eq!(
            resample_point_cloud(&points_only, 10, &mut rng),
            Err(ResampleError::EmptySurface)
        );
        assert_eq!(
            resample_point_cloud(&two_quads(), 0, &mut rng),
            Err(ResampleError::ZeroCount)
        );
    }

    #[test]
    fn dense_array_has_seven_columns() {
        let mut rng = StdRng::seed_from_u64(1);
        let cloud = resample_point_cloud(&two_quads(), 4, &mut rng).unwrap();
        let array = cloud.to_array().unwrap();
        assert_eq!((array.rows, array.cols), (4, 7));
        assert_eq!(array.row(2)[6], 1.0);
        assert_eq!(array.row(2)[0], cloud.points[2].x);
    }
}
