//! Deterministic camera position samplers on a (possibly scaled and
//! rotated) sphere.
//!
//! Two strategies are provided:
//!
//! - [`sample_random_uniform`]: area-uniform random positions, one
//!   independent MT19937 stream per camera. Per-frame layouts keep drawing
//!   from the same streams, so the first repetition is identical to the
//!   static layout with the same seed.
//! - [`sample_golden_angle`]: a seed-free Fibonacci-sphere layout.
//!
//! Both are pure functions of their inputs and reproduce bit-identical
//! layouts across runs.

mod mt19937;

pub use mt19937::Mt19937;

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{Mat3, Pt3, Real, Vec3, euler_xyz};

/// Multiplier applied to `seed + 1` when deriving per-camera seeds.
pub const SEED_MIX_GLOBAL: i128 = 2_654_435_761;
/// Multiplier applied to `camera_index + 1` when deriving per-camera seeds.
pub const SEED_MIX_CAMERA: i128 = 805_459_861;

/// Errors reported by the samplers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplerError {
    #[error("camera count must be at least 1")]
    NoCameras,
    #[error("frame range is empty: last frame {last} precedes first frame {first}")]
    EmptyFrameRange { first: i64, last: i64 },
    #[error("sphere scale must be non-zero on every axis, got {0:?}")]
    FlatSphere([Real; 3]),
    #[error("sphere radius must be positive and finite, got {0}")]
    InvalidRadius(Real),
}

/// Sampling sphere placed in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereSpec {
    /// Sphere center in world coordinates. Samplers work in sphere-local
    /// space and ignore it; rig placement adds it.
    pub center: Vec3,
    /// XYZ Euler rotation in radians.
    pub rotation: Vec3,
    /// Per-axis scale. Every component must be non-zero.
    pub scale: Vec3,
    /// Radius applied on top of `scale`.
    pub radius: Real,
}

impl Default for SphereSpec {
    fn default() -> Self {
        Self {
            center: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            radius: 4.0,
        }
    }
}

impl SphereSpec {
    /// True if any scale component is zero.
    pub fn is_flat(&self) -> bool {
        self.scale.iter().any(|s| *s == 0.0)
    }

    /// Reject degenerate spheres.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.is_flat() {
            return Err(SamplerError::FlatSphere([
                self.scale.x,
                self.scale.y,
                self.scale.z,
            ]));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SamplerError::InvalidRadius(self.radius));
        }
        Ok(())
    }

    fn place(&self, rotation: &Mat3, unit: &Vec3) -> Pt3 {
        let scaled = Vec3::new(
            (self.radius * self.scale.x) * unit.x,
            (self.radius * self.scale.y) * unit.y,
            (self.radius * self.scale.z) * unit.z,
        );
        Pt3::from(rotation * scaled)
    }
}

/// How camera positions are distributed over the sphere and over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distribution {
    /// Seed-free golden-angle layout, identical for every frame.
    GoldenAngle,
    /// One random layout shared by every frame.
    RandomStatic,
    /// A fresh random layout per frame.
    #[default]
    RandomPerFrame,
}

/// Everything needed to sample a camera layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub seed: i64,
    pub camera_count: usize,
    pub hemisphere_only: bool,
    /// Cameras face away from the sphere center. Consumed by rig placement.
    pub outward: bool,
    pub distribution: Distribution,
    /// Inclusive frame range `[first, last]`.
    pub frame_range: (i64, i64),
    pub sphere: SphereSpec,
}

impl PlacementRequest {
    /// Number of frames in the inclusive range.
    pub fn frame_count(&self) -> usize {
        let (first, last) = self.frame_range;
        if last < first {
            0
        } else {
            (last - first + 1) as usize
        }
    }

    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.camera_count == 0 {
            return Err(SamplerError::NoCameras);
        }
        let (first, last) = self.frame_range;
        if last < first {
            return Err(SamplerError::EmptyFrameRange { first, last });
        }
        self.sphere.validate()
    }

    /// Sample the layout selected by `distribution`.
    pub fn sample(&self) -> Result<CameraLayout, SamplerError> {
        self.validate()?;
        let layout = match self.distribution {
            Distribution::GoldenAngle => {
                sample_golden_angle(self.camera_count, self.hemisphere_only, &self.sphere)
            }
            Distribution::RandomStatic => sample_random_uniform(
                self.seed,
                self.camera_count,
                self.hemisphere_only,
                1,
                &self.sphere,
            ),
            Distribution::RandomPerFrame => sample_random_uniform(
                self.seed,
                self.camera_count,
                self.hemisphere_only,
                self.frame_count(),
                &self.sphere,
            ),
        };
        log::debug!(
            "sampled {} cameras x {} repetitions ({:?})",
            layout.num_cameras(),
            layout.num_repetitions(),
            self.distribution
        );
        Ok(layout)
    }
}

/// Sampled camera positions indexed `[repetition][camera]`.
///
/// A layout has either a single repetition (static cameras) or one
/// repetition per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraLayout {
    positions: Vec<Vec<Pt3>>,
}

/// Trajectory of a single camera across repetitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub camera_index: usize,
    /// One entry per frame, or a single entry for static layouts.
    pub positions_by_frame: Vec<Pt3>,
}

impl CameraLayout {
    /// Build a layout from `[repetition][camera]` positions.
    ///
    /// Returns `None` if there are no repetitions, no cameras, or the rows
    /// have different lengths.
    pub fn from_positions(positions: Vec<Vec<Pt3>>) -> Option<Self> {
        let cams = positions.first()?.len();
        if cams == 0 || positions.iter().any(|row| row.len() != cams) {
            return None;
        }
        Some(Self { positions })
    }

    pub fn num_cameras(&self) -> usize {
        self.positions[0].len()
    }

    pub fn num_repetitions(&self) -> usize {
        self.positions.len()
    }

    pub fn is_static(&self) -> bool {
        self.positions.len() == 1
    }

    /// Positions of every camera for one repetition.
    pub fn repetition(&self, rep: usize) -> &[Pt3] {
        &self.positions[rep]
    }

    /// Position of `camera` at frame offset `t`; static layouts broadcast.
    pub fn position(&self, t: usize, camera: usize) -> Pt3 {
        let rep = if self.is_static() { 0 } else { t };
        self.positions[rep][camera]
    }

    /// Per-camera view of the layout.
    pub fn pose(&self, camera: usize) -> CameraPose {
        CameraPose {
            camera_index: camera,
            positions_by_frame: self.positions.iter().map(|row| row[camera]).collect(),
        }
    }

    pub fn poses(&self) -> Vec<CameraPose> {
        (0..self.num_cameras()).map(|c| self.pose(c)).collect()
    }
}

/// Per-camera seed derived from the global seed.
///
/// Evaluated in 128-bit arithmetic so the bit pattern matches an
/// arbitrary-precision evaluation for every `i64` seed.
pub fn camera_seed(seed: i64, camera_index: usize) -> i128 {
    (SEED_MIX_GLOBAL * (i128::from(seed) + 1)) ^ (SEED_MIX_CAMERA * (camera_index as i128 + 1))
}

/// Area-uniform random layout.
///
/// Every camera owns an independent generator seeded with
/// [`camera_seed`]. Each repetition draws `θ = 2π·u` then
/// `φ = acos(1 − 2u)` from every generator, continuing the same streams.
pub fn sample_random_uniform(
    seed: i64,
    camera_count: usize,
    hemisphere_only: bool,
    repetitions: usize,
    sphere: &SphereSpec,
) -> CameraLayout {
    let rotation = euler_xyz(&sphere.rotation);
    let mut rngs: Vec<Mt19937> = (0..camera_count)
        .map(|i| Mt19937::from_python_seed(camera_seed(seed, i)))
        .collect();

    let positions = (0..repetitions.max(1))
        .map(|_| {
            rngs.iter_mut()
                .map(|rng| {
                    let theta = rng.random() * 2.0 * PI;
                    let phi = (1.0 - 2.0 * rng.random()).acos();
                    let unit = spherical_unit(theta, phi, hemisphere_only);
                    sphere.place(&rotation, &unit)
                })
                .collect()
        })
        .collect();
    CameraLayout { positions }
}

/// Golden-angle (Fibonacci sphere) layout, always a single repetition.
pub fn sample_golden_angle(
    camera_count: usize,
    hemisphere_only: bool,
    sphere: &SphereSpec,
) -> CameraLayout {
    let golden = PI * (5.0_f64.sqrt() - 1.0);
    let rotation = euler_xyz(&sphere.rotation);
    let n = camera_count as Real;

    let row = (0..camera_count)
        .map(|i| {
            let k = i as Real + 0.5;
            let z = if hemisphere_only {
                k / n
            } else {
                1.0 - (k / n) * 2.0
            };
            let r = (1.0 - z * z).sqrt();
            let theta = golden * i as Real;
            let unit = Vec3::new(theta.cos() * r, -theta.sin() * r, z);
            sphere.place(&rotation, &unit)
        })
        .collect();
    CameraLayout {
        positions: vec![row],
    }
}

fn spherical_unit(theta: Real, phi: Real, hemisphere_only: bool) -> Vec3 {
    let z = if hemisphere_only {
        phi.cos().abs()
    } else {
        phi.cos()
    };
    Vec3::new(theta.cos() * phi.sin(), theta.sin() * phi.sin(), z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_seed_matches_mixing_constants() {
        assert_eq!(camera_seed(0, 0), 2_654_435_761 ^ 805_459_861);
        assert_eq!(camera_seed(0, 3), 2_654_435_761 ^ (805_459_861 * 4));
        assert_eq!(camera_seed(-5, 1), -10_617_743_044 ^ 1_610_919_722);
    }

    #[test]
    fn static_random_equals_first_per_frame_repetition() {
        let sphere = SphereSpec::default();
        let per_frame = sample_random_uniform(9, 6, false, 3, &sphere);
        let fixed = sample_random_uniform(9, 6, false, 1, &sphere);
        assert_eq!(per_frame.repetition(0), fixed.repetition(0));
        assert_ne!(per_frame.repetition(0), per_frame.repetition(1));
    }

    #[test]
    fn hemisphere_restricts_z() {
        let sphere = SphereSpec::default();
        let layout = sample_random_uniform(1, 200, true, 2, &sphere);
        for rep in 0..layout.num_repetitions() {
            assert!(layout.repetition(rep).iter().all(|p| p.z >= 0.0));
        }
        let golden = sample_golden_angle(200, true, &sphere);
        assert!(golden.repetition(0).iter().all(|p| p.z > 0.0));
    }

    #[test]
    fn radius_scale_and_rotation_are_applied() {
        let sphere = SphereSpec {
            center: Vec3::new(1.0, -2.0, 0.5),
            rotation: Vec3::new(0.3, -0.2, 1.1),
            scale: Vec3::new(1.0, 2.0, 0.5),
            radius: 3.0,
        };
        let unit_sphere = SphereSpec {
            radius: 1.0,
            ..SphereSpec::default()
        };
        let raw = sample_golden_angle(16, false, &unit_sphere);
        let placed = sample_golden_angle(16, false, &sphere);
        let rot = euler_xyz(&sphere.rotation);
        for (u, p) in raw.repetition(0).iter().zip(placed.repetition(0)) {
            let expected = rot * Vec3::new(3.0 * u.x, 6.0 * u.y, 1.5 * u.z);
            assert!((p.coords - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn static_layout_broadcasts_positions() {
        let layout = sample_golden_angle(5, false, &SphereSpec::default());
        assert!(layout.is_static());
        assert_eq!(layout.position(0, 2), layout.position(40, 2));
        assert_eq!(layout.pose(2).positions_by_frame.len(), 1);
    }

    #[test]
    fn request_validation_reports_errors() {
        let mut req = PlacementRequest {
            seed: 0,
            camera_count: 0,
            hemisphere_only: false,
            outward: false,
            distribution: Distribution::RandomPerFrame,
            frame_range: (1, 10),
            sphere: SphereSpec::default(),
        };
        assert_eq!(req.sample(), Err(SamplerError::NoCameras));

        req.camera_count = 3;
        req.frame_range = (5, 4);
        assert!(matches!(
            req.sample(),
            Err(SamplerError::EmptyFrameRange { first: 5, last: 4 })
        ));

        req.frame_range = (1, 10);
        req.sphere.scale.y = 0.0;
        assert!(matches!(req.sample(), Err(SamplerError::FlatSphere(_))));

        req.sphere.scale.y = 1.0;
        let layout = req.sample().unwrap();
        assert_eq!(layout.num_repetitions(), 10);
        assert_eq!(layout.num_cameras(), 3);
    }

    #[test]
    fn layout_rejects_ragged_rows() {
        let p = Pt3::origin();
        assert!(CameraLayout::from_positions(vec![vec![p, p], vec![p]]).is_none());
        assert!(CameraLayout::from_positions(vec![]).is_none());
        assert!(CameraLayout::from_positions(vec![vec![p, p]]).is_some());
    }
}
