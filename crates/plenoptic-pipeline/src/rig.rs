//! Camera rig placement: names, location keys and look-at orientation.

use plenoptic_core::{CameraLayout, Mat4, PlacementRequest, Pt3, Real, Vec3};
use serde::{Deserialize, Serialize};

const POLE_EPS: Real = 1e-9;

/// Host camera-to-world pose at `position` aimed at (or away from) `target`.
///
/// The camera looks down its local −Z axis with local +Y as close to world
/// +Z as possible. Falls back to world +Y as the up hint when the viewing
/// direction is vertical.
pub fn look_at(position: &Pt3, target: &Pt3, outward: bool) -> Mat4 {
    let back = if outward {
        target - position
    } else {
        position - target
    };
    let z = if back.norm() > POLE_EPS {
        back.normalize()
    } else {
        Vec3::z()
    };
    let mut x = Vec3::z().cross(&z);
    if x.norm() < POLE_EPS {
        x = Vec3::y().cross(&z);
    }
    let x = x.normalize();
    let y = z.cross(&x);

    let mut pose = Mat4::identity();
    pose.fixed_view_mut::<3, 1>(0, 0).copy_from(&x);
    pose.fixed_view_mut::<3, 1>(0, 1).copy_from(&y);
    pose.fixed_view_mut::<3, 1>(0, 2).copy_from(&z);
    pose.fixed_view_mut::<3, 1>(0, 3).copy_from(&position.coords);
    pose
}

/// A generated camera with its keyed locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPlacement {
    /// Object name, `{template}_{index}`.
    pub name: String,
    /// Multiview suffix, `_{index}`.
    pub suffix: String,
    pub index: usize,
    /// `(frame, location)` keys, sorted by frame.
    pub keyframes: Vec<(i64, Pt3)>,
    /// Tracking target (the sphere center).
    pub target: Pt3,
    pub outward: bool,
}

impl CameraPlacement {
    /// Location held at `frame`: the last key at or before it, or the
    /// first key for earlier frames.
    pub fn location(&self, frame: i64) -> Option<Pt3> {
        let idx = self.keyframes.partition_point(|(f, _)| *f <= frame);
        let key = if idx == 0 {
            self.keyframes.first()
        } else {
            self.keyframes.get(idx - 1)
        };
        key.map(|(_, p)| *p)
    }

    pub fn world_transform(&self, frame: i64) -> Option<Mat4> {
        self.location(frame)
            .map(|p| look_at(&p, &self.target, self.outward))
    }
}

/// Turn a sampled layout into named camera placements.
///
/// Repetition `r` is keyed at frame `first_frame + r`. Sampled positions are
/// sphere-local and are offset by the sphere center here.
pub fn build_placements(
    template_name: &str,
    layout: &CameraLayout,
    request: &PlacementRequest,
) -> Vec<CameraPlacement> {
    let first_frame = request.frame_range.0;
    let target = Pt3::from(request.sphere.center);
    (0..layout.num_cameras())
        .map(|index| {
            let keyframes = (0..layout.num_repetitions())
                .map(|rep| {
                    let local = layout.repetition(rep)[index];
                    (first_frame + rep as i64, local + request.sphere.center)
                })
                .collect();
            CameraPlacement {
                name: format!("{template_name}_{index}"),
                suffix: format!("_{index}"),
                index,
                keyframes,
                target,
                outward: request.outward,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenoptic_core::{Distribution, SphereSpec};

    fn request(distribution: Distribution) -> PlacementRequest {
        PlacementRequest {
            seed: 7,
            camera_count: 3,
            hemisphere_only: false,
            outward: false,
            distribution,
            frame_range: (5, 8),
            sphere: SphereSpec {
                center: Vec3::new(1.0, -2.0, 0.5),
                ..SphereSpec::default()
            },
        }
    }

    #[test]
    fn look_at_is_a_proper_pose() {
        let p = Pt3::new(3.0, -1.0, 2.0);
        let pose = look_at(&p, &Pt3::origin(), false);
        let r = pose.fixed_view::<3, 3>(0, 0).into_owned();
        assert!((r.transpose() * r - plenoptic_core::Mat3::identity()).norm() < 1e-12);
        assert!((r.determinant() - 1.0).abs() < 1e-12);
        // −Z points at the target.
        let forward = -r.column(2).into_owned();
        assert!((forward - (-p.coords).normalize()).norm() < 1e-12);
        // Local +Y leans towards world up.
        assert!(r[(2, 1)] > 0.0);
    }

    #[test]
    fn outward_cameras_face_away() {
        let p = Pt3::new(0.0, 4.0, 0.0);
        let pose = look_at(&p, &Pt3::origin(), true);
        let forward = -pose.fixed_view::<3, 1>(0, 2).into_owned();
        assert!((forward - Vec3::y()).norm() < 1e-12);
    }

    #[test]
    fn look_at_handles_poles() {
        for z in [4.0, -4.0] {
            let pose = look_at(&Pt3::new(0.0, 0.0, z), &Pt3::origin(), false);
            assert!(plenoptic_core::is_finite_mat4(&pose));
            let r = pose.fixed_view::<3, 3>(0, 0).into_owned();
            assert!((r.determinant() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn placements_are_named_and_keyed() {
        let req = request(Distribution::RandomPerFrame);
        let layout = req.sample().unwrap();
        let placements = build_placements("Camera", &layout, &req);
        assert_eq!(placements.len(), 3);
        assert_eq!(placements[2].name, "Camera_2");
        assert_eq!(placements[2].suffix, "_2");
        let frames: Vec<i64> = placements[0].keyframes.iter().map(|(f, _)| *f).collect();
        assert_eq!(frames, vec![5, 6, 7, 8]);
        assert_eq!(
            placements[1].location(7),
            Some(layout.position(2, 1) + req.sphere.center)
        );
        assert_eq!(placements[0].target, Pt3::new(1.0, -2.0, 0.5));
    }

    #[test]
    fn static_placements_hold_their_only_key() {
        let req = request(Distribution::GoldenAngle);
        let layout = req.sample().unwrap();
        let placements = build_placements("Cam", &layout, &req);
        let cam = &placements[1];
        assert_eq!(cam.keyframes.len(), 1);
        assert_eq!(cam.location(0), cam.location(100));
        assert_eq!(cam.world_transform(5), cam.world_transform(8));
    }
}
