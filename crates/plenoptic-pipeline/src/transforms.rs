//! `transforms.json` document (NeRF / instant-ngp style).

use plenoptic_core::{Intrinsics, Real, mat4_rows};
use serde::{Deserialize, Serialize};

use crate::extrinsics::ExtrinsicsGrid;

pub const TRANSFORMS_FILE: &str = "transforms.json";

/// Output flavour of `transforms.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformsFormat {
    /// instant-ngp: full pinhole intrinsics plus an AABB scale.
    Ngp { aabb_scale: u32 },
    /// Original NeRF: horizontal field of view only.
    Nerf,
}

impl Default for TransformsFormat {
    fn default() -> Self {
        Self::Ngp { aabb_scale: 4 }
    }
}

impl TransformsFormat {
    /// Label used in run logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ngp { .. } => "NGP",
            Self::Nerf => "NeRF",
        }
    }

    /// AABB scale, if the format carries one.
    pub fn aabb_scale(&self) -> Option<u32> {
        match self {
            Self::Ngp { aabb_scale } => Some(*aabb_scale),
            Self::Nerf => None,
        }
    }
}

/// Intrinsics block of `transforms.json`, flattened into the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntrinsicsSchema {
    FullPinhole {
        camera_angle_x: Real,
        camera_angle_y: Real,
        fl_x: Real,
        fl_y: Real,
        k1: Real,
        k2: Real,
        p1: Real,
        p2: Real,
        cx: Real,
        cy: Real,
        w: u32,
        h: u32,
        aabb_scale: u32,
    },
    AngleOnly {
        camera_angle_x: Real,
    },
}

impl IntrinsicsSchema {
    pub fn new(intrinsics: &Intrinsics, format: TransformsFormat) -> Self {
        match format {
            TransformsFormat::Ngp { aabb_scale } => Self::FullPinhole {
                camera_angle_x: intrinsics.camera_angle_x,
                camera_angle_y: intrinsics.camera_angle_y,
                fl_x: intrinsics.fl_x,
                fl_y: intrinsics.fl_y,
                k1: intrinsics.k1,
                k2: intrinsics.k2,
                p1: intrinsics.p1,
                p2: intrinsics.p2,
                cx: intrinsics.cx,
                cy: intrinsics.cy,
                w: intrinsics.width,
                h: intrinsics.height,
                aabb_scale,
            },
            TransformsFormat::Nerf => Self::AngleOnly {
                camera_angle_x: intrinsics.camera_angle_x,
            },
        }
    }
}

/// One camera at one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformsFrame {
    pub file_path: String,
    pub camera_object: String,
    pub frame: i64,
    /// Camera-to-world matrix in the host convention, row-major.
    pub transform_matrix: [[Real; 4]; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformsJson {
    #[serde(flatten)]
    pub intrinsics: IntrinsicsSchema,
    pub frames: Vec<TransformsFrame>,
}

impl TransformsJson {
    /// Build the document from host camera-to-world extrinsics.
    ///
    /// `file_names` is indexed `[frame][camera]` and is prefixed with the
    /// image folder. Frame numbers start at `first_frame`.
    pub fn build(
        intrinsics: &Intrinsics,
        format: TransformsFormat,
        c2w: &ExtrinsicsGrid,
        camera_names: &[String],
        file_names: &[Vec<String>],
        first_frame: i64,
    ) -> Self {
        let mut frames = Vec::with_capacity(c2w.num_frames() * c2w.num_cameras());
        for (t, row) in file_names.iter().enumerate().take(c2w.num_frames()) {
            for (cam, (pose, name)) in c2w.frame(t).iter().zip(camera_names).enumerate() {
                frames.push(TransformsFrame {
                    file_path: format!("ims/{}", row[cam]),
                    camera_object: name.clone(),
                    frame: first_frame + t as i64,
                    transform_matrix: mat4_rows(pose),
                });
            }
        }
        Self {
            intrinsics: IntrinsicsSchema::new(intrinsics, format),
            frames,
        }
    }
}
